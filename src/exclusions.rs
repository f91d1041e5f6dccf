use std::collections::HashSet;
use std::fmt;

use tracing::warn;

use crate::key::PgpKey;
use crate::types::algorithm::{DSA, ECC, ECDSA, RSA};

/// Why an expiring key will not be notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ExclusionReason {
    /// Algorithm or key size below the accepted minimum.
    WeakKey,
    /// Every usable email address is at a blacklisted domain.
    AllDomainsBlacklisted,
    /// No uid holds a usable email address.
    NoValidEmails,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            ExclusionReason::WeakKey => "weak key",
            ExclusionReason::AllDomainsBlacklisted => "all domains blacklisted",
            ExclusionReason::NoValidEmails => "no valid emails",
        };
        f.write_str(reason)
    }
}

/// Decides which expiring keys are not eligible for a notification.
#[derive(Debug, Clone, Default)]
pub struct ExclusionPolicy {
    blacklisted_domains: HashSet<String>,
}

impl ExclusionPolicy {
    /// Domains are compared case-insensitively.
    pub fn new<I, S>(blacklisted_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            blacklisted_domains: blacklisted_domains
                .into_iter()
                .map(|domain| domain.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn is_blacklisted(&self, domain: &str) -> bool {
        self.blacklisted_domains.contains(&domain.to_lowercase())
    }

    /// True if the key has at least one valid uid and all of them are at
    /// blacklisted domains. Keys with no valid uid are left to
    /// [`no_valid_uids`].
    pub fn all_uids_blacklisted(&self, key: &PgpKey) -> bool {
        let uids = key.valid_uids();
        !uids.is_empty() && uids.iter().all(|uid| self.is_blacklisted(uid.domain()))
    }

    /// The first matching reason, checked as weak key, then blacklisted
    /// domains, then missing emails.
    pub fn exclusion_reason(&self, key: &PgpKey) -> Option<ExclusionReason> {
        if is_weak_key(key) {
            Some(ExclusionReason::WeakKey)
        } else if self.all_uids_blacklisted(key) {
            Some(ExclusionReason::AllDomainsBlacklisted)
        } else if no_valid_uids(key) {
            Some(ExclusionReason::NoValidEmails)
        } else {
            None
        }
    }

    pub fn should_exclude(&self, key: &PgpKey) -> bool {
        self.exclusion_reason(key).is_some()
    }
}

/// Classifies a key by algorithm and size.
///
/// RSA and DSA need 2048 bits, ECC needs 256. ECDSA is always accepted
/// whatever the curve size. Unknown algorithms, and keys missing their
/// algorithm or size, count as weak.
pub fn is_weak_key(key: &PgpKey) -> bool {
    let (Some(algorithm), Some(bits)) = (key.algorithm_number(), key.size_bits()) else {
        warn!(key = %key, "missing key algorithm or size");
        return true;
    };

    match algorithm {
        RSA | DSA => bits < 2048,
        ECC => bits < 256,
        ECDSA => {
            // TODO: pick a minimum curve size for ECDSA keys
            warn!(bits, "treating ECDSA key as strong");
            false
        }
        _ => {
            warn!(algorithm, bits, "unknown key algorithm");
            true
        }
    }
}

pub fn no_valid_uids(key: &PgpKey) -> bool {
    !key.uids().any(|uid| uid.is_valid())
}
