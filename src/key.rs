use std::fmt;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::types::KeyType;
use crate::uid::{Uid, ValidUid};

/// An OpenPGP public key as listed by a keyserver.
///
/// Built through [`PgpKeyBuilder`] and read-only afterwards. Uids are kept as
/// the raw strings received and parsed on read, so a key without a single
/// usable email address can still be represented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PgpKey {
    fingerprint: Option<Fingerprint>,
    algorithm_number: Option<u32>,
    size_bits: Option<u32>,
    created: Option<NaiveDate>,
    expires: Option<NaiveDate>,
    revoked: bool,
    uids: Vec<String>,
}

impl PgpKey {
    pub fn builder() -> PgpKeyBuilder {
        PgpKeyBuilder::default()
    }

    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprint.as_ref()
    }

    /// `0x` followed by the last 16 fingerprint digits.
    pub fn long_id(&self) -> Option<String> {
        self.fingerprint.as_ref().map(Fingerprint::to_long_id)
    }

    pub fn algorithm_number(&self) -> Option<u32> {
        self.algorithm_number
    }

    pub fn size_bits(&self) -> Option<u32> {
        self.size_bits
    }

    pub fn key_type(&self) -> Option<KeyType> {
        Some(KeyType {
            algorithm: self.algorithm_number?,
            bits: self.size_bits?,
        })
    }

    pub fn created_date(&self) -> Option<NaiveDate> {
        self.created
    }

    /// `None` means the key never expires.
    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expires
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// Has a fingerprint and is not revoked.
    pub fn is_valid(&self) -> bool {
        self.fingerprint.is_some() && !self.revoked
    }

    /// True if the expiry date is strictly before `today`.
    pub fn has_expired(&self, today: NaiveDate) -> bool {
        self.expires.is_some_and(|expires| expires < today)
    }

    /// Whole days from `today` until expiry; negative once expired.
    pub fn days_until_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.expires.map(|expires| (expires - today).num_days())
    }

    /// True only on the single day that is exactly `days` before expiry.
    pub fn expires_in(&self, today: NaiveDate, days: i64) -> bool {
        self.days_until_expiry(today) == Some(days)
    }

    /// e.g. `Friday 22 December 2017`.
    pub fn friendly_expiry_date(&self) -> Option<String> {
        self.expires
            .map(|expires| expires.format("%A %d %B %Y").to_string())
    }

    /// The uid strings exactly as received.
    pub fn raw_uids(&self) -> &[String] {
        &self.uids
    }

    pub fn uids(&self) -> impl Iterator<Item = Uid> + '_ {
        self.uids.iter().map(|uid| Uid::parse(uid))
    }

    pub fn valid_uids(&self) -> Vec<ValidUid> {
        self.uids()
            .filter_map(|uid| match uid {
                Uid::Valid(valid) => Some(valid),
                Uid::Invalid => None,
            })
            .collect()
    }

    pub fn email_lines(&self) -> Vec<String> {
        self.valid_uids().iter().map(ValidUid::email_line).collect()
    }

    pub fn emails(&self) -> Vec<String> {
        self.valid_uids()
            .iter()
            .map(|uid| uid.email().to_string())
            .collect()
    }
}

impl fmt::Display for PgpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PGPKey(")?;
        match &self.fingerprint {
            Some(fingerprint) => write!(f, "{fingerprint}")?,
            None => write!(f, "no fingerprint")?,
        }
        match (self.revoked, self.expires) {
            (true, _) => write!(f, " [revoked])"),
            (false, Some(expires)) => write!(f, " [expires {expires}])"),
            (false, None) => write!(f, " [never expires])"),
        }
    }
}

/// Mutable stage of a [`PgpKey`].
#[derive(Debug, Default)]
pub struct PgpKeyBuilder {
    key: PgpKey,
}

impl PgpKeyBuilder {
    pub fn set_fingerprint(&mut self, fingerprint: &str) -> Result<&mut Self> {
        self.key.fingerprint = Some(Fingerprint::parse(fingerprint)?);
        Ok(self)
    }

    pub fn set_algorithm_number(&mut self, algorithm_number: u32) -> &mut Self {
        self.key.algorithm_number = Some(algorithm_number);
        self
    }

    pub fn set_size_bits(&mut self, size_bits: u32) -> &mut Self {
        self.key.size_bits = Some(size_bits);
        self
    }

    pub fn set_created_date(&mut self, date: Option<NaiveDate>) -> &mut Self {
        self.key.created = date;
        self
    }

    pub fn set_expiry_date(&mut self, date: Option<NaiveDate>) -> &mut Self {
        self.key.expires = date;
        self
    }

    /// Unix seconds, converted to a UTC calendar date.
    pub fn set_created_timestamp(&mut self, timestamp: i64) -> Result<&mut Self> {
        self.key.created = Some(date_from_timestamp(timestamp)?);
        Ok(self)
    }

    /// Unix seconds, converted to a UTC calendar date.
    pub fn set_expiry_timestamp(&mut self, timestamp: i64) -> Result<&mut Self> {
        self.key.expires = Some(date_from_timestamp(timestamp)?);
        Ok(self)
    }

    pub fn set_revoked(&mut self) -> &mut Self {
        self.key.revoked = true;
        self
    }

    /// Adds a raw uid. A NUL byte marks the whole record as corrupt.
    pub fn add_uid(&mut self, uid: impl Into<String>) -> Result<&mut Self> {
        let uid = uid.into();
        if uid.contains('\0') {
            return Err(Error::CorruptIdentity { uid });
        }
        self.key.uids.push(uid);
        Ok(self)
    }

    pub fn build(self) -> PgpKey {
        self.key
    }
}

fn date_from_timestamp(timestamp: i64) -> Result<NaiveDate> {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| Error::InvalidDate {
            value: timestamp.to_string(),
        })
}
