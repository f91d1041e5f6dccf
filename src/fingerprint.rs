use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};

/// A 40 hex digit OpenPGP v4 fingerprint.
///
/// Stored as canonical uppercase digits without separators. Equality and
/// hashing use the digits only, so `"a999 b749 ..."` and `"0xA999B749..."`
/// compare equal once parsed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Parses a fingerprint as printed by gpg, a keyserver or a user.
    ///
    /// Accepted formats:
    /// - 40 hex characters, any case
    /// - Whitespace anywhere between the digits (e.g. `A999 B749 ...  ...`)
    /// - Any of the above with a "0x" prefix
    ///
    /// A bare 16 hex character string is a v3 key and fails with
    /// [`Error::UnsupportedLegacyFingerprint`] so callers can skip it quietly.
    pub fn parse(fingerprint: &str) -> Result<Self> {
        if fingerprint.len() == 16 && fingerprint.chars().all(|c| c.is_ascii_hexdigit()) {
            debug!(fingerprint, "dropping OpenPGP v3 key");
            return Err(Error::UnsupportedLegacyFingerprint(fingerprint.to_string()));
        }

        let trimmed = fingerprint.trim_start();
        let digits: String = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidFingerprint {
                fingerprint: fingerprint.to_string(),
                reason: "fingerprint must contain only hexadecimal characters".to_string(),
            });
        }

        if digits.len() != 40 {
            return Err(Error::InvalidFingerprint {
                fingerprint: fingerprint.to_string(),
                reason: format!(
                    "fingerprint must be 40 hex characters (got {})",
                    digits.len()
                ),
            });
        }

        Ok(Self(digits.to_ascii_uppercase()))
    }

    /// The canonical 40 uppercase digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `0x` followed by the last 16 digits, e.g. `0x309F635DAD1B5517`.
    pub fn to_long_id(&self) -> String {
        format!("0x{}", &self.0[24..])
    }

    /// `0x` followed by all 40 digits, as used in keyserver queries.
    pub fn hex_format(&self) -> String {
        format!("0x{}", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..10 {
            match i {
                0 => {}
                5 => f.write_str("  ")?,
                _ => f.write_str(" ")?,
            }
            f.write_str(&self.0[i * 4..i * 4 + 4])?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

impl PartialEq<str> for Fingerprint {
    fn eq(&self, other: &str) -> bool {
        Self::parse(other).is_ok_and(|other| *self == other)
    }
}

impl PartialEq<&str> for Fingerprint {
    fn eq(&self, other: &&str) -> bool {
        *self == **other
    }
}
