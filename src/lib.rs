//! Track OpenPGP keys nearing expiry and decide whose holders to notify.
//!
//! This crate parses a keyserver's machine readable index into [`PgpKey`]s,
//! finds the keys expiring in exactly N days, and drops the ones that should
//! not be notified (weak keys, blacklisted domains, no usable email).
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use pgp_expiry::{Classification, ExclusionPolicy, ExpiryRun, VindexParser, EXPIRING_DAYS};
//!
//! let response = "info:1:1
//! pub:A999B7498D1A8DC473E53C92309F635DAD1B5517:1:4096:1414791274:1513954217:
//! uid:Paul Michael Furley <paul@paulfurley.com>:1482418217::
//! ";
//!
//! let policy = ExclusionPolicy::new(["example.net"]);
//! let today = NaiveDate::from_ymd_opt(2017, 12, 19).unwrap();
//! let mut run = ExpiryRun::new(today, EXPIRING_DAYS, &policy);
//!
//! for key in VindexParser::new(response) {
//!     if run.classify(&key) == Classification::Expiring {
//!         println!("{}: {:?}", key.long_id().unwrap_or_default(), key.email_lines());
//!     }
//! }
//!
//! assert_eq!(run.finish().expiring, 1);
//! ```
//!
//! Nothing here reads the system clock; the reference day is always passed in.

mod config;
mod error;
mod exclusions;
mod expiry;
mod fingerprint;
mod key;
mod keyserver;
mod parse;
mod record;
mod types;
mod uid;
mod validation;

pub use config::Config;
pub use error::{Error, Result};
pub use exclusions::{ExclusionPolicy, ExclusionReason, is_weak_key, no_valid_uids};
pub use expiry::{
    Classification, EXPIRING_DAYS, ExpiryRun, RunStats, days_until_expiry, has_expired,
    is_expiring_in_exactly,
};
pub use fingerprint::Fingerprint;
pub use key::{PgpKey, PgpKeyBuilder};
pub use keyserver::{HttpGet, KeyserverClient};
pub use parse::{VindexBlock, VindexBlocks, VindexParser};
pub use record::{KeyRecord, UID_SEPARATOR, read_records, write_records};
pub use types::{KeyType, KeyserverOptions, algorithm};
pub use uid::{Uid, ValidUid};
pub use validation::{validate_email, validate_hostname};
