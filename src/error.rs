use std::io;
use std::str::Utf8Error;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid fingerprint '{fingerprint}': {reason}")]
    InvalidFingerprint { fingerprint: String, reason: String },

    #[error("unsupported OpenPGP v3 fingerprint: {0}")]
    UnsupportedLegacyFingerprint(String),

    #[error("NUL byte in uid {uid:?}")]
    CorruptIdentity { uid: String },

    #[error("malformed record '{line}': {reason}")]
    MalformedRecord { line: String, reason: String },

    #[error("keyserver response is not valid UTF-8: {0}")]
    NotText(#[from] Utf8Error),

    #[error("requested key {requested} but the keyserver returned {received}")]
    SuspiciousKey { requested: String, received: String },

    #[error("expected 1 key for {query}, got {count}")]
    UnexpectedKeyCount { query: String, count: usize },

    #[error("keyserver request failed: {0}")]
    Transport(String),

    #[error("keyserver request timed out after {0} seconds")]
    Timeout(u64),

    #[error("invalid date '{value}'")]
    InvalidDate { value: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("key record error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
