//! Runtime configuration, read from a JSON file.
//!
//! ```json
//! {
//!     "keyserver": "https://keyserver.example.com",
//!     "blacklisted_domains": ["example.net"],
//!     "expiring_days": 3
//! }
//! ```

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::exclusions::ExclusionPolicy;
use crate::expiry::EXPIRING_DAYS;

const DEFAULT_KEYSERVER: &str = "http://pool.sks-keyservers.net:11371";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Keyserver base URL, without a trailing slash.
    #[serde(default = "default_keyserver")]
    pub keyserver: String,

    /// Keys whose every email is at one of these domains are not notified.
    #[serde(default)]
    pub blacklisted_domains: Vec<String>,

    #[serde(default = "default_expiring_days")]
    pub expiring_days: i64,
}

fn default_keyserver() -> String {
    DEFAULT_KEYSERVER.to_string()
}

fn default_expiring_days() -> i64 {
    EXPIRING_DAYS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keyserver: default_keyserver(),
            blacklisted_domains: Vec::new(),
            expiring_days: default_expiring_days(),
        }
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Like [`Config::load`], but a missing file gives the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_json_str(&contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn exclusion_policy(&self) -> ExclusionPolicy {
        ExclusionPolicy::new(&self.blacklisted_domains)
    }
}
