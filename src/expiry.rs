use chrono::NaiveDate;
use tracing::{info, warn};

use crate::exclusions::{ExclusionPolicy, ExclusionReason};
use crate::key::PgpKey;

/// Days ahead of expiry at which key holders are notified.
pub const EXPIRING_DAYS: i64 = 3;

/// True only when the key expires exactly `days` after `today`.
///
/// This is an equality test, not a range: a daily run sees each key on one
/// day only, so a missed run means that key is not notified this cycle.
pub fn is_expiring_in_exactly(key: &PgpKey, today: NaiveDate, days: i64) -> bool {
    key.expires_in(today, days)
}

pub fn has_expired(key: &PgpKey, today: NaiveDate) -> bool {
    key.has_expired(today)
}

pub fn days_until_expiry(key: &PgpKey, today: NaiveDate) -> Option<i64> {
    key.days_until_expiry(today)
}

/// Outcome of checking one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    NotExpiring,
    Expiring,
    Excluded(ExclusionReason),
}

/// Counters for a classification run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub parsed: usize,
    pub expiring: usize,
    pub excluded: usize,
}

/// Sorts keys into those to notify and those excluded, for one reference day.
pub struct ExpiryRun<'a> {
    today: NaiveDate,
    days: i64,
    policy: &'a ExclusionPolicy,
    stats: RunStats,
}

impl<'a> ExpiryRun<'a> {
    pub fn new(today: NaiveDate, days: i64, policy: &'a ExclusionPolicy) -> Self {
        Self {
            today,
            days,
            policy,
            stats: RunStats::default(),
        }
    }

    pub fn classify(&mut self, key: &PgpKey) -> Classification {
        self.stats.parsed += 1;

        if !is_expiring_in_exactly(key, self.today, self.days) {
            return Classification::NotExpiring;
        }

        match self.policy.exclusion_reason(key) {
            Some(reason) => {
                warn!(key = %key, emails = ?key.email_lines(), %reason, "skipping key");
                self.stats.excluded += 1;
                Classification::Excluded(reason)
            }
            None => {
                self.stats.expiring += 1;
                Classification::Expiring
            }
        }
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Logs the summary line and returns the final counts.
    pub fn finish(self) -> RunStats {
        info!(
            checked = self.stats.parsed,
            excluded = self.stats.excluded,
            expiring = self.stats.expiring,
            days = self.days,
            "finished expiry run"
        );
        self.stats
    }
}
