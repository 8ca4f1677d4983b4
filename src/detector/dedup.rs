use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::alert::{AlarmIdentity, Alert};

pub const DEFAULT_COOLDOWN_SECS: u64 = 10;

/// Cooldown ledger keyed by alarm identity. The window is anchored to the last
/// emitted alarm; suppressed attempts leave it untouched.
#[derive(Debug)]
pub struct AlarmDeduplicator {
    last_emitted: HashMap<AlarmIdentity, DateTime<Utc>>,
    cooldown: Duration,
}

impl AlarmDeduplicator {
    pub fn new(cooldown_secs: u64) -> Self {
        let cooldown_secs = i64::try_from(cooldown_secs).unwrap_or(i64::MAX);
        Self {
            last_emitted: HashMap::new(),
            cooldown: Duration::try_seconds(cooldown_secs).unwrap_or(Duration::MAX),
        }
    }

    pub fn admit(&mut self, alert: &Alert, device_id: &str, now: DateTime<Utc>) -> bool {
        let identity = alert.identity(device_id);

        if let Some(last) = self.last_emitted.get(&identity)
            && now.signed_duration_since(*last) < self.cooldown
        {
            return false;
        }

        self.last_emitted.insert(identity, now);
        true
    }

    pub fn last_emitted(&self, identity: &AlarmIdentity) -> Option<DateTime<Utc>> {
        self.last_emitted.get(identity).copied()
    }
}

impl Default for AlarmDeduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_SECS)
    }
}
