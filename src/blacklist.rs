use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::warn;

use crate::cache::ExpiringStore;

/// Why and when an instance was excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureMark {
    pub reason: String,
    pub reported_at: DateTime<Utc>,
}

/// Instances that failed recently, each excluded for a fixed cooldown.
#[derive(Debug, Clone)]
pub struct Blacklist {
    store: ExpiringStore<String, FailureMark>,
}

impl Blacklist {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            store: ExpiringStore::new(cooldown),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.store.default_ttl()
    }

    /// Records a failure. Reporting an instance again restarts its cooldown.
    pub fn report(&self, instance: &str, reason: impl Into<String>) {
        let mark = FailureMark {
            reason: reason.into(),
            reported_at: Utc::now(),
        };
        warn!(
            instance,
            reason = %mark.reason,
            cooldown = ?self.cooldown(),
            "blacklisting instance"
        );
        self.store.insert(instance.to_string(), mark);
    }

    pub fn contains(&self, instance: &str) -> bool {
        self.store.contains(instance)
    }

    pub fn mark(&self, instance: &str) -> Option<FailureMark> {
        self.store.get(instance).ok()
    }

    /// Instances still cooling down, sorted by name.
    pub fn instances(&self) -> Vec<String> {
        let mut instances: Vec<String> = self
            .store
            .snapshot()
            .into_iter()
            .map(|(instance, _)| instance)
            .collect();
        instances.sort();
        instances
    }

    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired()
    }
}
