//! Process-wide cache for derived attribute data
//!
//! Entries are grouped (`listing_attribute`, `listing_category`, ...) and
//! keyed by the exact query that produced them. Invalidation bumps the
//! group's epoch and drops the entries cached under the old one; the epoch
//! is part of every entry key, so a write racing the bump can at worst land
//! one entry that is never read again. Concurrent requests may race to
//! recompute the same entry; recomputation is deterministic, so a lost race
//! only costs redundant work.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Shared cache for attribute catalogs, category id lists and numeric ranges.
///
/// No TTL and no locking. Staleness is bounded by epoch bumps from the
/// configuration surface, and races are benign.
#[derive(Default)]
pub struct DerivedCache {
    entries: DashMap<String, Value>,
    epochs: DashMap<String, u64>,
}

impl DerivedCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn epoch(&self, group: &str) -> u64 {
        self.epochs.get(group).map(|e| *e).unwrap_or(0)
    }

    fn entry_key(&self, group: &str, key: &Value) -> String {
        format!("{group}@{}:{key}", self.epoch(group))
    }

    /// Look up a cached value. `None` on miss or when the cached payload no
    /// longer deserializes into `T`.
    pub fn get<T: DeserializeOwned>(&self, group: &str, key: &Value) -> Option<T> {
        let entry = self.entries.get(&self.entry_key(group, key))?;
        serde_json::from_value(entry.value().clone()).ok()
    }

    /// Store a value under the group's current epoch.
    pub fn set<T: Serialize>(&self, group: &str, key: &Value, value: &T) {
        if let Ok(payload) = serde_json::to_value(value) {
            self.entries.insert(self.entry_key(group, key), payload);
        }
    }

    /// Bump the group's epoch and drop every entry cached under the old one.
    pub fn invalidate(&self, group: &str) {
        let (stale, epoch) = {
            let mut epoch = self.epochs.entry(group.to_string()).or_insert(0);
            let stale = format!("{group}@{}:", *epoch);
            *epoch += 1;
            (stale, *epoch)
        };
        self.entries.retain(|key, _| !key.starts_with(&stale));
        debug!(group, epoch, "cache group invalidated");
    }
}
