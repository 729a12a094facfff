//! Per-day admission counter.

use crate::db::kv::{KeyValueStore, StoreError};

pub fn daily_key(day: &str) -> String {
    format!("kiosk:daily:{}", day)
}

/// Counts first visits per calendar day. A new day is a new key, so there is
/// no reset; old keys expire after `ttl_secs`.
pub struct DailyQuotaCounter<'a> {
    kv: &'a dyn KeyValueStore,
    ttl_secs: u64,
}

impl<'a> DailyQuotaCounter<'a> {
    pub fn new(kv: &'a dyn KeyValueStore, ttl_secs: u64) -> Self {
        Self { kv, ttl_secs }
    }

    /// Adds one to `day`'s total and returns the new total.
    ///
    /// Best-effort: concurrent increments may undercount.
    pub async fn increment(&self, day: &str) -> Result<u64, StoreError> {
        self.kv.incr_ex(&daily_key(day), self.ttl_secs).await
    }

    /// Current total for `day`, 0 if nobody has been counted yet.
    pub async fn get(&self, day: &str) -> Result<u64, StoreError> {
        let key = daily_key(day);
        match self.kv.get(&key).await? {
            Some(v) => v.parse().map_err(|_| StoreError::Corrupt { key }),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::db::kv::MemoryStore;

    #[tokio::test]
    async fn increments_are_per_day() {
        let kv = MemoryStore::new();
        let counter = DailyQuotaCounter::new(&kv, 172_800);

        assert_eq!(counter.get("2025-05-01").await.unwrap(), 0);
        assert_eq!(counter.increment("2025-05-01").await.unwrap(), 1);
        assert_eq!(counter.increment("2025-05-01").await.unwrap(), 2);
        assert_eq!(counter.increment("2025-05-02").await.unwrap(), 1);
        assert_eq!(counter.get("2025-05-01").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn counter_expires_after_two_days() {
        let kv = MemoryStore::new();
        let counter = DailyQuotaCounter::new(&kv, 172_800);
        counter.increment("2025-05-01").await.unwrap();

        let ttl = kv.ttl(&daily_key("2025-05-01")).unwrap();
        assert!(ttl > Duration::from_secs(172_700));
    }

    #[tokio::test]
    async fn get_reports_corrupt_values() {
        let kv = MemoryStore::new();
        kv.set_ex(&daily_key("2025-05-01"), "-3", 60).await.unwrap();
        let counter = DailyQuotaCounter::new(&kv, 60);
        assert!(matches!(
            counter.get("2025-05-01").await,
            Err(StoreError::Corrupt { .. })
        ));
    }
}
