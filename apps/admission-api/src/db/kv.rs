use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

/// Reasons the shared store could not serve a request.
///
/// These are distinct from "key absent", which is `Ok(None)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("shared store is not configured")]
    Unconfigured,

    #[error("shared store is misconfigured: {0}")]
    Misconfigured(String),

    #[error("shared store unreachable: {0}")]
    Unreachable(String),

    #[error("shared store timed out during {op}")]
    Timeout { op: &'static str },

    #[error("corrupt value under key {key}")]
    Corrupt { key: String },
}

/// Abstraction over the key-value store shared by every request handler.
///
/// Backed by Redis in production, an in-memory map in tests, and a no-op
/// variant when no store is configured.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reports whether the store can serve requests at all.
    async fn check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError>;
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn del(&self, key: &str) -> Result<(), StoreError>;

    /// Increments the integer under `key` and returns the new value, setting
    /// the key's TTL to `ttl_secs`.
    ///
    /// Best-effort: the default read-modify-write may undercount when several
    /// handlers increment the same key at once. Stores with a native atomic
    /// increment override this without changing the contract.
    async fn incr_ex(&self, key: &str, ttl_secs: u64) -> Result<u64, StoreError> {
        let current = match self.get(key).await? {
            Some(v) => v.parse::<u64>().map_err(|_| StoreError::Corrupt {
                key: key.to_string(),
            })?,
            None => 0,
        };
        let next = current + 1;
        self.set_ex(key, &next.to_string(), ttl_secs).await?;
        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation (tests and single-instance demos)
// ---------------------------------------------------------------------------

struct Entry {
    value: String,
    expires_at: Instant,
}

pub struct MemoryStore {
    data: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }

    /// Remaining lifetime of `key`, if it exists and has not expired.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let data = self.data.lock();
        let entry = data.get(key)?;
        entry.expires_at.checked_duration_since(Instant::now())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        self.data.lock().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + Duration::from_secs(ttl_secs),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut data = self.data.lock();
        let expired = match data.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Ok(Some(entry.value.clone()))
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            data.remove(key);
        }
        Ok(None)
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        self.data.lock().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// No-op implementation (store absent or unusable)
// ---------------------------------------------------------------------------

/// Stand-in used when no shared store is available.
///
/// Reads report "absent" and writes succeed without effect, while `check`
/// reports why the store is unavailable so callers can pick their failure
/// policy.
pub struct NoopStore {
    reason: StoreError,
}

impl NoopStore {
    pub fn unconfigured() -> Self {
        Self {
            reason: StoreError::Unconfigured,
        }
    }

    pub fn misconfigured(detail: impl Into<String>) -> Self {
        Self::with_reason(StoreError::Misconfigured(detail.into()))
    }

    pub fn with_reason(reason: StoreError) -> Self {
        Self { reason }
    }
}

#[async_trait]
impl KeyValueStore for NoopStore {
    async fn check(&self) -> Result<(), StoreError> {
        Err(self.reason.clone())
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    async fn del(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips_and_deletes() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set_ex("k", "v", 60).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        store.del("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);

        // Deleting a missing key is fine.
        store.del("k").await.unwrap();
    }

    #[tokio::test]
    async fn memory_store_expires_entries() {
        let store = MemoryStore::new();
        store.set_ex("gone", "v", 0).await.unwrap();
        assert_eq!(store.get("gone").await.unwrap(), None);
        assert!(store.ttl("gone").is_none());
    }

    #[tokio::test]
    async fn default_incr_counts_up_and_sets_ttl() {
        let store = MemoryStore::new();
        assert_eq!(store.incr_ex("c", 120).await.unwrap(), 1);
        assert_eq!(store.incr_ex("c", 120).await.unwrap(), 2);
        assert_eq!(store.get("c").await.unwrap().as_deref(), Some("2"));

        let ttl = store.ttl("c").unwrap();
        assert!(ttl > Duration::from_secs(110) && ttl <= Duration::from_secs(120));
    }

    #[tokio::test]
    async fn default_incr_rejects_non_numeric_values() {
        let store = MemoryStore::new();
        store.set_ex("c", "many", 60).await.unwrap();
        assert_eq!(
            store.incr_ex("c", 60).await,
            Err(StoreError::Corrupt {
                key: "c".to_string()
            })
        );
    }

    #[tokio::test]
    async fn noop_store_reports_reason_but_never_fails_operations() {
        let store = NoopStore::unconfigured();
        assert_eq!(store.check().await, Err(StoreError::Unconfigured));
        store.set_ex("k", "v", 60).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        store.del("k").await.unwrap();

        let store = NoopStore::misconfigured("bad url");
        assert_eq!(
            store.check().await,
            Err(StoreError::Misconfigured("bad url".to_string()))
        );
    }
}
