//! Shared presence tracking for concurrency limits.
//!
//! Two kinds of keys back the registry:
//! - one session record per token holding its last-activity time (epoch ms)
//! - a single online set listing the tokens believed present
//!
//! A session is *stale* when its last activity is older than the liveness
//! window. Staleness is computed at read time; stale members are only removed
//! from the online set lazily, by [`ConcurrencyRegistry::count_active`].

use std::time::Duration;

use crate::db::kv::{KeyValueStore, StoreError};

pub const ONLINE_KEY: &str = "kiosk:online";

pub fn session_key(session_id: &str) -> String {
    format!("kiosk:session:{}", session_id)
}

pub struct ConcurrencyRegistry<'a> {
    kv: &'a dyn KeyValueStore,
    ttl_secs: u64,
}

impl<'a> ConcurrencyRegistry<'a> {
    /// `ttl_secs` applies to both session records and the online set.
    pub fn new(kv: &'a dyn KeyValueStore, ttl_secs: u64) -> Self {
        Self { kv, ttl_secs }
    }

    /// Number of online-set members active within `window` of `now_ms`.
    ///
    /// Stale or recordless members are dropped, and the online set is
    /// rewritten once if anything was dropped.
    pub async fn count_active(&self, now_ms: i64, window: Duration) -> Result<u64, StoreError> {
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        let members = self.members().await?;

        let mut active = Vec::with_capacity(members.len());
        for id in &members {
            match self.last_active(id).await? {
                Some(at) if now_ms.saturating_sub(at) < window_ms => active.push(id.clone()),
                _ => {}
            }
        }

        if active.len() != members.len() {
            tracing::debug!(
                pruned = members.len() - active.len(),
                remaining = active.len(),
                "pruning stale sessions from online set"
            );
            self.persist(&active).await?;
        }

        Ok(active.len() as u64)
    }

    /// Record activity for `session_id` at `now_ms` and make sure it is in
    /// the online set.
    pub async fn touch(&self, session_id: &str, now_ms: i64) -> Result<(), StoreError> {
        self.kv
            .set_ex(&session_key(session_id), &now_ms.to_string(), self.ttl_secs)
            .await?;
        self.add_member(session_id).await
    }

    pub async fn add_member(&self, session_id: &str) -> Result<(), StoreError> {
        let mut members = self.members().await?;
        if members.iter().any(|m| m == session_id) {
            return Ok(());
        }
        members.push(session_id.to_string());
        self.persist(&members).await
    }

    pub async fn remove_member(&self, session_id: &str) -> Result<(), StoreError> {
        let mut members = self.members().await?;
        let before = members.len();
        members.retain(|m| m != session_id);
        if members.len() == before {
            return Ok(());
        }
        self.persist(&members).await
    }

    /// Last-activity time of `session_id`, `None` if the record is gone.
    ///
    /// An unreadable timestamp is treated like a missing record so it gets
    /// pruned instead of wedging the count.
    pub async fn last_active(&self, session_id: &str) -> Result<Option<i64>, StoreError> {
        let key = session_key(session_id);
        Ok(match self.kv.get(&key).await? {
            Some(raw) => match raw.parse() {
                Ok(at) => Some(at),
                Err(_) => {
                    tracing::warn!(%key, "ignoring unreadable session timestamp");
                    None
                }
            },
            None => None,
        })
    }

    async fn members(&self) -> Result<Vec<String>, StoreError> {
        match self.kv.get(ONLINE_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!(key = ONLINE_KEY, %err, "discarding unreadable online set");
                Vec::new()
            })),
            None => Ok(Vec::new()),
        }
    }

    async fn persist(&self, members: &[String]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(members).map_err(|_| StoreError::Corrupt {
            key: ONLINE_KEY.to_string(),
        })?;
        self.kv.set_ex(ONLINE_KEY, &raw, self.ttl_secs).await
    }
}
