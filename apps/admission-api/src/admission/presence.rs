//! Heartbeat and explicit teardown of admitted sessions.
//!
//! Unlike admission, these paths do not fail open: an unrefreshed or
//! unreleased session has no safe default, so store errors reach the caller.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::registry::{session_key, ConcurrencyRegistry};
use crate::config::Config;
use crate::db::kv::{KeyValueStore, StoreError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PresenceError {
    #[error("no session to refresh")]
    NoSession,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Presence<'a> {
    kv: &'a dyn KeyValueStore,
    registry: ConcurrencyRegistry<'a>,
}

impl<'a> Presence<'a> {
    pub fn new(kv: &'a dyn KeyValueStore, config: &Config) -> Self {
        Self {
            kv,
            registry: ConcurrencyRegistry::new(kv, config.session_ttl_secs),
        }
    }

    /// Renew `session_id`'s liveness. Returns the timestamp recorded (epoch ms).
    pub async fn beat(&self, session_id: &str, now: DateTime<Utc>) -> Result<i64, PresenceError> {
        if session_id.is_empty() {
            return Err(PresenceError::NoSession);
        }
        self.kv.check().await?;

        let now_ms = now.timestamp_millis();
        self.registry.touch(session_id, now_ms).await.map_err(|err| {
            tracing::warn!(op = "heartbeat", key = %session_key(session_id), %err);
            err
        })?;
        tracing::debug!(session_id, "heartbeat");
        Ok(now_ms)
    }

    /// Release `session_id`. Empty ids, unknown ids and repeated calls all
    /// succeed.
    pub async fn leave(&self, session_id: &str) -> Result<(), PresenceError> {
        if session_id.is_empty() {
            return Ok(());
        }
        self.kv.check().await?;

        let key = session_key(session_id);
        self.kv.del(&key).await.map_err(|err| {
            tracing::warn!(op = "leave", %key, %err);
            err
        })?;
        self.registry.remove_member(session_id).await?;
        tracing::debug!(session_id, "session released");
        Ok(())
    }
}
