//! Admission decisions.
//!
//! Checks run in a fixed order:
//! 1. once-per-day (client cookie, no store access)
//! 2. concurrency limit (before the counter, so refusals don't inflate it)
//! 3. daily limit (first visit of the day increments, later visits only read)
//!
//! then a session is issued, registered as present, and the client's cookie
//! state is locked in for the day.
//!
//! Store failures fail open: the client is admitted with zeroed counters and
//! a warning. Both limits are soft caps; racing admissions at the boundary
//! may overshoot.

use chrono::{DateTime, Utc};
use kiosk_common::{local_day, session_token};

use super::counter::{daily_key, DailyQuotaCounter};
use super::identity::ClientIdentity;
use super::registry::{session_key, ConcurrencyRegistry, ONLINE_KEY};
use crate::config::Config;
use crate::db::kv::{KeyValueStore, StoreError};

pub const FAIL_OPEN_WARNING: &str =
    "Admission control is temporarily unavailable; entry was allowed without limits.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    OncePerDay,
    ConcurrencyLimit,
    DailyLimit,
}

impl DenialReason {
    pub fn code(self) -> &'static str {
        match self {
            Self::OncePerDay => "ONCE_PER_DAY",
            Self::ConcurrencyLimit => "CONCURRENCY_LIMIT",
            Self::DailyLimit => "DAILY_LIMIT",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::OncePerDay => {
                "You have already used the service today. Please come back tomorrow."
            }
            Self::ConcurrencyLimit => {
                "Too many people are using the service right now. Please try again shortly."
            }
            Self::DailyLimit => "Today's capacity has been reached. Please come back tomorrow.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub reason: DenialReason,
    pub total: Option<u64>,
    pub concurrent_users: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub total: u64,
    pub concurrent_users: u64,
    pub session_id: String,
    /// Client state to write back.
    pub identity: ClientIdentity,
    /// Set when the grant was issued without consulting the store.
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Granted(Grant),
    Denied(Denial),
}

pub struct AdmissionEngine<'a> {
    kv: &'a dyn KeyValueStore,
    config: &'a Config,
}

impl<'a> AdmissionEngine<'a> {
    pub fn new(kv: &'a dyn KeyValueStore, config: &'a Config) -> Self {
        Self { kv, config }
    }

    /// Decide whether the client may enter at `now`. Never fails; store
    /// trouble yields a warning-flagged grant.
    pub async fn attempt_enter(&self, identity: &ClientIdentity, now: DateTime<Utc>) -> Decision {
        let today = local_day(now, self.config.utc_offset);

        if identity.used_on(&today) {
            return Decision::Denied(Denial {
                reason: DenialReason::OncePerDay,
                total: None,
                concurrent_users: None,
            });
        }

        match self.admit(identity, &today, now.timestamp_millis()).await {
            Ok(decision) => decision,
            Err(err) => {
                tracing::warn!(%err, day = %today, "admission store failure, failing open");
                let session_id = identity
                    .session()
                    .map(str::to_string)
                    .unwrap_or_else(session_token);
                Decision::Granted(Grant {
                    total: 0,
                    concurrent_users: 0,
                    identity: identity.locked_in(&today, &session_id, false),
                    session_id,
                    warning: Some(FAIL_OPEN_WARNING.to_string()),
                })
            }
        }
    }

    async fn admit(
        &self,
        identity: &ClientIdentity,
        today: &str,
        now_ms: i64,
    ) -> Result<Decision, StoreError> {
        self.kv.check().await?;

        let registry = ConcurrencyRegistry::new(self.kv, self.config.session_ttl_secs);
        let counter = DailyQuotaCounter::new(self.kv, self.config.counter_ttl_secs);

        let concurrent_users = registry
            .count_active(now_ms, self.config.liveness_window)
            .await
            .inspect_err(|err| tracing::warn!(op = "count_active", key = ONLINE_KEY, %err))?;
        if concurrent_users >= self.config.concurrency_limit {
            tracing::info!(
                concurrent_users,
                limit = self.config.concurrency_limit,
                "admission denied: concurrency"
            );
            return Ok(Decision::Denied(Denial {
                reason: DenialReason::ConcurrencyLimit,
                total: None,
                concurrent_users: Some(concurrent_users),
            }));
        }

        let first_visit = !identity.visited_on(today);
        let (op, counted) = if first_visit {
            ("increment", counter.increment(today).await)
        } else {
            ("get", counter.get(today).await)
        };
        let total =
            counted.inspect_err(|err| tracing::warn!(op, key = %daily_key(today), %err))?;
        if total > self.config.daily_limit {
            tracing::info!(total, limit = self.config.daily_limit, "admission denied: daily limit");
            return Ok(Decision::Denied(Denial {
                reason: DenialReason::DailyLimit,
                total: Some(total),
                concurrent_users: None,
            }));
        }

        let session_id = identity
            .session()
            .map(str::to_string)
            .unwrap_or_else(session_token);
        registry
            .touch(&session_id, now_ms)
            .await
            .inspect_err(|err| {
                tracing::warn!(op = "touch", key = %session_key(&session_id), %err)
            })?;

        tracing::info!(total, concurrent_users, first_visit, "admission granted");

        Ok(Decision::Granted(Grant {
            total,
            concurrent_users,
            identity: identity.locked_in(today, &session_id, first_visit),
            session_id,
            warning: None,
        }))
    }
}
