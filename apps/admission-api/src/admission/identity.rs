//! Client-held admission state.
//!
//! Carried in cookies and never authoritative for the limits themselves. The
//! once-per-day rule relies on `used_today` alone, so a client that clears its
//! cookies can enter again the same day.

/// Cookie names shared by the HTTP layer.
pub mod cookie {
    pub const VISITED_DATE: &str = "visited_date";
    pub const USED_TODAY: &str = "used_today";
    pub const SESSION_ID: &str = "session_id";
}

/// Immutable snapshot of the client's cookies, handed to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Day this client last contributed to the daily counter.
    pub visited_date: Option<String>,
    /// Day this client was last granted its once-per-day entry.
    pub used_today: Option<String>,
    pub session_id: Option<String>,
}

impl ClientIdentity {
    pub fn used_on(&self, day: &str) -> bool {
        self.used_today.as_deref() == Some(day)
    }

    pub fn visited_on(&self, day: &str) -> bool {
        self.visited_date.as_deref() == Some(day)
    }

    /// The session token to reuse, if the client sent a non-empty one.
    pub fn session(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|s| !s.is_empty())
    }

    /// State to hand back after a grant: today's entry is consumed, and the
    /// visit is recorded when it was counted.
    pub fn locked_in(&self, day: &str, session_id: &str, counted: bool) -> Self {
        Self {
            visited_date: if counted {
                Some(day.to_string())
            } else {
                self.visited_date.clone()
            },
            used_today: Some(day.to_string()),
            session_id: Some(session_id.to_string()),
        }
    }
}
