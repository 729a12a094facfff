//! Admission control and presence tracking on top of the shared store.
//!
//! Request handlers share no memory; everything here coordinates through
//! [`KeyValueStore`](crate::db::kv::KeyValueStore) keys with TTLs.

pub mod counter;
pub mod engine;
pub mod identity;
pub mod presence;
pub mod registry;

pub use engine::{AdmissionEngine, Decision, DenialReason};
pub use identity::ClientIdentity;
pub use presence::{Presence, PresenceError};
