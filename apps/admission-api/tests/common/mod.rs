use std::sync::Arc;

use axum::Router;
use chrono::Utc;
use http::HeaderValue;

use admission_api::config::Config;
use admission_api::db::kv::{KeyValueStore, MemoryStore};
use admission_api::AppState;

/// Build the full application [`Router`] over a fresh in-memory store.
///
/// The store is returned too so tests can inspect or seed shared state.
pub fn test_app(config: Config) -> (Router, AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let (app, state) = test_app_with_store(config, store.clone());
    (app, state, store)
}

/// Build the application over an arbitrary store implementation.
pub fn test_app_with_store(config: Config, kv: Arc<dyn KeyValueStore>) -> (Router, AppState) {
    let state = AppState {
        kv,
        config: Arc::new(config),
    };
    let app = admission_api::routes::router().with_state(state.clone());
    (app, state)
}

/// Config with the given limits and defaults elsewhere.
pub fn limits(daily_limit: u64, concurrency_limit: u64) -> Config {
    Config {
        daily_limit,
        concurrency_limit,
        ..Config::default()
    }
}

/// Today's day label as the server computes it.
pub fn today(config: &Config) -> String {
    kiosk_common::local_day(Utc::now(), config.utc_offset)
}

/// A `Cookie` request header carrying the given pairs.
pub fn cookie_header(pairs: &[(&str, &str)]) -> HeaderValue {
    let raw = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("; ");
    HeaderValue::from_str(&raw).expect("valid cookie header")
}
