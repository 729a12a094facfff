pub mod admission;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;

use std::sync::Arc;

use config::Config;
use db::kv::KeyValueStore;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub kv: Arc<dyn KeyValueStore>,
    pub config: Arc<Config>,
}
