pub mod kv;
pub mod redis_store;

use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use kv::{KeyValueStore, MemoryStore, NoopStore};

/// Build the shared store described by `config`.
///
/// Never fails: a missing or unusable Redis configuration yields a
/// [`NoopStore`] that reports why it is unavailable.
pub fn connect(config: &Config) -> Arc<dyn KeyValueStore> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("using in-process memory store; limits are not shared across instances");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Redis => match config.redis_url.as_deref() {
            None => {
                tracing::warn!("REDIS_URL not set; admission control disabled (fail-open)");
                Arc::new(NoopStore::unconfigured())
            }
            Some(url) => match redis_store::RedisStore::open(url, config.store_timeout) {
                Ok(store) => {
                    tracing::info!("redis store configured");
                    Arc::new(store)
                }
                Err(err) => {
                    tracing::error!(%err, "invalid REDIS_URL; admission control disabled (fail-open)");
                    Arc::new(NoopStore::with_reason(err))
                }
            },
        },
    }
}
