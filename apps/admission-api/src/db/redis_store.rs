//! Redis-backed [`KeyValueStore`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::OnceCell;

use super::kv::{KeyValueStore, StoreError};

/// Shared store talking to Redis through a lazily established
/// [`ConnectionManager`].
///
/// Every round trip is bounded by `timeout`; a timeout is reported as
/// [`StoreError::Timeout`].
pub struct RedisStore {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
    timeout: Duration,
}

impl RedisStore {
    /// Parse the connection URL. No connection is made until first use, so a
    /// Redis that is down at startup is picked up once it comes back.
    pub fn open(url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::Misconfigured(e.to_string()))?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
            timeout,
        })
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = redis::RedisResult<T>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::warn!(op, error = %e, "redis command failed");
                Err(StoreError::Unreachable(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(op, timeout_ms = self.timeout.as_millis() as u64, "redis command timed out");
                Err(StoreError::Timeout { op })
            }
        }
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let conn = self
            .bounded(
                "connect",
                self.conn
                    .get_or_try_init(|| ConnectionManager::new(self.client.clone())),
            )
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn check(&self) -> Result<(), StoreError> {
        self.connection().await.map(|_| ())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        self.bounded("set_ex", conn.set_ex::<_, _, ()>(key, value, ttl_secs))
            .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        self.bounded("get", conn.get::<_, Option<String>>(key)).await
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        self.bounded("del", conn.del::<_, ()>(key)).await
    }

    /// Native `INCR` + `EXPIRE` in one MULTI block. Still documented as
    /// best-effort so callers never rely on more than the trait promises.
    async fn incr_ex(&self, key: &str, ttl_secs: u64) -> Result<u64, StoreError> {
        let mut conn = self.connection().await?;
        let mut pipe = redis::pipe();
        pipe.atomic()
            .incr(key, 1u64)
            .expire(key, ttl_secs as i64)
            .ignore();
        let (total,): (u64,) = self.bounded("incr_ex", pipe.query_async(&mut conn)).await?;
        Ok(total)
    }
}
