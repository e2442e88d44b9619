//! Redis-backed `StateStore`, using the Tokio multiplexed connection so one
//! client instance can be shared across every controller task and the
//! scheduler without a connection pool.

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::instrument;

use crate::error::StoreError;
use crate::StateStore;

#[derive(Clone)]
pub struct RedisStateStore {
    client: redis::Client,
    conn: redis::aio::ConnectionManager,
}

impl RedisStateStore {
    pub async fn connect(redis_url: impl AsRef<str>) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { client, conn })
    }
}

impl std::fmt::Debug for RedisStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStateStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    #[instrument(skip(self), fields(key = %key))]
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    #[instrument(skip(self, value), fields(key = %key))]
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        // ConnectionManager has no explicit close; dropping the last clone
        // tears the connection down. Nothing to do here beyond letting the
        // caller drop its handle.
        let _ = &self.client;
        Ok(())
    }
}
