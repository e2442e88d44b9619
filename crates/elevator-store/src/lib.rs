//! State store adapter: key/value `get`/`set`/`exists`/`delete` over a
//! backing store, JSON-encoded values.

mod error;
mod memory;
mod redis_store;

pub use error::StoreError;
pub use memory::InMemoryStateStore;
pub use redis_store::RedisStateStore;

use async_trait::async_trait;

/// Key/value state store. Values are opaque JSON strings — callers
/// serialize/deserialize their own types; the adapter guarantees no partial
/// writes (single-key atomicity from the backing store) and is safe to call
/// from multiple tasks concurrently.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    async fn close(&self) -> Result<(), StoreError>;
}
