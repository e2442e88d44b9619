//! Broker adapter: durable consumer-group streams plus ephemeral pub/sub,
//! over either a real Redis instance or an in-memory double.

mod error;
mod memory;
mod pubsub;
mod redis_broker;
mod redis_pubsub;
mod redis_stream;
mod retry;
mod stream;

pub use error::BrokerError;
pub use memory::InMemoryBroker;
pub use pubsub::{PubSubBroker, PubSubMessage, PubSubSubscription};
pub use redis_broker::RedisBroker;
pub use redis_pubsub::RedisPubSubBroker;
pub use redis_stream::RedisStreamBroker;
pub use retry::{with_retry, RetryPolicy};
pub use stream::{GroupStart, ReadFrom, StreamBroker, StreamEntry, StreamId, TrimSpec};

/// Combines both broker primitives: every consumer of the broker adapter
/// needs streams for requests/commands and pub/sub for status, so this is
/// the bound controllers and the scheduler actually depend on.
pub trait Broker: StreamBroker + PubSubBroker {}
impl<T: StreamBroker + PubSubBroker> Broker for T {}
