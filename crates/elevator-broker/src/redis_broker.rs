//! Combines the streams and pub/sub adapters behind one connection setup:
//! both are facets of a single broker backed by the same Redis instance.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::BrokerError;
use crate::pubsub::{PubSubBroker, PubSubSubscription};
use crate::redis_pubsub::RedisPubSubBroker;
use crate::redis_stream::RedisStreamBroker;
use crate::stream::{GroupStart, ReadFrom, StreamBroker, StreamEntry, StreamId, TrimSpec};

#[derive(Clone)]
pub struct RedisBroker {
    stream: RedisStreamBroker,
    pubsub: RedisPubSubBroker,
}

impl RedisBroker {
    #[instrument(skip(redis_url))]
    pub async fn connect(redis_url: &str) -> Result<Self, BrokerError> {
        let client = redis::Client::open(redis_url).map_err(BrokerError::from)?;
        let conn = redis::aio::ConnectionManager::new(client.clone())
            .await
            .map_err(BrokerError::from)?;
        Ok(Self {
            stream: RedisStreamBroker::new(conn.clone()),
            pubsub: RedisPubSubBroker::new(client, conn),
        })
    }
}

#[async_trait]
impl StreamBroker for RedisBroker {
    async fn publish(
        &self,
        stream: &str,
        fields: HashMap<String, String>,
    ) -> Result<StreamId, BrokerError> {
        self.stream.publish(stream, fields).await
    }

    async fn create_group(
        &self,
        stream: &str,
        group: &str,
        start: GroupStart,
    ) -> Result<(), BrokerError> {
        self.stream.create_group(stream, group, start).await
    }

    async fn read_group(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        count: usize,
        block_ms: u64,
        from: ReadFrom,
    ) -> Result<Vec<StreamEntry>, BrokerError> {
        self.stream
            .read_group(stream, group, consumer, count, block_ms, from)
            .await
    }

    async fn ack(&self, stream: &str, group: &str, ids: &[StreamId]) -> Result<u64, BrokerError> {
        self.stream.ack(stream, group, ids).await
    }

    async fn range(
        &self,
        stream: &str,
        lo: &str,
        hi: &str,
    ) -> Result<Vec<StreamEntry>, BrokerError> {
        self.stream.range(stream, lo, hi).await
    }

    async fn trim(
        &self,
        stream: &str,
        spec: TrimSpec,
        approximate: bool,
    ) -> Result<(), BrokerError> {
        self.stream.trim(stream, spec, approximate).await
    }
}

#[async_trait]
impl PubSubBroker for RedisBroker {
    async fn publish(&self, channel: &str, payload: String) -> Result<(), BrokerError> {
        PubSubBroker::publish(&self.pubsub, channel, payload).await
    }

    async fn subscribe(&self, channel: &str) -> Result<PubSubSubscription, BrokerError> {
        self.pubsub.subscribe(channel).await
    }

    async fn unsubscribe(&self, channel: &str) -> Result<(), BrokerError> {
        self.pubsub.unsubscribe(channel).await
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.pubsub.close().await
    }
}
