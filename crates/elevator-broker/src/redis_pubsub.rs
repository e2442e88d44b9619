//! Redis Pub/Sub-backed `PubSubBroker`, adapted from the synchronous
//! listener-thread draft the corpus carries for this purpose. Each
//! subscription opens its own dedicated connection, since Redis multiplexes
//! a pubsub connection differently from a command connection.

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::AsyncCommands;
use tokio::sync::mpsc;
use tracing::instrument;

use crate::error::BrokerError;
use crate::pubsub::{PubSubBroker, PubSubMessage, PubSubSubscription};

#[derive(Clone)]
pub struct RedisPubSubBroker {
    client: redis::Client,
    publish_conn: redis::aio::ConnectionManager,
}

impl RedisPubSubBroker {
    pub fn new(client: redis::Client, publish_conn: redis::aio::ConnectionManager) -> Self {
        Self {
            client,
            publish_conn,
        }
    }
}

#[async_trait]
impl PubSubBroker for RedisPubSubBroker {
    #[instrument(skip(self, payload), fields(channel = %channel))]
    async fn publish(&self, channel: &str, payload: String) -> Result<(), BrokerError> {
        let mut conn = self.publish_conn.clone();
        let _subscribers_reached: i64 = conn.publish(channel, payload).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(channel = %channel))]
    async fn subscribe(&self, channel: &str) -> Result<PubSubSubscription, BrokerError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(BrokerError::from)?;
        pubsub.subscribe(channel).await.map_err(BrokerError::from)?;

        let (tx, rx) = mpsc::unbounded_channel();
        // Redis's own first reply to SUBSCRIBE is a subscription
        // confirmation frame, consumed by the client library itself rather
        // than surfaced as a message — we synthesize the same shape here so
        // callers see identical behavior whether running against Redis or
        // the in-memory broker.
        let _ = tx.send(PubSubMessage::Subscribed {
            channel: channel.to_string(),
        });

        let channel_name = channel.to_string();
        tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                let data: String = match msg.get_payload() {
                    Ok(data) => data,
                    Err(_) => continue,
                };
                if tx
                    .send(PubSubMessage::Message {
                        channel: channel_name.clone(),
                        data,
                    })
                    .is_err()
                {
                    return;
                }
            }
        });

        Ok(PubSubSubscription::new(rx))
    }

    async fn unsubscribe(&self, _channel: &str) -> Result<(), BrokerError> {
        // The subscription task owns its own dedicated connection and exits
        // (dropping it, which unsubscribes server-side) once the caller
        // drops its `PubSubSubscription`.
        Ok(())
    }

    async fn close(&self) -> Result<(), BrokerError> {
        Ok(())
    }
}
