//! Ephemeral publish/subscribe topics: fire-and-forget, no persistence, no
//! delivery guarantees.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::BrokerError;

/// A message delivered to a subscriber. The first message after subscribing
/// is always `Subscribed`; listeners must ignore it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PubSubMessage {
    Subscribed { channel: String },
    Message { channel: String, data: String },
}

/// A live subscription: a lazy sequence of `PubSubMessage`s.
pub struct PubSubSubscription {
    receiver: mpsc::UnboundedReceiver<PubSubMessage>,
}

impl PubSubSubscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<PubSubMessage>) -> Self {
        Self { receiver }
    }

    /// Awaits the next message. Returns `None` once the channel has closed
    /// (e.g. after `unsubscribe`/`close`).
    pub async fn recv(&mut self) -> Option<PubSubMessage> {
        self.receiver.recv().await
    }
}

#[async_trait]
pub trait PubSubBroker: Send + Sync {
    /// Delivers `payload` to currently-subscribed listeners of `channel`.
    async fn publish(&self, channel: &str, payload: String) -> Result<(), BrokerError>;

    /// Begins receiving on `channel`.
    async fn subscribe(&self, channel: &str) -> Result<PubSubSubscription, BrokerError>;

    async fn unsubscribe(&self, channel: &str) -> Result<(), BrokerError>;

    async fn close(&self) -> Result<(), BrokerError>;
}
