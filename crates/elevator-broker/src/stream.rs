//! Durable, ordered streams with consumer-group semantics.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::BrokerError;

/// A server-assigned stream entry id, of the form `ms-seq`, ordered
/// lexicographically.
pub type StreamId = String;

/// One entry read back from a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: HashMap<String, String>,
}

/// Selects where a `create_group` call starts reading from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupStart {
    /// `"0"` — beginning of the stream.
    Beginning,
    /// `"$"` — only entries appended after the group is created.
    New,
    /// A specific id to replay from.
    Id(StreamId),
}

impl GroupStart {
    pub fn as_arg(&self) -> String {
        match self {
            GroupStart::Beginning => "0".to_string(),
            GroupStart::New => "$".to_string(),
            GroupStart::Id(id) => id.clone(),
        }
    }
}

/// Selects which entries `read_group` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFrom {
    /// `">"` — only entries never delivered to this group.
    Undelivered,
    /// Any other id — replay this consumer's pending backlog starting here.
    Pending(StreamId),
}

/// Exactly one of `min_id` / `maxlen` must be set, enforced by
/// `Broker::trim` returning `BadArgument` otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrimSpec {
    MinId(StreamId),
    MaxLen(usize),
}

/// Durable, ordered stream with consumer-group fan-out.
#[async_trait]
pub trait StreamBroker: Send + Sync {
    /// Appends `fields` to `stream`, returning the assigned id.
    async fn publish(
        &self,
        stream: &str,
        fields: HashMap<String, String>,
    ) -> Result<StreamId, BrokerError>;

    /// Idempotent: if the group already exists, succeeds without error.
    /// The stream is created on demand.
    async fn create_group(
        &self,
        stream: &str,
        group: &str,
        start: GroupStart,
    ) -> Result<(), BrokerError>;

    /// Returns up to `count` entries. A blocking read returns after
    /// `block_ms` with an empty result if nothing is available.
    async fn read_group(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        count: usize,
        block_ms: u64,
        from: ReadFrom,
    ) -> Result<Vec<StreamEntry>, BrokerError>;

    /// Marks entries delivered-and-processed; unacked entries are
    /// redelivered on future `ReadFrom::Pending("0")` reads by the same
    /// consumer. Returns the number of entries actually acknowledged.
    async fn ack(&self, stream: &str, group: &str, ids: &[StreamId]) -> Result<u64, BrokerError>;

    /// Inclusive scan for operator tooling.
    async fn range(
        &self,
        stream: &str,
        lo: &str,
        hi: &str,
    ) -> Result<Vec<StreamEntry>, BrokerError>;

    /// Bounded deletion. `approximate` allows the backend to trim loosely
    /// for performance; exactly one of `TrimSpec::MinId`/`MaxLen` is valid
    /// per call (enforced by the `TrimSpec` type itself).
    async fn trim(&self, stream: &str, spec: TrimSpec, approximate: bool)
        -> Result<(), BrokerError>;
}
