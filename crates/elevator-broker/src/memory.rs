//! In-memory broker used by tests and by a `--no-redis` dev mode. Emulates
//! Redis Streams consumer-group semantics (pending list, `">"` vs replay
//! reads) closely enough to exercise restart-recovery scenarios without a
//! live Redis instance.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::error::BrokerError;
use crate::pubsub::{PubSubBroker, PubSubMessage, PubSubSubscription};
use crate::stream::{GroupStart, ReadFrom, StreamBroker, StreamEntry, StreamId, TrimSpec};

#[derive(Default)]
struct GroupState {
    /// Index into `entries` of the next entry this group has never
    /// delivered to anyone.
    next_index: usize,
    /// consumer name -> ids currently delivered-but-unacked, in delivery
    /// order.
    pending: HashMap<String, Vec<StreamId>>,
}

#[derive(Default)]
struct StreamLog {
    entries: Vec<StreamEntry>,
    groups: HashMap<String, GroupState>,
}

#[derive(Default)]
struct StreamState {
    streams: Mutex<HashMap<String, StreamLog>>,
    seq: AtomicU64,
}

impl StreamState {
    fn next_id(&self) -> StreamId {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        format!("{millis:020}-{seq}")
    }
}

/// In-memory implementation of both broker primitives.
#[derive(Default)]
pub struct InMemoryBroker {
    streams: StreamState,
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StreamBroker for InMemoryBroker {
    async fn publish(
        &self,
        stream: &str,
        fields: HashMap<String, String>,
    ) -> Result<StreamId, BrokerError> {
        let id = self.streams.next_id();
        let mut streams = self.streams.streams.lock().unwrap();
        let log = streams.entry(stream.to_string()).or_default();
        log.entries.push(StreamEntry {
            id: id.clone(),
            fields,
        });
        Ok(id)
    }

    async fn create_group(
        &self,
        stream: &str,
        group: &str,
        start: GroupStart,
    ) -> Result<(), BrokerError> {
        let mut streams = self.streams.streams.lock().unwrap();
        let log = streams.entry(stream.to_string()).or_default();
        if log.groups.contains_key(group) {
            return Ok(());
        }
        let next_index = match start {
            GroupStart::Beginning => 0,
            GroupStart::New => log.entries.len(),
            GroupStart::Id(_) => 0,
        };
        log.groups.insert(group.to_string(), GroupState {
            next_index,
            pending: HashMap::new(),
        });
        Ok(())
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
        match from {
            ReadFrom::Pending(_) => {
                let streams = self.streams.streams.lock().unwrap();
                let log = streams
                    .get(stream)
                    .ok_or_else(|| BrokerError::Command(format!("unknown stream: {stream}")))?;
                let state = log
                    .groups
                    .get(group)
                    .ok_or_else(|| BrokerError::Command(format!("unknown group: {group}")))?;
                let Some(ids) = state.pending.get(consumer) else {
                    return Ok(vec![]);
                };
                let by_id: HashMap<&str, &StreamEntry> =
                    log.entries.iter().map(|e| (e.id.as_str(), e)).collect();
                Ok(ids
                    .iter()
                    .take(count)
                    .filter_map(|id| by_id.get(id.as_str()).map(|e| (*e).clone()))
                    .collect())
            }
            ReadFrom::Undelivered => {
                // Poll until something is available or block_ms elapses, so
                // shutdown stays observable within one block cycle and we
                // never block longer than asked.
                let deadline = tokio::time::Instant::now() + Duration::from_millis(block_ms);
                loop {
                    {
                        let mut streams = self.streams.streams.lock().unwrap();
                        let log = streams
                            .entry(stream.to_string())
                            .or_default();
                        let state = log.groups.entry(group.to_string()).or_default();
                        if state.next_index < log.entries.len() {
                            let end = (state.next_index + count).min(log.entries.len());
                            let batch: Vec<StreamEntry> =
                                log.entries[state.next_index..end].to_vec();
                            state.next_index = end;
                            let consumer_pending =
                                state.pending.entry(consumer.to_string()).or_default();
                            consumer_pending.extend(batch.iter().map(|e| e.id.clone()));
                            return Ok(batch);
                        }
                    }
                    if tokio::time::Instant::now() >= deadline {
                        return Ok(vec![]);
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            }
        }
    }

    async fn ack(&self, stream: &str, group: &str, ids: &[StreamId]) -> Result<u64, BrokerError> {
        let mut streams = self.streams.streams.lock().unwrap();
        let Some(log) = streams.get_mut(stream) else {
            return Ok(0);
        };
        let Some(state) = log.groups.get_mut(group) else {
            return Ok(0);
        };
        let mut acked = 0;
        for ids_for_consumer in state.pending.values_mut() {
            let before = ids_for_consumer.len();
            ids_for_consumer.retain(|id| !ids.contains(id));
            acked += (before - ids_for_consumer.len()) as u64;
        }
        Ok(acked)
    }

    async fn range(
        &self,
        stream: &str,
        lo: &str,
        hi: &str,
    ) -> Result<Vec<StreamEntry>, BrokerError> {
        let streams = self.streams.streams.lock().unwrap();
        let Some(log) = streams.get(stream) else {
            return Ok(vec![]);
        };
        Ok(log
            .entries
            .iter()
            .filter(|e| {
                (lo == "-" || e.id.as_str() >= lo) && (hi == "+" || e.id.as_str() <= hi)
            })
            .cloned()
            .collect())
    }

    async fn trim(
        &self,
        stream: &str,
        spec: TrimSpec,
        _approximate: bool,
    ) -> Result<(), BrokerError> {
        let mut streams = self.streams.streams.lock().unwrap();
        let Some(log) = streams.get_mut(stream) else {
            return Ok(());
        };
        match spec {
            TrimSpec::MinId(min_id) => {
                log.entries.retain(|e| e.id >= min_id);
            }
            TrimSpec::MaxLen(max_len) => {
                if log.entries.len() > max_len {
                    let drop = log.entries.len() - max_len;
                    log.entries.drain(0..drop);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PubSubBroker for InMemoryBroker {
    async fn publish(&self, channel: &str, payload: String) -> Result<(), BrokerError> {
        let channels = self.channels.lock().unwrap();
        if let Some(sender) = channels.get(channel) {
            // No subscribers is not an error: fire-and-forget.
            let _ = sender.send(payload);
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<PubSubSubscription, BrokerError> {
        let broadcast_rx = {
            let mut channels = self.channels.lock().unwrap();
            let sender = channels
                .entry(channel.to_string())
                .or_insert_with(|| broadcast::channel(1024).0);
            sender.subscribe()
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(PubSubMessage::Subscribed {
            channel: channel.to_string(),
        });

        let channel_name = channel.to_string();
        tokio::spawn(async move {
            let mut broadcast_rx = broadcast_rx;
            loop {
                match broadcast_rx.recv().await {
                    Ok(payload) => {
                        if tx
                            .send(PubSubMessage::Message {
                                channel: channel_name.clone(),
                                data: payload,
                            })
                            .is_err()
                        {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });

        Ok(PubSubSubscription::new(rx))
    }

    async fn unsubscribe(&self, _channel: &str) -> Result<(), BrokerError> {
        // The subscription task exits when its receiver (held by the
        // caller) is dropped; nothing to do centrally.
        Ok(())
    }

    async fn close(&self) -> Result<(), BrokerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_then_range_sees_entry() {
        let broker = InMemoryBroker::new();
        let mut fields = HashMap::new();
        fields.insert("a".to_string(), "1".to_string());
        let id = StreamBroker::publish(&broker, "s", fields).await.unwrap();
        let entries = broker.range("s", "-", "+").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, id);
    }

    #[tokio::test]
    async fn unacked_entries_are_redelivered_on_pending_pass() {
        let broker = InMemoryBroker::new();
        broker
            .create_group("s", "g", GroupStart::Beginning)
            .await
            .unwrap();
        let mut fields = HashMap::new();
        fields.insert("a".to_string(), "1".to_string());
        StreamBroker::publish(&broker, "s", fields).await.unwrap();

        let delivered = broker
            .read_group("s", "g", "c1", 10, 50, ReadFrom::Undelivered)
            .await
            .unwrap();
        assert_eq!(delivered.len(), 1);

        // never acked: a "0" pass for the same consumer must see it again.
        let replayed = broker
            .read_group(
                "s",
                "g",
                "c1",
                10,
                50,
                ReadFrom::Pending("0".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(replayed.len(), 1);
        assert_eq!(replayed[0].id, delivered[0].id);
    }

    #[tokio::test]
    async fn ack_removes_from_pending() {
        let broker = InMemoryBroker::new();
        broker
            .create_group("s", "g", GroupStart::Beginning)
            .await
            .unwrap();
        let mut fields = HashMap::new();
        fields.insert("a".to_string(), "1".to_string());
        StreamBroker::publish(&broker, "s", fields).await.unwrap();

        let delivered = broker
            .read_group("s", "g", "c1", 10, 50, ReadFrom::Undelivered)
            .await
            .unwrap();
        let ids: Vec<StreamId> = delivered.iter().map(|e| e.id.clone()).collect();
        let acked = broker.ack("s", "g", &ids).await.unwrap();
        assert_eq!(acked, 1);

        let replayed = broker
            .read_group(
                "s",
                "g",
                "c1",
                10,
                50,
                ReadFrom::Pending("0".to_string()),
            )
            .await
            .unwrap();
        assert!(replayed.is_empty());
    }

    #[tokio::test]
    async fn create_group_is_idempotent() {
        let broker = InMemoryBroker::new();
        broker
            .create_group("s", "g", GroupStart::Beginning)
            .await
            .unwrap();
        broker
            .create_group("s", "g", GroupStart::New)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn pubsub_ignores_no_subscribers() {
        let broker = InMemoryBroker::new();
        PubSubBroker::publish(&broker, "ch", "hi".to_string())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn pubsub_first_message_is_subscription_confirmation() {
        let broker = InMemoryBroker::new();
        let mut sub = broker.subscribe("ch").await.unwrap();
        match sub.recv().await {
            Some(PubSubMessage::Subscribed { channel }) => assert_eq!(channel, "ch"),
            other => panic!("expected subscription confirmation, got {other:?}"),
        }
        PubSubBroker::publish(&broker, "ch", "hello".to_string())
            .await
            .unwrap();
        match sub.recv().await {
            Some(PubSubMessage::Message { data, .. }) => assert_eq!(data, "hello"),
            other => panic!("expected message, got {other:?}"),
        }
    }
}
