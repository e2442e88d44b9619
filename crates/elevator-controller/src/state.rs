//! The single chokepoint through which an elevator's state is mutated,
//! published, and persisted — held across all three via a `tokio::sync::Mutex`
//! guard that lives through the awaits.

use std::time::{SystemTime, UNIX_EPOCH};

use elevator_broker::{Broker, PubSubBroker};
use elevator_core::{ElevatorId, Elevator, StatusSnapshot};
use elevator_store::StateStore;
use tokio::sync::Mutex;
use tracing::warn;

use crate::keys::{status_key, status_topic};

pub fn now_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
        * 1000.0
}

/// Applies `mutate` to the shared elevator under lock, then publishes the
/// resulting snapshot to the status topic and persists it to the store
/// before releasing the lock. Store/broker failures here are treated as
/// transient: logged and swallowed, never propagated — the next transition
/// republishes a more-current snapshot anyway.
pub async fn apply_and_publish<F>(
    elevator: &Mutex<Elevator>,
    store: &dyn StateStore,
    broker: &dyn Broker,
    id: ElevatorId,
    mutate: F,
) where
    F: FnOnce(&mut Elevator),
{
    let mut guard = elevator.lock().await;
    mutate(&mut guard);

    let snapshot = StatusSnapshot::new(guard.clone(), now_millis());
    let json = match serde_json::to_string(&snapshot) {
        Ok(json) => json,
        Err(err) => {
            warn!(elevator_id = %id, error = %err, "failed to serialize status snapshot");
            return;
        }
    };

    if let Err(err) = store.set(&status_key(id), json.clone()).await {
        warn!(elevator_id = %id, error = %err, "failed to persist elevator snapshot");
    }
    if let Err(err) = PubSubBroker::publish(broker, &status_topic(id), json).await {
        warn!(elevator_id = %id, error = %err, "failed to publish status notification");
    }
}
