//! The scheduler's private read-through snapshot cache, refreshed only at
//! startup — the simpler of two possible refresh strategies; see DESIGN.md.

use std::collections::BTreeMap;
use std::sync::Mutex;

use elevator_core::{Elevator, ElevatorId, StatusSnapshot};
use elevator_store::StateStore;
use tracing::warn;

use crate::keys::status_key;

/// Advisory-only mirror of elevator snapshots, used solely for scoring. The
/// state store remains authoritative; this cache never feeds back into it.
pub struct SnapshotCache {
    snapshots: Mutex<BTreeMap<ElevatorId, Elevator>>,
}

impl SnapshotCache {
    /// Loads each elevator's snapshot (ids `1..=num_elevators`); any that
    /// are absent are initialized to the default steady state and
    /// persisted, mirroring the controller's own startup behavior so the
    /// scheduler never scores a ghost elevator.
    pub async fn load(
        store: &dyn StateStore,
        num_elevators: u32,
    ) -> Result<Self, elevator_store::StoreError> {
        let mut snapshots = BTreeMap::new();
        for raw_id in 1..=num_elevators {
            let id = ElevatorId::new(raw_id);
            let elevator = match store.get(&status_key(id)).await? {
                Some(json) => match serde_json::from_str::<StatusSnapshot>(&json) {
                    Ok(snapshot) => snapshot.elevator,
                    Err(err) => {
                        warn!(elevator_id = %id, error = %err, "snapshot cache: unreadable stored snapshot, using default");
                        Elevator::new_default(id)
                    }
                },
                None => {
                    let elevator = Elevator::new_default(id);
                    let snapshot = StatusSnapshot::new(elevator.clone(), 0.0);
                    let json = serde_json::to_string(&snapshot)
                        .expect("status snapshot is always serializable");
                    store.set(&status_key(id), json).await?;
                    elevator
                }
            };
            snapshots.insert(id, elevator);
        }
        Ok(Self {
            snapshots: Mutex::new(snapshots),
        })
    }

    pub fn snapshot(&self) -> BTreeMap<ElevatorId, Elevator> {
        self.snapshots.lock().unwrap().clone()
    }
}
