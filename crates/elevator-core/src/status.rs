//! Status snapshot: the payload published on an elevator's status topic and
//! written to the state store. The store entry is authoritative; the topic
//! message is a best-effort change notification.

use serde::{Deserialize, Serialize};

use crate::elevator::Elevator;

/// A status snapshot paired with the moment it was produced.
///
/// `timestamp` is a monotonic-enough wall-clock reading (epoch millis); it
/// exists only so subscribers can discard stale notifications, never for
/// ordering guarantees (those come from the topic/stream itself).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(flatten)]
    pub elevator: Elevator,
    pub timestamp: f64,
}

impl StatusSnapshot {
    pub fn new(elevator: Elevator, timestamp_millis: f64) -> Self {
        Self {
            elevator,
            timestamp: timestamp_millis,
        }
    }
}
