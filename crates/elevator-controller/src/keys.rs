//! Key/topic naming conventions.

use elevator_core::ElevatorId;

pub fn status_key(id: ElevatorId) -> String {
    format!("elevator:status:{id}")
}

pub fn commands_topic(id: ElevatorId) -> String {
    format!("elevator:commands:{id}")
}

pub fn status_topic(id: ElevatorId) -> String {
    format!("elevator:status:{id}")
}
