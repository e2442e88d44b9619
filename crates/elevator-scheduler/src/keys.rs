//! Stream/topic/key naming conventions.

use elevator_core::ElevatorId;

pub const REQUESTS_STREAM: &str = "elevator:requests:stream";
pub const SCHEDULER_GROUP: &str = "scheduler-group";

pub fn status_key(id: ElevatorId) -> String {
    format!("elevator:status:{id}")
}

pub fn commands_topic(id: ElevatorId) -> String {
    format!("elevator:commands:{id}")
}
