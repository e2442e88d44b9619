//! Command payload: the ephemeral, unpersisted directive the scheduler
//! publishes on an elevator's command topic.

use serde::{Deserialize, Serialize};

use crate::ids::{FloorId, RequestId};

/// The two command kinds a controller understands. Anything else is an
/// unknown command, logged and discarded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    GoToFloor,
    AddDestination,
}

/// Payload published on `elevator:commands:{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub command: CommandKind,
    pub floor: FloorId,
    pub request_id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub correlation_id: Option<String>,
}

impl Command {
    pub fn go_to_floor(floor: FloorId, request_id: RequestId) -> Self {
        Self {
            command: CommandKind::GoToFloor,
            floor,
            request_id,
            correlation_id: None,
        }
    }

    pub fn add_destination(floor: FloorId, request_id: RequestId) -> Self {
        Self {
            command: CommandKind::AddDestination,
            floor,
            request_id,
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}
