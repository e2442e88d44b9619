//! Request entity: the tagged external/internal hall-call/cabin-selection
//! variant appended to the requests stream by ingress and consumed by the
//! scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::elevator::Direction;
use crate::error::{DomainError, DomainResult};
use crate::ids::{ElevatorId, FloorId, RequestId};

/// Request lifecycle status. Never mutated after creation — nothing marks a
/// request completed after service; this field is carried for wire
/// compatibility and otherwise unused by the core.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Completed,
}

/// A hall call or cabin selection, as appended to `elevator:requests:stream`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request_type", rename_all = "snake_case")]
pub enum Request {
    External {
        id: RequestId,
        timestamp: DateTime<Utc>,
        status: RequestStatus,
        floor: FloorId,
        direction: Direction,
    },
    Internal {
        id: RequestId,
        timestamp: DateTime<Utc>,
        status: RequestStatus,
        elevator_id: ElevatorId,
        destination_floor: FloorId,
    },
}

impl Request {
    pub fn id(&self) -> RequestId {
        match self {
            Request::External { id, .. } => *id,
            Request::Internal { id, .. } => *id,
        }
    }

    /// Builds a validated external (hall call) request.
    pub fn new_external(floor: u32, direction: Direction, max_floor: u32) -> DomainResult<Self> {
        if floor < 1 || floor > max_floor {
            return Err(DomainError::validation(format!(
                "floor {floor} out of range [1, {max_floor}]"
            )));
        }
        Ok(Request::External {
            id: RequestId::new(),
            timestamp: Utc::now(),
            status: RequestStatus::Pending,
            floor: FloorId::new(floor),
            direction,
        })
    }

    /// Builds a validated internal (cabin selection) request.
    pub fn new_internal(
        elevator_id: u32,
        destination_floor: u32,
        max_elevator: u32,
        max_floor: u32,
    ) -> DomainResult<Self> {
        if elevator_id < 1 || elevator_id > max_elevator {
            return Err(DomainError::validation(format!(
                "elevator_id {elevator_id} out of range [1, {max_elevator}]"
            )));
        }
        if destination_floor < 1 || destination_floor > max_floor {
            return Err(DomainError::validation(format!(
                "destination_floor {destination_floor} out of range [1, {max_floor}]"
            )));
        }
        Ok(Request::Internal {
            id: RequestId::new(),
            timestamp: Utc::now(),
            status: RequestStatus::Pending,
            elevator_id: ElevatorId::new(elevator_id),
            destination_floor: FloorId::new(destination_floor),
        })
    }

    /// Parses the flat string-keyed map ingress appends to the stream into a
    /// `Request`. Tolerant of the wire schema: extra fields are ignored,
    /// `direction` is case-insensitive.
    pub fn from_dict(fields: &HashMap<String, String>) -> DomainResult<Self> {
        let id = fields
            .get("id")
            .ok_or_else(|| DomainError::validation("missing field: id"))?
            .parse::<RequestId>()?;
        let timestamp = fields
            .get("timestamp")
            .ok_or_else(|| DomainError::validation("missing field: timestamp"))?;
        let timestamp = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|e| DomainError::validation(format!("invalid timestamp: {e}")))?
            .with_timezone(&Utc);
        let status = match fields.get("status").map(String::as_str) {
            Some("completed") => RequestStatus::Completed,
            _ => RequestStatus::Pending,
        };
        let request_type = fields
            .get("request_type")
            .ok_or_else(|| DomainError::validation("missing field: request_type"))?;

        match request_type.as_str() {
            "external" => {
                let floor = parse_required_u32(fields, "floor")?;
                let direction_raw = fields
                    .get("direction")
                    .ok_or_else(|| DomainError::validation("missing field: direction"))?;
                let direction = Direction::parse_case_insensitive(direction_raw)?;
                Ok(Request::External {
                    id,
                    timestamp,
                    status,
                    floor: FloorId::new(floor),
                    direction,
                })
            }
            "internal" => {
                let elevator_id = parse_required_u32(fields, "elevator_id")?;
                let destination_floor = parse_required_u32(fields, "destination_floor")?;
                Ok(Request::Internal {
                    id,
                    timestamp,
                    status,
                    elevator_id: ElevatorId::new(elevator_id),
                    destination_floor: FloorId::new(destination_floor),
                })
            }
            other => Err(DomainError::validation(format!(
                "unknown request_type: {other}"
            ))),
        }
    }

    /// Serializes back to the flat string-keyed map shape used on the wire.
    pub fn to_dict(&self) -> HashMap<String, String> {
        let mut fields = HashMap::new();
        match self {
            Request::External {
                id,
                timestamp,
                status,
                floor,
                direction,
            } => {
                fields.insert("id".to_string(), id.to_string());
                fields.insert("timestamp".to_string(), timestamp.to_rfc3339());
                fields.insert("status".to_string(), status_str(status).to_string());
                fields.insert("request_type".to_string(), "external".to_string());
                fields.insert("floor".to_string(), floor.get().to_string());
                fields.insert(
                    "direction".to_string(),
                    match direction {
                        Direction::Up => "up".to_string(),
                        Direction::Down => "down".to_string(),
                    },
                );
            }
            Request::Internal {
                id,
                timestamp,
                status,
                elevator_id,
                destination_floor,
            } => {
                fields.insert("id".to_string(), id.to_string());
                fields.insert("timestamp".to_string(), timestamp.to_rfc3339());
                fields.insert("status".to_string(), status_str(status).to_string());
                fields.insert("request_type".to_string(), "internal".to_string());
                fields.insert("elevator_id".to_string(), elevator_id.to_string());
                fields.insert(
                    "destination_floor".to_string(),
                    destination_floor.get().to_string(),
                );
            }
        }
        fields
    }
}

fn status_str(status: &RequestStatus) -> &'static str {
    match status {
        RequestStatus::Pending => "pending",
        RequestStatus::Completed => "completed",
    }
}

fn parse_required_u32(fields: &HashMap<String, String>, key: &str) -> DomainResult<u32> {
    fields
        .get(key)
        .ok_or_else(|| DomainError::validation(format!("missing field: {key}")))?
        .parse::<u32>()
        .map_err(|e| DomainError::validation(format!("invalid {key}: {e}")))
}
