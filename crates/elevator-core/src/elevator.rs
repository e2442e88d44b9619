//! The elevator entity: in-memory state plus the pure transitions that move
//! it between states. Nothing in this module talks to Redis or touches
//! wall-clock time — that belongs to `elevator-controller`.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::ids::{ElevatorId, FloorId};

/// Motion state of an elevator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionStatus {
    Idle,
    MovingUp,
    MovingDown,
}

/// Door state of an elevator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorStatus {
    Open,
    Closed,
}

/// Direction of travel or of a hall call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Parses `"up"`/`"down"`, case-insensitively.
    pub fn parse_case_insensitive(raw: &str) -> DomainResult<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(DomainError::validation(format!(
                "invalid direction: {other}"
            ))),
        }
    }
}

/// In-memory elevator entity.
///
/// Invariants (enforced by the methods below, never by direct field
/// mutation from outside this module):
/// - `door_status` is `Closed` whenever `status != Idle`.
/// - `destinations` never contains `current_floor` and has no duplicates.
/// - a destination is popped only on arrival at that floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elevator {
    pub id: ElevatorId,
    pub current_floor: FloorId,
    pub status: MotionStatus,
    pub door_status: DoorStatus,
    pub destinations: Vec<FloorId>,
}

/// Per-elevator motion timing, held by the controller alongside its
/// `Elevator` but not part of the persisted snapshot schema.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MotionTiming {
    pub floor_travel_time_secs: f64,
    pub door_operation_time_secs: f64,
}

impl Default for MotionTiming {
    fn default() -> Self {
        Self {
            floor_travel_time_secs: 1.0,
            door_operation_time_secs: 1.5,
        }
    }
}

impl Elevator {
    /// The steady-state elevator a fresh system (or a controller with no
    /// prior snapshot) starts from: floor 1, idle, closed, empty queue.
    pub fn new_default(id: ElevatorId) -> Self {
        Self {
            id,
            current_floor: FloorId::new(1),
            status: MotionStatus::Idle,
            door_status: DoorStatus::Closed,
            destinations: Vec::new(),
        }
    }

    /// Appends `floor` to the destination queue unless it is the current
    /// floor or already queued (no-op in both cases).
    pub fn add_destination(&mut self, floor: FloorId) {
        if floor == self.current_floor {
            return;
        }
        if self.destinations.contains(&floor) {
            return;
        }
        self.destinations.push(floor);
    }

    /// Prepends `floor` to the destination queue (highest priority), unless
    /// it is the current floor. If already queued elsewhere, it is moved to
    /// the front rather than duplicated.
    pub fn prepend_destination(&mut self, floor: FloorId) {
        if floor == self.current_floor {
            return;
        }
        self.destinations.retain(|&f| f != floor);
        self.destinations.insert(0, floor);
    }

    /// Direction implied by the head of the destination queue, relative to
    /// the current floor. `None` when the queue is empty.
    pub fn next_direction(&self) -> Option<Direction> {
        let target = *self.destinations.first()?;
        if target > self.current_floor {
            Some(Direction::Up)
        } else if target < self.current_floor {
            Some(Direction::Down)
        } else {
            None
        }
    }

    /// Records arrival at `floor`: updates the current floor, pops the head
    /// of the queue if it matches, and drops back to idle once the queue is
    /// empty.
    pub fn arrive(&mut self, floor: FloorId) {
        self.current_floor = floor;
        if self.destinations.first() == Some(&floor) {
            self.destinations.remove(0);
        }
        if self.destinations.is_empty() {
            self.status = MotionStatus::Idle;
        }
    }

    /// Opens the door. Only legal while idle (motion states never coexist
    /// with an open door).
    pub fn open_door(&mut self) -> DomainResult<()> {
        if self.status != MotionStatus::Idle {
            return Err(DomainError::invariant(
                "cannot open door while elevator is moving",
            ));
        }
        self.door_status = DoorStatus::Open;
        Ok(())
    }

    /// Closes the door.
    pub fn close_door(&mut self) -> DomainResult<()> {
        self.door_status = DoorStatus::Closed;
        Ok(())
    }

    /// Sets the motion status ahead of a travel leg.
    pub fn start_moving(&mut self, direction: Direction) {
        self.status = match direction {
            Direction::Up => MotionStatus::MovingUp,
            Direction::Down => MotionStatus::MovingDown,
        };
    }

    /// True once the destination queue is empty and the elevator is idle
    /// with the door closed — the system's steady-state invariant.
    pub fn is_steady_state(&self) -> bool {
        self.destinations.is_empty()
            && self.status == MotionStatus::Idle
            && self.door_status == DoorStatus::Closed
    }
}
