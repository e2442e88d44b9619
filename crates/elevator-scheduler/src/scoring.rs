//! Elevator selection scoring for external requests.

use std::collections::BTreeMap;

use elevator_core::{Direction, Elevator, ElevatorId, FloorId, MotionStatus};

/// Lower is better. Idle elevators get a flat bonus; moving elevators get a
/// discount when the request is "on the way" (same direction, request ahead
/// of the elevator) or a penalty otherwise.
pub fn score(elevator: &Elevator, request_floor: FloorId, request_direction: Direction) -> f64 {
    let distance = elevator.current_floor.distance_to(request_floor) as f64;
    let mut score = distance;

    match elevator.status {
        MotionStatus::Idle => score -= 1.0,
        MotionStatus::MovingUp => {
            let on_way = request_direction == Direction::Up
                && request_floor.get() >= elevator.current_floor.get();
            score *= if on_way { 0.8 } else { 5.0 };
        }
        MotionStatus::MovingDown => {
            let on_way = request_direction == Direction::Down
                && request_floor.get() <= elevator.current_floor.get();
            score *= if on_way { 0.8 } else { 5.0 };
        }
    }

    score
}

/// Picks the elevator with the minimum score, tie-breaking on the lowest
/// id. Iterating a `BTreeMap` in ascending key order and only replacing the
/// incumbent on a strictly lower score gives that tie-break for free.
pub fn select_best_elevator(
    snapshots: &BTreeMap<ElevatorId, Elevator>,
    request_floor: FloorId,
    request_direction: Direction,
) -> Option<ElevatorId> {
    let mut best: Option<(ElevatorId, f64)> = None;
    for (&id, elevator) in snapshots {
        let s = score(elevator, request_floor, request_direction);
        match best {
            Some((_, best_score)) if s >= best_score => {}
            _ => best = Some((id, s)),
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevator_core::DoorStatus;

    fn elevator(id: u32, floor: u32, status: MotionStatus, destinations: Vec<u32>) -> Elevator {
        Elevator {
            id: ElevatorId::new(id),
            current_floor: FloorId::new(floor),
            status,
            door_status: if status == MotionStatus::Idle {
                DoorStatus::Closed
            } else {
                DoorStatus::Closed
            },
            destinations: destinations.into_iter().map(FloorId::new).collect(),
        }
    }

    #[test]
    fn idle_nearest_wins_ties_broken_by_lowest_id() {
        let mut snapshots = BTreeMap::new();
        snapshots.insert(ElevatorId::new(1), elevator(1, 1, MotionStatus::Idle, vec![]));
        snapshots.insert(ElevatorId::new(2), elevator(2, 1, MotionStatus::Idle, vec![]));
        snapshots.insert(ElevatorId::new(3), elevator(3, 1, MotionStatus::Idle, vec![]));

        let chosen = select_best_elevator(&snapshots, FloorId::new(3), Direction::Up);
        assert_eq!(chosen, Some(ElevatorId::new(1)));
    }

    #[test]
    fn on_the_way_elevator_beats_closer_idle_elevator() {
        let mut snapshots = BTreeMap::new();
        snapshots.insert(ElevatorId::new(1), elevator(1, 1, MotionStatus::Idle, vec![]));
        snapshots.insert(
            ElevatorId::new(2),
            elevator(2, 5, MotionStatus::MovingUp, vec![6]),
        );
        snapshots.insert(ElevatorId::new(3), elevator(3, 10, MotionStatus::Idle, vec![]));

        assert_eq!(score(snapshots.get(&ElevatorId::new(1)).unwrap(), FloorId::new(6), Direction::Up), 4.0);
        assert_eq!(score(snapshots.get(&ElevatorId::new(2)).unwrap(), FloorId::new(6), Direction::Up), 0.8);
        assert_eq!(score(snapshots.get(&ElevatorId::new(3)).unwrap(), FloorId::new(6), Direction::Up), 3.0);

        let chosen = select_best_elevator(&snapshots, FloorId::new(6), Direction::Up);
        assert_eq!(chosen, Some(ElevatorId::new(2)));
    }

    #[test]
    fn moving_away_elevator_is_heavily_penalized() {
        let mut snapshots = BTreeMap::new();
        snapshots.insert(
            ElevatorId::new(1),
            elevator(1, 5, MotionStatus::MovingDown, vec![1]),
        );
        snapshots.insert(ElevatorId::new(2), elevator(2, 8, MotionStatus::Idle, vec![]));

        // Elevator 1 is moving down while the request (floor 6, up) needs it
        // to reverse: not on the way, 5x penalty.
        let chosen = select_best_elevator(&snapshots, FloorId::new(6), Direction::Up);
        assert_eq!(chosen, Some(ElevatorId::new(2)));
    }

    #[test]
    fn selection_is_deterministic_across_calls() {
        let mut snapshots = BTreeMap::new();
        snapshots.insert(ElevatorId::new(1), elevator(1, 4, MotionStatus::Idle, vec![]));
        snapshots.insert(ElevatorId::new(2), elevator(2, 9, MotionStatus::Idle, vec![]));

        let first = select_best_elevator(&snapshots, FloorId::new(5), Direction::Up);
        let second = select_best_elevator(&snapshots, FloorId::new(5), Direction::Up);
        assert_eq!(first, second);
    }
}
