//! The background movement task: drains the destination queue one leg at a
//! time, with cancellable travel/door/dwell waits.

use std::sync::Arc;
use std::time::Duration;

use elevator_broker::Broker;
use elevator_core::{Elevator, ElevatorId, MotionTiming};
use elevator_store::StateStore;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::state::apply_and_publish;

const DWELL_SECS: f64 = 2.0;

/// Runs until the destination queue empties or `shutdown` fires. On
/// cancellation the task exits mid-leg without corrupting state: the last
/// `apply_and_publish` call already persisted the authoritative snapshot.
#[instrument(skip(elevator, store, broker, shutdown), fields(elevator_id = %id))]
pub async fn run(
    id: ElevatorId,
    elevator: Arc<Mutex<Elevator>>,
    store: Arc<dyn StateStore>,
    broker: Arc<dyn Broker>,
    timing: MotionTiming,
    shutdown: CancellationToken,
) {
    loop {
        let (target, direction, current) = {
            let guard = elevator.lock().await;
            let Some(&target) = guard.destinations.first() else {
                return;
            };
            (target, guard.next_direction(), guard.current_floor)
        };

        let Some(direction) = direction else {
            // Invariant violation recovery: the head of the queue matches
            // the current floor. Pop it and keep draining rather than spin.
            apply_and_publish(&elevator, store.as_ref(), broker.as_ref(), id, |e| {
                e.arrive(target);
            })
            .await;
            continue;
        };

        apply_and_publish(&elevator, store.as_ref(), broker.as_ref(), id, |e| {
            e.start_moving(direction);
        })
        .await;

        let travel_secs = current.distance_to(target) as f64 * timing.floor_travel_time_secs;
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs_f64(travel_secs)) => {}
            _ = shutdown.cancelled() => {
                info!("movement task cancelled mid-travel");
                return;
            }
        }

        apply_and_publish(&elevator, store.as_ref(), broker.as_ref(), id, |e| {
            e.arrive(target);
        })
        .await;

        apply_and_publish(&elevator, store.as_ref(), broker.as_ref(), id, |e| {
            // Arrival always leaves the elevator idle for this leg, so
            // opening the door here is always legal.
            let _ = e.open_door();
        })
        .await;

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs_f64(timing.door_operation_time_secs)) => {}
            _ = shutdown.cancelled() => {
                info!("movement task cancelled during door-open wait");
                return;
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs_f64(DWELL_SECS)) => {}
            _ = shutdown.cancelled() => {
                info!("movement task cancelled during dwell");
                return;
            }
        }

        apply_and_publish(&elevator, store.as_ref(), broker.as_ref(), id, |e| {
            let _ = e.close_door();
        })
        .await;

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs_f64(timing.door_operation_time_secs)) => {}
            _ = shutdown.cancelled() => {
                info!("movement task cancelled during door-close wait");
                return;
            }
        }
    }
}
