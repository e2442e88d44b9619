//! Command parsing and dispatch: the per-controller command-consumer task
//! body.

use std::sync::Arc;
use std::time::Duration;

use elevator_broker::Broker;
use elevator_core::{Command, CommandKind, Elevator, ElevatorId, FloorId, MotionTiming};
use elevator_store::StateStore;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::movement;
use crate::state::apply_and_publish;

const DOOR_ONLY_DWELL_SECS: f64 = 2.0;

/// Parses and applies one command payload. Parse errors and out-of-range
/// floors are logged and discarded, never fatal.
///
/// Spawns (or leaves running) the movement task in `movement_task` when the
/// destination queue transitions from empty to non-empty.
#[allow(clippy::too_many_arguments)]
pub async fn handle_raw_command(
    payload: &str,
    id: ElevatorId,
    num_floors: u32,
    elevator: &Arc<Mutex<Elevator>>,
    store: &Arc<dyn StateStore>,
    broker: &Arc<dyn Broker>,
    timing: MotionTiming,
    shutdown: &CancellationToken,
    movement_task: &mut Option<JoinHandle<()>>,
) {
    let command: Command = match serde_json::from_str(payload) {
        Ok(command) => command,
        Err(err) => {
            warn!(elevator_id = %id, error = %err, payload, "failed to parse command, discarding");
            return;
        }
    };

    if command.floor.get() < 1 || command.floor.get() > num_floors {
        warn!(
            elevator_id = %id,
            floor = command.floor.get(),
            "command references out-of-range floor, discarding"
        );
        return;
    }

    match command.command {
        CommandKind::GoToFloor => handle_go_to_floor(
            command.floor,
            id,
            elevator,
            store,
            broker,
            timing,
            shutdown,
            movement_task,
        )
        .await,
        CommandKind::AddDestination => {
            {
                let mut guard = elevator.lock().await;
                guard.add_destination(command.floor);
            }
            ensure_movement_running(id, elevator, store, broker, timing, shutdown, movement_task);
        }
    }
}

async fn handle_go_to_floor(
    floor: FloorId,
    id: ElevatorId,
    elevator: &Arc<Mutex<Elevator>>,
    store: &Arc<dyn StateStore>,
    broker: &Arc<dyn Broker>,
    timing: MotionTiming,
    shutdown: &CancellationToken,
    movement_task: &mut Option<JoinHandle<()>>,
) {
    let at_current_with_empty_queue = {
        let guard = elevator.lock().await;
        floor == guard.current_floor && guard.destinations.is_empty()
    };

    if at_current_with_empty_queue {
        run_door_only_cycle(id, elevator, store, broker, shutdown).await;
        return;
    }

    {
        let mut guard = elevator.lock().await;
        guard.prepend_destination(floor);
    }
    ensure_movement_running(id, elevator, store, broker, timing, shutdown, movement_task);
}

/// The elevator is already at the requested floor with nothing queued: just
/// cycle the door rather than starting a movement task. Runs inline on the
/// command task — the next command waits for it, by design: one command
/// processed to completion before the next.
async fn run_door_only_cycle(
    id: ElevatorId,
    elevator: &Arc<Mutex<Elevator>>,
    store: &Arc<dyn StateStore>,
    broker: &Arc<dyn Broker>,
    shutdown: &CancellationToken,
) {
    apply_and_publish(elevator, store.as_ref(), broker.as_ref(), id, |e| {
        let _ = e.open_door();
    })
    .await;

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs_f64(DOOR_ONLY_DWELL_SECS)) => {}
        _ = shutdown.cancelled() => return,
    }

    apply_and_publish(elevator, store.as_ref(), broker.as_ref(), id, |e| {
        let _ = e.close_door();
    })
    .await;
}

/// Spawns the movement task if none is currently running. Safe to call
/// unconditionally: the command loop is the sole spawner, so there is never
/// a race between two spawn attempts.
fn ensure_movement_running(
    id: ElevatorId,
    elevator: &Arc<Mutex<Elevator>>,
    store: &Arc<dyn StateStore>,
    broker: &Arc<dyn Broker>,
    timing: MotionTiming,
    shutdown: &CancellationToken,
    movement_task: &mut Option<JoinHandle<()>>,
) {
    if let Some(handle) = movement_task.as_ref() {
        if !handle.is_finished() {
            return;
        }
    }
    info!(elevator_id = %id, "starting movement task");
    let elevator = Arc::clone(elevator);
    let store = Arc::clone(store);
    let broker = Arc::clone(broker);
    let shutdown = shutdown.clone();
    *movement_task = Some(tokio::spawn(movement::run(
        id, elevator, store, broker, timing, shutdown,
    )));
}
