//! Per-elevator controller: command-consumer task plus movement task,
//! together owning exactly one `Elevator`.

mod dispatch;
mod error;
mod keys;
mod movement;
mod state;

pub use error::ControllerError;

use std::sync::Arc;

use elevator_broker::{Broker, PubSubBroker, PubSubMessage, PubSubSubscription};
use elevator_core::{Elevator, ElevatorId, MotionTiming, StatusSnapshot};
use elevator_store::StateStore;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use keys::{commands_topic, status_key};
use state::now_millis;

/// Static configuration a controller needs beyond its adapters.
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    pub num_floors: u32,
    pub timing: MotionTiming,
}

/// Owns exactly one elevator. Construct with [`Controller::new`], then
/// [`Controller::spawn`] to start its command loop and receive a handle for
/// shutdown.
pub struct Controller {
    id: ElevatorId,
    store: Arc<dyn StateStore>,
    broker: Arc<dyn Broker>,
    config: ControllerConfig,
}

impl Controller {
    pub fn new(
        id: ElevatorId,
        store: Arc<dyn StateStore>,
        broker: Arc<dyn Broker>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            id,
            store,
            broker,
            config,
        }
    }

    /// Runs the startup sequence (load-or-initialize snapshot, subscribe to
    /// the command topic) and spawns the command loop. Failures here are
    /// persistent by construction — the supervisor should treat them as
    /// fatal.
    #[instrument(skip(self), fields(elevator_id = %self.id))]
    pub async fn spawn(self) -> Result<ControllerHandle, ControllerError> {
        let elevator = load_or_init_snapshot(self.id, self.store.as_ref()).await?;
        let elevator = Arc::new(Mutex::new(elevator));

        let topic = commands_topic(self.id);
        let sub = self.broker.subscribe(&topic).await?;

        let shutdown = CancellationToken::new();
        let join = tokio::spawn(run_command_loop(
            self.id,
            self.config,
            elevator,
            Arc::clone(&self.store),
            Arc::clone(&self.broker),
            sub,
            shutdown.clone(),
        ));

        Ok(ControllerHandle { shutdown, join })
    }
}

/// Returned by [`Controller::spawn`]; drives graceful shutdown.
pub struct ControllerHandle {
    shutdown: CancellationToken,
    join: JoinHandle<()>,
}

impl ControllerHandle {
    /// Cancels the command loop and any in-flight movement task, and waits
    /// for both to exit.
    pub async fn stop(self) {
        self.shutdown.cancel();
        let _ = self.join.await;
    }
}

async fn load_or_init_snapshot(
    id: ElevatorId,
    store: &dyn StateStore,
) -> Result<Elevator, ControllerError> {
    if let Some(json) = store.get(&status_key(id)).await? {
        match serde_json::from_str::<StatusSnapshot>(&json) {
            Ok(snapshot) => return Ok(snapshot.elevator),
            Err(err) => {
                warn!(elevator_id = %id, error = %err, "stored snapshot is unreadable, reinitializing");
            }
        }
    }

    let elevator = Elevator::new_default(id);
    let snapshot = StatusSnapshot::new(elevator.clone(), now_millis());
    let json =
        serde_json::to_string(&snapshot).expect("status snapshot is always serializable");
    store.set(&status_key(id), json).await?;
    Ok(elevator)
}

#[allow(clippy::too_many_arguments)]
async fn run_command_loop(
    id: ElevatorId,
    config: ControllerConfig,
    elevator: Arc<Mutex<Elevator>>,
    store: Arc<dyn StateStore>,
    broker: Arc<dyn Broker>,
    mut sub: PubSubSubscription,
    shutdown: CancellationToken,
) {
    let mut movement_task: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            msg = sub.recv() => {
                match msg {
                    Some(PubSubMessage::Subscribed { .. }) => continue,
                    Some(PubSubMessage::Message { data, .. }) => {
                        dispatch::handle_raw_command(
                            &data,
                            id,
                            config.num_floors,
                            &elevator,
                            &store,
                            &broker,
                            config.timing,
                            &shutdown,
                            &mut movement_task,
                        )
                        .await;
                    }
                    None => break,
                }
            }
            _ = shutdown.cancelled() => break,
        }
    }

    if let Some(handle) = movement_task.take() {
        let _ = handle.await;
    }
    if let Err(err) = PubSubBroker::unsubscribe(broker.as_ref(), &commands_topic(id)).await {
        warn!(elevator_id = %id, error = %err, "failed to unsubscribe from command topic during shutdown");
    }
    info!(elevator_id = %id, "controller stopped");
}
