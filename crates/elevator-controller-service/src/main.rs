//! Controller process supervisor: constructs adapters once,
//! launches one `Controller` per elevator id `1..=NUM_ELEVATORS`, and runs
//! them concurrently until a shutdown signal arrives.

mod config;

use std::sync::Arc;

use elevator_broker::{Broker, RedisBroker};
use elevator_controller::{Controller, ControllerConfig, ControllerHandle};
use elevator_core::{ElevatorId, MotionTiming};
use elevator_store::{RedisStateStore, StateStore};

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    elevator_observability::init();

    let config = Config::from_env();
    tracing::info!(
        num_floors = config.num_floors,
        num_elevators = config.num_elevators,
        "starting controller process"
    );

    let store: Arc<dyn StateStore> = Arc::new(RedisStateStore::connect(&config.redis_url).await?);
    let broker: Arc<dyn Broker> = Arc::new(RedisBroker::connect(&config.redis_url).await?);

    let controller_config = ControllerConfig {
        num_floors: config.num_floors,
        timing: MotionTiming::default(),
    };

    let mut handles = Vec::with_capacity(config.num_elevators as usize);
    for raw_id in 1..=config.num_elevators {
        let id = ElevatorId::new(raw_id);
        let controller = Controller::new(id, Arc::clone(&store), Arc::clone(&broker), controller_config);
        let handle = controller.spawn().await?;
        handles.push(handle);
    }

    wait_for_shutdown_signal().await;
    tracing::info!("shutdown signal received, stopping controllers");

    shutdown_all(handles).await;
    store.close().await?;
    broker.close().await?;

    tracing::info!("controller process exiting");
    Ok(())
}

async fn shutdown_all(handles: Vec<ControllerHandle>) {
    let stops = handles.into_iter().map(ControllerHandle::stop);
    futures_util::future::join_all(stops).await;
}

/// Resolves once SIGINT or (on unix) SIGTERM arrives, so shutdown is
/// signal-driven regardless of platform.
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
