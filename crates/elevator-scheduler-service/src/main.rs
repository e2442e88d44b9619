//! Scheduler process supervisor: constructs adapters once,
//! runs a single `Scheduler` instance, and exits non-zero if the main loop
//! dies of a persistent broker failure rather than a shutdown signal.

mod config;

use std::sync::Arc;

use elevator_broker::{Broker, RedisBroker};
use elevator_scheduler::{Scheduler, SchedulerConfig};
use elevator_store::{RedisStateStore, StateStore};

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    elevator_observability::init();

    let config = Config::from_env();
    tracing::info!(
        scheduler_id = %config.scheduler_id,
        num_elevators = config.num_elevators,
        "starting scheduler process"
    );

    let store: Arc<dyn StateStore> = Arc::new(RedisStateStore::connect(&config.redis_url).await?);
    let broker: Arc<dyn Broker> = Arc::new(RedisBroker::connect(&config.redis_url).await?);

    let scheduler = Scheduler::new(
        SchedulerConfig {
            scheduler_id: config.scheduler_id,
            num_elevators: config.num_elevators,
        },
        Arc::clone(&store),
        Arc::clone(&broker),
    );
    let handle = scheduler.spawn().await?;

    let graceful = handle.run_until(wait_for_shutdown_signal()).await;

    store.close().await?;
    broker.close().await?;

    if graceful {
        tracing::info!("scheduler process exiting after signal-driven shutdown");
        Ok(())
    } else {
        tracing::error!("scheduler main loop exited on its own; treating as unrecoverable");
        anyhow::bail!("scheduler main loop exited unexpectedly")
    }
}

/// Resolves once SIGINT or (on unix) SIGTERM arrives.
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
