//! Scheduler: consumes the requests stream in a consumer group, scores
//! elevators for external requests, and dispatches commands.

mod cache;
mod error;
mod handler;
mod keys;
mod scoring;

pub use cache::SnapshotCache;
pub use error::SchedulerError;
pub use scoring::{score, select_best_elevator};

use std::sync::Arc;

use elevator_broker::{Broker, GroupStart, ReadFrom, RetryPolicy, StreamBroker};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use elevator_store::StateStore;
use keys::{REQUESTS_STREAM, SCHEDULER_GROUP};

const MAX_READ_COUNT: usize = 10;
const BLOCK_MS: u64 = 1000;

/// Static configuration the scheduler needs beyond its adapters.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub scheduler_id: String,
    pub num_elevators: u32,
}

pub struct Scheduler {
    config: SchedulerConfig,
    store: Arc<dyn StateStore>,
    broker: Arc<dyn Broker>,
    retry_policy: RetryPolicy,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, store: Arc<dyn StateStore>, broker: Arc<dyn Broker>) -> Self {
        Self {
            config,
            store,
            broker,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Runs the startup sequence (ensure group, load snapshot cache, drain
    /// pending backlog) and spawns the main loop task.
    pub async fn spawn(self) -> Result<SchedulerHandle, SchedulerError> {
        self.broker
            .create_group(REQUESTS_STREAM, SCHEDULER_GROUP, GroupStart::New)
            .await
            .map_err(SchedulerError::GroupSetup)?;

        let cache = Arc::new(SnapshotCache::load(self.store.as_ref(), self.config.num_elevators).await?);

        let shutdown = CancellationToken::new();
        let join = tokio::spawn(run_main_loop(
            self.config,
            self.broker,
            cache,
            self.retry_policy,
            shutdown.clone(),
        ));

        Ok(SchedulerHandle { shutdown, join })
    }
}

pub struct SchedulerHandle {
    shutdown: CancellationToken,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    pub async fn stop(self) {
        self.shutdown.cancel();
        let _ = self.join.await;
    }

    /// Runs until either the main loop exits on its own (a persistent
    /// broker failure) or `shutdown_signal` resolves first.
    /// Returns `true` when the loop was still running and had to be
    /// cancelled, `false` when it had already exited on its own — the
    /// supervisor uses this to choose its exit code.
    pub async fn run_until(mut self, shutdown_signal: impl std::future::Future<Output = ()>) -> bool {
        tokio::select! {
            _ = &mut self.join => false,
            _ = shutdown_signal => {
                self.shutdown.cancel();
                let _ = self.join.await;
                true
            }
        }
    }
}

async fn run_main_loop(
    config: SchedulerConfig,
    broker: Arc<dyn Broker>,
    cache: Arc<SnapshotCache>,
    retry_policy: RetryPolicy,
    shutdown: CancellationToken,
) {
    // Startup backlog-drain pass: replay this consumer's own pending entries
    // from a previous incarnation before joining the undelivered stream.
    if let Err(err) = drain_pending_backlog(&config, &broker, &cache, &retry_policy, &shutdown).await {
        error!(scheduler_id = %config.scheduler_id, error = %err, "scheduler exiting: backlog drain failed");
        return;
    }

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        let read = elevator_broker::with_retry(&retry_policy, "scheduler read_group", || {
            broker.read_group(
                REQUESTS_STREAM,
                SCHEDULER_GROUP,
                &config.scheduler_id,
                MAX_READ_COUNT,
                BLOCK_MS,
                ReadFrom::Undelivered,
            )
        })
        .await;

        let entries = match read {
            Ok(entries) => entries,
            Err(err) => {
                error!(scheduler_id = %config.scheduler_id, error = %err, "scheduler exiting: broker read exhausted retries");
                return;
            }
        };

        for entry in entries {
            handler::handle_entry(&entry.fields, &cache, broker.as_ref()).await;
            if let Err(err) = broker.ack(REQUESTS_STREAM, SCHEDULER_GROUP, &[entry.id]).await {
                warn!(scheduler_id = %config.scheduler_id, error = %err, "failed to ack request entry");
            }
        }
    }

    info!(scheduler_id = %config.scheduler_id, "scheduler stopped");
}

async fn drain_pending_backlog(
    config: &SchedulerConfig,
    broker: &Arc<dyn Broker>,
    cache: &Arc<SnapshotCache>,
    retry_policy: &RetryPolicy,
    shutdown: &CancellationToken,
) -> Result<(), elevator_broker::BrokerError> {
    loop {
        if shutdown.is_cancelled() {
            return Ok(());
        }
        let entries = elevator_broker::with_retry(retry_policy, "scheduler backlog read_group", || {
            broker.read_group(
                REQUESTS_STREAM,
                SCHEDULER_GROUP,
                &config.scheduler_id,
                MAX_READ_COUNT,
                0,
                ReadFrom::Pending("0".to_string()),
            )
        })
        .await?;
        if entries.is_empty() {
            return Ok(());
        }
        for entry in &entries {
            handler::handle_entry(&entry.fields, cache, broker.as_ref()).await;
        }
        let ids: Vec<String> = entries.into_iter().map(|e| e.id).collect();
        broker.ack(REQUESTS_STREAM, SCHEDULER_GROUP, &ids).await?;
    }
}
