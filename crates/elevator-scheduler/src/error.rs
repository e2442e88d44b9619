use elevator_broker::BrokerError;
use elevator_store::StoreError;
use thiserror::Error;

/// Failures that stop the scheduler before or during its main loop.
/// Per-message parse/validation failures are logged and acked in place and
/// never reach this type.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to load or initialize elevator snapshot cache: {0}")]
    Startup(#[from] StoreError),

    #[error("failed to ensure consumer group: {0}")]
    GroupSetup(BrokerError),

    #[error("broker read failed after exhausting retries: {0}")]
    BrokerExhausted(BrokerError),
}
