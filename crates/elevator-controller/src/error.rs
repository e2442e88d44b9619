use elevator_broker::BrokerError;
use elevator_store::StoreError;
use thiserror::Error;

/// Failures that stop a controller before its command loop can start.
/// Everything that can happen once the loop is running (parse errors,
/// transient store/broker failures on publish) is logged and swallowed
/// in place instead.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("failed to load or initialize elevator snapshot: {0}")]
    Startup(#[from] StoreError),

    #[error("failed to subscribe to command topic: {0}")]
    Subscribe(#[from] BrokerError),
}
