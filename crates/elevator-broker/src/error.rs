use thiserror::Error;

/// Broker-level error kinds.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker connection error: {0}")]
    Connection(String),

    #[error("broker command error: {0}")]
    Command(String),

    #[error("bad argument: {0}")]
    BadArgument(String),
}

impl From<redis::RedisError> for BrokerError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_timeout() || err.is_io_error() {
            BrokerError::Connection(err.to_string())
        } else {
            BrokerError::Command(err.to_string())
        }
    }
}
