use thiserror::Error;

/// A single error kind for the state store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store connection error: {0}")]
    Connection(String),

    #[error("state store command error: {0}")]
    Command(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_timeout() || err.is_io_error() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Command(err.to_string())
        }
    }
}
