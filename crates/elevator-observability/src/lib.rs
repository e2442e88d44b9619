//! Shared tracing/logging setup for the elevator control plane's binaries,
//! so every binary logs the same way.

use tracing_subscriber::EnvFilter;

/// Initializes process-wide structured logging. `RUST_LOG` controls the
/// filter, defaulting to `info`. Safe to call multiple times; later calls
/// are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
