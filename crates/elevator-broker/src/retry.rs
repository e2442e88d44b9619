//! Explicit retry helper, re-architected from the source's retry-decorator
//! pattern into a policy struct plus a generic async wrapper.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

/// Capped exponential backoff with jitter: initial ~1s, factor 1.5-2.0,
/// jitter, at least 3 attempts before giving up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub factor: f64,
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            factor: 2.0,
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Delay before the given attempt (1-indexed), before jitter.
    fn base_delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.factor.powi(attempt.saturating_sub(1) as i32);
        Duration::from_secs_f64(self.initial_delay.as_secs_f64() * exp)
    }

    /// Delay for the given attempt (1-indexed), with jitter applied.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay_for_attempt(attempt).as_secs_f64();
        if self.jitter <= 0.0 {
            return Duration::from_secs_f64(base);
        }
        let mut rng = rand::thread_rng();
        let jitter_range = base * self.jitter;
        let offset: f64 = rng.gen_range(-jitter_range..=jitter_range);
        Duration::from_secs_f64((base + offset).max(0.0))
    }
}

/// Retries a fallible async operation under `policy`, logging and sleeping
/// between attempts. Returns the last error once attempts are exhausted.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_attempts => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    operation = label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delay_grows_with_factor() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            factor: 2.0,
            jitter: 0.0,
        };
        assert_eq!(policy.base_delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.base_delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.base_delay_for_attempt(3), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn with_retry_returns_first_success() {
        let policy = RetryPolicy::default();
        let result: Result<u32, &str> = with_retry(&policy, "noop", || async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn with_retry_gives_up_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            factor: 1.0,
            jitter: 0.0,
        };
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = with_retry(&policy, "always-fails", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("boom") }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
