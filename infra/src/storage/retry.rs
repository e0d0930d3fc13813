//! Retry of transient storage failures
//!
//! Only errors where `PersistenceError::is_transient` is true are retried.
//! The delay doubles with each attempt up to `max_backoff`, plus up to 50%
//! random jitter.

use rand::Rng;
use std::thread;
use std::time::Duration;
use tk_core::errors::PersistenceError;
use tracing::{debug, warn};

/// Retry settings for storage operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(20),
            max_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryConfig {
    /// A single attempt
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Runs `operation`, retrying transient failures with backoff
///
/// Returns the first success, the first non-transient error, or the last
/// transient error once retries are exhausted.
pub fn with_retry<T, F>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, PersistenceError>
where
    F: FnMut() -> Result<T, PersistenceError>,
{
    let mut attempt = 0u32;
    loop {
        match operation() {
            Ok(value) => {
                if attempt > 0 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) if err.is_transient() && attempt < config.max_retries => {
                let delay = compute_backoff(config, attempt);
                debug!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_attempts = config.max_retries + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient error, retrying after backoff"
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(err) => {
                if err.is_transient() {
                    warn!(operation = operation_name, attempts = attempt + 1, error = %err, "retries exhausted");
                }
                return Err(err);
            }
        }
    }
}

fn compute_backoff(config: &RetryConfig, attempt: u32) -> Duration {
    let base = config
        .initial_backoff
        .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
    let capped = base.min(config.max_backoff);

    let jitter_range = capped.as_millis() as u64 / 2;
    if jitter_range > 0 {
        capped + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_range))
    } else {
        capped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        }
    }

    fn transient() -> PersistenceError {
        PersistenceError::Io {
            message: "interrupted".to_string(),
            transient: true,
        }
    }

    #[test]
    fn test_succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let result = with_retry(&fast(), "save", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(transient())
            } else {
                Ok(calls.get())
            }
        });
        assert_eq!(result, Ok(3));
    }

    #[test]
    fn test_gives_up_after_max_retries() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retry(&fast(), "save", || {
            calls.set(calls.get() + 1);
            Err(transient())
        });
        assert_eq!(result, Err(transient()));
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_permanent_error_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retry(&fast(), "load", || {
            calls.set(calls.get() + 1);
            Err(PersistenceError::Corrupt {
                message: "bad json".to_string(),
            })
        });
        assert!(matches!(result, Err(PersistenceError::Corrupt { .. })));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = RetryConfig {
            max_retries: 10,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(400),
        };
        let delay = compute_backoff(&config, 8);
        assert!(delay >= Duration::from_millis(400));
        assert!(delay <= Duration::from_millis(600));
    }
}
