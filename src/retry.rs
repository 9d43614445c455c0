//! Retry with linear-times-backoff sleeps for remote calls.

use std::time::Duration;

use tracing::warn;

use crate::error::ApiError;

/// How often and how patiently a remote call is retried.
///
/// The sleep before attempt `n + 1` is `delay * n * backoff`, so the default
/// policy waits 6s, then 12s, before giving up after the third attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
    backoff: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(3),
            backoff: 2,
        }
    }
}

impl RetryPolicy {
    /// `max_retries` is the total number of attempts; zero is treated as one.
    pub fn new(max_retries: u32, delay: Duration, backoff: u32) -> Self {
        Self {
            max_retries: max_retries.max(1),
            delay,
            backoff,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Sleep taken after failed attempt number `attempt` (1-based).
    pub fn sleep_for(&self, attempt: u32) -> Duration {
        self.delay
            .checked_mul(attempt.saturating_mul(self.backoff))
            .unwrap_or(Duration::MAX)
    }

    /// Run `operation`, retrying transient failures.
    ///
    /// Non-transient errors are returned on first sight. Once every attempt
    /// has failed the last transient error is returned as is.
    pub fn run<T, F>(&self, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Result<T, ApiError>,
    {
        let mut attempt = 1;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(error) if !error.is_transient() => return Err(error),
                Err(error) => {
                    if attempt >= self.max_retries {
                        warn!(attempt, error = %error, "Giving up after {} attempts", attempt);
                        return Err(error);
                    }
                    let sleep = self.sleep_for(attempt);
                    warn!(
                        attempt,
                        sleep_secs = sleep.as_secs_f64(),
                        error = %error,
                        "Error encountered retrieving report, sleeping for {:?}. Attempt {} [{}]",
                        sleep,
                        attempt,
                        error
                    );
                    std::thread::sleep(sleep);
                    attempt += 1;
                }
            }
        }
    }
}
