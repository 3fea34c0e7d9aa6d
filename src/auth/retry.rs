//! Timeout and retry handling for directory calls.
//!
//! Each attempt is bounded by a timeout. Transient failures (timeout,
//! directory unreachable) are retried with exponential backoff; every other
//! outcome is returned immediately.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::SecurityConfig;
use crate::error::{AuthErrorKind, GatekeeperError};

/// Bounds for directory calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Time allowed for a single attempt.
    pub attempt_timeout: Duration,
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Cap on the delay between attempts.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SecurityConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self {
            attempt_timeout: Duration::from_millis(config.directory_timeout_ms),
            max_retries: config.directory_retries,
            initial_backoff: Duration::from_millis(config.backoff_initial_ms),
            max_backoff: Duration::from_millis(config.backoff_max_ms),
        }
    }

    /// Delay before retry number `retry` (zero-based): doubling, capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(1u32 << retry.min(16))
            .min(self.max_backoff)
    }

    /// Run `operation` under this policy.
    ///
    /// `operation` is called once per attempt. `label` names the call in
    /// log output.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, GatekeeperError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatekeeperError>>,
    {
        let attempts = self.max_retries.saturating_add(1);
        let mut attempt = 1;

        loop {
            let error = match with_timeout(self.attempt_timeout, operation()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => e,
                Err(e) => return Err(e),
            };

            if attempt >= attempts {
                warn!(
                    call = label,
                    attempts,
                    error = %error,
                    "Directory call failed, giving up"
                );
                return Err(error);
            }

            let delay = self.backoff(attempt - 1);
            warn!(
                call = label,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient directory failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Await `future` for at most `timeout`.
///
/// Elapsing maps to a retryable `DirectoryTimeout` error.
pub async fn with_timeout<T, Fut>(timeout: Duration, future: Fut) -> Result<T, GatekeeperError>
where
    Fut: Future<Output = Result<T, GatekeeperError>>,
{
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| GatekeeperError::Auth {
            kind: AuthErrorKind::DirectoryTimeout {
                timeout_ms: timeout.as_millis() as u64,
            },
        })?
}
