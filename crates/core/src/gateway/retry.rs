//! Bounded retries with per-attempt timeout and exponential backoff

use futures::future::BoxFuture;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::outcome::{GatewayError, GatewayResult};
use crate::{Error, Result};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// How often and how patiently a backend call is attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Deadline for each single attempt
    pub attempt_timeout: Duration,
    /// Pause after the first failure; doubles after each further failure
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Set the number of attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the per-attempt deadline
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Set the first backoff delay
    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    ///
    /// `None` once no attempt follows.
    pub fn backoff_after(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt >= self.max_attempts {
            return None;
        }
        let factor = 2u32.checked_pow(attempt - 1).unwrap_or(u32::MAX);
        Some(
            self.initial_backoff
                .checked_mul(factor)
                .unwrap_or(Duration::MAX),
        )
    }
}

/// Source of delays between attempts
pub trait Sleep: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleep;

impl Sleep for TokioSleep {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Run `op` until it succeeds or the policy's attempts are used up.
///
/// Each attempt races the policy's timeout; an elapsed attempt counts as a
/// failure with `Error::Timeout`. Attempts never overlap. The final failure is
/// returned without a trailing delay.
pub async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleep,
    operation: &'static str,
    mut op: F,
) -> GatewayResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let outcome = match tokio::time::timeout(policy.attempt_timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(policy.attempt_timeout)),
        };

        let cause = match outcome {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation, attempt, "Gateway call recovered");
                }
                return Ok(value);
            }
            Err(cause) => cause,
        };

        warn!(
            operation,
            attempt,
            max_attempts,
            error = %cause,
            "Gateway attempt failed"
        );

        match policy.backoff_after(attempt) {
            Some(delay) if attempt < max_attempts => {
                sleeper.sleep(delay).await;
                attempt += 1;
            }
            _ => {
                return Err(GatewayError {
                    operation,
                    attempts: attempt,
                    cause,
                })
            }
        }
    }
}
