//! Bounded retry policy for collaborator calls

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Errors that can tell a transient failure from a permanent one
pub trait Retryable {
    /// Worth trying again with the same input
    fn is_transient(&self) -> bool;
}

/// Delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Backoff {
    /// Retry immediately
    #[default]
    None,
    /// Wait a fixed delay before each retry
    Fixed { delay_ms: u64 },
}

impl Backoff {
    fn delay(&self) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Fixed { delay_ms } => Some(Duration::from_millis(*delay_ms)),
        }
    }
}

/// Result of a retried operation together with how many attempts it took
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

/// Bounded retry: at most `max_attempts` calls in total, retrying only
/// transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first call; values below 1 act as 1
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// One automatic retry after the first attempt
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

    /// Create a policy with the given attempt budget and no backoff
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::None,
        }
    }

    /// Never retry
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    /// Wait `delay` between attempts
    pub fn with_fixed_backoff(mut self, delay: Duration) -> Self {
        self.backoff = Backoff::Fixed {
            delay_ms: delay.as_millis() as u64,
        };
        self
    }

    fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Run `op` until it succeeds, fails permanently, or the budget runs out.
    /// `op` receives the 1-based attempt number.
    pub async fn execute<T, E, F, Fut>(&self, mut op: F) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let budget = self.attempt_budget();
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(e) if e.is_transient() && attempt < budget => {
                    warn!(
                        attempt,
                        max_attempts = budget,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    if let Some(delay) = self.backoff.delay() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => {
                    debug!(attempt, transient = e.is_transient(), "Giving up");
                    return RetryOutcome {
                        result: Err(e),
                        attempts: attempt,
                    };
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}

fn default_max_attempts() -> u32 {
    RetryPolicy::DEFAULT_MAX_ATTEMPTS
}
