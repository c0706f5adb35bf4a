//! Bounded retry for store calls.
//!
//! Each attempt runs under its own deadline; a timeout aborts that attempt
//! only. Between retried attempts the policy sleeps for a fixed delay.

use crate::store::StoreError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Decides whether a failed attempt is worth repeating.
pub type RetryPredicate = fn(&StoreError) -> bool;

/// Retry everything except errors that repeating cannot fix.
pub fn retry_unless_terminal(err: &StoreError) -> bool {
    !matches!(
        err,
        StoreError::SchemaMissing(_) | StoreError::NotConfigured | StoreError::Decode(_)
    )
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Fixed pause between attempts
    pub delay: Duration,
    /// Deadline for a single attempt
    pub attempt_timeout: Duration,
    pub retryable: RetryPredicate,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(10),
            retryable: retry_unless_terminal,
        }
    }
}

/// Result of running an operation under a `RetryPolicy`.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T, StoreError>,
    pub attempts: u32,
    pub pauses: u32,
}

impl RetryPolicy {
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. The last error is returned on exhaustion.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempts = 0;
        let mut pauses = 0;

        loop {
            attempts += 1;
            debug!(operation = label, attempt = attempts, max_attempts, "Store attempt");

            let result = match tokio::time::timeout(self.attempt_timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout),
            };

            let err = match result {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts,
                        pauses,
                    }
                }
                Err(err) => err,
            };

            if !(self.retryable)(&err) || attempts >= max_attempts {
                if attempts >= max_attempts && (self.retryable)(&err) {
                    warn!(operation = label, attempts, "Store attempts exhausted: {}", err);
                }
                return RetryOutcome {
                    result: Err(err),
                    attempts,
                    pauses,
                };
            }

            warn!(
                operation = label,
                attempt = attempts,
                "Store attempt failed, retrying in {:?}: {}",
                self.delay,
                err
            );
            tokio::time::sleep(self.delay).await;
            pauses += 1;
        }
    }
}
