//! Retry utilities with exponential backoff for transient RPC failures.

use crate::client::ClientError;
use rand::Rng;
use std::{future::Future, time::Duration};
use tracing::{debug, warn};

/// Upper bound on the backoff exponent, so the shift below cannot overflow.
const MAX_BACKOFF_EXPONENT: usize = 10;

/// Timeout and backoff settings applied to every RPC call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Deadline for a single attempt.
    pub call_timeout: Duration,
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A single attempt with the default per-call timeout.
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn delay_for(&self, attempt: usize) -> Duration {
        let initial_ms = self.initial_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;

        let base_delay = initial_ms.saturating_mul(1 << attempt.min(MAX_BACKOFF_EXPONENT));
        let capped_delay = base_delay.min(max_ms);
        let jitter = rand::thread_rng().gen_range(0..=capped_delay / 4);
        Duration::from_millis(capped_delay + jitter)
    }
}

/// Run `f` until it succeeds, fails with a non-transient error, or the
/// policy's retry budget is spent. Each attempt is bounded by
/// [`RetryPolicy::call_timeout`].
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut f: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempt = 0;

    loop {
        let outcome = match tokio::time::timeout(policy.call_timeout, f()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ClientError::Timeout {
                operation: operation_name.to_string(),
                timeout: policy.call_timeout,
            }),
        };

        match outcome {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !err.is_transient() {
                    debug!(
                        operation = %operation_name,
                        error = %err,
                        "Non-transient error, not retrying"
                    );
                    return Err(err);
                }

                if attempt >= policy.max_retries {
                    warn!(
                        operation = %operation_name,
                        attempts = %(attempt + 1),
                        error = %err,
                        "Max retries exceeded"
                    );
                    return Err(err);
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    operation = %operation_name,
                    attempt = %(attempt + 1),
                    max_retries = %policy.max_retries,
                    delay_ms = %delay.as_millis(),
                    error = %err,
                    "Transient RPC error, retrying"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
