use std::future::Future;
use std::time::Duration;

use crate::error::ResponderError;

/// Retry policy for responder calls.
///
/// Only transport failures are retried. A server that answered with an error
/// has already made up its mind, so remote failures are returned immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every further attempt.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self { max_retries, backoff }
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << attempt.min(16))
    }

    pub fn should_retry(&self, attempt: u32, err: &ResponderError) -> bool {
        attempt < self.max_retries && err.is_transport()
    }

    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, ResponderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ResponderError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if self.should_retry(attempt, &err) => {
                    let delay = self.delay_for(attempt);
                    log::warn!("request failed ({}), retrying in {:?}", err, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
