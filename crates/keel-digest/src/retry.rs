use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::DigestError;

/// Bounded fixed-delay retry policy coupled to cancellation.
///
/// A reusable value object so the same policy can be unit-tested apart
/// from the digestion logic. Cancellation aborts the loop immediately:
/// before an attempt, during the backoff delay, or when the operation
/// itself reports [`DigestError::Cancelled`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Run `op` until it succeeds, the attempt bound is exhausted, or the
    /// token is cancelled. The terminal error wraps the last failure.
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, DigestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DigestError>>,
    {
        let mut attempt = 0u32;
        loop {
            if cancel.is_cancelled() {
                return Err(DigestError::Cancelled);
            }
            attempt += 1;

            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_cancelled() => return Err(DigestError::Cancelled),
                Err(err) => {
                    if attempt >= self.max_attempts.max(1) {
                        return Err(DigestError::RetryExhausted {
                            attempts: attempt,
                            source: Box::new(err),
                        });
                    }
                    warn!(attempt, error = %err, "attempt failed; retrying after delay");
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(DigestError::Cancelled),
                        _ = tokio::time::sleep(self.delay) => {}
                    }
                }
            }
        }
    }
}
