//! Bounded retry with exponential backoff for provider calls.

use crate::{EmbeddingError, EmbeddingResult};
use std::future::Future;
use std::time::Duration;

/// Retry policy applied to every provider request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Only transient errors are retried. A rate-limit hint from the provider
    /// replaces the computed delay, still capped by `max_delay`. When attempts
    /// run out, the last error is reported as a provider failure.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> EmbeddingResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EmbeddingResult<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_transient() {
                return Err(err);
            }
            if attempt >= attempts {
                if attempts == 1 {
                    return Err(err);
                }
                return Err(EmbeddingError::Provider(format!(
                    "{} after {} attempts",
                    err, attempts
                )));
            }

            let delay = match &err {
                EmbeddingError::RateLimited {
                    retry_after_secs: Some(secs),
                } => Duration::from_secs(*secs).min(self.max_delay),
                _ => self.delay_for(attempt),
            };
            tracing::warn!(
                attempt,
                max_attempts = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "embedding request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy::default().with_base_delay(Duration::from_millis(1))
    }

    #[test]
    fn delays_double_and_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for(40), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = fast()
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(EmbeddingError::Provider("503".into()))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: EmbeddingResult<()> = fast()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(EmbeddingError::Rejected("401".into())) }
            })
            .await;
        assert!(matches!(result, Err(EmbeddingError::Rejected(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_reports_provider_error() {
        let calls = AtomicU32::new(0);
        let result: EmbeddingResult<()> = fast()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(EmbeddingError::RateLimited {
                        retry_after_secs: None,
                    })
                }
            })
            .await;
        match result {
            Err(EmbeddingError::Provider(msg)) => assert!(msg.contains("after 3 attempts")),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
