use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::domain::models::RetryConfig;

/// Retry policy with exponential backoff for persistence calls
///
/// Backoff doubles with each retry and is capped at `max_backoff_ms`.
///
/// # Retry Decision
/// - Retry on: network and database errors (`DomainError::is_transient`)
/// - Do NOT retry: everything else
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries before giving up
    max_retries: u32,
    /// Initial backoff duration in milliseconds
    initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds
    max_backoff_ms: u64,
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Arguments
    /// * `max_retries` - Maximum retry attempts after the first call
    /// * `initial_backoff_ms` - Starting backoff delay
    /// * `max_backoff_ms` - Maximum backoff delay
    pub fn new(max_retries: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff_ms,
            max_backoff_ms: max_backoff_ms.max(initial_backoff_ms),
        }
    }

    /// A policy that calls the operation exactly once.
    pub fn no_retry() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Execute an operation with exponential backoff retry logic
    ///
    /// # Returns
    /// * `Ok(T)` - Operation succeeded
    /// * `Err(DomainError)` - Permanent error, or transient error after all retries
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!("Operation succeeded after {} retries", attempt);
                    }
                    return Ok(result);
                }
                Err(err) => {
                    if self.should_retry(&err, attempt) {
                        let backoff = self.calculate_backoff(attempt);
                        warn!(
                            "Attempt {} failed with transient error: {}. Retrying in {:?}...",
                            attempt + 1,
                            err,
                            backoff
                        );

                        sleep(backoff).await;
                        attempt += 1;
                    } else {
                        if attempt >= self.max_retries && err.is_transient() {
                            warn!("Operation failed after {} attempts: {}", attempt + 1, err);
                        } else {
                            debug!("Permanent error, not retrying: {}", err);
                        }
                        return Err(err);
                    }
                }
            }
        }
    }

    /// Calculate exponential backoff duration for a given attempt
    ///
    /// Formula: min(initial_backoff * 2^attempt, max_backoff)
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }

    fn should_retry(&self, error: &DomainError, attempt: u32) -> bool {
        attempt < self.max_retries && error.is_transient()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            config.initial_backoff_ms,
            config.max_backoff_ms,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy::new(5, 1000, 60000);

        assert_eq!(policy.calculate_backoff(0), Duration::from_millis(1000));
        assert_eq!(policy.calculate_backoff(1), Duration::from_millis(2000));
        assert_eq!(policy.calculate_backoff(2), Duration::from_millis(4000));
        assert_eq!(policy.calculate_backoff(5), Duration::from_millis(32000));
        assert_eq!(policy.calculate_backoff(6), Duration::from_millis(60000));
        assert_eq!(policy.calculate_backoff(40), Duration::from_millis(60000));
    }

    #[test]
    fn test_should_retry_classification() {
        let policy = RetryPolicy::new(3, 1, 10);

        assert!(policy.should_retry(&DomainError::Network("down".to_string()), 0));
        assert!(policy.should_retry(&DomainError::DatabaseError("busy".to_string()), 2));
        assert!(!policy.should_retry(&DomainError::Network("down".to_string()), 3));
        assert!(!policy.should_retry(&DomainError::NoActiveSession, 0));
    }

    #[tokio::test]
    async fn test_execute_retries_transient_then_succeeds() {
        let policy = RetryPolicy::new(3, 1, 5);
        let calls = Arc::new(AtomicU32::new(0));

        let result = policy
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(DomainError::Network("flaky".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_execute_does_not_retry_permanent_error() {
        let policy = RetryPolicy::new(3, 1, 5);
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = policy
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(DomainError::ExerciseNotFound("row".to_string()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execute_gives_up_after_max_retries() {
        let policy = RetryPolicy::new(2, 1, 5);
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = policy
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(DomainError::Network("offline".to_string()))
                }
            })
            .await;

        assert!(matches!(result, Err(DomainError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_no_retry_policy() {
        let policy = RetryPolicy::no_retry();
        assert_eq!(policy.max_retries(), 0);
        assert!(!policy.should_retry(&DomainError::Network("x".to_string()), 0));
    }
}
