//! Bounded retry with exponential backoff for store calls.
//!
//! Every attempt runs under the operation timeout. Only transient failures
//! (connection loss, timeouts) are retried; constraint violations, missing
//! rows and query errors return immediately. Non-idempotent writes retry
//! connection failures only, and health pings make a single attempt.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::domain::ports::ContactRepositoryError;

/// Retry and timeout settings applied to each repository call.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use contacts_backend::outbound::persistence::RetryPolicy;
///
/// let policy = RetryPolicy::default().with_initial_backoff(Duration::from_millis(100));
/// assert_eq!(policy.backoff_for(3), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    operation_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(30),
            operation_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Total attempts including the first; values below one are raised to one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    #[must_use]
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    #[must_use]
    pub fn with_operation_timeout(mut self, operation_timeout: Duration) -> Self {
        self.operation_timeout = operation_timeout;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    /// Delay after failed attempt `attempt` (1-based), capped at the maximum.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }

    /// Run an idempotent `call` until it succeeds, fails permanently, or
    /// attempts run out.
    ///
    /// # Errors
    ///
    /// Returns the last error observed. An attempt exceeding the operation
    /// timeout is reported as [`ContactRepositoryError::Timeout`].
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        call: F,
    ) -> Result<T, ContactRepositoryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ContactRepositoryError>>,
    {
        self.run_with(operation, self.max_attempts, ContactRepositoryError::is_transient, call)
            .await
    }

    /// Run a non-idempotent write such as an insert or delete.
    ///
    /// Connection failures are retried. A timed-out attempt may already have
    /// committed, so timeouts are returned without a retry.
    ///
    /// # Errors
    ///
    /// Returns the last error observed.
    pub async fn run_write<T, F, Fut>(
        &self,
        operation: &'static str,
        call: F,
    ) -> Result<T, ContactRepositoryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ContactRepositoryError>>,
    {
        self.run_with(
            operation,
            self.max_attempts,
            |error| matches!(error, ContactRepositoryError::Connection { .. }),
            call,
        )
        .await
    }

    /// Run `call` once under the operation timeout, without retries.
    ///
    /// # Errors
    ///
    /// Returns the error of the single attempt.
    pub async fn run_once<T, F, Fut>(
        &self,
        operation: &'static str,
        call: F,
    ) -> Result<T, ContactRepositoryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ContactRepositoryError>>,
    {
        self.run_with(operation, 1, |_| false, call).await
    }

    async fn run_with<T, F, Fut>(
        &self,
        operation: &'static str,
        max_attempts: u32,
        retryable: fn(&ContactRepositoryError) -> bool,
        mut call: F,
    ) -> Result<T, ContactRepositoryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ContactRepositoryError>>,
    {
        let mut attempt = 1;
        loop {
            let outcome = match tokio::time::timeout(self.operation_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(ContactRepositoryError::timeout(format!(
                    "{operation} exceeded {}ms",
                    self.operation_timeout.as_millis()
                ))),
            };

            match outcome {
                Err(error) if retryable(&error) && attempt < max_attempts => {
                    let delay = self.backoff_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "transient contact store failure; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use rstest::rstest;

    use super::*;
    use crate::domain::ContactId;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::default()
            .with_initial_backoff(Duration::from_millis(1))
            .with_max_backoff(Duration::from_millis(2))
    }

    #[rstest]
    #[case(1, 200)]
    #[case(2, 400)]
    #[case(3, 800)]
    #[case(5, 3_200)]
    fn backoff_doubles_per_attempt(#[case] attempt: u32, #[case] expected_ms: u64) {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(attempt), Duration::from_millis(expected_ms));
    }

    #[rstest]
    fn backoff_is_capped() {
        let policy = RetryPolicy::default().with_max_backoff(Duration::from_secs(1));
        assert_eq!(policy.backoff_for(20), Duration::from_secs(1));
    }

    #[rstest]
    fn max_attempts_never_drops_below_one() {
        assert_eq!(RetryPolicy::default().with_max_attempts(0).max_attempts(), 1);
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = fast_policy()
            .run("list", || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ContactRepositoryError::connection("reset by peer"))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = fast_policy()
            .with_max_attempts(3)
            .run("list", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ContactRepositoryError::connection("refused"))
                }
            })
            .await;

        assert!(matches!(result, Err(ContactRepositoryError::Connection { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[rstest]
    #[case(ContactRepositoryError::duplicate_email())]
    #[case(ContactRepositoryError::not_found(ContactId::new(3)))]
    #[case(ContactRepositoryError::query("syntax error"))]
    #[tokio::test]
    async fn permanent_failures_are_not_retried(#[case] failure: ContactRepositoryError) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = fast_policy()
            .run("create", || {
                let counter = counter.clone();
                let failure = failure.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(failure)
                }
            })
            .await;

        assert_eq!(result, Err(failure));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_calls_time_out_and_are_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = fast_policy()
            .with_max_attempts(2)
            .with_operation_timeout(Duration::from_millis(50))
            .run("get", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                }
            })
            .await;

        assert!(matches!(result, Err(ContactRepositoryError::Timeout { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn writes_do_not_retry_timeouts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = fast_policy()
            .with_operation_timeout(Duration::from_millis(50))
            .run_write("create", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                }
            })
            .await;

        assert!(matches!(result, Err(ContactRepositoryError::Timeout { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn writes_retry_connection_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = fast_policy()
            .run_write("delete", || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(ContactRepositoryError::connection("refused"))
                    } else {
                        Ok(true)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(true));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn single_attempt_does_not_retry_connection_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = fast_policy()
            .run_once("ping", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ContactRepositoryError::connection("refused"))
                }
            })
            .await;

        assert!(matches!(result, Err(ContactRepositoryError::Connection { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
