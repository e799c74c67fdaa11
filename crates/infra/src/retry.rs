//! Bounded exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

/// Retry budget: `max_attempts` tries, waiting `base_delay * factor^(n-1)`
/// after failed attempt `n`. No jitter and no cap.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
            factor: 2,
        }
    }
}

impl RetryPolicy {
    /// Retry without waiting between attempts (tests, local tooling).
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            factor: 1,
        }
    }

    /// Wait after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        match self.factor.checked_pow(exponent) {
            Some(multiplier) => self.base_delay.saturating_mul(multiplier),
            None => Duration::MAX,
        }
    }
}

/// Every attempt failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Run `op` until it succeeds or the policy's attempt budget is spent.
///
/// `op` receives the 1-based attempt number. There is no wait after the
/// final failed attempt.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: core::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if attempt >= max_attempts => {
                warn!(operation, attempt, error = %err, "attempt failed; retry budget exhausted");
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: err,
                });
            }
            Err(err) => {
                let delay = policy.delay_after(attempt);
                warn!(operation, attempt, error = %err, ?delay, "attempt failed; retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[test]
    fn default_policy_doubles_from_one_second() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (1..=9).map(|n| policy.delay_after(n).as_secs()).collect();

        assert_eq!(policy.max_attempts, 10);
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 32, 64, 128, 256]);
    }

    #[test]
    fn delay_saturates_instead_of_overflowing() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(200), Duration::MAX);
    }

    #[test]
    fn immediate_policy_never_waits() {
        let policy = RetryPolicy::immediate(5);
        assert!((1..=5).all(|n| policy.delay_after(n).is_zero()));
    }

    /// Records the (paused) clock at the start of every attempt.
    fn recorder() -> (Arc<Mutex<Vec<Instant>>>, impl Fn() -> u32 + Clone) {
        let starts = Arc::new(Mutex::new(Vec::new()));
        let handle = starts.clone();
        let record = move || {
            let mut starts = handle.lock().unwrap();
            starts.push(Instant::now());
            starts.len() as u32
        };
        (starts, record)
    }

    fn gaps_in_secs(starts: &[Instant]) -> Vec<u64> {
        starts
            .windows(2)
            .map(|w| (w[1] - w[0]).as_secs())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_tenth_attempt_after_nine_backoffs() {
        let (starts, record) = recorder();

        let result = retry_with_backoff(&RetryPolicy::default(), "connect", |attempt| {
            let record = record.clone();
            async move {
                record();
                if attempt < 10 {
                    Err(format!("refused on attempt {attempt}"))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 10);
        let starts = starts.lock().unwrap();
        assert_eq!(starts.len(), 10);
        assert_eq!(gaps_in_secs(&starts), vec![1, 2, 4, 8, 16, 32, 64, 128, 256]);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_tenth_failure_without_trailing_wait() {
        let (starts, record) = recorder();
        let began = Instant::now();

        let result: Result<(), _> =
            retry_with_backoff(&RetryPolicy::default(), "connect", |attempt| {
                let record = record.clone();
                async move {
                    record();
                    Err(format!("refused on attempt {attempt}"))
                }
            })
            .await;

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 10);
        assert_eq!(exhausted.last_error, "refused on attempt 10");
        assert_eq!(starts.lock().unwrap().len(), 10);
        assert_eq!(began.elapsed().as_secs(), 511);
    }

    #[tokio::test]
    async fn first_success_needs_no_retry() {
        let mut calls = 0;
        let result: Result<&str, RetryExhausted<String>> =
            retry_with_backoff(&RetryPolicy::default(), "connect", |_| {
                calls += 1;
                async { Ok("connected") }
            })
            .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn zero_attempt_budget_still_tries_once() {
        let mut calls = 0;
        let result: Result<(), _> =
            retry_with_backoff(&RetryPolicy::immediate(0), "connect", |_| {
                calls += 1;
                async { Err("down") }
            })
            .await;

        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(calls, 1);
    }
}
