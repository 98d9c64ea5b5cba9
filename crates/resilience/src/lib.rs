//! # Junction Resilience
//!
//! Bounded retry with capped exponential backoff and jitter.
//!
//! Every retry loop in the workspace goes through [`retry_with_backoff_if`]:
//! cache-store calls, control-plane reloads and broker publishes all share
//! this one primitive, so "all retries are bounded" holds by construction.
//! No operation retries indefinitely.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;

/// Retry policy configuration.
///
/// The stock policies ([`store`](Self::store), [`reload`](Self::reload),
/// [`publish`](Self::publish)) are tuned per dependency; all keep the same
/// shape: a fixed attempt count and capped exponential backoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,

    /// Backoff before the second attempt.
    pub initial_backoff: Duration,

    /// Backoff multiplier (typically 2.0 for exponential).
    pub backoff_multiplier: f32,

    /// Upper bound on any single backoff.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy for transient cache-store errors: 5 attempts, 200ms initial,
    /// capped at 5s.
    pub fn store() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(5),
        }
    }

    /// Policy for control-plane reloads: 5 attempts, 1s initial, capped
    /// at 30s.
    pub fn reload() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
        }
    }

    /// Policy for broker publishes: 5 attempts, 4s initial, capped at 60s.
    pub fn publish() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(4),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(60),
        }
    }

    /// Backoff before attempt `attempt + 1` (0-indexed).
    ///
    /// Capped exponential with ±10% jitter to avoid thundering herds.
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        use rand::RngExt;

        let base_ms = self.initial_backoff.as_millis() as f32;
        let backoff_ms = base_ms * self.backoff_multiplier.powi(attempt as i32);

        let jitter = rand::rng().random_range(0.9..=1.1);
        let jittered_ms = (backoff_ms * jitter) as u64;

        Duration::from_millis(jittered_ms).min(self.max_backoff)
    }
}

/// Retry an async operation, only re-attempting errors `should_retry`
/// accepts.
///
/// Sleeps the policy's backoff between attempts (never after the last) and
/// returns the operation's own final error when attempts are exhausted or
/// the error is not retryable — retry never rewrites the error type.
pub async fn retry_with_backoff_if<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    operation_name: &str,
    should_retry: P,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                attempt += 1;

                if attempt >= policy.max_attempts.max(1) || !should_retry(&error) {
                    tracing::warn!(
                        operation = operation_name,
                        attempts = attempt,
                        error = %error,
                        "giving up"
                    );
                    return Err(error);
                }

                let backoff = policy.backoff_duration(attempt - 1);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts = policy.max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %error,
                    "attempt failed, backing off"
                );
                sleep(backoff).await;
            }
        }
    }
}

/// Retry an async operation, treating every error as retryable.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_with_backoff_if(policy, operation_name, |_| true, f).await
}
