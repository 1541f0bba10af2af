//! Retry utilities with exponential backoff for resilient API calls.
//!
//! Attempts run strictly one after another. Each attempt races a timeout, and the
//! future of a timed-out attempt is dropped, which closes its connection. Between
//! failed attempts the caller sleeps for
//! `min(initial_backoff * 2^n + jitter, max_backoff)` where `jitter` is uniform in
//! `[0, max_jitter)`. A [`CancellationToken`] interrupts both the in-flight attempt
//! and the backoff sleep.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

use crate::sources::{ArxivError, FetchFailure};

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of attempts, the first one included
    pub max_attempts: u32,
    /// Time allowed for a single attempt
    pub timeout: Duration,
    /// Delay after the first failed attempt, before jitter
    pub initial_backoff: Duration,
    /// Upper bound for any single delay
    pub max_backoff: Duration,
    /// Exclusive upper bound of the random jitter added to each delay
    pub max_jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_millis(15_000),
            initial_backoff: Duration::from_millis(1_000),
            max_backoff: Duration::from_millis(10_000),
            max_jitter: Duration::from_millis(1_000),
        }
    }
}

impl RetryConfig {
    /// Set the number of attempts
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set initial and maximum backoff
    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Set the jitter bound
    pub fn max_jitter(mut self, jitter: Duration) -> Self {
        self.max_jitter = jitter;
        self
    }

    /// Delay to wait after failed attempt `attempt` (0-indexed)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponential = self
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt));
        let bound = self.max_jitter.as_millis().min(u64::MAX as u128) as u64;
        let jitter = if bound == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..bound))
        };
        exponential.saturating_add(jitter).min(self.max_backoff)
    }
}

/// How one attempt ended, as reported by the operation
#[derive(Debug)]
pub enum AttemptError {
    /// Worth another attempt after backing off
    Retryable(FetchFailure),
    /// Stop immediately, no backoff
    Fatal(ArxivError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttemptOutcome {
    Success,
    Retryable(FetchFailure),
    Fatal,
}

/// Bookkeeping for one iteration of the retry loop
#[derive(Debug, Clone)]
pub(crate) struct FetchAttempt {
    pub(crate) attempt: u32,
    /// Sleep taken after this attempt (zero for the last one)
    pub(crate) backoff: Duration,
    pub(crate) outcome: AttemptOutcome,
}

/// Execute an async operation with retry logic
///
/// # Arguments
///
/// * `config` - Retry configuration
/// * `cancel` - Token that aborts the whole operation
/// * `operation` - Produces one attempt; called again for every retry
///
/// # Returns
///
/// The first successful value, the first fatal error, [`ArxivError::FetchExhausted`]
/// once every attempt failed, or [`ArxivError::Cancelled`].
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    operation: F,
) -> Result<T, ArxivError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let (result, history) = run_attempts(config, cancel, operation).await;

    if let Some(last) = history.last() {
        let total_backoff: Duration = history.iter().map(|a| a.backoff).sum();
        tracing::debug!(
            attempts = last.attempt + 1,
            ?total_backoff,
            outcome = ?last.outcome,
            "fetch finished"
        );
    }

    result
}

pub(crate) async fn run_attempts<T, F, Fut>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut operation: F,
) -> (Result<T, ArxivError>, Vec<FetchAttempt>)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut history = Vec::with_capacity(max_attempts as usize);
    let mut attempt = 0;

    loop {
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => return (Err(ArxivError::Cancelled), history),
            outcome = timeout(config.timeout, operation()) => outcome,
        };

        let failure = match outcome {
            Ok(Ok(value)) => {
                if attempt > 0 {
                    tracing::info!(
                        "Request succeeded on attempt {} after {} transient failures",
                        attempt + 1,
                        attempt
                    );
                }
                history.push(FetchAttempt {
                    attempt,
                    backoff: Duration::ZERO,
                    outcome: AttemptOutcome::Success,
                });
                return (Ok(value), history);
            }
            Ok(Err(AttemptError::Fatal(error))) => {
                history.push(FetchAttempt {
                    attempt,
                    backoff: Duration::ZERO,
                    outcome: AttemptOutcome::Fatal,
                });
                return (Err(error), history);
            }
            Ok(Err(AttemptError::Retryable(failure))) => failure,
            Err(_) => FetchFailure::Timeout(config.timeout),
        };

        if attempt + 1 >= max_attempts {
            tracing::warn!(
                "Request failed after {} attempts: {}",
                max_attempts,
                failure
            );
            history.push(FetchAttempt {
                attempt,
                backoff: Duration::ZERO,
                outcome: AttemptOutcome::Retryable(failure.clone()),
            });
            return (
                Err(ArxivError::FetchExhausted {
                    attempts: max_attempts,
                    last: failure,
                }),
                history,
            );
        }

        let delay = config.backoff_delay(attempt);
        tracing::debug!(
            "Transient error on attempt {}: {}, retrying in {:?}",
            attempt + 1,
            failure,
            delay
        );
        history.push(FetchAttempt {
            attempt,
            backoff: delay,
            outcome: AttemptOutcome::Retryable(failure),
        });

        tokio::select! {
            biased;
            () = cancel.cancelled() => return (Err(ArxivError::Cancelled), history),
            () = sleep(delay) => {}
        }

        attempt += 1;
    }
}
