//! Caller-side retry policies
//!
//! The engine never retries on its own: after a transport fault the
//! caller cannot know which calls of a batch already ran server-side. When
//! the operation is known to be safe to repeat (reads, idempotent saves),
//! wrap it in [`retry`] with one of the strategies below.
//!
//! # Built-in Strategies
//!
//! - **ExponentialBackoff**: doubling delays up to a ceiling, optional jitter
//! - **FixedDelay**: constant delay between attempts
//! - **NoRetry**: run once
//!
//! Only [`Error::Transport`](cmdb_rpc_core::Error::Transport) triggers
//! another attempt. Protocol, argument and application faults are
//! returned immediately.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cmdb_rpc_client::{retry, CmdbClient, ExponentialBackoff};
//! use std::time::Duration;
//!
//! # async fn example(client: &CmdbClient) -> cmdb_rpc_core::Result<()> {
//! let mut policy = ExponentialBackoff::new(Duration::from_millis(200), Duration::from_secs(5))
//!     .with_max_attempts(4)
//!     .with_jitter();
//!
//! let version = retry(&mut policy, || async { client.idoit().version().await }).await?;
//! println!("{}", version);
//! # Ok(())
//! # }
//! ```

use cmdb_rpc_core::Result;
use std::future::Future;
use std::time::Duration;

/// Decides how long to wait before the next attempt, or whether to give up
///
/// `attempt` counts retries, starting at 0 for the first retry after the
/// initial failure. `reset` is called once an attempt succeeds.
pub trait RetryStrategy: Send + Sync {
    /// Delay before the next attempt; `None` gives up
    fn next_delay(&mut self, attempt: u32) -> Option<Duration>;

    /// Clear accumulated state after a success
    fn reset(&mut self);
}

/// Exponentially growing delays with an optional random spread
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    min_delay: Duration,
    max_delay: Duration,
    max_attempts: Option<u32>,
    jitter: bool,
    current_attempt: u32,
}

impl ExponentialBackoff {
    /// Start at `min_delay`, double each attempt, never exceed `max_delay`
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay,
            max_attempts: None,
            jitter: false,
            current_attempt: 0,
        }
    }

    /// Give up after `max_attempts` retries
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Add up to 25% random extra delay to each attempt
    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(250), Duration::from_secs(10))
            .with_max_attempts(3)
            .with_jitter()
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn next_delay(&mut self, attempt: u32) -> Option<Duration> {
        self.current_attempt = attempt;

        if let Some(max) = self.max_attempts {
            if attempt >= max {
                return None;
            }
        }

        let base = (self.min_delay.as_millis() as u64)
            .saturating_mul(2u64.saturating_pow(attempt));
        let delay = base.min(self.max_delay.as_millis() as u64);

        if self.jitter {
            use rand::Rng;
            let spread = rand::thread_rng().gen_range(0..=(delay / 4));
            return Some(Duration::from_millis(delay + spread));
        }

        Some(Duration::from_millis(delay))
    }

    fn reset(&mut self) {
        self.current_attempt = 0;
    }
}

/// Constant delay between attempts
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<u32>,
}

impl FixedDelay {
    /// Wait `delay` before every retry
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    /// Give up after `max_attempts` retries
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

impl RetryStrategy for FixedDelay {
    fn next_delay(&mut self, attempt: u32) -> Option<Duration> {
        match self.max_attempts {
            Some(max) if attempt >= max => None,
            _ => Some(self.delay),
        }
    }

    fn reset(&mut self) {}
}

/// Never retry
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryStrategy for NoRetry {
    fn next_delay(&mut self, _attempt: u32) -> Option<Duration> {
        None
    }

    fn reset(&mut self) {}
}

/// Run `op` until it succeeds, fails with a non-transport fault, or the
/// strategy gives up
///
/// The last error is returned when the strategy gives up.
pub async fn retry<S, F, Fut, T>(strategy: &mut S, mut op: F) -> Result<T>
where
    S: RetryStrategy + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => {
                strategy.reset();
                return Ok(value);
            }
            Err(err) if err.is_retryable() => match strategy.next_delay(attempt) {
                Some(delay) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying after transport failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    tracing::error!(attempts = attempt + 1, error = %err, "Giving up");
                    return Err(err);
                }
            },
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdb_rpc_core::{Error, ProtocolError, TransportError};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_exponential_backoff_doubles() {
        let mut strategy =
            ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(10))
                .with_max_attempts(5);

        assert_eq!(strategy.next_delay(0), Some(Duration::from_millis(100)));
        assert_eq!(strategy.next_delay(1), Some(Duration::from_millis(200)));
        assert_eq!(strategy.next_delay(2), Some(Duration::from_millis(400)));
    }

    #[test]
    fn test_exponential_backoff_caps_at_max_delay() {
        let mut strategy =
            ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(strategy.next_delay(10), Some(Duration::from_secs(1)));
        assert_eq!(strategy.next_delay(70), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_exponential_backoff_max_attempts_and_reset() {
        let mut strategy =
            ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(10))
                .with_max_attempts(2);

        assert!(strategy.next_delay(0).is_some());
        assert!(strategy.next_delay(1).is_some());
        assert!(strategy.next_delay(2).is_none());
        assert_eq!(strategy.current_attempt, 2);

        strategy.reset();
        assert_eq!(strategy.current_attempt, 0);
    }

    #[test]
    fn test_exponential_backoff_jitter_range() {
        let mut strategy =
            ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(10))
                .with_jitter();

        for _ in 0..50 {
            let delay = strategy.next_delay(0).unwrap();
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(125));
        }
    }

    #[test]
    fn test_fixed_delay_and_no_retry() {
        let mut fixed = FixedDelay::new(Duration::from_millis(50)).with_max_attempts(2);
        assert_eq!(fixed.next_delay(0), Some(Duration::from_millis(50)));
        assert_eq!(fixed.next_delay(1), Some(Duration::from_millis(50)));
        assert!(fixed.next_delay(2).is_none());

        assert!(NoRetry.next_delay(0).is_none());
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transport_fault() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let mut strategy = FixedDelay::new(Duration::from_millis(1)).with_max_attempts(3);

        let result = retry(&mut strategy, move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::from(TransportError::Timeout))
            } else {
                Ok("1.18")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "1.18");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_with_last_error() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let mut strategy = FixedDelay::new(Duration::from_millis(1)).with_max_attempts(2);

        let result: Result<()> = retry(&mut strategy, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::Request("connection refused".into()).into())
        })
        .await;

        assert!(matches!(result, Err(Error::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_never_repeats_other_faults() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let mut strategy = FixedDelay::new(Duration::from_millis(1)).with_max_attempts(5);

        let result: Result<()> = retry(&mut strategy, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ProtocolError::UnknownId(9).into())
        })
        .await;

        assert!(matches!(result, Err(Error::Protocol(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_retry_runs_once() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = retry(&mut NoRetry, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::Timeout.into())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
