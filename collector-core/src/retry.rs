//! Bounded retry with a fixed delay between attempts.

use std::{
    fmt::{self, Debug, Display},
    future::Future,
    time::Duration,
};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of tries, including the first.
    pub max_attempts: u32,
    /// Pause between two consecutive tries.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, delay: DEFAULT_DELAY }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), delay }
    }
}

/// Every attempt failed; carries the last error.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl<E: Display> Display for Exhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gave up after {} attempts: {}", self.attempts, self.last_error)
    }
}

impl<E: Display + Debug> std::error::Error for Exhausted<E> {}

/// Run `action` until it succeeds or `policy.max_attempts` is reached.
///
/// Sleeps `policy.delay` between attempts but not after the final one.
pub async fn attempt<T, E, F, Fut>(policy: &RetryPolicy, mut action: F) -> Result<T, Exhausted<E>>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max = policy.max_attempts.max(1);
    let mut n = 1;

    loop {
        match action().await {
            Ok(value) => {
                if n > 1 {
                    tracing::info!(attempt = n, "succeeded after retrying");
                }
                return Ok(value);
            }
            Err(e) if n < max => {
                tracing::warn!(
                    "Attempt {n}/{max} failed, retrying in {:?}: {e}",
                    policy.delay
                );
                tokio::time::sleep(policy.delay).await;
                n += 1;
            }
            Err(e) => return Err(Exhausted { attempts: n, last_error: e }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::Instant;

    #[test]
    fn default_policy_is_five_tries_five_seconds_apart() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay, Duration::from_secs(5));
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_returns_without_sleeping() {
        let start = Instant::now();
        let calls = Cell::new(0);

        let result: Result<u32, Exhausted<String>> = attempt(&RetryPolicy::default(), || {
            calls.set(calls.get() + 1);
            async { Ok(7) }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_last_attempt() {
        let start = Instant::now();
        let calls = Cell::new(0u32);

        let result = attempt(&RetryPolicy::default(), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { if n < 5 { Err(format!("refused #{n}")) } else { Ok(n) } }
        })
        .await;

        assert_eq!(result.unwrap(), 5);
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_reports_last_error() {
        let start = Instant::now();
        let calls = Cell::new(0u32);

        let result: Result<(), _> = attempt(&RetryPolicy::default(), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { Err(format!("refused #{n}")) }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 5);
        assert_eq!(err.last_error, "refused #5");
        assert_eq!(calls.get(), 5);
        // four pauses between five tries
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }
}
