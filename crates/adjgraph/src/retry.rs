//! Bounded retry for optimistic transactions.
//!
//! [`retry`] knows nothing about graphs or engines: it re-runs an operation
//! while the caller-supplied predicate says the error is retryable, up to
//! [`RetryPolicy::max_attempts`] attempts. Each attempt must redo its work from
//! scratch; [`GraphStore::update`](crate::GraphStore::update) builds on this by
//! opening a fresh transaction per attempt.

use log::debug;
use serde::{Deserialize, Serialize};

/// Attempts made before a conflict is treated as final.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// How many times an operation may be attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// Policy allowing `max_attempts` attempts.
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Policy that never retries.
    pub fn no_retry() -> Self {
        Self { max_attempts: 1 }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent.
///
/// `op` receives the 1-based attempt number. On exhaustion the error from the
/// last attempt is returned unchanged.
///
/// ```
/// use adjgraph::retry::{retry, RetryPolicy};
///
/// let mut calls = 0;
/// let result: Result<u32, &str> = retry(
///     RetryPolicy::new(5),
///     |e| *e == "busy",
///     |attempt| {
///         calls += 1;
///         if attempt < 3 { Err("busy") } else { Ok(attempt) }
///     },
/// );
/// assert_eq!(result, Ok(3));
/// assert_eq!(calls, 3);
/// ```
pub fn retry<T, E, P, F>(policy: RetryPolicy, is_retryable: P, mut op: F) -> Result<T, E>
where
    P: Fn(&E) -> bool,
    F: FnMut(u32) -> Result<T, E>,
{
    let max = policy.attempts();
    let mut attempt = 1;

    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max && is_retryable(&err) => {
                debug!("Retryable failure on attempt {attempt}/{max}, retrying");
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Conflict,
        Fatal,
    }

    fn is_conflict(e: &TestError) -> bool {
        *e == TestError::Conflict
    }

    #[test]
    fn test_success_on_first_attempt() {
        let mut calls = 0;
        let result: Result<&str, TestError> = retry(RetryPolicy::default(), is_conflict, |_| {
            calls += 1;
            Ok("done")
        });
        assert_eq!(result, Ok("done"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_retries_until_success() {
        let mut seen = Vec::new();
        let result = retry(RetryPolicy::new(4), is_conflict, |attempt| {
            seen.push(attempt);
            if attempt < 4 {
                Err(TestError::Conflict)
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(result, Ok(4));
        assert_eq!(seen, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_non_retryable_error_stops_immediately() {
        let mut calls = 0;
        let result: Result<(), TestError> = retry(RetryPolicy::default(), is_conflict, |_| {
            calls += 1;
            Err(TestError::Fatal)
        });
        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_exhaustion_returns_last_error() {
        let mut calls = 0;
        let result: Result<(), TestError> = retry(RetryPolicy::new(3), is_conflict, |_| {
            calls += 1;
            Err(TestError::Conflict)
        });
        assert_eq!(result, Err(TestError::Conflict));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let mut calls = 0;
        let result: Result<(), TestError> = retry(RetryPolicy::new(0), is_conflict, |_| {
            calls += 1;
            Err(TestError::Conflict)
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_default_policy() {
        assert_eq!(RetryPolicy::default().max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(RetryPolicy::no_retry().max_attempts, 1);
    }
}
