//! Result of one element probe.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// InteractionOutcome
// ============================================================================

/// Outcome of probing an element condition.
///
/// `NotReady` is never returned to callers of the public waits: the poll
/// loop either retries it or converts it into a timeout.
#[derive(Debug)]
pub enum InteractionOutcome<T> {
    /// The condition holds.
    Success(T),
    /// The condition does not hold yet; carries the elapsed wait.
    NotReady(Duration),
    /// The probe failed with a non-retryable error, or the wait timed out.
    Failed(Error),
}

impl<T> InteractionOutcome<T> {
    /// Returns `true` for `Success`.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Converts into a `Result`.
    ///
    /// # Errors
    ///
    /// - The carried error for `Failed`
    /// - [`Error::Transport`] for `NotReady`, which should not escape a wait
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failed(err) => Err(err),
            Self::NotReady(elapsed) => Err(Error::transport(format!(
                "condition still pending after {}ms",
                elapsed.as_millis()
            ))),
        }
    }

    /// Maps the success value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> InteractionOutcome<U> {
        match self {
            Self::Success(value) => InteractionOutcome::Success(f(value)),
            Self::NotReady(elapsed) => InteractionOutcome::NotReady(elapsed),
            Self::Failed(err) => InteractionOutcome::Failed(err),
        }
    }
}

impl<T> From<Result<T>> for InteractionOutcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Failed(err),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
