//! Bounded per-scenario retry.
//!
//! A failed attempt is retried while the scenario's retry count is below the
//! maximum. A retried attempt is rewritten to a transient skip so it does not
//! count as a failure. When the count reaches the maximum, the failure stands
//! and the counter is discarded.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::identifiers::ScenarioId;
use crate::reporting::Level;

// ============================================================================
// TestOutcome
// ============================================================================

/// Outcome of one scenario attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TestOutcome {
    /// The attempt passed.
    Passed,
    /// The attempt failed.
    Failed {
        /// Failure message.
        cause: String,
    },
    /// The attempt was skipped.
    Skipped {
        /// Skip reason.
        reason: String,
        /// `true` if the skip stands for a failure that will be retried.
        transient: bool,
    },
}

impl TestOutcome {
    /// Creates a failed outcome.
    #[must_use]
    pub fn failed(cause: impl Into<String>) -> Self {
        Self::Failed {
            cause: cause.into(),
        }
    }

    /// Creates a non-transient skip.
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
            transient: false,
        }
    }

    /// Returns `true` for `Passed`.
    #[inline]
    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Returns `true` for `Failed`.
    #[inline]
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Returns `true` for a transient skip.
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Skipped { transient: true, .. })
    }

    /// Returns the report level for this outcome.
    #[must_use]
    pub fn level(&self) -> Level {
        match self {
            Self::Passed => Level::Pass,
            Self::Failed { .. } => Level::Fail,
            Self::Skipped { .. } => Level::Skip,
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::Failed { cause } => write!(f, "failed: {cause}"),
            Self::Skipped { reason, .. } => write!(f, "skipped: {reason}"),
        }
    }
}

// ============================================================================
// RetryState
// ============================================================================

/// Retry state of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// No failed attempt recorded.
    Fresh,
    /// This many retries have been granted.
    Retrying(u32),
}

// ============================================================================
// RetryPolicy
// ============================================================================

/// Retry decisions keyed by scenario.
///
/// Counters are shared across workers; each decision holds the lock only
/// for the increment.
#[derive(Debug)]
pub struct RetryPolicy {
    max_retries: u32,
    counters: Mutex<FxHashMap<ScenarioId, u32>>,
}

impl RetryPolicy {
    /// Creates a policy allowing `max_retries` retries per scenario.
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            counters: Mutex::new(FxHashMap::default()),
        }
    }

    /// Returns the retry bound.
    #[inline]
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the scenario's retry state.
    #[must_use]
    pub fn state(&self, scenario: &ScenarioId) -> RetryState {
        match self.counters.lock().get(scenario) {
            Some(&n) => RetryState::Retrying(n),
            None => RetryState::Fresh,
        }
    }

    /// Decides whether the attempt should run again.
    ///
    /// Only `Failed` outcomes are retried; any other outcome discards the
    /// scenario's counter. When a retry is granted the
    /// outcome is rewritten in place to a transient skip. When the bound is
    /// reached the outcome is left failed and the counter is discarded.
    pub fn should_retry(&self, scenario: &ScenarioId, outcome: &mut TestOutcome) -> bool {
        let cause = match outcome {
            TestOutcome::Failed { cause } => cause.clone(),
            _ => {
                self.counters.lock().remove(scenario);
                return false;
            }
        };

        let granted = {
            let mut counters = self.counters.lock();
            let count = counters.entry(scenario.clone()).or_insert(0);
            if *count < self.max_retries {
                *count += 1;
                Some(*count)
            } else {
                counters.remove(scenario);
                None
            }
        };

        match granted {
            Some(attempt) => {
                info!(
                    scenario = %scenario,
                    attempt,
                    max = self.max_retries,
                    "Retrying failed scenario"
                );
                *outcome = TestOutcome::Skipped {
                    reason: format!(
                        "Retry {attempt}/{} after failure: {cause}",
                        self.max_retries
                    ),
                    transient: true,
                };
                true
            }
            None => {
                warn!(scenario = %scenario, max = self.max_retries, "Retries exhausted");
                false
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
