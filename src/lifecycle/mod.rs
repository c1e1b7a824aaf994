//! Suite and scenario lifecycle.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Scenario`] | User-implemented scenario body |
//! | [`ScenarioContext`] | Worker-scoped handles passed to each attempt |
//! | [`SuiteRunner`] | Parallel workers, retries, teardown, reporting |
//! | [`SuiteSummary`] | Aggregate counts and per-scenario results |

// ============================================================================
// Submodules
// ============================================================================

/// Scenario trait and context.
pub mod scenario;

/// Suite orchestration.
pub mod suite;

// ============================================================================
// Re-exports
// ============================================================================

pub use scenario::{Scenario, ScenarioContext};
pub use suite::{
    ScenarioReport, ScenarioState, SuiteParameters, SuiteRunner, SuiteState, SuiteSummary,
};
