//! Suite reporting.
//!
//! The [`Reporter`] holds one active [`TestHandle`] per worker. Interaction
//! and lifecycle code log [`ReportEvent`]s against a [`WorkerId`]; the
//! reporter routes them to that worker's unit. [`Reporter::flush`] hands the
//! assembled [`ReportDocument`] to a [`ReportWriter`].
//!
//! | Module | Description |
//! |--------|-------------|
//! | `event` | [`Level`] and [`ReportEvent`] |
//! | `reporter` | [`Reporter`] and [`TestHandle`] |
//! | `writer` | Document model, JSON and in-memory writers |
//!
//! [`WorkerId`]: crate::identifiers::WorkerId

// ============================================================================
// Submodules
// ============================================================================

/// Event types.
pub mod event;

/// Reporter and test units.
pub mod reporter;

/// Document model and writers.
pub mod writer;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{Level, ReportEvent};
pub use reporter::{Reporter, TestHandle};
pub use writer::{JsonFileWriter, MemoryWriter, ReportDocument, ReportWriter, TestRecord};
