//! Automation session ownership.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Session`] | Handle to one live remote session |
//! | [`SessionRegistry`] | Binds at most one session to each worker |

// ============================================================================
// Submodules
// ============================================================================

/// Live session handle.
pub mod handle;

/// Worker-keyed registry.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use handle::Session;
pub use registry::SessionRegistry;
