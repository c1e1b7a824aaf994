//! HTTP transport layer.
//!
//! This module carries [`crate::protocol::Command`]s to an Appium-compatible
//! automation server over HTTP and hands back the decoded payload.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Harness (Rust) │           HTTP/JSON          │  Automation     │
//! │                 │◄────────────────────────────►│  Server         │
//! │  HttpTransport  │      {base}/session/...      │  (Appium)       │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `http` | reqwest-backed request execution |

// ============================================================================
// Submodules
// ============================================================================

/// reqwest-backed request execution.
pub mod http;

// ============================================================================
// Re-exports
// ============================================================================

pub use http::{DEFAULT_REQUEST_TIMEOUT, HttpTransport};
