//! W3C WebDriver wire protocol types.
//!
//! This module defines the HTTP commands sent to an Appium-compatible
//! automation server and the response envelope it returns.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Shape |
//! |---------|-----------|-------|
//! | [`Command`] | Harness → Server | HTTP method + path + JSON body |
//! | [`Response`] | Server → Harness | `{"value": ...}` |
//! | [`WireError`] | Server → Harness | `{"value": {"error", "message"}}` |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command definitions and routing |
//! | `response` | Response envelope and error mapping |

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions.
pub mod command;

/// Response envelope and error mapping.
pub mod response;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, Method};
pub use response::{ELEMENT_KEY, LEGACY_ELEMENT_KEY, Response, WireError};
