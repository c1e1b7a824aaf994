//! Error types for the mobile harness.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use mobile_harness::{Error, Result};
//!
//! async fn example(page: &Interactor) -> Result<()> {
//!     page.click(&login_button).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::MissingConfiguration`], [`Error::InvalidConfiguration`], [`Error::UnsupportedPlatform`] |
//! | Session | [`Error::SessionCreation`], [`Error::NotInitialized`], [`Error::SessionClosed`] |
//! | Element | [`Error::NoLocator`], [`Error::ElementNotFound`], [`Error::StaleElement`], [`Error::InteractionTimeout`] |
//! | Remote | [`Error::Remote`], [`Error::Transport`] |
//! | Scenario | [`Error::Assertion`], [`Error::Skipped`], [`Error::ScenarioPanicked`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::Toml`], [`Error::Http`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::capabilities::Platform;
use crate::identifiers::{ElementId, SessionId, WorkerId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for the failure report.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when a configuration source cannot be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// A required configuration key is absent.
    #[error("Missing configuration: {key}")]
    MissingConfiguration {
        /// The missing key.
        key: String,
    },

    /// A configuration value could not be parsed.
    #[error("Invalid configuration: {key}={value:?} (expected {expected})")]
    InvalidConfiguration {
        /// The offending key.
        key: String,
        /// The raw value found.
        value: String,
        /// Description of the accepted values.
        expected: &'static str,
    },

    /// Platform name outside {Android, iOS}.
    #[error("Unsupported platform: {platform}")]
    UnsupportedPlatform {
        /// The rejected platform name.
        platform: String,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Remote session could not be created.
    ///
    /// Fatal to the calling scenario. Never retried by the registry.
    #[error("Session creation failed: {message}")]
    SessionCreation {
        /// Description of the failure.
        message: String,
    },

    /// Operation requested before a session exists for the worker.
    #[error("No session initialized for {worker}")]
    NotInitialized {
        /// Worker that has no live session.
        worker: WorkerId,
    },

    /// The remote session is gone (quit or expired server-side).
    #[error("Session closed: {session_id}")]
    SessionClosed {
        /// The closed session's ID.
        session_id: SessionId,
    },

    // ========================================================================
    // Element Errors
    // ========================================================================
    /// Element reference has no locator for the session's platform.
    #[error("Element '{element}' has no locator for {platform}")]
    NoLocator {
        /// Human-readable element name.
        element: String,
        /// Platform of the active session.
        platform: Platform,
    },

    /// Locator matched no element.
    #[error("Element not found: {locator}")]
    ElementNotFound {
        /// Locator used, as `strategy=value`.
        locator: String,
    },

    /// Element reference is no longer attached to the UI tree.
    #[error("Stale element: {element_id}")]
    StaleElement {
        /// The stale element's ID.
        element_id: ElementId,
    },

    /// Bounded wait elapsed before the element reached the condition.
    #[error("Timed out after {timeout_ms}ms waiting for '{element}' to become {condition}")]
    InteractionTimeout {
        /// Human-readable element name.
        element: String,
        /// Condition waited for (visible, clickable, hidden).
        condition: &'static str,
        /// Configured bound in milliseconds.
        timeout_ms: u64,
    },

    // ========================================================================
    // Remote Errors
    // ========================================================================
    /// Automation server returned a W3C error.
    #[error("Remote error [{code}]: {message}")]
    Remote {
        /// W3C error code (e.g. `invalid argument`).
        code: String,
        /// Server-provided message.
        message: String,
    },

    /// Unexpected response shape or HTTP status.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    // ========================================================================
    // Scenario Errors
    // ========================================================================
    /// Scenario assertion failed.
    #[error("Assertion failed: {message}")]
    Assertion {
        /// Description of the failed expectation.
        message: String,
    },

    /// Scenario asked to be skipped.
    #[error("Skipped: {reason}")]
    Skipped {
        /// Why the scenario was skipped.
        reason: String,
    },

    /// Scenario body panicked.
    #[error("Scenario panicked: {message}")]
    ScenarioPanicked {
        /// Panic payload, if it was a string.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a missing configuration error.
    #[inline]
    pub fn missing_configuration(key: impl Into<String>) -> Self {
        Self::MissingConfiguration { key: key.into() }
    }

    /// Creates an invalid configuration error.
    #[inline]
    pub fn invalid_configuration(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::InvalidConfiguration {
            key: key.into(),
            value: value.into(),
            expected,
        }
    }

    /// Creates an unsupported platform error.
    #[inline]
    pub fn unsupported_platform(platform: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            platform: platform.into(),
        }
    }

    /// Creates a session creation error.
    #[inline]
    pub fn session_creation(message: impl Into<String>) -> Self {
        Self::SessionCreation {
            message: message.into(),
        }
    }

    /// Creates a not-initialized error.
    #[inline]
    pub fn not_initialized(worker: WorkerId) -> Self {
        Self::NotInitialized { worker }
    }

    /// Creates a session closed error.
    #[inline]
    pub fn session_closed(session_id: SessionId) -> Self {
        Self::SessionClosed { session_id }
    }

    /// Creates a missing locator error.
    #[inline]
    pub fn no_locator(element: impl Into<String>, platform: Platform) -> Self {
        Self::NoLocator {
            element: element.into(),
            platform,
        }
    }

    /// Creates an element not found error.
    #[inline]
    pub fn element_not_found(locator: impl Into<String>) -> Self {
        Self::ElementNotFound {
            locator: locator.into(),
        }
    }

    /// Creates a stale element error.
    #[inline]
    pub fn stale_element(element_id: ElementId) -> Self {
        Self::StaleElement { element_id }
    }

    /// Creates an interaction timeout error.
    #[inline]
    pub fn interaction_timeout(
        element: impl Into<String>,
        condition: &'static str,
        timeout_ms: u64,
    ) -> Self {
        Self::InteractionTimeout {
            element: element.into(),
            condition,
            timeout_ms,
        }
    }

    /// Creates a remote error.
    #[inline]
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an assertion error.
    #[inline]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    /// Creates a skip request.
    #[inline]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// Creates a scenario panic error.
    #[inline]
    pub fn scenario_panicked(message: impl Into<String>) -> Self {
        Self::ScenarioPanicked {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::InteractionTimeout { .. })
            || matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Returns `true` if the element may still appear on a later poll.
    #[inline]
    #[must_use]
    pub fn is_element_error(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. } | Self::StaleElement { .. }
        )
    }

    /// Returns `true` if this is a configuration error.
    #[inline]
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::MissingConfiguration { .. }
                | Self::InvalidConfiguration { .. }
                | Self::UnsupportedPlatform { .. }
        )
    }

    /// Returns `true` if the error ends the scenario without any caller
    /// recovery path.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.is_config_error()
            || matches!(
                self,
                Self::SessionCreation { .. }
                    | Self::NotInitialized { .. }
                    | Self::SessionClosed { .. }
            )
    }

    /// Returns `true` if this is a skip request rather than a failure.
    #[inline]
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::session_creation("connection refused");
        assert_eq!(
            err.to_string(),
            "Session creation failed: connection refused"
        );
    }

    #[test]
    fn test_timeout_display_names_element_and_bound() {
        let err = Error::interaction_timeout("Home Screen", "visible", 10_000);
        let message = err.to_string();
        assert!(message.contains("'Home Screen'"));
        assert!(message.contains("10000ms"));
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::interaction_timeout("Login", "clickable", 500);
        let other_err = Error::config("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_element_error() {
        assert!(Error::element_not_found("id=login").is_element_error());
        assert!(Error::stale_element(ElementId::new("e1")).is_element_error());
        assert!(!Error::remote("unknown error", "boom").is_element_error());
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::unsupported_platform("windows").is_fatal());
        assert!(Error::missing_configuration("ios.bundle.id").is_fatal());
        assert!(Error::not_initialized(WorkerId::new(1)).is_fatal());
        assert!(!Error::interaction_timeout("x", "visible", 1).is_fatal());
    }

    #[test]
    fn test_is_skip() {
        assert!(Error::skipped("not on this device").is_skip());
        assert!(!Error::assertion("nope").is_skip());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
