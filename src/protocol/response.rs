//! W3C response envelope and error mapping.
//!
//! Every WebDriver response is `{"value": ...}`. Errors carry
//! `{"value": {"error": code, "message": msg}}`.
//!
//! | W3C code | Harness error |
//! |----------|---------------|
//! | `no such element` | [`Error::ElementNotFound`] |
//! | `stale element reference` | [`Error::StaleElement`] |
//! | `invalid session id` | [`Error::SessionClosed`] |
//! | `session not created` | [`Error::SessionCreation`] |
//! | anything else | [`Error::Remote`] |

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{ElementId, SessionId};

use super::Command;

// ============================================================================
// Constants
// ============================================================================

/// W3C element reference key.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Legacy JSONWP element reference key.
pub const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

// ============================================================================
// Response
// ============================================================================

/// Response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Payload, or the error object.
    #[serde(default)]
    pub value: Value,
}

impl Response {
    /// Returns the wire error if the payload is an error object.
    #[must_use]
    pub fn error(&self) -> Option<WireError> {
        let code = self.value.get("error")?.as_str()?;
        let message = self
            .value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(code);

        Some(WireError {
            code: code.to_string(),
            message: message.to_string(),
        })
    }

    /// Extracts the payload, mapping wire errors through `command`.
    ///
    /// # Errors
    ///
    /// Returns the mapped error if the payload is an error object.
    pub fn into_result(self, command: &Command, session: Option<&SessionId>) -> Result<Value> {
        match self.error() {
            Some(err) => Err(err.into_error(command, session)),
            None => Ok(self.value),
        }
    }
}

// ============================================================================
// WireError
// ============================================================================

/// W3C error object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireError {
    /// W3C error code.
    pub code: String,
    /// Server message.
    pub message: String,
}

impl WireError {
    /// Maps to a harness error, using the command for context.
    #[must_use]
    pub fn into_error(self, command: &Command, session: Option<&SessionId>) -> Error {
        match self.code.as_str() {
            "no such element" => match command {
                Command::FindElement { by } => Error::element_not_found(by.to_string()),
                _ => Error::element_not_found(self.message),
            },
            "stale element reference" => match command.element() {
                Some(element) => Error::stale_element(element.clone()),
                None => Error::remote(self.code, self.message),
            },
            "invalid session id" => match session {
                Some(id) => Error::session_closed(id.clone()),
                None => Error::remote(self.code, self.message),
            },
            "session not created" => Error::session_creation(self.message),
            _ => Error::remote(self.code, self.message),
        }
    }
}

// ============================================================================
// Payload Helpers
// ============================================================================

/// Extracts an element ID from a find-element payload.
///
/// # Errors
///
/// Returns [`Error::Transport`] if neither reference key is present.
pub fn element_id(value: &Value) -> Result<ElementId> {
    value
        .get(ELEMENT_KEY)
        .or_else(|| value.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(ElementId::new)
        .ok_or_else(|| Error::transport(format!("response has no element reference: {value}")))
}

/// Extracts a boolean payload.
///
/// # Errors
///
/// Returns [`Error::Transport`] if the payload is not a boolean.
pub fn as_bool(value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| Error::transport(format!("expected boolean, got {value}")))
}

/// Extracts a string payload.
///
/// # Errors
///
/// Returns [`Error::Transport`] if the payload is not a string.
pub fn as_string(value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::transport(format!("expected string, got {value}")))
}

// ============================================================================
// Tests
// ============================================================================
