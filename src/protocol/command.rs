//! W3C WebDriver command definitions.
//!
//! Each [`Command`] knows its HTTP method, its path relative to the server
//! base URL, and its JSON body. Only the subset of endpoints the harness
//! drives is modeled.
//!
//! | Command | Method | Path |
//! |---------|--------|------|
//! | `NewSession` | POST | `session` |
//! | `DeleteSession` | DELETE | `session/{id}` |
//! | `SetTimeouts` | POST | `session/{id}/timeouts` |
//! | `FindElement` | POST | `session/{id}/element` |
//! | `IsDisplayed` | GET | `session/{id}/element/{el}/displayed` |
//! | `IsEnabled` | GET | `session/{id}/element/{el}/enabled` |
//! | `GetRect` | GET | `session/{id}/element/{el}/rect` |
//! | `GetText` | GET | `session/{id}/element/{el}/text` |
//! | `Click` | POST | `session/{id}/element/{el}/click` |
//! | `Clear` | POST | `session/{id}/element/{el}/clear` |
//! | `SendKeys` | POST | `session/{id}/element/{el}/value` |
//! | `Screenshot` | GET | `session/{id}/screenshot` |
//! | `Back` | POST | `session/{id}/back` |
//! | `ExecuteScript` | POST | `session/{id}/execute/sync` |

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::identifiers::{ElementId, SessionId};
use crate::locator::By;

// ============================================================================
// Method
// ============================================================================

/// HTTP method of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET, no body.
    Get,
    /// POST with a JSON body.
    Post,
    /// DELETE, no body.
    Delete,
}

// ============================================================================
// Command
// ============================================================================

/// One WebDriver command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a session.
    NewSession {
        /// W3C `capabilities` object.
        capabilities: Value,
    },

    /// Delete the session.
    DeleteSession,

    /// Set the implicit wait.
    SetTimeouts {
        /// Implicit wait in milliseconds.
        implicit_ms: u64,
    },

    /// Find one element.
    FindElement {
        /// Locator strategy and value.
        by: By,
    },

    /// Query element visibility.
    IsDisplayed {
        /// Target element.
        element: ElementId,
    },

    /// Query element enabled state.
    IsEnabled {
        /// Target element.
        element: ElementId,
    },

    /// Query element bounds.
    GetRect {
        /// Target element.
        element: ElementId,
    },

    /// Read element text.
    GetText {
        /// Target element.
        element: ElementId,
    },

    /// Tap the element.
    Click {
        /// Target element.
        element: ElementId,
    },

    /// Clear an editable element.
    Clear {
        /// Target element.
        element: ElementId,
    },

    /// Type into an editable element.
    SendKeys {
        /// Target element.
        element: ElementId,
        /// Text to type.
        text: String,
    },

    /// Capture the viewport as base64 PNG.
    Screenshot,

    /// Platform back navigation.
    Back,

    /// Execute a synchronous script (Appium `mobile:` extensions).
    ExecuteScript {
        /// Script name, e.g. `mobile: scroll`.
        script: String,
        /// Script arguments.
        args: Vec<Value>,
    },
}

impl Command {
    /// Returns the command name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewSession { .. } => "newSession",
            Self::DeleteSession => "deleteSession",
            Self::SetTimeouts { .. } => "setTimeouts",
            Self::FindElement { .. } => "findElement",
            Self::IsDisplayed { .. } => "isElementDisplayed",
            Self::IsEnabled { .. } => "isElementEnabled",
            Self::GetRect { .. } => "getElementRect",
            Self::GetText { .. } => "getElementText",
            Self::Click { .. } => "elementClick",
            Self::Clear { .. } => "elementClear",
            Self::SendKeys { .. } => "elementSendKeys",
            Self::Screenshot => "takeScreenshot",
            Self::Back => "back",
            Self::ExecuteScript { .. } => "executeScript",
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            Self::DeleteSession => Method::Delete,
            Self::IsDisplayed { .. }
            | Self::IsEnabled { .. }
            | Self::GetRect { .. }
            | Self::GetText { .. }
            | Self::Screenshot => Method::Get,
            _ => Method::Post,
        }
    }

    /// Returns the element this command targets, if any.
    #[must_use]
    pub fn element(&self) -> Option<&ElementId> {
        match self {
            Self::IsDisplayed { element }
            | Self::IsEnabled { element }
            | Self::GetRect { element }
            | Self::GetText { element }
            | Self::Click { element }
            | Self::Clear { element }
            | Self::SendKeys { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Returns the path relative to the server base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if a session-scoped command is built
    /// without a session.
    pub fn path(&self, session: Option<&SessionId>) -> Result<String> {
        if let Self::NewSession { .. } = self {
            return Ok("session".to_string());
        }

        let session = session.ok_or_else(|| {
            Error::transport(format!("{} requires a session", self.name()))
        })?;
        let base = format!("session/{}", urlencoding::encode(session.as_str()));

        let element_path = |suffix: &str, element: &ElementId| {
            format!(
                "{base}/element/{}/{suffix}",
                urlencoding::encode(element.as_str())
            )
        };

        let path = match self {
            Self::NewSession { .. } | Self::DeleteSession => base.clone(),
            Self::SetTimeouts { .. } => format!("{base}/timeouts"),
            Self::FindElement { .. } => format!("{base}/element"),
            Self::IsDisplayed { element } => element_path("displayed", element),
            Self::IsEnabled { element } => element_path("enabled", element),
            Self::GetRect { element } => element_path("rect", element),
            Self::GetText { element } => element_path("text", element),
            Self::Click { element } => element_path("click", element),
            Self::Clear { element } => element_path("clear", element),
            Self::SendKeys { element, .. } => element_path("value", element),
            Self::Screenshot => format!("{base}/screenshot"),
            Self::Back => format!("{base}/back"),
            Self::ExecuteScript { .. } => format!("{base}/execute/sync"),
        };

        Ok(path)
    }

    /// Returns the JSON body. `None` for GET and DELETE.
    #[must_use]
    pub fn body(&self) -> Option<Value> {
        match self.method() {
            Method::Get | Method::Delete => return None,
            Method::Post => {}
        }

        let body = match self {
            Self::NewSession { capabilities } => json!({ "capabilities": capabilities }),
            Self::SetTimeouts { implicit_ms } => json!({ "implicit": implicit_ms }),
            Self::FindElement { by } => json!(by),
            Self::SendKeys { text, .. } => json!({ "text": text }),
            Self::ExecuteScript { script, args } => json!({ "script": script, "args": args }),
            _ => json!({}),
        };

        Some(body)
    }
}

// ============================================================================
// Tests
// ============================================================================
