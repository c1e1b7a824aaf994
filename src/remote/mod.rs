//! Remote automation session abstraction.
//!
//! [`AutomationServer`] opens sessions; [`RemoteSession`] is the per-session
//! command surface the interaction layer drives. Two implementations ship:
//!
//! | Module | Implementation | Used for |
//! |--------|----------------|----------|
//! | `http` | [`WebDriverServer`] / [`WebDriverSession`] | Real Appium servers |
//! | `scripted` | [`ScriptedServer`] / [`ScriptedSession`] | In-memory UI scripts for tests and dry runs |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capabilities::CapabilitySet;
use crate::error::Result;
use crate::identifiers::{ElementId, SessionId};
use crate::locator::By;

// ============================================================================
// Submodules
// ============================================================================

/// WebDriver HTTP implementation.
pub mod http;

/// In-memory scripted implementation.
pub mod scripted;

// ============================================================================
// Re-exports
// ============================================================================

pub use http::{WebDriverServer, WebDriverSession};
pub use scripted::{ElementScript, ScriptedServer, ScriptedSession};

// ============================================================================
// ElementRect
// ============================================================================

/// Element bounds in device points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl ElementRect {
    /// Returns `true` if both dimensions are positive.
    #[inline]
    #[must_use]
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Opens automation sessions.
#[async_trait]
pub trait AutomationServer: Send + Sync {
    /// Creates a session with the given capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SessionCreation`] if the server refuses.
    async fn create_session(&self, capabilities: &CapabilitySet) -> Result<Box<dyn RemoteSession>>;
}

/// Commands available on one live automation session.
///
/// Element-level failures surface as [`crate::Error::ElementNotFound`] or
/// [`crate::Error::StaleElement`] so callers can poll through them.
#[async_trait]
pub trait RemoteSession: Send + Sync + fmt::Debug {
    /// Returns the server-assigned session ID.
    fn id(&self) -> &SessionId;

    /// Sets the server-side implicit wait.
    async fn set_implicit_wait(&self, wait: Duration) -> Result<()>;

    /// Finds one element.
    async fn find_element(&self, by: &By) -> Result<ElementId>;

    /// Returns whether the element is displayed.
    async fn is_displayed(&self, element: &ElementId) -> Result<bool>;

    /// Returns whether the element is enabled.
    async fn is_enabled(&self, element: &ElementId) -> Result<bool>;

    /// Returns the element bounds.
    async fn rect(&self, element: &ElementId) -> Result<ElementRect>;

    /// Returns the element text.
    async fn text(&self, element: &ElementId) -> Result<String>;

    /// Taps the element.
    async fn click(&self, element: &ElementId) -> Result<()>;

    /// Clears an editable element.
    async fn clear(&self, element: &ElementId) -> Result<()>;

    /// Types into an editable element.
    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()>;

    /// Scrolls until the element is in the viewport.
    async fn scroll_into_view(&self, element: &ElementId) -> Result<()>;

    /// Platform back navigation.
    async fn back(&self) -> Result<()>;

    /// Captures the viewport as PNG bytes.
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// Ends the session on the server.
    async fn quit(&self) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================
