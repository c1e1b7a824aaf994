//! In-memory automation server driven by per-locator scripts.
//!
//! A [`ScriptedServer`] stands in for a device: each locator is registered
//! with an [`ElementScript`] describing when it appears, whether it is
//! displayed and enabled, and what text it holds. Counters record every
//! session, lookup, click and keystroke so callers can assert on them.
//!
//! # Example
//!
//! ```
//! use mobile_harness::locator::By;
//! use mobile_harness::remote::{ElementScript, ScriptedServer};
//!
//! let server = ScriptedServer::new();
//! server.add_element(By::accessibility_id("home"), ElementScript::visible().appearing_after(3));
//!
//! assert_eq!(server.sessions_created(), 0);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::capabilities::CapabilitySet;
use crate::error::{Error, Result};
use crate::identifiers::{ElementId, SessionId};
use crate::locator::By;

use super::{AutomationServer, ElementRect, RemoteSession};

// ============================================================================
// Constants
// ============================================================================

/// Bytes returned for every screenshot (PNG signature plus a marker).
pub const SCREENSHOT_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nscripted";

// ============================================================================
// ElementScript
// ============================================================================

/// Scripted behavior of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementScript {
    appear_after: u32,
    present_for: Option<u32>,
    displayed: bool,
    enabled: bool,
    rect: ElementRect,
    text: String,
}

impl Default for ElementScript {
    fn default() -> Self {
        Self::visible()
    }
}

impl ElementScript {
    /// Displayed, enabled, 100x40 element present from the first lookup.
    #[must_use]
    pub fn visible() -> Self {
        Self {
            appear_after: 0,
            present_for: None,
            displayed: true,
            enabled: true,
            rect: ElementRect {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 40.0,
            },
            text: String::new(),
        }
    }

    /// The first `lookups` lookups report "no such element".
    #[must_use]
    pub fn appearing_after(mut self, lookups: u32) -> Self {
        self.appear_after = lookups;
        self
    }

    /// After appearing, the element is found `lookups` more times and then
    /// vanishes. Existing references become stale.
    #[must_use]
    pub fn vanishing_after(mut self, lookups: u32) -> Self {
        self.present_for = Some(lookups);
        self
    }

    /// Present in the tree but not displayed.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Displayed but not enabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Displayed with zero width and height.
    #[must_use]
    pub fn zero_sized(mut self) -> Self {
        self.rect.width = 0.0;
        self.rect.height = 0.0;
        self
    }

    /// Sets the element text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

// ============================================================================
// Server State
// ============================================================================

#[derive(Debug)]
struct ElementState {
    script: ElementScript,
    lookups: u32,
    gone: bool,
    clicks: u32,
    scrolls: u32,
    value: Option<String>,
}

impl ElementState {
    fn new(script: ElementScript) -> Self {
        Self {
            script,
            lookups: 0,
            gone: false,
            clicks: 0,
            scrolls: 0,
            value: None,
        }
    }

    /// Records one lookup and returns whether the element was found.
    fn lookup(&mut self) -> bool {
        self.lookups += 1;
        let n = self.lookups;

        if n <= self.script.appear_after {
            return false;
        }
        if let Some(present_for) = self.script.present_for
            && n > self.script.appear_after + present_for
        {
            self.gone = true;
            return false;
        }
        true
    }
}

#[derive(Debug, Default)]
struct ServerState {
    elements: FxHashMap<By, ElementState>,
    next_id: u64,
    sessions_created: usize,
    sessions_quit: usize,
    capabilities: Vec<CapabilitySet>,
    implicit_waits: Vec<Duration>,
    creation_failure: Option<String>,
    back_presses: usize,
    screenshots: usize,
}

impl ServerState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

// ============================================================================
// ScriptedServer
// ============================================================================

/// In-memory automation server.
///
/// Clones share state, so a test can keep one handle while the harness
/// drives another.
#[derive(Debug, Clone, Default)]
pub struct ScriptedServer {
    state: Arc<Mutex<ServerState>>,
}

impl ScriptedServer {
    /// Creates a server with no elements.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces an element script.
    pub fn add_element(&self, by: By, script: ElementScript) {
        self.state.lock().elements.insert(by, ElementState::new(script));
    }

    /// Makes every subsequent session creation fail with `message`.
    pub fn fail_session_creation(&self, message: impl Into<String>) {
        self.state.lock().creation_failure = Some(message.into());
    }

    /// Number of sessions created.
    #[must_use]
    pub fn sessions_created(&self) -> usize {
        self.state.lock().sessions_created
    }

    /// Number of sessions quit.
    #[must_use]
    pub fn sessions_quit(&self) -> usize {
        self.state.lock().sessions_quit
    }

    /// Capability sets of every session-creation request, in order.
    #[must_use]
    pub fn capabilities(&self) -> Vec<CapabilitySet> {
        self.state.lock().capabilities.clone()
    }

    /// Implicit waits applied, in order.
    #[must_use]
    pub fn implicit_waits(&self) -> Vec<Duration> {
        self.state.lock().implicit_waits.clone()
    }

    /// Number of lookups for a locator.
    #[must_use]
    pub fn lookups(&self, by: &By) -> u32 {
        self.state.lock().elements.get(by).map_or(0, |e| e.lookups)
    }

    /// Number of clicks on a locator's element.
    #[must_use]
    pub fn clicks(&self, by: &By) -> u32 {
        self.state.lock().elements.get(by).map_or(0, |e| e.clicks)
    }

    /// Number of scrolls to a locator's element.
    #[must_use]
    pub fn scrolls(&self, by: &By) -> u32 {
        self.state.lock().elements.get(by).map_or(0, |e| e.scrolls)
    }

    /// Current typed value of a locator's element.
    #[must_use]
    pub fn value(&self, by: &By) -> Option<String> {
        self.state
            .lock()
            .elements
            .get(by)
            .and_then(|e| e.value.clone())
    }

    /// Number of back navigations.
    #[must_use]
    pub fn back_presses(&self) -> usize {
        self.state.lock().back_presses
    }

    /// Number of screenshots taken.
    #[must_use]
    pub fn screenshots_taken(&self) -> usize {
        self.state.lock().screenshots
    }
}

#[async_trait]
impl AutomationServer for ScriptedServer {
    async fn create_session(&self, capabilities: &CapabilitySet) -> Result<Box<dyn RemoteSession>> {
        let mut state = self.state.lock();

        if let Some(message) = &state.creation_failure {
            return Err(Error::session_creation(message.clone()));
        }

        let id = SessionId::new(format!("scripted-{}", state.next_id()));
        state.sessions_created += 1;
        state.capabilities.push(capabilities.clone());

        debug!(session_id = %id, "Scripted session created");

        Ok(Box::new(ScriptedSession {
            id,
            state: Arc::clone(&self.state),
            closed: AtomicBool::new(false),
            handles: Mutex::new(FxHashMap::default()),
        }))
    }
}

// ============================================================================
// ScriptedSession
// ============================================================================

/// Session on a [`ScriptedServer`].
#[derive(Debug)]
pub struct ScriptedSession {
    id: SessionId,
    state: Arc<Mutex<ServerState>>,
    closed: AtomicBool,
    handles: Mutex<FxHashMap<ElementId, By>>,
}

impl ScriptedSession {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::session_closed(self.id.clone()));
        }
        Ok(())
    }

    /// Runs `f` against the element behind `element`.
    fn with_element<T>(
        &self,
        element: &ElementId,
        f: impl FnOnce(&mut ElementState) -> T,
    ) -> Result<T> {
        self.ensure_open()?;

        let by = self
            .handles
            .lock()
            .get(element)
            .cloned()
            .ok_or_else(|| Error::stale_element(element.clone()))?;

        let mut state = self.state.lock();
        match state.elements.get_mut(&by) {
            Some(el) if !el.gone => Ok(f(el)),
            _ => Err(Error::stale_element(element.clone())),
        }
    }
}

#[async_trait]
impl RemoteSession for ScriptedSession {
    fn id(&self) -> &SessionId {
        &self.id
    }

    async fn set_implicit_wait(&self, wait: Duration) -> Result<()> {
        self.ensure_open()?;
        self.state.lock().implicit_waits.push(wait);
        Ok(())
    }

    async fn find_element(&self, by: &By) -> Result<ElementId> {
        self.ensure_open()?;

        let id = {
            let mut state = self.state.lock();
            let found = state.elements.get_mut(by).is_some_and(ElementState::lookup);
            if !found {
                return Err(Error::element_not_found(by.to_string()));
            }
            ElementId::new(format!("{}-el-{}", self.id, state.next_id()))
        };

        self.handles.lock().insert(id.clone(), by.clone());
        Ok(id)
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        self.with_element(element, |el| el.script.displayed)
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool> {
        self.with_element(element, |el| el.script.enabled)
    }

    async fn rect(&self, element: &ElementId) -> Result<ElementRect> {
        self.with_element(element, |el| el.script.rect)
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        self.with_element(element, |el| {
            el.value.clone().unwrap_or_else(|| el.script.text.clone())
        })
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        self.with_element(element, |el| el.clicks += 1)
    }

    async fn clear(&self, element: &ElementId) -> Result<()> {
        self.with_element(element, |el| el.value = Some(String::new()))
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()> {
        self.with_element(element, |el| {
            el.value.get_or_insert_with(String::new).push_str(text);
        })
    }

    async fn scroll_into_view(&self, element: &ElementId) -> Result<()> {
        self.with_element(element, |el| el.scrolls += 1)
    }

    async fn back(&self) -> Result<()> {
        self.ensure_open()?;
        self.state.lock().back_presses += 1;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.ensure_open()?;
        self.state.lock().screenshots += 1;
        Ok(SCREENSHOT_BYTES.to_vec())
    }

    async fn quit(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(Error::session_closed(self.id.clone()));
        }
        self.state.lock().sessions_quit += 1;
        debug!(session_id = %self.id, "Scripted session quit");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
