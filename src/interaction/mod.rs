//! Synchronized element interaction.
//!
//! Every [`Interactor`] operation resolves the calling worker's session,
//! picks the element's locator for that session's platform, and polls the
//! required condition within a bounded wait. Element lookups that fail with
//! "not found" or "stale" are retried until the bound; any other error ends
//! the wait immediately.
//!
//! Each public operation logs one report event on the worker's active test.
//!
//! # Example
//!
//! ```ignore
//! let username = ElementRef::new("Username Field").any(By::accessibility_id("username"));
//! let login = ElementRef::new("Login Button").any(By::accessibility_id("login"));
//!
//! ctx.interactor().type_text(&username, "user1").await?;
//! ctx.interactor().click(&login).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

use crate::artifacts::{self, ArtifactStore};
use crate::config::HarnessSettings;
use crate::error::{Error, Result};
use crate::identifiers::{ElementId, WorkerId};
use crate::locator::{By, ElementRef};
use crate::reporting::{Level, Reporter};
use crate::session::{Session, SessionRegistry};

// ============================================================================
// Submodules
// ============================================================================

/// Probe outcome type.
pub mod outcome;

// ============================================================================
// Re-exports
// ============================================================================

pub use outcome::InteractionOutcome;

// ============================================================================
// Condition
// ============================================================================

/// Element condition a wait polls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Found, displayed, non-zero size.
    Visible,
    /// Visible and enabled.
    Clickable,
    /// Not found, stale, or not displayed.
    Hidden,
}

impl Condition {
    /// Returns the condition name used in messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Clickable => "clickable",
            Self::Hidden => "hidden",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conditions that resolve to an element handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Visible,
    Clickable,
}

impl From<Readiness> for Condition {
    fn from(readiness: Readiness) -> Self {
        match readiness {
            Readiness::Visible => Self::Visible,
            Readiness::Clickable => Self::Clickable,
        }
    }
}

// ============================================================================
// Probes
// ============================================================================

async fn probe_visible(session: &Session, by: &By) -> Result<Option<ElementId>> {
    let remote = session.remote()?;
    let id = remote.find_element(by).await?;

    if !remote.is_displayed(&id).await? {
        return Ok(None);
    }
    if !remote.rect(&id).await?.has_area() {
        return Ok(None);
    }
    Ok(Some(id))
}

async fn probe_clickable(session: &Session, by: &By) -> Result<Option<ElementId>> {
    let Some(id) = probe_visible(session, by).await? else {
        return Ok(None);
    };

    if session.remote()?.is_enabled(&id).await? {
        Ok(Some(id))
    } else {
        Ok(None)
    }
}

async fn probe_hidden(session: &Session, by: &By) -> Result<Option<()>> {
    let remote = session.remote()?;

    let id = match remote.find_element(by).await {
        Ok(id) => id,
        Err(e) if e.is_element_error() => return Ok(Some(())),
        Err(e) => return Err(e),
    };

    match remote.is_displayed(&id).await {
        Ok(true) => Ok(None),
        Ok(false) => Ok(Some(())),
        Err(e) if e.is_element_error() => Ok(Some(())),
        Err(e) => Err(e),
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Interactor
// ============================================================================

/// Element interaction surface for one worker.
#[derive(Clone)]
pub struct Interactor {
    worker: WorkerId,
    registry: Arc<SessionRegistry>,
    reporter: Arc<Reporter>,
    artifacts: Arc<ArtifactStore>,
    timeout: Duration,
    poll_interval: Duration,
    screenshot_on_pass: bool,
    screenshot_on_failure: bool,
}

impl fmt::Debug for Interactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interactor")
            .field("worker", &self.worker)
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl Interactor {
    /// Creates an interactor for `worker` using the configured waits and
    /// screenshot policy.
    #[must_use]
    pub fn new(
        worker: WorkerId,
        registry: Arc<SessionRegistry>,
        reporter: Arc<Reporter>,
        artifacts: Arc<ArtifactStore>,
        settings: &HarnessSettings,
    ) -> Self {
        Self {
            worker,
            registry,
            reporter,
            artifacts,
            timeout: settings.explicit_wait,
            poll_interval: settings.poll_interval,
            screenshot_on_pass: settings.screenshot_on_pass,
            screenshot_on_failure: settings.screenshot_on_failure,
        }
    }

    /// Returns a copy with a different wait bound.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    /// Returns the worker this interactor acts for.
    #[inline]
    #[must_use]
    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    /// Returns the wait bound.
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // ========================================================================
    // Waits
    // ========================================================================

    /// Waits until the element is displayed with a non-zero size.
    pub async fn wait_visible(&self, element: &ElementRef) -> InteractionOutcome<ElementId> {
        let outcome = self.wait_for(element, Readiness::Visible).await;
        self.report_wait(element, Condition::Visible, &outcome).await;
        outcome.map(|(_, id)| id)
    }

    /// Waits until the element is visible and enabled.
    pub async fn wait_clickable(&self, element: &ElementRef) -> InteractionOutcome<ElementId> {
        let outcome = self.wait_for(element, Readiness::Clickable).await;
        self.report_wait(element, Condition::Clickable, &outcome).await;
        outcome.map(|(_, id)| id)
    }

    /// Waits until the element is absent, stale, or not displayed.
    ///
    /// # Errors
    ///
    /// - [`Error::InteractionTimeout`] if it stays visible past the bound
    /// - Session or locator errors
    pub async fn wait_disappear(&self, element: &ElementRef) -> Result<()> {
        let result = match self.target(element) {
            Ok((session, by)) => self
                .poll(element, Condition::Hidden, || probe_hidden(&session, &by))
                .await
                .into_result(),
            Err(e) => Err(e),
        };

        match &result {
            Ok(()) => {
                debug!(worker = %self.worker, element = element.name(), "Element disappeared");
                self.reporter
                    .info(self.worker, format!("Element disappeared: {}", element.name()));
            }
            Err(e) => {
                self.report_fail(format!("Element still visible: {} - {e}", element.name()))
                    .await;
            }
        }
        result
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Waits until clickable, then taps the element.
    ///
    /// # Errors
    ///
    /// - [`Error::InteractionTimeout`] if the element never becomes clickable
    /// - Session, locator, or remote errors
    pub async fn click(&self, element: &ElementRef) -> Result<()> {
        let result: Result<()> = async {
            let (session, id) = self.wait_for(element, Readiness::Clickable).await.into_result()?;
            session.remote()?.click(&id).await
        }
        .await;

        match &result {
            Ok(()) => {
                debug!(worker = %self.worker, element = element.name(), "Clicked");
                self.report_pass(format!("Clicked on: {}", element.name())).await;
            }
            Err(e) => {
                warn!(worker = %self.worker, element = element.name(), error = %e, "Click failed");
                self.report_fail(format!("Failed to click on: {} - {e}", element.name()))
                    .await;
            }
        }
        result
    }

    /// Waits until visible, clears the element, then types `text`.
    ///
    /// # Errors
    ///
    /// - [`Error::InteractionTimeout`] if the element never becomes visible
    /// - Session, locator, or remote errors
    pub async fn type_text(&self, element: &ElementRef, text: &str) -> Result<()> {
        let result: Result<()> = async {
            let (session, id) = self.wait_for(element, Readiness::Visible).await.into_result()?;
            let remote = session.remote()?;
            remote.clear(&id).await?;
            remote.send_keys(&id, text).await
        }
        .await;

        match &result {
            Ok(()) => {
                debug!(worker = %self.worker, element = element.name(), "Text entered");
                self.report_pass(format!("Entered text '{text}' in: {}", element.name()))
                    .await;
            }
            Err(e) => {
                warn!(worker = %self.worker, element = element.name(), error = %e, "Typing failed");
                self.report_fail(format!("Failed to enter text in: {} - {e}", element.name()))
                    .await;
            }
        }
        result
    }

    /// Waits until visible, then reads the element text.
    ///
    /// # Errors
    ///
    /// - [`Error::InteractionTimeout`] if the element never becomes visible
    /// - Session, locator, or remote errors
    pub async fn read_text(&self, element: &ElementRef) -> Result<String> {
        let result: Result<String> = async {
            let (session, id) = self.wait_for(element, Readiness::Visible).await.into_result()?;
            session.remote()?.text(&id).await
        }
        .await;

        match &result {
            Ok(text) => {
                self.reporter.info(
                    self.worker,
                    format!("Got text '{text}' from: {}", element.name()),
                );
            }
            Err(e) => {
                self.report_fail(format!("Failed to get text from: {} - {e}", element.name()))
                    .await;
            }
        }
        result
    }

    /// Scrolls until the element is in the viewport.
    ///
    /// # Errors
    ///
    /// Returns the lookup or scroll error unchanged.
    pub async fn scroll_into_view(&self, element: &ElementRef) -> Result<()> {
        let result: Result<()> = async {
            let (session, by) = self.target(element)?;
            let remote = session.remote()?;
            let id = remote.find_element(&by).await?;
            remote.scroll_into_view(&id).await
        }
        .await;

        match &result {
            Ok(()) => {
                self.reporter
                    .info(self.worker, format!("Scrolled to element: {}", element.name()));
            }
            Err(e) => {
                self.report_fail(format!("Failed to scroll to element: {} - {e}", element.name()))
                    .await;
            }
        }
        result
    }

    /// Performs platform back navigation.
    ///
    /// # Errors
    ///
    /// Returns session or remote errors.
    pub async fn navigate_back(&self) -> Result<()> {
        let result: Result<()> = async {
            let session = self.registry.current(self.worker)?;
            session.remote()?.back().await
        }
        .await;

        match &result {
            Ok(()) => self.reporter.info(self.worker, "Navigated back"),
            Err(e) => self.report_fail(format!("Failed to navigate back - {e}")).await,
        }
        result
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Single-shot visibility check. Never fails: any error reads as `false`.
    pub async fn is_displayed(&self, element: &ElementRef) -> bool {
        let result: Result<bool> = async {
            let (session, by) = self.target(element)?;
            let remote = session.remote()?;
            let id = remote.find_element(&by).await?;
            remote.is_displayed(&id).await
        }
        .await;

        match result {
            Ok(shown) => {
                self.reporter.info(
                    self.worker,
                    format!("Element '{}' display status: {shown}", element.name()),
                );
                shown
            }
            Err(e) => {
                debug!(worker = %self.worker, element = element.name(), error = %e, "Display check failed");
                self.reporter
                    .info(self.worker, format!("Element '{}' is not displayed", element.name()));
                false
            }
        }
    }

    /// Waits until visible, then checks the enabled state. Never fails:
    /// any error reads as `false`.
    pub async fn is_enabled(&self, element: &ElementRef) -> bool {
        let result: Result<bool> = async {
            let (session, id) = self.wait_for(element, Readiness::Visible).await.into_result()?;
            session.remote()?.is_enabled(&id).await
        }
        .await;

        let enabled = result.unwrap_or_else(|e| {
            debug!(worker = %self.worker, element = element.name(), error = %e, "Enabled check failed");
            false
        });
        self.reporter.info(
            self.worker,
            format!("Element '{}' enabled status: {enabled}", element.name()),
        );
        enabled
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn target(&self, element: &ElementRef) -> Result<(Session, By)> {
        let session = self.registry.current(self.worker)?;
        let by = element.locator_for(session.platform())?.clone();
        Ok((session, by))
    }

    async fn wait_for(
        &self,
        element: &ElementRef,
        readiness: Readiness,
    ) -> InteractionOutcome<(Session, ElementId)> {
        let (session, by) = match self.target(element) {
            Ok(target) => target,
            Err(e) => return InteractionOutcome::Failed(e),
        };

        let condition = Condition::from(readiness);
        let outcome = match readiness {
            Readiness::Visible => {
                self.poll(element, condition, || probe_visible(&session, &by))
                    .await
            }
            Readiness::Clickable => {
                self.poll(element, condition, || probe_clickable(&session, &by))
                    .await
            }
        };

        outcome.map(|id| (session, id))
    }

    /// Polls `probe` until it yields a value, fails hard, or the bound elapses.
    async fn poll<T, F, Fut>(
        &self,
        element: &ElementRef,
        condition: Condition,
        mut probe: F,
    ) -> InteractionOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut polls = 0u32;

        loop {
            polls += 1;
            let budget = deadline
                .saturating_duration_since(Instant::now())
                .max(self.poll_interval);

            let outcome = match time::timeout(budget, probe()).await {
                Ok(Ok(Some(value))) => InteractionOutcome::Success(value),
                Ok(Ok(None)) => InteractionOutcome::NotReady(started.elapsed()),
                Ok(Err(e)) if e.is_element_error() => InteractionOutcome::NotReady(started.elapsed()),
                Ok(Err(e)) => InteractionOutcome::Failed(e),
                Err(_) => InteractionOutcome::NotReady(started.elapsed()),
            };

            let InteractionOutcome::NotReady(elapsed) = outcome else {
                return outcome;
            };

            let now = Instant::now();
            if now >= deadline {
                debug!(
                    worker = %self.worker,
                    element = element.name(),
                    %condition,
                    polls,
                    "Wait timed out"
                );
                return InteractionOutcome::Failed(Error::interaction_timeout(
                    element.name(),
                    condition.as_str(),
                    millis(self.timeout),
                ));
            }

            trace!(
                worker = %self.worker,
                element = element.name(),
                %condition,
                polls,
                elapsed_ms = millis(elapsed),
                "Condition not met yet"
            );
            time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    async fn report_wait<T>(
        &self,
        element: &ElementRef,
        condition: Condition,
        outcome: &InteractionOutcome<T>,
    ) {
        match outcome {
            InteractionOutcome::Success(_) => {
                self.report_pass(format!("Element is {condition}: {}", element.name()))
                    .await;
            }
            InteractionOutcome::Failed(e) => {
                warn!(worker = %self.worker, element = element.name(), error = %e, "Wait failed");
                self.report_fail(format!("Element not {condition}: {} - {e}", element.name()))
                    .await;
            }
            InteractionOutcome::NotReady(_) => {}
        }
    }

    async fn report_pass(&self, message: String) {
        let artifact = if self.screenshot_on_pass {
            self.capture_screenshot().await
        } else {
            None
        };
        self.reporter
            .log_with_artifact(self.worker, Level::Pass, message, artifact);
    }

    async fn report_fail(&self, message: String) {
        let artifact = if self.screenshot_on_failure {
            self.capture_screenshot().await
        } else {
            None
        };
        self.reporter
            .log_with_artifact(self.worker, Level::Fail, message, artifact);
    }

    async fn capture_screenshot(&self) -> Option<PathBuf> {
        let session = self.registry.current(self.worker).ok()?;
        match self
            .artifacts
            .capture(&session, &artifacts::worker_stem(self.worker))
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(worker = %self.worker, error = %e, "Screenshot capture failed");
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::capabilities::Platform;
    use crate::config::{Configuration, ReportSettings};
    use crate::remote::{ElementScript, ScriptedServer};
    use crate::reporting::MemoryWriter;

    struct Fixture {
        server: ScriptedServer,
        reporter: Arc<Reporter>,
        interactor: Interactor,
        _shots: tempfile::TempDir,
    }

    const WORKER: WorkerId = WorkerId::new(1);

    async fn fixture(settings: HarnessSettings) -> Fixture {
        let server = ScriptedServer::new();
        let config = Configuration::from_pairs([
            ("android.platform.version", "14"),
            ("android.device.name", "Pixel"),
            ("android.app.path", "/a.apk"),
            ("android.app.package", "com.example"),
            ("android.app.activity", ".Main"),
        ]);
        let registry = Arc::new(SessionRegistry::new(
            Arc::new(server.clone()),
            config,
            settings.implicit_wait,
        ));
        registry.acquire(WORKER, Platform::Android).await.expect("session");

        let reporter = Arc::new(Reporter::new(
            ReportSettings::default(),
            Arc::new(MemoryWriter::new()),
        ));
        reporter.create_test(WORKER, "unit", "");

        let shots = tempfile::tempdir().expect("tempdir");
        let artifacts = Arc::new(ArtifactStore::new(shots.path()));
        let interactor = Interactor::new(WORKER, registry, reporter.clone(), artifacts, &settings);

        Fixture {
            server,
            reporter,
            interactor,
            _shots: shots,
        }
    }

    fn settings() -> HarnessSettings {
        HarnessSettings {
            explicit_wait: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
            ..HarnessSettings::default()
        }
    }

    fn levels(reporter: &Reporter) -> Vec<Level> {
        reporter
            .active_test(WORKER)
            .expect("active")
            .events()
            .iter()
            .map(|e| e.level)
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_visible_polls_until_found() {
        let f = fixture(settings()).await;
        let by = By::accessibility_id("home");
        f.server
            .add_element(by.clone(), ElementScript::visible().appearing_after(3));

        let home = ElementRef::new("Home Screen").any(by.clone());
        let outcome = f.interactor.wait_visible(&home).await;

        assert!(outcome.is_success());
        assert_eq!(f.server.lookups(&by), 4);
        assert_eq!(levels(&f.reporter), [Level::Pass]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_visible_times_out() {
        let f = fixture(settings()).await;
        let ghost = ElementRef::new("Ghost").any(By::id("ghost"));

        let started = Instant::now();
        let err = f.interactor.wait_visible(&ghost).await.into_result().unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "Timed out after 10000ms waiting for 'Ghost' to become visible"
        );
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert_eq!(levels(&f.reporter), [Level::Fail]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_and_zero_sized_are_not_visible() {
        let f = fixture(settings()).await;
        f.server.add_element(By::id("hidden"), ElementScript::visible().hidden());
        f.server.add_element(By::id("flat"), ElementScript::visible().zero_sized());

        let quick = f.interactor.with_timeout(Duration::from_secs(1));
        assert!(!quick.wait_visible(&ElementRef::new("h").any(By::id("hidden"))).await.is_success());
        assert!(!quick.wait_visible(&ElementRef::new("f").any(By::id("flat"))).await.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_requires_enabled() {
        let f = fixture(settings()).await;
        let by = By::id("submit");
        f.server.add_element(by.clone(), ElementScript::visible().disabled());

        let submit = ElementRef::new("Submit").any(by.clone());
        let err = f
            .interactor
            .with_timeout(Duration::from_secs(2))
            .click(&submit)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InteractionTimeout { condition: "clickable", .. }));
        assert_eq!(f.server.clicks(&by), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_and_type() {
        let f = fixture(settings()).await;
        let field = By::id("username");
        let button = By::id("login");
        f.server.add_element(field.clone(), ElementScript::visible().with_text("hint"));
        f.server.add_element(button.clone(), ElementScript::visible());

        f.interactor
            .type_text(&ElementRef::new("Username").any(field.clone()), "user1")
            .await
            .expect("type");
        f.interactor
            .click(&ElementRef::new("Login").any(button.clone()))
            .await
            .expect("click");

        assert_eq!(f.server.value(&field).as_deref(), Some("user1"));
        assert_eq!(f.server.clicks(&button), 1);
        assert_eq!(levels(&f.reporter), [Level::Pass, Level::Pass]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_displayed_never_errors() {
        let f = fixture(settings()).await;
        f.server.add_element(By::id("shown"), ElementScript::visible());

        assert!(f.interactor.is_displayed(&ElementRef::new("s").any(By::id("shown"))).await);
        assert!(!f.interactor.is_displayed(&ElementRef::new("m").any(By::id("missing"))).await);
        assert!(!f.interactor.is_displayed(&ElementRef::new("i").ios(By::id("ios-only"))).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_locator_fails_without_polling() {
        let f = fixture(settings()).await;
        let ios_only = ElementRef::new("Face ID").ios(By::accessibility_id("faceid"));

        let started = Instant::now();
        let outcome = f.interactor.wait_visible(&ios_only).await;

        assert!(matches!(outcome, InteractionOutcome::Failed(Error::NoLocator { .. })));
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_disappear() {
        let f = fixture(settings()).await;
        let by = By::id("spinner");
        f.server.add_element(by.clone(), ElementScript::visible().vanishing_after(2));

        f.interactor
            .wait_disappear(&ElementRef::new("Spinner").any(by))
            .await
            .expect("disappear");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_attaches_screenshot() {
        let f = fixture(settings()).await;
        let ghost = ElementRef::new("Ghost").any(By::id("ghost"));

        let _ = f.interactor.with_timeout(Duration::from_secs(1)).click(&ghost).await;

        let events = f.reporter.active_test(WORKER).expect("active").events();
        assert_eq!(events.len(), 1);
        assert!(events[0].artifact.as_ref().is_some_and(|p| p.exists()));
        assert_eq!(f.server.screenshots_taken(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_session() {
        let f = fixture(settings()).await;
        let other = Interactor {
            worker: WorkerId::new(9),
            ..f.interactor.clone()
        };

        let err = other
            .click(&ElementRef::new("x").any(By::id("x")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotInitialized { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_and_back() {
        let f = fixture(settings()).await;
        let by = By::id("footer");
        f.server.add_element(by.clone(), ElementScript::visible());

        f.interactor
            .scroll_into_view(&ElementRef::new("Footer").any(by.clone()))
            .await
            .expect("scroll");
        f.interactor.navigate_back().await.expect("back");

        assert_eq!(f.server.scrolls(&by), 1);
        assert_eq!(f.server.back_presses(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_enabled() {
        let f = fixture(settings()).await;
        f.server.add_element(By::id("on"), ElementScript::visible());
        f.server.add_element(By::id("off"), ElementScript::visible().disabled());

        let quick = f.interactor.with_timeout(Duration::from_secs(1));
        assert!(quick.is_enabled(&ElementRef::new("On").any(By::id("on"))).await);
        assert!(!quick.is_enabled(&ElementRef::new("Off").any(By::id("off"))).await);
        assert!(!quick.is_enabled(&ElementRef::new("Gone").any(By::id("gone"))).await);
    }

    #[test]
    fn test_readiness_maps_to_condition() {
        assert_eq!(Condition::from(Readiness::Visible), Condition::Visible);
        assert_eq!(Condition::from(Readiness::Clickable), Condition::Clickable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_type_text_waits_for_visible_not_hidden() {
        let f = fixture(settings()).await;
        let by = By::id("search");
        f.server.add_element(by.clone(), ElementScript::visible().hidden());

        let search = ElementRef::new("Search").any(by.clone());
        let err = f
            .interactor
            .with_timeout(Duration::from_secs(2))
            .type_text(&search, "phones")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InteractionTimeout { condition: "visible", .. }));
        assert_eq!(f.server.value(&by), None);
    }
}
