//! Suite reporter with per-worker active test units.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ReportSettings;
use crate::error::Result;
use crate::identifiers::WorkerId;

use super::writer::{JsonFileWriter, ReportDocument, ReportWriter, TestRecord};
use super::{Level, ReportEvent};

// ============================================================================
// TestHandle
// ============================================================================

struct TestUnit {
    id: Uuid,
    name: String,
    description: String,
    worker: WorkerId,
    started_at: DateTime<Utc>,
    status: Option<Level>,
    events: Vec<ReportEvent>,
}

/// Handle to one report test unit.
///
/// Appends are serialized per unit, so events from one worker never
/// interleave with another's.
#[derive(Clone)]
pub struct TestHandle {
    inner: Arc<Mutex<TestUnit>>,
}

impl fmt::Debug for TestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.inner.lock();
        f.debug_struct("TestHandle")
            .field("id", &unit.id)
            .field("name", &unit.name)
            .field("worker", &unit.worker)
            .field("events", &unit.events.len())
            .finish_non_exhaustive()
    }
}

impl TestHandle {
    fn new(worker: WorkerId, name: &str, description: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TestUnit {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description: description.to_string(),
                worker,
                started_at: Utc::now(),
                status: None,
                events: Vec::new(),
            })),
        }
    }

    /// Returns the unit ID.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.inner.lock().id
    }

    /// Returns the unit name.
    #[must_use]
    pub fn name(&self) -> String {
        self.inner.lock().name.clone()
    }

    /// Returns the owning worker.
    #[must_use]
    pub fn worker(&self) -> WorkerId {
        self.inner.lock().worker
    }

    /// Appends an event.
    pub fn log(&self, event: ReportEvent) {
        self.inner.lock().events.push(event);
    }

    /// Sets the final status.
    pub fn finish(&self, status: Level) {
        self.inner.lock().status = Some(status);
    }

    /// Returns the final status, if set.
    #[must_use]
    pub fn status(&self) -> Option<Level> {
        self.inner.lock().status
    }

    /// Returns a snapshot of the events.
    #[must_use]
    pub fn events(&self) -> Vec<ReportEvent> {
        self.inner.lock().events.clone()
    }

    fn record(&self) -> TestRecord {
        let unit = self.inner.lock();
        TestRecord {
            id: unit.id,
            name: unit.name.clone(),
            description: unit.description.clone(),
            worker: unit.worker,
            started_at: unit.started_at,
            status: unit.status,
            events: unit.events.clone(),
        }
    }
}

// ============================================================================
// Reporter
// ============================================================================

static GLOBAL: OnceLock<Arc<Reporter>> = OnceLock::new();

/// Collects suite and test events and writes the report document.
///
/// Severity calls are scoped to the caller's worker: they land in that
/// worker's active unit. Calls for a worker with no active unit are dropped.
pub struct Reporter {
    settings: ReportSettings,
    writer: Arc<dyn ReportWriter>,
    system_info: Mutex<BTreeMap<String, String>>,
    suite_events: Mutex<Vec<ReportEvent>>,
    tests: Mutex<Vec<TestHandle>>,
    active: Mutex<FxHashMap<WorkerId, TestHandle>>,
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("title", &self.settings.title)
            .field("tests", &self.tests.lock().len())
            .finish_non_exhaustive()
    }
}

impl Reporter {
    /// Creates a reporter with a custom writer.
    #[must_use]
    pub fn new(settings: ReportSettings, writer: Arc<dyn ReportWriter>) -> Self {
        Self {
            settings,
            writer,
            system_info: Mutex::new(BTreeMap::new()),
            suite_events: Mutex::new(Vec::new()),
            tests: Mutex::new(Vec::new()),
            active: Mutex::new(FxHashMap::default()),
        }
    }

    /// Creates a reporter writing JSON to `settings.path`.
    #[must_use]
    pub fn json(settings: ReportSettings) -> Self {
        let writer = Arc::new(JsonFileWriter::new(settings.path.clone()));
        Self::new(settings, writer)
    }

    /// Returns the process-wide reporter, creating it on first call.
    ///
    /// Later calls ignore `settings` and return the same instance.
    pub fn global(settings: ReportSettings) -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| {
            info!(path = %settings.path.display(), "Initializing report");
            Arc::new(Self::json(settings))
        }))
    }

    /// Returns the report settings.
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Sets one system-info entry.
    pub fn set_system_info(&self, key: impl Into<String>, value: impl Into<String>) {
        self.system_info.lock().insert(key.into(), value.into());
    }

    /// Logs a suite-level event.
    pub fn suite_event(&self, level: Level, message: impl Into<String>) {
        self.suite_events.lock().push(ReportEvent::new(level, message));
    }

    /// Returns suite-level events.
    #[must_use]
    pub fn suite_events(&self) -> Vec<ReportEvent> {
        self.suite_events.lock().clone()
    }

    // ========================================================================
    // Test Units
    // ========================================================================

    /// Creates a test unit and makes it the worker's active unit.
    pub fn create_test(&self, worker: WorkerId, name: &str, description: &str) -> TestHandle {
        let handle = TestHandle::new(worker, name, description);
        self.tests.lock().push(handle.clone());
        self.active.lock().insert(worker, handle.clone());
        debug!(%worker, test = name, "Test unit created");
        handle
    }

    /// Returns the worker's active unit.
    #[must_use]
    pub fn active_test(&self, worker: WorkerId) -> Option<TestHandle> {
        self.active.lock().get(&worker).cloned()
    }

    /// Clears the worker's active unit.
    pub fn end_test(&self, worker: WorkerId) {
        self.active.lock().remove(&worker);
    }

    /// Returns every unit in creation order.
    #[must_use]
    pub fn tests(&self) -> Vec<TestHandle> {
        self.tests.lock().clone()
    }

    // ========================================================================
    // Severity
    // ========================================================================

    /// Appends an event to the worker's active unit.
    pub fn log(&self, worker: WorkerId, event: ReportEvent) {
        match self.active_test(worker) {
            Some(handle) => handle.log(event),
            None => debug!(%worker, message = %event.message, "No active test, event dropped"),
        }
    }

    /// Logs an info event.
    pub fn info(&self, worker: WorkerId, message: impl Into<String>) {
        self.log(worker, ReportEvent::new(Level::Info, message));
    }

    /// Logs a pass event.
    pub fn pass(&self, worker: WorkerId, message: impl Into<String>) {
        self.log(worker, ReportEvent::new(Level::Pass, message));
    }

    /// Logs a fail event.
    pub fn fail(&self, worker: WorkerId, message: impl Into<String>) {
        self.log(worker, ReportEvent::new(Level::Fail, message));
    }

    /// Logs a skip event.
    pub fn skip(&self, worker: WorkerId, message: impl Into<String>) {
        self.log(worker, ReportEvent::new(Level::Skip, message));
    }

    /// Logs an event with an optional attached artifact.
    pub fn log_with_artifact(
        &self,
        worker: WorkerId,
        level: Level,
        message: impl Into<String>,
        artifact: Option<PathBuf>,
    ) {
        let mut event = ReportEvent::new(level, message);
        event.artifact = artifact;
        self.log(worker, event);
    }

    /// Attaches an artifact to the worker's active unit as an info event.
    pub fn attach(&self, worker: WorkerId, path: impl Into<PathBuf>) {
        let path = path.into();
        let message = format!("Attached {}", path.display());
        self.log(worker, ReportEvent::new(Level::Info, message).with_artifact(path));
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Builds the current report document.
    #[must_use]
    pub fn document(&self) -> ReportDocument {
        ReportDocument {
            title: self.settings.title.clone(),
            theme: self.settings.theme.clone(),
            generated_at: Utc::now(),
            system_info: self.system_info.lock().clone(),
            suite_events: self.suite_events(),
            tests: self.tests().iter().map(TestHandle::record).collect(),
        }
    }

    /// Writes the report document.
    ///
    /// # Errors
    ///
    /// Returns the writer's error.
    pub fn flush(&self) -> Result<()> {
        self.writer.write(&self.document())
    }
}

// ============================================================================
// Tests
// ============================================================================
