//! Suite orchestration over parallel workers.
//!
//! ```text
//! SuiteIdle ──run──► SuiteRunning ──all workers drained──► SuiteDone
//!
//! per scenario attempt:
//! ScenarioIdle ──► ScenarioRunning ──► Passed | Failed | Skipped
//!                        ▲                       │
//!                        └──── retry granted ────┘
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::join_all;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::artifacts::{self, ArtifactStore};
use crate::capabilities::Platform;
use crate::config::{Configuration, HarnessSettings, TeardownPolicy, keys};
use crate::error::{Error, Result};
use crate::identifiers::{ScenarioId, WorkerId};
use crate::interaction::Interactor;
use crate::remote::AutomationServer;
use crate::reporting::{Level, Reporter};
use crate::retry::{RetryPolicy, TestOutcome};
use crate::session::SessionRegistry;

use super::scenario::{Scenario, ScenarioContext};

// ============================================================================
// States
// ============================================================================

/// Suite state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuiteState {
    /// Not started.
    #[default]
    Idle,
    /// Workers are draining the queue.
    Running,
    /// Finished; the report has been flushed.
    Done,
}

/// Scenario state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioState {
    /// Queued.
    Idle,
    /// An attempt is executing.
    Running,
    /// Final attempt passed.
    Passed,
    /// Final attempt failed.
    Failed,
    /// Final attempt skipped.
    Skipped,
}

impl From<&TestOutcome> for ScenarioState {
    fn from(outcome: &TestOutcome) -> Self {
        match outcome {
            TestOutcome::Passed => Self::Passed,
            TestOutcome::Failed { .. } => Self::Failed,
            TestOutcome::Skipped { .. } => Self::Skipped,
        }
    }
}

// ============================================================================
// SuiteParameters
// ============================================================================

/// Suite-level parameters layered above the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteParameters {
    /// Suite name.
    pub name: String,
    /// Platform override.
    pub platform: Option<String>,
    /// Device name override for the suite platform.
    pub device_name: Option<String>,
    /// Platform version override for the suite platform.
    pub platform_version: Option<String>,
}

impl SuiteParameters {
    /// Creates parameters with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the platform override.
    #[must_use]
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Sets the device name override.
    #[must_use]
    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = Some(name.into());
        self
    }

    /// Sets the platform version override.
    #[must_use]
    pub fn platform_version(mut self, version: impl Into<String>) -> Self {
        self.platform_version = Some(version.into());
        self
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Final result of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    /// Scenario ID.
    pub scenario: ScenarioId,
    /// Worker that ran the final attempt.
    pub worker: WorkerId,
    /// Attempts made, including retries.
    pub attempts: u32,
    /// Final state.
    pub state: ScenarioState,
    /// Final outcome.
    pub outcome: TestOutcome,
}

/// Aggregate counts for a suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuiteSummary {
    /// Scenarios run.
    pub total: usize,
    /// Scenarios whose final attempt passed.
    pub passed: usize,
    /// Scenarios whose final attempt failed.
    pub failed: usize,
    /// Scenarios whose final attempt was skipped.
    pub skipped: usize,
    /// Attempts that were retried.
    pub retried: usize,
    /// Per-scenario results in queue order.
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteSummary {
    fn from_reports(scenarios: Vec<ScenarioReport>) -> Self {
        let count = |state: ScenarioState| scenarios.iter().filter(|r| r.state == state).count();

        Self {
            total: scenarios.len(),
            passed: count(ScenarioState::Passed),
            failed: count(ScenarioState::Failed),
            skipped: count(ScenarioState::Skipped),
            retried: scenarios
                .iter()
                .map(|r| r.attempts.saturating_sub(1) as usize)
                .sum(),
            scenarios,
        }
    }

    /// Returns `true` if no scenario failed.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for SuiteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {}, Passed: {}, Failed: {}, Skipped: {}, Retried: {}",
            self.total, self.passed, self.failed, self.skipped, self.retried
        )
    }
}

// ============================================================================
// SuiteRunner
// ============================================================================

/// Runs scenarios across parallel workers and reports the results.
pub struct SuiteRunner {
    config: Configuration,
    server: Arc<dyn AutomationServer>,
    reporter: Arc<Reporter>,
    state: Mutex<SuiteState>,
}

impl fmt::Debug for SuiteRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteRunner")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SuiteRunner {
    /// Creates a runner.
    #[must_use]
    pub fn new(
        config: Configuration,
        server: Arc<dyn AutomationServer>,
        reporter: Arc<Reporter>,
    ) -> Self {
        Self {
            config,
            server,
            reporter,
            state: Mutex::new(SuiteState::Idle),
        }
    }

    /// Returns the suite state.
    #[must_use]
    pub fn state(&self) -> SuiteState {
        *self.state.lock()
    }

    /// Runs every scenario and flushes the report.
    ///
    /// Scenario failures are reported in the summary, not as errors.
    ///
    /// # Errors
    ///
    /// - Configuration errors from suite setup (the report is still flushed)
    /// - [`Error::Config`] if the suite is already running or two scenarios
    ///   share a name
    /// - The report writer's error
    pub async fn run(
        &self,
        params: SuiteParameters,
        scenarios: Vec<Arc<dyn Scenario>>,
    ) -> Result<SuiteSummary> {
        {
            let mut state = self.state.lock();
            if *state == SuiteState::Running {
                return Err(Error::config("suite is already running"));
            }
            *state = SuiteState::Running;
        }

        info!(suite = %params.name, scenarios = scenarios.len(), "Suite started");
        self.reporter
            .suite_event(Level::Info, format!("Test Suite: {} started", params.name));

        let result = self.run_inner(&params, scenarios).await;

        if let Err(e) = &result {
            error!(suite = %params.name, error = %e, "Suite setup failed");
            self.reporter
                .suite_event(Level::Fail, format!("Suite setup failed: {e}"));
        }

        let flushed = self.reporter.flush();
        *self.state.lock() = SuiteState::Done;

        let summary = result?;
        flushed?;

        info!(suite = %params.name, %summary, "Suite finished");
        Ok(summary)
    }

    async fn run_inner(
        &self,
        params: &SuiteParameters,
        scenarios: Vec<Arc<dyn Scenario>>,
    ) -> Result<SuiteSummary> {
        let shared = Arc::new(self.prepare(params, scenarios)?);
        let workers = shared.settings.workers;

        info!(workers, "Spawning workers");

        let handles = (1..=workers).map(|n| {
            let shared = Arc::clone(&shared);
            let worker = WorkerId::new(u32::try_from(n).unwrap_or(u32::MAX));
            tokio::spawn(async move { shared.run_worker(worker).await })
        });

        let mut reports = Vec::new();
        for joined in join_all(handles).await {
            match joined {
                Ok(worker_reports) => reports.extend(worker_reports),
                Err(e) => error!(error = %e, "Worker task aborted"),
            }
        }

        shared.registry.release_all().await;

        reports.sort_by_key(|(index, _)| *index);
        let summary =
            SuiteSummary::from_reports(reports.into_iter().map(|(_, report)| report).collect());

        self.reporter.suite_event(
            Level::Info,
            format!("Test Suite: {} finished - {summary}", params.name),
        );

        Ok(summary)
    }

    /// Applies suite parameters and resolves settings.
    fn prepare(
        &self,
        params: &SuiteParameters,
        scenarios: Vec<Arc<dyn Scenario>>,
    ) -> Result<SuiteShared> {
        reject_duplicate_names(&scenarios)?;

        let mut config = self.config.clone();
        if let Some(name) = &params.platform {
            let requested: Platform = name.parse()?;
            config = config.with_overlay([(keys::PLATFORM, requested.config_prefix())]);
        }

        // Runtime overrides outrank suite parameters, so the effective
        // platform is whatever the layered config resolves to.
        let settings = HarnessSettings::from_config(&config)?;
        let platform = settings.platform;
        let prefix = platform.config_prefix();

        let mut overlay = Vec::new();
        if let Some(device) = &params.device_name {
            overlay.push((keys::device_name_key(prefix), device.clone()));
        }
        if let Some(version) = &params.platform_version {
            overlay.push((keys::platform_version_key(prefix), version.clone()));
        }
        let config = config.with_overlay(overlay);

        if let Some(requested) = &params.platform {
            if !requested.trim().eq_ignore_ascii_case(prefix) {
                warn!(requested = %requested, effective = %platform, "Platform parameter overridden at runtime");
            }
            self.reporter
                .suite_event(Level::Info, format!("Platform set to: {platform}"));
        }

        self.record_system_info(&config, platform);

        let artifacts = ArtifactStore::new(&settings.screenshot_dir);
        if let Err(e) = artifacts.cleanup_older_than(settings.screenshot_retention_days) {
            warn!(error = %e, "Screenshot cleanup failed");
        }

        let registry = SessionRegistry::new(
            Arc::clone(&self.server),
            config.clone(),
            settings.implicit_wait,
        );

        Ok(SuiteShared {
            retry: RetryPolicy::new(settings.max_retries),
            registry: Arc::new(registry),
            reporter: Arc::clone(&self.reporter),
            artifacts: Arc::new(artifacts),
            queue: Mutex::new(scenarios.into_iter().enumerate().collect()),
            config,
            settings,
        })
    }

    fn record_system_info(&self, config: &Configuration, platform: Platform) {
        let prefix = platform.config_prefix();
        let reporter = &self.reporter;

        reporter.set_system_info("os", std::env::consts::OS);
        reporter.set_system_info("platform", platform.name());
        if let Some(device) = config.get(&keys::device_name_key(prefix)) {
            reporter.set_system_info("device", device);
        }
        if let Some(version) = config.get(&keys::platform_version_key(prefix)) {
            reporter.set_system_info("platform_version", version);
        }
        for key in [keys::CI_BUILD_URL, keys::CI_BUILD_NUMBER, keys::CI_JOB_NAME] {
            if let Some(value) = config.get(key) {
                reporter.set_system_info(key, value);
            }
        }
    }
}

// ============================================================================
// SuiteShared
// ============================================================================

/// State shared by every worker of one run.
struct SuiteShared {
    config: Configuration,
    settings: HarnessSettings,
    registry: Arc<SessionRegistry>,
    reporter: Arc<Reporter>,
    artifacts: Arc<ArtifactStore>,
    retry: RetryPolicy,
    queue: Mutex<VecDeque<(usize, Arc<dyn Scenario>)>>,
}

impl SuiteShared {
    async fn run_worker(&self, worker: WorkerId) -> Vec<(usize, ScenarioReport)> {
        let mut reports = Vec::new();

        loop {
            let next = self.queue.lock().pop_front();
            let Some((index, scenario)) = next else {
                break;
            };
            reports.push((index, self.run_scenario(worker, scenario.as_ref()).await));
        }

        info!(%worker, scenarios = reports.len(), "Worker finished");
        reports
    }

    async fn run_scenario(&self, worker: WorkerId, scenario: &dyn Scenario) -> ScenarioReport {
        let id = ScenarioId::new(scenario.name());
        let mut attempts = 0;

        loop {
            attempts += 1;
            let (outcome, retrying) = self.run_attempt(worker, scenario, &id, attempts).await;

            if !retrying {
                return ScenarioReport {
                    scenario: id,
                    worker,
                    attempts,
                    state: ScenarioState::from(&outcome),
                    outcome,
                };
            }
        }
    }

    async fn run_attempt(
        &self,
        worker: WorkerId,
        scenario: &dyn Scenario,
        id: &ScenarioId,
        attempt: u32,
    ) -> (TestOutcome, bool) {
        let name = scenario.name();
        let platform = scenario.platform().unwrap_or(self.settings.platform);
        let config = match scenario.platform() {
            Some(pinned) => self
                .config
                .with_overlay([(keys::PLATFORM, pinned.config_prefix())]),
            None => self.config.clone(),
        };

        let description = if attempt > 1 {
            format!("{} (attempt {attempt})", scenario.description())
        } else {
            scenario.description()
        };
        let handle = self.reporter.create_test(worker, name, &description);
        self.reporter
            .info(worker, format!("Scenario started: {name}"));
        info!(%worker, scenario = %id, attempt, %platform, state = ?ScenarioState::Running, "Scenario started");

        let mut outcome = match self.execute(worker, scenario, id, attempt, platform, config).await {
            Ok(()) => TestOutcome::Passed,
            Err(Error::Skipped { reason }) => TestOutcome::skipped(reason),
            Err(e) => {
                error!(%worker, scenario = %id, attempt, error = %e, "Scenario failed");
                TestOutcome::failed(e.to_string())
            }
        };

        let screenshot = if outcome.is_failed() && self.settings.screenshot_on_failure {
            self.failure_screenshot(worker, name).await
        } else {
            None
        };

        let retrying = self.retry.should_retry(id, &mut outcome);

        match &outcome {
            TestOutcome::Passed => {
                self.reporter.pass(worker, format!("Scenario passed: {name}"));
            }
            TestOutcome::Skipped {
                reason,
                transient: true,
            } => {
                warn!(%worker, scenario = %id, attempt, "Scenario will be retried");
                self.reporter.log_with_artifact(
                    worker,
                    Level::Skip,
                    format!("Scenario retried: {name} - {reason}"),
                    screenshot,
                );
            }
            TestOutcome::Skipped { reason, .. } => {
                self.reporter
                    .skip(worker, format!("Scenario skipped: {name} - {reason}"));
            }
            TestOutcome::Failed { cause } => {
                self.reporter.log_with_artifact(
                    worker,
                    Level::Fail,
                    format!("Scenario failed: {name} - {cause}"),
                    screenshot,
                );
            }
        }

        handle.finish(outcome.level());
        self.reporter.end_test(worker);

        if self.settings.teardown == TeardownPolicy::PerScenario
            && let Err(e) = self.registry.release(worker).await
        {
            warn!(%worker, error = %e, "Session release failed");
        }

        info!(%worker, scenario = %id, attempt, %outcome, "Scenario finished");
        (outcome, retrying)
    }

    async fn execute(
        &self,
        worker: WorkerId,
        scenario: &dyn Scenario,
        id: &ScenarioId,
        attempt: u32,
        platform: Platform,
        config: Configuration,
    ) -> Result<()> {
        self.registry.acquire_with(worker, platform, &config).await?;

        let ctx = ScenarioContext {
            worker,
            scenario: id.clone(),
            attempt,
            platform,
            interactor: Interactor::new(
                worker,
                Arc::clone(&self.registry),
                Arc::clone(&self.reporter),
                Arc::clone(&self.artifacts),
                &self.settings,
            ),
            config,
            registry: Arc::clone(&self.registry),
            reporter: Arc::clone(&self.reporter),
        };

        match AssertUnwindSafe(scenario.run(&ctx)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(Error::scenario_panicked(panic_message(payload.as_ref()))),
        }
    }

    async fn failure_screenshot(&self, worker: WorkerId, name: &str) -> Option<std::path::PathBuf> {
        let session = self.registry.current(worker).ok()?;
        match self
            .artifacts
            .capture(&session, &artifacts::scenario_stem(name))
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(%worker, scenario = name, error = %e, "Failure screenshot not captured");
                None
            }
        }
    }
}

/// Scenario names key retry counters, so they must be unique within a run.
fn reject_duplicate_names(scenarios: &[Arc<dyn Scenario>]) -> Result<()> {
    let mut seen = FxHashSet::default();
    for scenario in scenarios {
        if !seen.insert(scenario.name()) {
            return Err(Error::config(format!(
                "duplicate scenario name '{}'",
                scenario.name()
            )));
        }
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "scenario panicked".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let report = |name: &str, attempts, outcome: TestOutcome| ScenarioReport {
            scenario: ScenarioId::new(name),
            worker: WorkerId::new(1),
            attempts,
            state: ScenarioState::from(&outcome),
            outcome,
        };

        let summary = SuiteSummary::from_reports(vec![
            report("a", 1, TestOutcome::Passed),
            report("b", 3, TestOutcome::failed("x")),
            report("c", 1, TestOutcome::skipped("manual")),
            report("d", 2, TestOutcome::Passed),
        ]);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.retried, 3);
        assert!(!summary.is_success());
        assert_eq!(
            summary.to_string(),
            "Total: 4, Passed: 2, Failed: 1, Skipped: 1, Retried: 3"
        );
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "scenario panicked");
    }

    #[test]
    fn test_suite_parameters_builder() {
        let params = SuiteParameters::new("smoke")
            .platform("ios")
            .device_name("iPhone 15")
            .platform_version("17.4");

        assert_eq!(params.name, "smoke");
        assert_eq!(params.platform.as_deref(), Some("ios"));
        assert_eq!(params.device_name.as_deref(), Some("iPhone 15"));
    }
}
