//! Scenario trait and the context handed to each attempt.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::capabilities::Platform;
use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::identifiers::{ScenarioId, WorkerId};
use crate::interaction::Interactor;
use crate::reporting::Reporter;
use crate::session::{Session, SessionRegistry};

// ============================================================================
// Scenario
// ============================================================================

/// One executable test scenario.
///
/// # Example
///
/// ```ignore
/// struct ValidLogin;
///
/// #[async_trait]
/// impl Scenario for ValidLogin {
///     fn name(&self) -> &str {
///         "Valid login"
///     }
///
///     async fn run(&self, ctx: &ScenarioContext) -> Result<()> {
///         let page = LoginPage::new(ctx.interactor().clone());
///         ctx.step("Log in as user1", page.login("user1", "secret")).await
///     }
/// }
/// ```
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Scenario name. Also the retry key.
    fn name(&self) -> &str;

    /// Report description.
    fn description(&self) -> String {
        format!("Scenario: {}", self.name())
    }

    /// Platform this scenario is pinned to, if any. `None` uses the suite's.
    fn platform(&self) -> Option<Platform> {
        None
    }

    /// Runs the scenario body.
    ///
    /// Return [`Error::Skipped`] to skip, any other error to fail.
    async fn run(&self, ctx: &ScenarioContext) -> Result<()>;
}

// ============================================================================
// ScenarioContext
// ============================================================================

/// Everything one scenario attempt needs, scoped to its worker.
pub struct ScenarioContext {
    pub(crate) worker: WorkerId,
    pub(crate) scenario: ScenarioId,
    pub(crate) attempt: u32,
    pub(crate) platform: Platform,
    pub(crate) config: Configuration,
    pub(crate) interactor: Interactor,
    pub(crate) registry: Arc<SessionRegistry>,
    pub(crate) reporter: Arc<Reporter>,
}

impl fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("worker", &self.worker)
            .field("scenario", &self.scenario)
            .field("attempt", &self.attempt)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl ScenarioContext {
    /// Returns the worker running this attempt.
    #[inline]
    #[must_use]
    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    /// Returns the scenario ID.
    #[inline]
    #[must_use]
    pub fn scenario_id(&self) -> &ScenarioId {
        &self.scenario
    }

    /// Returns the 1-based attempt number.
    #[inline]
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the platform of this attempt.
    #[inline]
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Returns the effective configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Returns the worker's interactor.
    #[inline]
    #[must_use]
    pub fn interactor(&self) -> &Interactor {
        &self.interactor
    }

    /// Returns the worker's live session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if no session is bound.
    pub fn session(&self) -> Result<Session> {
        self.registry.current(self.worker)
    }

    /// Logs an info event on this attempt's report unit.
    pub fn info(&self, message: impl Into<String>) {
        self.reporter.info(self.worker, message);
    }

    /// Runs one named step: Pass on success, Fail on error.
    ///
    /// # Errors
    ///
    /// Returns the step's error unchanged.
    pub async fn step<T, F>(&self, description: &str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        debug!(worker = %self.worker, scenario = %self.scenario, step = description, "Step started");

        match future.await {
            Ok(value) => {
                self.reporter.pass(self.worker, description);
                Ok(value)
            }
            Err(e) => {
                self.reporter
                    .fail(self.worker, format!("{description} - {e}"));
                Err(e)
            }
        }
    }

    /// Fails with [`Error::Assertion`] unless `condition` holds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Assertion`] carrying `message`.
    pub fn ensure(&self, condition: bool, message: impl Into<String>) -> Result<()> {
        if condition {
            Ok(())
        } else {
            Err(Error::assertion(message))
        }
    }
}
