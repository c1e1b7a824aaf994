//! Mobile Harness - UI test harness for Appium-compatible automation servers.
//!
//! This library runs mobile UI test scenarios against an automation server
//! speaking the W3C WebDriver protocol with Appium extensions.
//!
//! # Architecture
//!
//! - **Configuration**: layered key/value store (file, suite overlay, runtime)
//! - **Sessions**: one remote session per worker, created lazily
//! - **Interactions**: polling waits with a per-probe deadline
//! - **Lifecycle**: parallel workers drain a scenario queue with bounded retry
//! - **Reporting**: per-worker report units flushed to a JSON document
//!
//! Every worker-scoped operation takes an explicit [`WorkerId`]. Nothing is
//! keyed by thread identity.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use mobile_harness::{
//!     By, Configuration, ElementRef, HarnessSettings, Reporter, Result, Scenario,
//!     ScenarioContext, SuiteParameters, SuiteRunner, WebDriverServer,
//! };
//!
//! struct OpenSettings;
//!
//! #[async_trait]
//! impl Scenario for OpenSettings {
//!     fn name(&self) -> &str {
//!         "Open settings"
//!     }
//!
//!     async fn run(&self, ctx: &ScenarioContext) -> Result<()> {
//!         let settings = ElementRef::new("Settings").any(By::accessibility_id("settings"));
//!         ctx.interactor().click(&settings).await
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Configuration::from_default_sources()?;
//!     let settings = HarnessSettings::from_config(&config)?;
//!     let server = Arc::new(WebDriverServer::from_config(&config)?);
//!     let reporter = Arc::new(Reporter::json(settings.report));
//!
//!     let scenarios: Vec<Arc<dyn Scenario>> = vec![Arc::new(OpenSettings)];
//!     let runner = SuiteRunner::new(config, server, reporter);
//!     let summary = runner.run(SuiteParameters::new("smoke"), scenarios).await?;
//!
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Layered configuration and typed settings |
//! | [`capabilities`] | Platform capability negotiation |
//! | [`locator`] | Locator strategies and platform-aware element refs |
//! | [`session`] | Per-worker session registry |
//! | [`interaction`] | Waits and element actions |
//! | [`reporting`] | Report units, events, and writers |
//! | [`artifacts`] | Screenshot storage and retention |
//! | [`retry`] | Bounded per-scenario retry |
//! | [`lifecycle`] | Scenario trait and suite runner |
//! | [`remote`] | Automation server abstraction |
//! | [`protocol`] | W3C WebDriver command/response types (internal) |
//! | [`transport`] | HTTP transport (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Screenshot storage and retention.
pub mod artifacts;

/// Platform capability negotiation.
pub mod capabilities;

/// Layered configuration.
///
/// Use [`Configuration::from_default_sources()`] to load `config/harness.toml`
/// with environment overrides.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Element waits and actions.
pub mod interaction;

/// Scenario and suite lifecycle.
pub mod lifecycle;

/// Locator strategies and element references.
pub mod locator;

/// W3C WebDriver protocol types.
///
/// Internal module defining command/response structures.
pub mod protocol;

/// Automation server abstraction.
///
/// [`WebDriverServer`] talks HTTP; [`ScriptedServer`] answers from memory.
pub mod remote;

/// Report units and writers.
pub mod reporting;

/// Bounded retry of failed scenarios.
pub mod retry;

/// Per-worker sessions.
pub mod session;

/// HTTP transport layer.
///
/// Internal module handling request execution and error mapping.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration
pub use capabilities::{CapabilitySet, Platform};
pub use config::{Configuration, HarnessSettings, ReportSettings, TeardownPolicy};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ElementId, ScenarioId, SessionId, WorkerId};

// Interaction types
pub use interaction::{Condition, InteractionOutcome, Interactor};
pub use locator::{By, ElementRef};

// Lifecycle types
pub use lifecycle::{
    Scenario, ScenarioContext, ScenarioReport, ScenarioState, SuiteParameters, SuiteRunner,
    SuiteState, SuiteSummary,
};
pub use retry::{RetryPolicy, TestOutcome};

// Remote types
pub use remote::{AutomationServer, ElementScript, RemoteSession, ScriptedServer, WebDriverServer};
pub use session::{Session, SessionRegistry};

// Reporting types
pub use artifacts::ArtifactStore;
pub use reporting::{JsonFileWriter, Level, MemoryWriter, ReportEvent, Reporter};
