//! Report event types.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Level
// ============================================================================

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Informational step.
    Info,
    /// Successful step or scenario.
    Pass,
    /// Failed step or scenario.
    Fail,
    /// Skipped or retried scenario.
    Skip,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Skip => "SKIP",
        })
    }
}

// ============================================================================
// ReportEvent
// ============================================================================

/// One logged report event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEvent {
    /// Severity.
    pub level: Level,
    /// Message text.
    pub message: String,
    /// Attached artifact path, usually a screenshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    /// Wall-clock time the event was logged.
    pub timestamp: DateTime<Utc>,
}

impl ReportEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            artifact: None,
            timestamp: Utc::now(),
        }
    }

    /// Attaches an artifact.
    #[must_use]
    pub fn with_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact = Some(path.into());
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
