//! Report document and its writers.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::identifiers::WorkerId;

use super::{Level, ReportEvent};

// ============================================================================
// Document
// ============================================================================

/// Serialized report for one suite run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    /// Report title.
    pub title: String,
    /// Theme name.
    pub theme: String,
    /// Time the document was produced.
    pub generated_at: DateTime<Utc>,
    /// Host and run metadata.
    pub system_info: BTreeMap<String, String>,
    /// Suite-level events.
    pub suite_events: Vec<ReportEvent>,
    /// Test units in creation order.
    pub tests: Vec<TestRecord>,
}

/// Serialized test unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    /// Unit ID.
    pub id: Uuid,
    /// Scenario name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Worker that ran the unit.
    pub worker: WorkerId,
    /// Creation time.
    pub started_at: DateTime<Utc>,
    /// Final status, if the unit was finished.
    pub status: Option<Level>,
    /// Ordered events.
    pub events: Vec<ReportEvent>,
}

// ============================================================================
// ReportWriter
// ============================================================================

/// Persists report documents.
pub trait ReportWriter: Send + Sync {
    /// Writes the document, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns I/O or serialization errors.
    fn write(&self, document: &ReportDocument) -> Result<()>;
}

// ============================================================================
// JsonFileWriter
// ============================================================================

/// Writes the document as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonFileWriter {
    path: PathBuf,
}

impl JsonFileWriter {
    /// Creates a writer targeting `path`. Parent directories are created on write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the output path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportWriter for JsonFileWriter {
    fn write(&self, document: &ReportDocument) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), document)?;

        info!(path = %self.path.display(), tests = document.tests.len(), "Report written");
        Ok(())
    }
}

// ============================================================================
// MemoryWriter
// ============================================================================

/// Keeps every written document in memory.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    documents: Mutex<Vec<ReportDocument>>,
}

impl MemoryWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the most recently written document.
    #[must_use]
    pub fn last(&self) -> Option<ReportDocument> {
        self.documents.lock().last().cloned()
    }

    /// Returns how many documents were written.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.documents.lock().len()
    }
}

impl ReportWriter for MemoryWriter {
    fn write(&self, document: &ReportDocument) -> Result<()> {
        self.documents.lock().push(document.clone());
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> ReportDocument {
        ReportDocument {
            title: "Mobile Test Report".to_string(),
            theme: "standard".to_string(),
            generated_at: Utc::now(),
            system_info: BTreeMap::from([("platform".to_string(), "Android".to_string())]),
            suite_events: vec![ReportEvent::new(Level::Info, "suite started")],
            tests: vec![TestRecord {
                id: Uuid::new_v4(),
                name: "login".to_string(),
                description: "Scenario: login".to_string(),
                worker: WorkerId::new(1),
                started_at: Utc::now(),
                status: Some(Level::Pass),
                events: vec![ReportEvent::new(Level::Pass, "done")],
            }],
        }
    }

    #[test]
    fn test_json_writer_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("reports/nested/report.json");
        let writer = JsonFileWriter::new(&path);

        writer.write(&document()).expect("write");

        let text = fs::read_to_string(&path).expect("read");
        let parsed: ReportDocument = serde_json::from_str(&text).expect("parse");
        assert_eq!(parsed.tests[0].name, "login");
        assert_eq!(parsed.system_info["platform"], "Android");
    }

    #[test]
    fn test_memory_writer_keeps_documents() {
        let writer = MemoryWriter::new();
        writer.write(&document()).expect("write");
        writer.write(&document()).expect("write");

        assert_eq!(writer.writes(), 2);
        assert_eq!(writer.last().expect("doc").title, "Mobile Test Report");
    }
}
