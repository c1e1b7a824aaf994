//! Screenshot artifact storage.
//!
//! Screenshots are written as `{stem}.png` under one directory. Stems are
//! either worker-scoped (interaction screenshots) or scenario-scoped
//! (failure screenshots); both carry a millisecond timestamp.

// ============================================================================
// Imports
// ============================================================================

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, SystemTime};

use chrono::Utc;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::identifiers::WorkerId;
use crate::session::Session;

// ============================================================================
// Constants
// ============================================================================

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S-%3f";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

static UNSAFE_CHARS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9.-]").ok());

// ============================================================================
// Naming
// ============================================================================

/// Replaces every character outside `[a-zA-Z0-9.-]` with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    match UNSAFE_CHARS.as_ref() {
        Some(re) => re.replace_all(name, "_").into_owned(),
        None => name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect(),
    }
}

/// Stem for an interaction screenshot taken by `worker`.
#[must_use]
pub fn worker_stem(worker: WorkerId) -> String {
    format!(
        "screenshot_{}_worker_{}",
        Utc::now().format(TIMESTAMP_FORMAT),
        worker.as_u32()
    )
}

/// Stem for a scenario failure screenshot.
#[must_use]
pub fn scenario_stem(scenario: &str) -> String {
    format!(
        "{}_{}",
        sanitize_file_name(scenario),
        Utc::now().format(TIMESTAMP_FORMAT)
    )
}

// ============================================================================
// ArtifactStore
// ============================================================================

/// Directory of saved screenshots.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a store rooted at `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the root directory.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes PNG bytes to `{dir}/{stem}.png`.
    ///
    /// An existing file is never overwritten: a taken name gets a `_1`,
    /// `_2`, ... suffix.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the directory or file cannot be written.
    pub fn save(&self, stem: &str, png: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let stem = sanitize_file_name(stem);

        let mut suffix = 0u32;
        loop {
            let name = if suffix == 0 {
                format!("{stem}.png")
            } else {
                format!("{stem}_{suffix}.png")
            };
            let path = self.dir.join(name);

            match File::create_new(&path) {
                Ok(mut file) => {
                    file.write_all(png)?;
                    debug!(path = %path.display(), bytes = png.len(), "Screenshot saved");
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Captures a screenshot from `session` and saves it.
    ///
    /// # Errors
    ///
    /// Returns the remote or I/O error.
    pub async fn capture(&self, session: &Session, stem: &str) -> Result<PathBuf> {
        let png = session.screenshot().await?;
        self.save(stem, &png)
    }

    /// Deletes files whose modification time is older than `days`.
    ///
    /// A missing directory counts as empty. Returns the number of files deleted.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the directory cannot be listed.
    pub fn cleanup_older_than(&self, days: u64) -> Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let max_age = Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY));
        let now = SystemTime::now();
        let mut deleted = 0;

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok());

            if age.is_some_and(|age| age > max_age) {
                match fs::remove_file(entry.path()) {
                    Ok(()) => deleted += 1,
                    Err(e) => warn!(path = %entry.path().display(), error = %e, "Failed to delete old screenshot"),
                }
            }
        }

        if deleted > 0 {
            info!(deleted, days, dir = %self.dir.display(), "Old screenshots cleaned up");
        }
        Ok(deleted)
    }
}

// ============================================================================
// Tests
// ============================================================================
