//! Typed settings snapshot resolved from a [`Configuration`].
//!
//! Resolved once per suite so that malformed values fail suite setup instead
//! of surfacing mid-scenario.

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::capabilities::Platform;
use crate::error::{Error, Result};

use super::Configuration;
use super::keys;

// ============================================================================
// Defaults
// ============================================================================

/// Default explicit wait bound in seconds.
pub const DEFAULT_EXPLICIT_WAIT_SECS: u64 = 10;

/// Default implicit wait floor in seconds.
pub const DEFAULT_IMPLICIT_WAIT_SECS: u64 = 30;

/// Default poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Default maximum retries per scenario.
pub const DEFAULT_RETRY_COUNT: u32 = 2;

/// Default number of parallel workers.
pub const DEFAULT_WORKERS: usize = 2;

/// Default screenshot retention in days.
pub const DEFAULT_RETENTION_DAYS: u64 = 7;

/// Default screenshot directory.
pub const DEFAULT_SCREENSHOT_DIR: &str = "test-output/screenshots";

/// Default report document path.
pub const DEFAULT_REPORT_PATH: &str = "test-output/reports/report.json";

// ============================================================================
// TeardownPolicy
// ============================================================================

/// When sessions are released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TeardownPolicy {
    /// Release after every scenario attempt.
    #[default]
    PerScenario,
    /// Keep each worker's session until suite end.
    PerSuite,
}

impl FromStr for TeardownPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scenario" | "test" | "method" => Ok(Self::PerScenario),
            "suite" => Ok(Self::PerSuite),
            _ => Err(Error::invalid_configuration(
                keys::TEARDOWN,
                s,
                "`scenario` or `suite`",
            )),
        }
    }
}

// ============================================================================
// ReportSettings
// ============================================================================

/// Report document settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    /// Output path of the JSON report document.
    pub path: PathBuf,
    /// Report title.
    pub title: String,
    /// Theme name passed through to the renderer.
    pub theme: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_REPORT_PATH),
            title: "Mobile Test Report".to_string(),
            theme: "standard".to_string(),
        }
    }
}

// ============================================================================
// HarnessSettings
// ============================================================================

/// Typed view over the recognized configuration keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessSettings {
    /// Default platform for scenarios that do not pin one.
    pub platform: Platform,
    /// Explicit wait bound for interactions.
    pub explicit_wait: Duration,
    /// Implicit wait floor applied to each new session.
    pub implicit_wait: Duration,
    /// Interval between interaction polls.
    pub poll_interval: Duration,
    /// Maximum retries per scenario.
    pub max_retries: u32,
    /// Number of parallel workers.
    pub workers: usize,
    /// Session teardown policy.
    pub teardown: TeardownPolicy,
    /// Attach screenshots to pass events.
    pub screenshot_on_pass: bool,
    /// Attach screenshots to fail events.
    pub screenshot_on_failure: bool,
    /// Screenshot directory.
    pub screenshot_dir: PathBuf,
    /// Screenshot retention window in days.
    pub screenshot_retention_days: u64,
    /// Report document settings.
    pub report: ReportSettings,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            platform: Platform::Android,
            explicit_wait: Duration::from_secs(DEFAULT_EXPLICIT_WAIT_SECS),
            implicit_wait: Duration::from_secs(DEFAULT_IMPLICIT_WAIT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_retries: DEFAULT_RETRY_COUNT,
            workers: DEFAULT_WORKERS,
            teardown: TeardownPolicy::PerScenario,
            screenshot_on_pass: false,
            screenshot_on_failure: true,
            screenshot_dir: PathBuf::from(DEFAULT_SCREENSHOT_DIR),
            screenshot_retention_days: DEFAULT_RETENTION_DAYS,
            report: ReportSettings::default(),
        }
    }
}

impl HarnessSettings {
    /// Resolves settings from configuration, applying defaults.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedPlatform`] if `test.platform` is not android/ios
    /// - [`Error::InvalidConfiguration`] for malformed values or zero workers
    pub fn from_config(config: &Configuration) -> Result<Self> {
        let platform = config.get_or(keys::PLATFORM, "android").parse()?;

        let poll_interval_ms = config.get_u64(keys::POLL_INTERVAL_MS, DEFAULT_POLL_INTERVAL_MS)?;
        if poll_interval_ms == 0 {
            return Err(Error::invalid_configuration(
                keys::POLL_INTERVAL_MS,
                "0",
                "a positive integer",
            ));
        }

        let max_retries = config.get_u64(keys::RETRY_COUNT, u64::from(DEFAULT_RETRY_COUNT))?;
        let max_retries = u32::try_from(max_retries).map_err(|_| {
            Error::invalid_configuration(keys::RETRY_COUNT, max_retries.to_string(), "a u32")
        })?;

        let workers = config.get_u64(keys::PARALLEL_WORKERS, DEFAULT_WORKERS as u64)?;
        if workers == 0 {
            return Err(Error::invalid_configuration(
                keys::PARALLEL_WORKERS,
                "0",
                "at least one worker",
            ));
        }

        let teardown = match config.get(keys::TEARDOWN) {
            Some(raw) => raw.parse()?,
            None => TeardownPolicy::default(),
        };

        let defaults = ReportSettings::default();
        let report = ReportSettings {
            path: config
                .get(keys::REPORT_PATH)
                .map_or(defaults.path, PathBuf::from),
            title: config
                .get(keys::REPORT_TITLE)
                .map_or(defaults.title, str::to_string),
            theme: config
                .get(keys::REPORT_THEME)
                .map_or(defaults.theme, str::to_string),
        };

        Ok(Self {
            platform,
            explicit_wait: Duration::from_secs(
                config.get_u64(keys::EXPLICIT_WAIT, DEFAULT_EXPLICIT_WAIT_SECS)?,
            ),
            implicit_wait: Duration::from_secs(
                config.get_u64(keys::IMPLICIT_WAIT, DEFAULT_IMPLICIT_WAIT_SECS)?,
            ),
            poll_interval: Duration::from_millis(poll_interval_ms),
            max_retries,
            workers: workers as usize,
            teardown,
            screenshot_on_pass: config.get_bool(keys::SCREENSHOT_ON_PASS, false)?,
            screenshot_on_failure: config.get_bool(keys::SCREENSHOT_ON_FAILURE, true)?,
            screenshot_dir: PathBuf::from(config.get_or(keys::SCREENSHOT_DIR, DEFAULT_SCREENSHOT_DIR)),
            screenshot_retention_days: config
                .get_u64(keys::SCREENSHOT_RETENTION_DAYS, DEFAULT_RETENTION_DAYS)?,
            report,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_config() {
        let settings = HarnessSettings::from_config(&Configuration::new()).expect("settings");
        assert_eq!(settings, HarnessSettings::default());
        assert_eq!(settings.explicit_wait, Duration::from_secs(10));
        assert_eq!(settings.implicit_wait, Duration::from_secs(30));
        assert_eq!(settings.max_retries, 2);
        assert_eq!(settings.workers, 2);
    }

    #[test]
    fn test_values_from_config() {
        let config = Configuration::from_pairs([
            ("test.platform", "iOS"),
            ("test.timeout.explicit", "5"),
            ("test.poll.interval.ms", "100"),
            ("test.retry.count", "1"),
            ("test.parallel.workers", "4"),
            ("session.teardown", "suite"),
            ("screenshot.on.pass", "true"),
            ("report.theme", "dark"),
        ]);

        let settings = HarnessSettings::from_config(&config).expect("settings");
        assert_eq!(settings.platform, Platform::Ios);
        assert_eq!(settings.explicit_wait, Duration::from_secs(5));
        assert_eq!(settings.poll_interval, Duration::from_millis(100));
        assert_eq!(settings.max_retries, 1);
        assert_eq!(settings.workers, 4);
        assert_eq!(settings.teardown, TeardownPolicy::PerSuite);
        assert!(settings.screenshot_on_pass);
        assert_eq!(settings.report.theme, "dark");
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = Configuration::from_pairs([("test.parallel.workers", "0")]);
        assert!(HarnessSettings::from_config(&config).is_err());
    }

    #[test]
    fn test_unknown_platform_rejected() {
        let config = Configuration::from_pairs([("test.platform", "windows")]);
        let err = HarnessSettings::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform { .. }));
    }

    #[test]
    fn test_teardown_policy_parse() {
        assert_eq!("scenario".parse::<TeardownPolicy>().unwrap(), TeardownPolicy::PerScenario);
        assert_eq!("SUITE".parse::<TeardownPolicy>().unwrap(), TeardownPolicy::PerSuite);
        assert!("never".parse::<TeardownPolicy>().is_err());
    }
}
