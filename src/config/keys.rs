//! Recognized configuration keys.
//!
//! Keys use dotted lower-case names. The same names appear as nested TOML
//! tables in the configuration file and, upper-cased with underscores, as
//! `HARNESS_` environment overrides.

// ============================================================================
// Server & Platform
// ============================================================================

/// Automation server base URL.
pub const SERVER_URL: &str = "appium.server.url";

/// Target platform (`android` or `ios`).
pub const PLATFORM: &str = "test.platform";

/// Server-side idle timeout in seconds (`newCommandTimeout`).
pub const COMMAND_TIMEOUT: &str = "session.command.timeout";

/// Session teardown policy (`scenario` or `suite`).
pub const TEARDOWN: &str = "session.teardown";

// ============================================================================
// Android
// ============================================================================

/// Android OS version.
pub const ANDROID_PLATFORM_VERSION: &str = "android.platform.version";
/// Android device or emulator name.
pub const ANDROID_DEVICE_NAME: &str = "android.device.name";
/// Path to the APK.
pub const ANDROID_APP_PATH: &str = "android.app.path";
/// Application package.
pub const ANDROID_APP_PACKAGE: &str = "android.app.package";
/// Launch activity.
pub const ANDROID_APP_ACTIVITY: &str = "android.app.activity";

// ============================================================================
// iOS
// ============================================================================

/// iOS version.
pub const IOS_PLATFORM_VERSION: &str = "ios.platform.version";
/// iOS device or simulator name.
pub const IOS_DEVICE_NAME: &str = "ios.device.name";
/// Path to the .app or .ipa.
pub const IOS_APP_PATH: &str = "ios.app.path";
/// Bundle identifier.
pub const IOS_BUNDLE_ID: &str = "ios.bundle.id";
/// WebDriverAgent local port.
pub const IOS_WDA_LOCAL_PORT: &str = "ios.wda.local.port";

// ============================================================================
// Timing & Execution
// ============================================================================

/// Explicit wait bound in seconds.
pub const EXPLICIT_WAIT: &str = "test.timeout.explicit";
/// Implicit wait floor in seconds.
pub const IMPLICIT_WAIT: &str = "test.timeout.implicit";
/// Poll interval in milliseconds.
pub const POLL_INTERVAL_MS: &str = "test.poll.interval.ms";
/// Maximum retries per scenario.
pub const RETRY_COUNT: &str = "test.retry.count";
/// Number of parallel workers.
pub const PARALLEL_WORKERS: &str = "test.parallel.workers";

// ============================================================================
// Artifacts & Reporting
// ============================================================================

/// Attach a screenshot to every pass event.
pub const SCREENSHOT_ON_PASS: &str = "screenshot.on.pass";
/// Attach a screenshot to every fail event.
pub const SCREENSHOT_ON_FAILURE: &str = "screenshot.on.failure";
/// Screenshot directory.
pub const SCREENSHOT_DIR: &str = "screenshot.dir";
/// Days to keep screenshots before suite-start eviction.
pub const SCREENSHOT_RETENTION_DAYS: &str = "screenshot.retention.days";
/// Report document path.
pub const REPORT_PATH: &str = "report.path";
/// Report title.
pub const REPORT_TITLE: &str = "report.title";
/// Report theme name (`standard` or `dark`).
pub const REPORT_THEME: &str = "report.theme";

/// CI build URL, recorded as report system info.
pub const CI_BUILD_URL: &str = "ci.build.url";
/// CI build number.
pub const CI_BUILD_NUMBER: &str = "ci.build.number";
/// CI job name.
pub const CI_JOB_NAME: &str = "ci.job.name";

/// Returns the device-name key for a platform prefix.
#[must_use]
pub fn device_name_key(platform_prefix: &str) -> String {
    format!("{platform_prefix}.device.name")
}

/// Returns the platform-version key for a platform prefix.
#[must_use]
pub fn platform_version_key(platform_prefix: &str) -> String {
    format!("{platform_prefix}.platform.version")
}
