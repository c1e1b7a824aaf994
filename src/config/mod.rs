//! Layered harness configuration.
//!
//! Values are looked up in three layers, highest precedence first:
//!
//! | Layer | Source | Mutability |
//! |-------|--------|------------|
//! | runtime | `HARNESS_*` environment, explicit overrides | fixed at construction |
//! | overlay | suite/scenario parameters | new value per [`Configuration::with_overlay`] |
//! | file | TOML configuration file | fixed at construction |
//!
//! A [`Configuration`] is never mutated in place. Overlays produce a new
//! value that shares the base layers, so one instance can be handed to every
//! worker by reference.
//!
//! # Example
//!
//! ```
//! use mobile_harness::config::{Configuration, keys};
//!
//! let config = Configuration::from_toml_str(
//!     r#"
//!     [appium.server]
//!     url = "http://127.0.0.1:4723"
//!
//!     [test]
//!     platform = "android"
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.get(keys::SERVER_URL), Some("http://127.0.0.1:4723"));
//! assert_eq!(config.get_int(keys::RETRY_COUNT, 2).unwrap(), 2);
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Recognized configuration keys.
pub mod keys;

/// Typed settings snapshot.
pub mod settings;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

pub use settings::{HarnessSettings, ReportSettings, TeardownPolicy};

// ============================================================================
// Constants
// ============================================================================

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "HARNESS_CONFIG";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "HARNESS_";

/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
const DEFAULT_CONFIG_PATH: &str = "config/harness.toml";

// ============================================================================
// Types
// ============================================================================

type Layer = Arc<FxHashMap<String, String>>;

// ============================================================================
// Configuration
// ============================================================================

/// Immutable layered key/value configuration.
#[derive(Clone, Default)]
pub struct Configuration {
    /// File-sourced base values, keyed by dotted name.
    file: Layer,

    /// Suite/scenario parameters, keyed by dotted name.
    overlay: Layer,

    /// Runtime overrides, keyed by normalized (env-style) name.
    runtime: Layer,
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("file_keys", &self.file.len())
            .field("overlay_keys", &self.overlay.len())
            .field("runtime_keys", &self.runtime.len())
            .finish()
    }
}

// ============================================================================
// Configuration - Constructors
// ============================================================================

impl Configuration {
    /// Creates an empty configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration whose file layer holds the given pairs.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let file = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<FxHashMap<_, _>>();

        Self {
            file: Arc::new(file),
            ..Self::default()
        }
    }

    /// Parses TOML text into the file layer.
    ///
    /// Nested tables flatten into dotted keys.
    ///
    /// # Errors
    ///
    /// - [`Error::Toml`] if the text is not valid TOML
    /// - [`Error::Config`] if a value is an array
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let table: toml::Table = text.parse()?;
        let mut file = FxHashMap::default();
        flatten_table("", &table, &mut file)?;

        Ok(Self {
            file: Arc::new(file),
            ..Self::default()
        })
    }

    /// Loads the file layer from a TOML file.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be read
    /// - [`Error::Toml`] / [`Error::Config`] if it cannot be parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;

        info!(path = %path.display(), keys = config.file.len(), "Configuration loaded");
        Ok(config)
    }

    /// Loads configuration from the default sources.
    ///
    /// Reads the file named by `HARNESS_CONFIG` (which must exist), or
    /// `config/harness.toml` if present, then applies `HARNESS_*`
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be loaded.
    pub fn from_default_sources() -> Result<Self> {
        let base = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(PathBuf::from(path))?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::load(default_path)?
                } else {
                    warn!(
                        path = DEFAULT_CONFIG_PATH,
                        "No configuration file found, using overrides only"
                    );
                    Self::new()
                }
            }
        };

        Ok(base.with_env_overrides())
    }
}

// ============================================================================
// Configuration - Layering
// ============================================================================

impl Configuration {
    /// Captures `HARNESS_*` environment variables as runtime overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        let vars = std::env::vars()
            .filter_map(|(name, value)| {
                name.strip_prefix(ENV_PREFIX)
                    .filter(|rest| !rest.is_empty() && name != CONFIG_PATH_ENV)
                    .map(|rest| (rest.to_string(), value))
            })
            .collect::<Vec<_>>();

        debug!(count = vars.len(), "Captured environment overrides");
        self.with_runtime_overrides(vars)
    }

    /// Adds runtime overrides, which take precedence over every other layer.
    ///
    /// Keys may be given dotted (`test.platform`) or env-style
    /// (`TEST_PLATFORM`).
    #[must_use]
    pub fn with_runtime_overrides<K, V>(self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut runtime = (*self.runtime).clone();
        for (key, value) in pairs {
            runtime.insert(normalize_key(key.as_ref()), value.into());
        }

        Self {
            runtime: Arc::new(runtime),
            ..self
        }
    }

    /// Returns a configuration with the given suite/scenario parameters
    /// layered above the file values.
    ///
    /// The receiver is left untouched.
    #[must_use]
    pub fn with_overlay<K, V>(&self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut overlay = (*self.overlay).clone();
        for (key, value) in pairs {
            let key = key.into();
            let value = value.into();
            debug!(key = %key, value = %value, "Overlay parameter applied");
            overlay.insert(key, value);
        }

        Self {
            file: Arc::clone(&self.file),
            overlay: Arc::new(overlay),
            runtime: Arc::clone(&self.runtime),
        }
    }
}

// ============================================================================
// Configuration - Accessors
// ============================================================================

impl Configuration {
    /// Returns the effective value for a key.
    ///
    /// Empty runtime overrides are ignored.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        if let Some(value) = self.runtime.get(&normalize_key(key))
            && !value.is_empty()
        {
            return Some(value);
        }

        self.overlay
            .get(key)
            .or_else(|| self.file.get(key))
            .map(String::as_str)
    }

    /// Returns the value for a key, or `default` if absent.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Returns a required, non-empty value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfiguration`] if the key is absent or empty.
    pub fn require(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(Error::missing_configuration(key)),
        }
    }

    /// Returns a boolean value, or `default` if absent.
    ///
    /// Accepts `true`/`false`/`yes`/`no`/`1`/`0`, case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for any other value.
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };

        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(Error::invalid_configuration(key, raw, "a boolean")),
        }
    }

    /// Returns an integer value, or `default` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the value is not an integer.
    pub fn get_int(&self, key: &str, default: i64) -> Result<i64> {
        match self.get(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| Error::invalid_configuration(key, raw, "an integer")),
            None => Ok(default),
        }
    }

    /// Returns a non-negative integer value, or `default` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the value is not a
    /// non-negative integer.
    pub fn get_u64(&self, key: &str, default: u64) -> Result<u64> {
        match self.get(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| Error::invalid_configuration(key, raw, "a non-negative integer")),
            None => Ok(default),
        }
    }

    /// Returns `true` if the key resolves in any layer.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Maps a dotted key to its env-style form (`test.platform` → `TEST_PLATFORM`).
fn normalize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '.' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// Flattens nested TOML tables into dotted keys.
fn flatten_table(
    prefix: &str,
    table: &toml::Table,
    out: &mut FxHashMap<String, String>,
) -> Result<()> {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };

        match value {
            toml::Value::Table(nested) => flatten_table(&key, nested, out)?,
            toml::Value::String(s) => {
                out.insert(key, s.clone());
            }
            toml::Value::Integer(i) => {
                out.insert(key, i.to_string());
            }
            toml::Value::Float(f) => {
                out.insert(key, f.to_string());
            }
            toml::Value::Boolean(b) => {
                out.insert(key, b.to_string());
            }
            toml::Value::Datetime(dt) => {
                out.insert(key, dt.to_string());
            }
            toml::Value::Array(_) => {
                return Err(Error::config(format!(
                    "Array values are not supported: {key}"
                )));
            }
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [appium.server]
        url = "http://127.0.0.1:4723"

        [test]
        platform = "android"
        retry = { count = 3 }

        [screenshot.on]
        failure = true
    "#;

    #[test]
    fn test_toml_flattens_to_dotted_keys() {
        let config = Configuration::from_toml_str(SAMPLE).expect("parse");
        assert_eq!(config.get("appium.server.url"), Some("http://127.0.0.1:4723"));
        assert_eq!(config.get("test.platform"), Some("android"));
        assert_eq!(config.get("test.retry.count"), Some("3"));
        assert_eq!(config.get("screenshot.on.failure"), Some("true"));
    }

    #[test]
    fn test_toml_rejects_arrays() {
        let result = Configuration::from_toml_str("devices = [\"a\", \"b\"]");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_runtime_overrides_beat_file() {
        let config = Configuration::from_pairs([("test.platform", "android")])
            .with_runtime_overrides([("TEST_PLATFORM", "ios")]);
        assert_eq!(config.get("test.platform"), Some("ios"));
    }

    #[test]
    fn test_runtime_overrides_accept_dotted_keys() {
        let config = Configuration::new().with_runtime_overrides([("test.retry.count", "5")]);
        assert_eq!(config.get_int("test.retry.count", 2).unwrap(), 5);
    }

    #[test]
    fn test_empty_runtime_override_is_ignored() {
        let config = Configuration::from_pairs([("test.platform", "android")])
            .with_runtime_overrides([("TEST_PLATFORM", "")]);
        assert_eq!(config.get("test.platform"), Some("android"));
    }

    #[test]
    fn test_overlay_beats_file_but_not_runtime() {
        let base = Configuration::from_pairs([
            ("test.platform", "android"),
            ("android.device.name", "Pixel"),
        ])
        .with_runtime_overrides([("ANDROID_DEVICE_NAME", "Emulator")]);

        let layered = base.with_overlay([
            ("test.platform", "ios"),
            ("android.device.name", "Galaxy"),
        ]);

        assert_eq!(layered.get("test.platform"), Some("ios"));
        assert_eq!(layered.get("android.device.name"), Some("Emulator"));
        // Base is untouched.
        assert_eq!(base.get("test.platform"), Some("android"));
    }

    #[test]
    fn test_require_missing_key() {
        let config = Configuration::new();
        let err = config.require("ios.bundle.id").unwrap_err();
        assert!(matches!(err, Error::MissingConfiguration { ref key } if key == "ios.bundle.id"));
    }

    #[test]
    fn test_require_blank_value_is_missing() {
        let config = Configuration::from_pairs([("ios.bundle.id", "  ")]);
        assert!(config.require("ios.bundle.id").is_err());
    }

    #[test]
    fn test_typed_accessors_default_when_absent() {
        let config = Configuration::new();
        assert_eq!(config.get_int("test.timeout.explicit", 10).unwrap(), 10);
        assert!(config.get_bool("screenshot.on.failure", true).unwrap());
        assert_eq!(config.get_or("report.theme", "standard"), "standard");
    }

    #[test]
    fn test_typed_accessors_reject_garbage() {
        let config = Configuration::from_pairs([
            ("test.retry.count", "two"),
            ("screenshot.on.pass", "maybe"),
            ("test.parallel.workers", "-1"),
        ]);
        assert!(config.get_int("test.retry.count", 2).is_err());
        assert!(config.get_bool("screenshot.on.pass", false).is_err());
        assert!(config.get_u64("test.parallel.workers", 2).is_err());
    }

    #[test]
    fn test_bool_spellings() {
        let config = Configuration::from_pairs([("a", "YES"), ("b", "0"), ("c", "False")]);
        assert!(config.get_bool("a", false).unwrap());
        assert!(!config.get_bool("b", true).unwrap());
        assert!(!config.get_bool("c", true).unwrap());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("harness.toml");
        std::fs::write(&path, SAMPLE).expect("write config");

        let config = Configuration::load(&path).expect("load");
        assert_eq!(config.get("test.platform"), Some("android"));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("appium.server.url"), "APPIUM_SERVER_URL");
        assert_eq!(normalize_key("TEST_PLATFORM"), "TEST_PLATFORM");
    }
}
