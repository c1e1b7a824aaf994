//! Platform identifiers and capability negotiation.
//!
//! [`build`] is a pure mapping from a [`Platform`] and a [`Configuration`]
//! to the [`CapabilitySet`] sent with the session-creation request.
//!
//! # Example
//!
//! ```
//! use mobile_harness::capabilities::{self, CapabilityValue, Platform};
//! use mobile_harness::config::Configuration;
//!
//! let config = Configuration::from_pairs([
//!     ("android.platform.version", "14"),
//!     ("android.device.name", "Pixel 8"),
//!     ("android.app.path", "/apps/app.apk"),
//!     ("android.app.package", "com.example.app"),
//!     ("android.app.activity", ".MainActivity"),
//! ]);
//!
//! let caps = capabilities::build(Platform::Android, &config).unwrap();
//! assert_eq!(caps.get("automationName"), Some(&CapabilityValue::from("UiAutomator2")));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::config::{Configuration, keys};
use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default server-side idle timeout in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: i64 = 300;

/// Default WebDriverAgent local port.
pub const DEFAULT_WDA_LOCAL_PORT: i64 = 8100;

/// Vendor prefix for non-W3C capabilities.
const VENDOR_PREFIX: &str = "appium:";

// ============================================================================
// Platform
// ============================================================================

/// Target mobile platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Platform {
    /// Android via UiAutomator2.
    Android,
    /// iOS via XCUITest.
    #[serde(rename = "iOS")]
    Ios,
}

impl Platform {
    /// Returns the `platformName` capability value.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Android => "Android",
            Self::Ios => "iOS",
        }
    }

    /// Returns the configuration key prefix (`android` / `ios`).
    #[inline]
    #[must_use]
    pub const fn config_prefix(&self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
        }
    }

    /// Returns the automation engine identifier.
    #[inline]
    #[must_use]
    pub const fn automation_name(&self) -> &'static str {
        match self {
            Self::Android => "UiAutomator2",
            Self::Ios => "XCUITest",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "android" => Ok(Self::Android),
            "ios" => Ok(Self::Ios),
            _ => Err(Error::unsupported_platform(s)),
        }
    }
}

// ============================================================================
// CapabilityValue
// ============================================================================

/// Scalar capability value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CapabilityValue {
    /// String value.
    Str(String),
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
}

impl From<&str> for CapabilityValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for CapabilityValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for CapabilityValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for CapabilityValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl CapabilityValue {
    fn to_json(&self) -> Value {
        match self {
            Self::Str(s) => Value::String(s.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
        }
    }
}

// ============================================================================
// CapabilitySet
// ============================================================================

/// Immutable capability mapping for one session-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeMap<String, CapabilityValue>);

impl CapabilitySet {
    /// Returns the value for a capability.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CapabilityValue> {
        self.0.get(key)
    }

    /// Returns the number of capabilities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates capabilities in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CapabilityValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the W3C `capabilities` object for `POST /session`.
    ///
    /// `platformName` stays unprefixed; every other key gets the `appium:`
    /// vendor prefix.
    #[must_use]
    pub fn to_w3c(&self) -> Value {
        let always_match = self
            .0
            .iter()
            .map(|(key, value)| {
                let key = if key == "platformName" {
                    key.clone()
                } else {
                    format!("{VENDOR_PREFIX}{key}")
                };
                (key, value.to_json())
            })
            .collect::<Map<_, _>>();

        json!({
            "alwaysMatch": always_match,
            "firstMatch": [{}],
        })
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builds the capability set for a platform.
///
/// # Errors
///
/// - [`Error::MissingConfiguration`] if a required key is absent
/// - [`Error::InvalidConfiguration`] if a numeric key is malformed
pub fn build(platform: Platform, config: &Configuration) -> Result<CapabilitySet> {
    let mut caps = BTreeMap::new();
    let mut put = |key: &str, value: CapabilityValue| {
        caps.insert(key.to_string(), value);
    };

    put("platformName", platform.name().into());
    put("automationName", platform.automation_name().into());
    put("noReset", true.into());
    put("fullReset", false.into());
    put(
        "newCommandTimeout",
        config
            .get_int(keys::COMMAND_TIMEOUT, DEFAULT_COMMAND_TIMEOUT_SECS)?
            .into(),
    );

    match platform {
        Platform::Android => {
            put("platformVersion", config.require(keys::ANDROID_PLATFORM_VERSION)?.into());
            put("deviceName", config.require(keys::ANDROID_DEVICE_NAME)?.into());
            put("app", config.require(keys::ANDROID_APP_PATH)?.into());
            put("appPackage", config.require(keys::ANDROID_APP_PACKAGE)?.into());
            put("appActivity", config.require(keys::ANDROID_APP_ACTIVITY)?.into());
        }
        Platform::Ios => {
            put("platformVersion", config.require(keys::IOS_PLATFORM_VERSION)?.into());
            put("deviceName", config.require(keys::IOS_DEVICE_NAME)?.into());
            put("app", config.require(keys::IOS_APP_PATH)?.into());
            put("bundleId", config.require(keys::IOS_BUNDLE_ID)?.into());
            put(
                "wdaLocalPort",
                config
                    .get_int(keys::IOS_WDA_LOCAL_PORT, DEFAULT_WDA_LOCAL_PORT)?
                    .into(),
            );
        }
    }

    Ok(CapabilitySet(caps))
}

/// Parses a platform name and builds its capability set.
///
/// # Errors
///
/// - [`Error::UnsupportedPlatform`] for names outside {Android, iOS}
/// - Any error from [`build`]
pub fn build_for(platform: &str, config: &Configuration) -> Result<CapabilitySet> {
    build(platform.parse()?, config)
}

// ============================================================================
// Tests
// ============================================================================
