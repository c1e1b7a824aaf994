//! Element locator strategies and named element references.
//!
//! [`By`] is one Appium locator strategy. It serializes straight into the
//! W3C find-element body (`{"using": ..., "value": ...}`).
//!
//! [`ElementRef`] is what page objects declare: a human-readable name plus
//! a locator per platform.
//!
//! # Example
//!
//! ```
//! use mobile_harness::capabilities::Platform;
//! use mobile_harness::locator::{By, ElementRef};
//!
//! let login = ElementRef::new("Login Button")
//!     .android(By::id("com.example:id/login"))
//!     .ios(By::accessibility_id("login"));
//!
//! assert_eq!(login.locator_for(Platform::Ios).unwrap().strategy(), "accessibility id");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capabilities::Platform;
use crate::error::{Error, Result};

// ============================================================================
// By Enum
// ============================================================================

/// Element locator strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "using", content = "value")]
pub enum By {
    /// Accessibility identifier (content-desc on Android, accessibilityIdentifier on iOS).
    #[serde(rename = "accessibility id")]
    AccessibilityId(String),

    /// Native resource ID.
    #[serde(rename = "id")]
    Id(String),

    /// XPath expression over the page source.
    #[serde(rename = "xpath")]
    XPath(String),

    /// Native class name.
    #[serde(rename = "class name")]
    ClassName(String),

    /// UiAutomator selector expression (Android only).
    ///
    /// # Example
    /// ```ignore
    /// By::AndroidUiAutomator("new UiSelector().text(\"Login\")".into())
    /// ```
    #[serde(rename = "-android uiautomator")]
    AndroidUiAutomator(String),

    /// NSPredicate string (iOS only).
    #[serde(rename = "-ios predicate string")]
    IosPredicate(String),

    /// XCUITest class chain (iOS only).
    #[serde(rename = "-ios class chain")]
    IosClassChain(String),
}

impl By {
    /// Creates an accessibility ID locator.
    #[inline]
    pub fn accessibility_id(id: impl Into<String>) -> Self {
        Self::AccessibilityId(id.into())
    }

    /// Creates a resource ID locator.
    #[inline]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Creates an XPath locator.
    #[inline]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Creates a class name locator.
    #[inline]
    pub fn class_name(name: impl Into<String>) -> Self {
        Self::ClassName(name.into())
    }

    /// Creates a UiAutomator locator.
    #[inline]
    pub fn android_uiautomator(expr: impl Into<String>) -> Self {
        Self::AndroidUiAutomator(expr.into())
    }

    /// Creates an iOS predicate locator.
    #[inline]
    pub fn ios_predicate(expr: impl Into<String>) -> Self {
        Self::IosPredicate(expr.into())
    }

    /// Creates an iOS class chain locator.
    #[inline]
    pub fn ios_class_chain(expr: impl Into<String>) -> Self {
        Self::IosClassChain(expr.into())
    }

    /// Returns the strategy name for the protocol.
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::AccessibilityId(_) => "accessibility id",
            Self::Id(_) => "id",
            Self::XPath(_) => "xpath",
            Self::ClassName(_) => "class name",
            Self::AndroidUiAutomator(_) => "-android uiautomator",
            Self::IosPredicate(_) => "-ios predicate string",
            Self::IosClassChain(_) => "-ios class chain",
        }
    }

    /// Returns the locator value.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::AccessibilityId(v)
            | Self::Id(v)
            | Self::XPath(v)
            | Self::ClassName(v)
            | Self::AndroidUiAutomator(v)
            | Self::IosPredicate(v)
            | Self::IosClassChain(v) => v,
        }
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy(), self.value())
    }
}

// ============================================================================
// ElementRef
// ============================================================================

/// Named element with per-platform locators.
///
/// The name is what report events show. A locator set through
/// [`ElementRef::any`] applies to both platforms unless a platform-specific
/// one is also set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    name: String,
    android: Option<By>,
    ios: Option<By>,
}

impl ElementRef {
    /// Creates a reference with no locators yet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            android: None,
            ios: None,
        }
    }

    /// Sets the same locator for both platforms.
    #[must_use]
    pub fn any(mut self, by: By) -> Self {
        self.android = Some(by.clone());
        self.ios = Some(by);
        self
    }

    /// Sets the Android locator.
    #[must_use]
    pub fn android(mut self, by: By) -> Self {
        self.android = Some(by);
        self
    }

    /// Sets the iOS locator.
    #[must_use]
    pub fn ios(mut self, by: By) -> Self {
        self.ios = Some(by);
        self
    }

    /// Returns the human-readable name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the locator for a platform.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoLocator`] if none was declared for `platform`.
    pub fn locator_for(&self, platform: Platform) -> Result<&By> {
        let by = match platform {
            Platform::Android => self.android.as_ref(),
            Platform::Ios => self.ios.as_ref(),
        };
        by.ok_or_else(|| Error::no_locator(&self.name, platform))
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_accessibility_id() {
        let by = By::accessibility_id("login");
        assert_eq!(by.strategy(), "accessibility id");
        assert_eq!(by.value(), "login");
    }

    #[test]
    fn test_by_serializes_as_find_body() {
        let json = serde_json::to_value(By::xpath("//button")).expect("serialize");
        assert_eq!(json, serde_json::json!({"using": "xpath", "value": "//button"}));

        let json = serde_json::to_value(By::ios_class_chain("**/XCUIElementTypeButton"))
            .expect("serialize");
        assert_eq!(json["using"], "-ios class chain");
    }

    #[test]
    fn test_by_display() {
        assert_eq!(By::id("user").to_string(), "id=user");
    }

    #[test]
    fn test_element_ref_platform_specific() {
        let el = ElementRef::new("Username Field")
            .android(By::id("com.example:id/username"))
            .ios(By::accessibility_id("username"));

        assert_eq!(
            el.locator_for(Platform::Android).unwrap(),
            &By::id("com.example:id/username")
        );
        assert_eq!(
            el.locator_for(Platform::Ios).unwrap(),
            &By::accessibility_id("username")
        );
    }

    #[test]
    fn test_element_ref_any_can_be_overridden() {
        let el = ElementRef::new("Menu")
            .any(By::accessibility_id("menu"))
            .ios(By::ios_predicate("name == 'menu'"));

        assert_eq!(el.locator_for(Platform::Android).unwrap().strategy(), "accessibility id");
        assert_eq!(el.locator_for(Platform::Ios).unwrap().strategy(), "-ios predicate string");
    }

    #[test]
    fn test_missing_platform_locator() {
        let el = ElementRef::new("Back Button").android(By::id("back"));
        let err = el.locator_for(Platform::Ios).unwrap_err();
        assert!(matches!(err, Error::NoLocator { ref element, platform: Platform::Ios } if element == "Back Button"));
    }
}
