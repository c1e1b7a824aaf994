//! WebDriver HTTP implementation of the remote traits.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::capabilities::CapabilitySet;
use crate::config::{Configuration, keys};
use crate::error::{Error, Result};
use crate::identifiers::{ElementId, SessionId};
use crate::locator::By;
use crate::protocol::Command;
use crate::protocol::response::{as_bool, as_string, element_id};
use crate::transport::HttpTransport;

use super::{AutomationServer, ElementRect, RemoteSession};

// ============================================================================
// WebDriverServer
// ============================================================================

/// Appium-compatible server reached over HTTP.
#[derive(Debug, Clone)]
pub struct WebDriverServer {
    transport: Arc<HttpTransport>,
}

impl WebDriverServer {
    /// Creates a server handle for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if the URL does not parse.
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            transport: Arc::new(HttpTransport::new(url)?),
        })
    }

    /// Creates a server handle from `appium.server.url`.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingConfiguration`] if the key is absent
    /// - [`Error::Url`] if the URL does not parse
    pub fn from_config(config: &Configuration) -> Result<Self> {
        Self::new(config.require(keys::SERVER_URL)?)
    }
}

#[async_trait]
impl AutomationServer for WebDriverServer {
    async fn create_session(&self, capabilities: &CapabilitySet) -> Result<Box<dyn RemoteSession>> {
        let command = Command::NewSession {
            capabilities: capabilities.to_w3c(),
        };

        let value = self
            .transport
            .execute(None, &command)
            .await
            .map_err(|e| match e {
                Error::SessionCreation { .. } => e,
                other => Error::session_creation(other.to_string()),
            })?;

        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::session_creation("response has no sessionId"))?;

        info!(session_id = %id, url = %self.transport.base_url(), "Remote session created");

        Ok(Box::new(WebDriverSession {
            id: SessionId::new(id),
            transport: Arc::clone(&self.transport),
        }))
    }
}

// ============================================================================
// WebDriverSession
// ============================================================================

/// One live session on a [`WebDriverServer`].
#[derive(Debug)]
pub struct WebDriverSession {
    id: SessionId,
    transport: Arc<HttpTransport>,
}

impl WebDriverSession {
    async fn send(&self, command: Command) -> Result<Value> {
        self.transport.execute(Some(&self.id), &command).await
    }
}

#[async_trait]
impl RemoteSession for WebDriverSession {
    fn id(&self) -> &SessionId {
        &self.id
    }

    async fn set_implicit_wait(&self, wait: Duration) -> Result<()> {
        let implicit_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
        self.send(Command::SetTimeouts { implicit_ms }).await?;
        Ok(())
    }

    async fn find_element(&self, by: &By) -> Result<ElementId> {
        let value = self.send(Command::FindElement { by: by.clone() }).await?;
        element_id(&value)
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        let value = self
            .send(Command::IsDisplayed {
                element: element.clone(),
            })
            .await?;
        as_bool(&value)
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool> {
        let value = self
            .send(Command::IsEnabled {
                element: element.clone(),
            })
            .await?;
        as_bool(&value)
    }

    async fn rect(&self, element: &ElementId) -> Result<ElementRect> {
        let value = self
            .send(Command::GetRect {
                element: element.clone(),
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        let value = self
            .send(Command::GetText {
                element: element.clone(),
            })
            .await?;
        as_string(&value)
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        self.send(Command::Click {
            element: element.clone(),
        })
        .await?;
        Ok(())
    }

    async fn clear(&self, element: &ElementId) -> Result<()> {
        self.send(Command::Clear {
            element: element.clone(),
        })
        .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()> {
        self.send(Command::SendKeys {
            element: element.clone(),
            text: text.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &ElementId) -> Result<()> {
        self.send(Command::ExecuteScript {
            script: "mobile: scroll".to_string(),
            args: vec![json!({ "elementId": element, "toVisible": true })],
        })
        .await?;
        Ok(())
    }

    async fn back(&self) -> Result<()> {
        self.send(Command::Back).await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let value = self.send(Command::Screenshot).await?;
        let data = as_string(&value)?;
        Base64Standard
            .decode(data.as_bytes())
            .map_err(|e| Error::transport(format!("Failed to decode screenshot: {e}")))
    }

    async fn quit(&self) -> Result<()> {
        self.send(Command::DeleteSession).await?;
        debug!(session_id = %self.id, "Remote session deleted");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_url() {
        let err = WebDriverServer::from_config(&Configuration::new()).unwrap_err();
        assert!(matches!(err, Error::MissingConfiguration { ref key } if key == keys::SERVER_URL));
    }

    #[test]
    fn test_from_config() {
        let config = Configuration::from_pairs([(keys::SERVER_URL, "http://127.0.0.1:4723")]);
        assert!(WebDriverServer::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_session_creation_error() {
        let server = WebDriverServer::new("http://127.0.0.1:9").expect("server");
        let config = Configuration::from_pairs([
            ("android.platform.version", "14"),
            ("android.device.name", "Pixel"),
            ("android.app.path", "/a.apk"),
            ("android.app.package", "com.example"),
            ("android.app.activity", ".Main"),
        ]);
        let caps = crate::capabilities::build(crate::capabilities::Platform::Android, &config)
            .expect("caps");

        let err = server.create_session(&caps).await.unwrap_err();
        assert!(matches!(err, Error::SessionCreation { .. }));
    }
}
