//! HTTP client for the automation server.
//!
//! One [`HttpTransport`] is shared by every session opened against the same
//! server. Each call is a single request/response round trip; correlation
//! is implicit in HTTP.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::protocol::{Command, Method, Response};

// ============================================================================
// Constants
// ============================================================================

/// Default per-request timeout. Session creation on real devices can take
/// minutes while the app installs.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

// ============================================================================
// HttpTransport
// ============================================================================

/// HTTP transport bound to one server base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
}

impl HttpTransport {
    /// Creates a transport for `base_url` with the default request timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if the URL does not parse
    /// - [`Error::Http`] if the client cannot be built
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a transport with a custom request timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if the URL does not parse
    /// - [`Error::Http`] if the client cannot be built
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base })
    }

    /// Returns the base URL.
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Executes a command and returns its `value` payload.
    ///
    /// # Errors
    ///
    /// - Mapped W3C errors (see [`crate::protocol::response`])
    /// - [`Error::Http`] on connection failures or timeouts
    /// - [`Error::Transport`] for non-JSON or non-success responses
    pub async fn execute(&self, session: Option<&SessionId>, command: &Command) -> Result<Value> {
        let url = self.base.join(&command.path(session)?)?;

        debug!(command = command.name(), %url, "Sending command");

        let request = match command.method() {
            Method::Get => self.client.get(url),
            Method::Delete => self.client.delete(url),
            Method::Post => self
                .client
                .post(url)
                .json(&command.body().unwrap_or_else(|| json!({}))),
        };

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        trace!(command = command.name(), %status, body = %text, "Received response");

        let parsed: Response = serde_json::from_str(&text).map_err(|e| {
            Error::transport(format!(
                "{} returned unreadable body ({status}): {e}",
                command.name()
            ))
        })?;

        let value = parsed.into_result(command, session)?;

        if !status.is_success() {
            return Err(Error::transport(format!(
                "{} failed with HTTP {status}",
                command.name()
            )));
        }

        Ok(value)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let transport = HttpTransport::new("http://127.0.0.1:4723/wd/hub").expect("transport");
        assert_eq!(transport.base_url().as_str(), "http://127.0.0.1:4723/wd/hub/");

        let joined = transport.base_url().join("session").expect("join");
        assert_eq!(joined.as_str(), "http://127.0.0.1:4723/wd/hub/session");
    }

    #[test]
    fn test_root_base_url() {
        let transport = HttpTransport::new("http://localhost:4723").expect("transport");
        assert_eq!(transport.base_url().as_str(), "http://localhost:4723/");
    }

    #[test]
    fn test_invalid_url() {
        let err = HttpTransport::new("not a url").unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        let transport =
            HttpTransport::with_timeout("http://127.0.0.1:9", Duration::from_millis(500))
                .expect("transport");
        let err = transport
            .execute(None, &Command::NewSession { capabilities: json!({}) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
