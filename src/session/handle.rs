//! Live automation session handle.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::capabilities::Platform;
use crate::error::{Error, Result};
use crate::identifiers::{SessionId, WorkerId};
use crate::remote::RemoteSession;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a session.
pub(crate) struct SessionInner {
    /// Worker the session is bound to.
    pub worker: WorkerId,

    /// Platform the session was created for.
    pub platform: Platform,

    /// Creation time.
    pub created_at: DateTime<Utc>,

    /// Cleared once the remote session has been quit.
    pub live: AtomicBool,

    /// Remote command surface.
    pub remote: Box<dyn RemoteSession>,
}

// ============================================================================
// Session
// ============================================================================

/// Handle to one live automation session.
///
/// Cheap to clone. Owned by a single worker through the
/// [`super::SessionRegistry`]; once released, every command returns
/// [`Error::SessionClosed`].
#[derive(Clone)]
pub struct Session {
    pub(crate) inner: Arc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", self.id())
            .field("worker", &self.inner.worker)
            .field("platform", &self.inner.platform)
            .field("live", &self.is_live())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Wraps a freshly created remote session.
    pub(crate) fn new(worker: WorkerId, platform: Platform, remote: Box<dyn RemoteSession>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                worker,
                platform,
                created_at: Utc::now(),
                live: AtomicBool::new(true),
                remote,
            }),
        }
    }

    /// Returns the server-assigned session ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &SessionId {
        self.inner.remote.id()
    }

    /// Returns the owning worker.
    #[inline]
    #[must_use]
    pub fn worker(&self) -> WorkerId {
        self.inner.worker
    }

    /// Returns the session platform.
    #[inline]
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.inner.platform
    }

    /// Returns the creation time.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// Returns `true` until the session is closed.
    #[inline]
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.inner.live.load(Ordering::Acquire)
    }

    /// Returns the remote command surface.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] once the session has been released.
    pub fn remote(&self) -> Result<&dyn RemoteSession> {
        if !self.is_live() {
            return Err(Error::session_closed(self.id().clone()));
        }
        Ok(self.inner.remote.as_ref())
    }

    /// Captures the viewport as PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] or any remote error.
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        self.remote()?.screenshot().await
    }

    /// Quits the remote session. Only the first call reaches the server.
    pub(crate) async fn close(&self) -> Result<()> {
        if !self.inner.live.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        debug!(session_id = %self.id(), worker = %self.inner.worker, "Closing session");
        self.inner.remote.quit().await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::capabilities;
    use crate::config::Configuration;
    use crate::remote::{AutomationServer, ScriptedServer};

    async fn open(server: &ScriptedServer) -> Session {
        let config = Configuration::from_pairs([
            ("android.platform.version", "14"),
            ("android.device.name", "Pixel"),
            ("android.app.path", "/a.apk"),
            ("android.app.package", "com.example"),
            ("android.app.activity", ".Main"),
        ]);
        let caps = capabilities::build(Platform::Android, &config).expect("caps");
        let remote = server.create_session(&caps).await.expect("remote");
        Session::new(WorkerId::new(1), Platform::Android, remote)
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let server = ScriptedServer::new();
        let session = open(&server).await;

        session.close().await.expect("close");
        session.close().await.expect("second close");
        assert_eq!(server.sessions_quit(), 1);
        assert!(!session.is_live());
    }

    #[tokio::test]
    async fn test_closed_session_rejects_commands() {
        let server = ScriptedServer::new();
        let session = open(&server).await;
        let clone = session.clone();

        session.close().await.expect("close");
        let err = clone.screenshot().await.unwrap_err();
        assert!(matches!(err, Error::SessionClosed { .. }));
    }
}
