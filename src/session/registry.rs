//! Per-worker session bindings.
//!
//! At most one live [`Session`] is bound to a [`WorkerId`] at any time.
//! The binding map is guarded by a short-lived lock; session creation and
//! quit run outside it, behind a `Reserved` slot that keeps concurrent
//! callers for the same worker from racing.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, error, info, warn};

use crate::capabilities::{self, Platform};
use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::identifiers::WorkerId;
use crate::remote::AutomationServer;

use super::Session;

// ============================================================================
// Types
// ============================================================================

/// Binding state for one worker.
enum Slot {
    /// Creation in progress.
    Reserved,
    /// Bound to a live session.
    Live(Session),
}

type SlotMap = FxHashMap<WorkerId, Slot>;

/// Removes a `Reserved` slot if acquisition does not complete.
struct Reservation<'a> {
    slots: &'a Mutex<SlotMap>,
    worker: WorkerId,
    committed: bool,
}

impl Reservation<'_> {
    fn commit(mut self, session: Session) {
        self.slots.lock().insert(self.worker, Slot::Live(session));
        self.committed = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut slots = self.slots.lock();
        if matches!(slots.get(&self.worker), Some(Slot::Reserved)) {
            slots.remove(&self.worker);
        }
    }
}

// ============================================================================
// SessionRegistry
// ============================================================================

/// Worker-keyed session registry.
pub struct SessionRegistry {
    server: Arc<dyn AutomationServer>,
    config: Configuration,
    implicit_wait: Duration,
    slots: Mutex<SlotMap>,
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("implicit_wait", &self.implicit_wait)
            .field("live", &self.live_count())
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// Creates a registry over `server`.
    ///
    /// `config` feeds capability negotiation; `implicit_wait` is applied to
    /// every new session.
    #[must_use]
    pub fn new(
        server: Arc<dyn AutomationServer>,
        config: Configuration,
        implicit_wait: Duration,
    ) -> Self {
        Self {
            server,
            config,
            implicit_wait,
            slots: Mutex::new(FxHashMap::default()),
        }
    }

    /// Returns the worker's session, creating one if needed.
    ///
    /// An existing session on the same platform is returned as-is. A session
    /// on a different platform is released first.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingConfiguration`] if a required capability key is absent
    /// - [`Error::SessionCreation`] if the server refuses or a creation is
    ///   already in progress for this worker
    pub async fn acquire(&self, worker: WorkerId, platform: Platform) -> Result<Session> {
        self.acquire_with(worker, platform, &self.config).await
    }

    /// Like [`acquire`](Self::acquire) but negotiates capabilities from
    /// `config` instead of the registry's configuration.
    ///
    /// # Errors
    ///
    /// See [`acquire`](Self::acquire).
    pub async fn acquire_with(
        &self,
        worker: WorkerId,
        platform: Platform,
        config: &Configuration,
    ) -> Result<Session> {
        let stale = {
            let mut slots = self.slots.lock();
            match slots.get(&worker) {
                Some(Slot::Live(session)) if session.platform() == platform => {
                    return Ok(session.clone());
                }
                Some(Slot::Reserved) => {
                    return Err(Error::session_creation(format!(
                        "session creation already in progress for {worker}"
                    )));
                }
                _ => {}
            }
            match slots.insert(worker, Slot::Reserved) {
                Some(Slot::Live(session)) => Some(session),
                _ => None,
            }
        };

        let reservation = Reservation {
            slots: &self.slots,
            worker,
            committed: false,
        };

        if let Some(stale) = stale {
            warn!(
                %worker,
                from = %stale.platform(),
                to = %platform,
                "Platform changed, releasing existing session"
            );
            if let Err(e) = stale.close().await {
                warn!(%worker, error = %e, "Failed to quit previous session");
            }
        }

        let session = match self.open(worker, platform, config).await {
            Ok(session) => session,
            Err(e) => {
                error!(%worker, %platform, error = %e, "Session creation failed");
                return Err(e);
            }
        };

        info!(
            %worker,
            %platform,
            session_id = %session.id(),
            "Session acquired"
        );

        reservation.commit(session.clone());
        Ok(session)
    }

    async fn open(
        &self,
        worker: WorkerId,
        platform: Platform,
        config: &Configuration,
    ) -> Result<Session> {
        let capabilities = capabilities::build(platform, config)?;

        let remote = self
            .server
            .create_session(&capabilities)
            .await
            .map_err(|e| match e {
                Error::SessionCreation { .. } => e,
                other => Error::session_creation(other.to_string()),
            })?;

        if let Err(e) = remote.set_implicit_wait(self.implicit_wait).await {
            if let Err(quit) = remote.quit().await {
                debug!(%worker, error = %quit, "Quit after failed setup also failed");
            }
            return Err(Error::session_creation(format!(
                "failed to apply implicit wait: {e}"
            )));
        }

        Ok(Session::new(worker, platform, remote))
    }

    /// Returns the worker's bound session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if no live session is bound.
    pub fn current(&self, worker: WorkerId) -> Result<Session> {
        match self.slots.lock().get(&worker) {
            Some(Slot::Live(session)) => Ok(session.clone()),
            _ => Err(Error::not_initialized(worker)),
        }
    }

    /// Returns `true` if the worker has a live session bound.
    #[must_use]
    pub fn is_active(&self, worker: WorkerId) -> bool {
        matches!(self.slots.lock().get(&worker), Some(Slot::Live(_)))
    }

    /// Returns the number of live sessions.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Live(_)))
            .count()
    }

    /// Quits and unbinds the worker's session. A no-op if none is bound.
    ///
    /// The binding is removed even if the quit fails.
    ///
    /// # Errors
    ///
    /// Returns the remote error if the quit command failed.
    pub async fn release(&self, worker: WorkerId) -> Result<()> {
        let session = {
            let mut slots = self.slots.lock();
            match slots.remove(&worker) {
                Some(Slot::Live(session)) => Some(session),
                Some(Slot::Reserved) => {
                    slots.insert(worker, Slot::Reserved);
                    None
                }
                None => None,
            }
        };

        let Some(session) = session else {
            debug!(%worker, "No session to release");
            return Ok(());
        };

        let result = session.close().await;
        match &result {
            Ok(()) => info!(%worker, session_id = %session.id(), "Session released"),
            Err(e) => warn!(%worker, session_id = %session.id(), error = %e, "Session quit failed"),
        }
        result
    }

    /// Quits and unbinds every live session. Quit failures are logged.
    pub async fn release_all(&self) {
        let sessions: Vec<Session> = {
            let mut slots = self.slots.lock();
            let workers: Vec<WorkerId> = slots
                .iter()
                .filter(|(_, slot)| matches!(slot, Slot::Live(_)))
                .map(|(worker, _)| *worker)
                .collect();

            workers
                .into_iter()
                .filter_map(|worker| match slots.remove(&worker) {
                    Some(Slot::Live(session)) => Some(session),
                    _ => None,
                })
                .collect()
        };

        if sessions.is_empty() {
            return;
        }

        info!(count = sessions.len(), "Releasing all sessions");

        for session in sessions {
            if let Err(e) = session.close().await {
                warn!(worker = %session.worker(), error = %e, "Session quit failed");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::remote::ScriptedServer;

    fn config() -> Configuration {
        Configuration::from_pairs([
            ("android.platform.version", "14"),
            ("android.device.name", "Pixel"),
            ("android.app.path", "/a.apk"),
            ("android.app.package", "com.example"),
            ("android.app.activity", ".Main"),
            ("ios.platform.version", "17"),
            ("ios.device.name", "iPhone"),
            ("ios.app.path", "/A.app"),
            ("ios.bundle.id", "com.example"),
        ])
    }

    fn registry(server: &ScriptedServer) -> SessionRegistry {
        SessionRegistry::new(Arc::new(server.clone()), config(), Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_acquire_reuses_live_session() {
        let server = ScriptedServer::new();
        let registry = registry(&server);
        let worker = WorkerId::new(1);

        let first = registry.acquire(worker, Platform::Android).await.expect("first");
        let second = registry.acquire(worker, Platform::Android).await.expect("second");

        assert_eq!(first.id(), second.id());
        assert_eq!(server.sessions_created(), 1);
        assert_eq!(server.implicit_waits(), vec![Duration::from_secs(30)]);
    }

    #[tokio::test]
    async fn test_platform_change_recreates() {
        let server = ScriptedServer::new();
        let registry = registry(&server);
        let worker = WorkerId::new(1);

        let android = registry.acquire(worker, Platform::Android).await.expect("android");
        let ios = registry.acquire(worker, Platform::Ios).await.expect("ios");

        assert_ne!(android.id(), ios.id());
        assert!(!android.is_live());
        assert_eq!(server.sessions_quit(), 1);
        assert_eq!(registry.current(worker).expect("current").platform(), Platform::Ios);
    }

    #[tokio::test]
    async fn test_current_without_session() {
        let server = ScriptedServer::new();
        let registry = registry(&server);

        let err = registry.current(WorkerId::new(4)).unwrap_err();
        assert!(matches!(err, Error::NotInitialized { .. }));
    }

    #[tokio::test]
    async fn test_failed_creation_leaves_worker_unbound() {
        let server = ScriptedServer::new();
        server.fail_session_creation("no device");
        let registry = registry(&server);
        let worker = WorkerId::new(1);

        let err = registry.acquire(worker, Platform::Android).await.unwrap_err();
        assert!(matches!(err, Error::SessionCreation { .. }));
        assert!(!registry.is_active(worker));
        assert!(matches!(registry.current(worker), Err(Error::NotInitialized { .. })));
    }

    #[tokio::test]
    async fn test_missing_capability_key_is_not_wrapped() {
        let server = ScriptedServer::new();
        let registry = SessionRegistry::new(
            Arc::new(server.clone()),
            Configuration::new(),
            Duration::from_secs(1),
        );

        let err = registry.acquire(WorkerId::new(1), Platform::Android).await.unwrap_err();
        assert!(matches!(err, Error::MissingConfiguration { .. }));
        assert_eq!(server.sessions_created(), 0);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let server = ScriptedServer::new();
        let registry = registry(&server);
        let worker = WorkerId::new(2);

        let session = registry.acquire(worker, Platform::Android).await.expect("acquire");
        registry.release(worker).await.expect("release");
        registry.release(worker).await.expect("second release");

        assert!(!registry.is_active(worker));
        assert!(!session.is_live());
        assert_eq!(server.sessions_quit(), 1);
    }

    #[tokio::test]
    async fn test_workers_are_isolated() {
        let server = ScriptedServer::new();
        let registry = registry(&server);

        let a = registry.acquire(WorkerId::new(1), Platform::Android).await.expect("a");
        let b = registry.acquire(WorkerId::new(2), Platform::Android).await.expect("b");
        assert_ne!(a.id(), b.id());

        registry.release(WorkerId::new(1)).await.expect("release");
        assert!(registry.is_active(WorkerId::new(2)));
        assert!(b.is_live());
        assert_eq!(registry.live_count(), 1);
    }

    #[tokio::test]
    async fn test_release_all() {
        let server = ScriptedServer::new();
        let registry = registry(&server);

        for n in 1..=3 {
            registry.acquire(WorkerId::new(n), Platform::Android).await.expect("acquire");
        }
        registry.release_all().await;

        assert_eq!(registry.live_count(), 0);
        assert_eq!(server.sessions_quit(), 3);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Acquire(u32, bool),
        Release(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1u32..4, any::<bool>()).prop_map(|(w, ios)| Op::Acquire(w, ios)),
            (1u32..4).prop_map(Op::Release),
        ]
    }

    proptest! {
        #[test]
        fn prop_one_live_session_per_worker(ops in proptest::collection::vec(op(), 1..24)) {
            let server = ScriptedServer::new();
            let registry = registry(&server);

            tokio_test::block_on(async {
                for op in &ops {
                    match *op {
                        Op::Acquire(w, ios) => {
                            let platform = if ios { Platform::Ios } else { Platform::Android };
                            registry.acquire(WorkerId::new(w), platform).await.expect("acquire");
                        }
                        Op::Release(w) => registry.release(WorkerId::new(w)).await.expect("release"),
                    }
                }
            });

            let live = server.sessions_created() - server.sessions_quit();
            prop_assert_eq!(live, registry.live_count());
            prop_assert!(registry.live_count() <= 3);
        }
    }
}
