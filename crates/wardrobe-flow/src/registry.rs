//! Session registry and single-flight guard.
//!
//! Each session carries two async mutexes. The flight lock marks a mutating
//! request in progress: under [`BusyPolicy::Reject`] a second one fails with
//! [`FlowError::Busy`], under [`BusyPolicy::Queue`] it waits for the first to
//! finish. The state lock guards the data itself; readers and the reset timer
//! take only that one, so they never make a mutation look busy.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use wardrobe_models::{FlowStage, SessionId};

use crate::config::BusyPolicy;
use crate::error::{FlowError, FlowResult};
use crate::metrics;
use crate::session::{FlowSession, SessionSnapshot};

/// Exclusive access to one session for the length of a request.
pub struct SessionGuard {
    session: OwnedMutexGuard<FlowSession>,
    _flight: OwnedMutexGuard<()>,
}

impl Deref for SessionGuard {
    type Target = FlowSession;

    fn deref(&self) -> &FlowSession {
        &self.session
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut FlowSession {
        &mut self.session
    }
}

#[derive(Clone)]
struct Slot {
    flight: Arc<Mutex<()>>,
    state: Arc<Mutex<FlowSession>>,
}

impl Slot {
    fn new(session: FlowSession) -> Self {
        Self {
            flight: Arc::new(Mutex::new(())),
            state: Arc::new(Mutex::new(session)),
        }
    }
}

/// In-memory sessions, keyed by id. Cheap to clone.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, Slot>>>,
    busy_policy: BusyPolicy,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(BusyPolicy::default())
    }
}

impl SessionRegistry {
    pub fn new(busy_policy: BusyPolicy) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            busy_policy,
        }
    }

    pub fn busy_policy(&self) -> BusyPolicy {
        self.busy_policy
    }

    /// Start a new session in `Upload`.
    pub async fn create(&self) -> SessionSnapshot {
        let session = FlowSession::new(SessionId::new());
        let snapshot = session.snapshot();

        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id, Slot::new(session));
        metrics::set_active_sessions(sessions.len());

        info!(session_id = %snapshot.id, "Session created");
        snapshot
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    async fn slot(&self, id: SessionId) -> FlowResult<Slot> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(FlowError::SessionNotFound(id))
    }

    /// Take the session for a mutating request, honouring the busy policy.
    pub async fn acquire(&self, id: SessionId) -> FlowResult<SessionGuard> {
        let slot = self.slot(id).await?;
        let flight = match self.busy_policy {
            BusyPolicy::Reject => slot.flight.try_lock_owned().map_err(|_| {
                debug!(session_id = %id, "Rejected request for busy session");
                metrics::record_busy_rejection();
                FlowError::Busy(id)
            })?,
            BusyPolicy::Queue => slot.flight.lock_owned().await,
        };

        Ok(SessionGuard {
            session: slot.state.lock_owned().await,
            _flight: flight,
        })
    }

    /// Read the session without counting as a mutation. Waits for any
    /// in-flight request to settle.
    pub async fn read<R>(&self, id: SessionId, f: impl FnOnce(&FlowSession) -> R) -> FlowResult<R> {
        let slot = self.slot(id).await?;
        let session = slot.state.lock().await;
        Ok(f(&*session))
    }

    /// Current state.
    pub async fn snapshot(&self, id: SessionId) -> FlowResult<SessionSnapshot> {
        self.read(id, FlowSession::snapshot).await
    }

    /// Abandon a session.
    pub async fn remove(&self, id: SessionId) -> FlowResult<()> {
        let mut sessions = self.sessions.write().await;
        sessions
            .remove(&id)
            .ok_or(FlowError::SessionNotFound(id))?;
        metrics::set_active_sessions(sessions.len());

        info!(session_id = %id, "Session removed");
        Ok(())
    }

    /// Reset the session to `Upload` after `delay`, provided it is still
    /// showing the `Complete` stage of cycle `cycle`.
    pub fn schedule_reset(&self, id: SessionId, cycle: u64, delay: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let Ok(slot) = registry.slot(id).await else {
                return;
            };
            let mut session = slot.state.lock().await;
            if session.stage == FlowStage::Complete && session.cycle == cycle {
                session.reset();
                info!(session_id = %id, "Session reset after save");
            }
        })
    }

    /// Drop sessions idle for longer than `ttl`. Busy sessions are kept.
    pub async fn reap_idle(&self, ttl: Duration) -> usize {
        let ttl_secs = ttl.as_secs() as i64;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, slot| {
            if slot.flight.try_lock().is_err() {
                return true;
            }
            match slot.state.try_lock() {
                Ok(session) => session.idle_secs() < ttl_secs,
                Err(_) => true,
            }
        });

        let reaped = before - sessions.len();
        metrics::set_active_sessions(sessions.len());
        reaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_create_and_snapshot() {
        let registry = SessionRegistry::default();
        let created = registry.create().await;

        let snapshot = registry.snapshot(created.id).await.unwrap();
        assert_eq!(snapshot.stage, FlowStage::Upload);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_reject_while_busy() {
        let registry = SessionRegistry::new(BusyPolicy::Reject);
        let id = registry.create().await.id;

        let guard = assert_ok!(registry.acquire(id).await);
        assert!(matches!(registry.acquire(id).await, Err(FlowError::Busy(b)) if b == id));

        drop(guard);
        assert_ok!(registry.acquire(id).await);
    }

    #[tokio::test]
    async fn test_reader_does_not_make_session_busy() {
        let registry = SessionRegistry::new(BusyPolicy::Reject);
        let id = registry.create().await.id;

        // Hold the state lock the way a snapshot or the reset timer does
        let slot = registry.slot(id).await.unwrap();
        let reader = slot.state.lock().await;

        let pending = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.acquire(id).await.map(|s| s.stage) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        drop(reader);
        assert_eq!(assert_ok!(pending.await.unwrap()), FlowStage::Upload);
    }

    #[tokio::test]
    async fn test_queue_waits_for_turn() {
        let registry = SessionRegistry::new(BusyPolicy::Queue);
        let id = registry.create().await.id;

        let mut guard = registry.acquire(id).await.unwrap();
        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.acquire(id).await.map(|s| s.stage) })
        };

        guard.stage = FlowStage::Cutout;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(guard);

        assert_eq!(waiter.await.unwrap().unwrap(), FlowStage::Cutout);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let registry = SessionRegistry::default();
        let id = SessionId::new();
        assert!(matches!(
            registry.acquire(id).await,
            Err(FlowError::SessionNotFound(_))
        ));
        assert!(registry.remove(id).await.is_err());
    }

    #[tokio::test]
    async fn test_scheduled_reset_only_for_same_cycle() {
        let registry = SessionRegistry::default();
        let id = registry.create().await.id;
        {
            let mut session = registry.acquire(id).await.unwrap();
            session.stage = FlowStage::Complete;
        }

        registry
            .schedule_reset(id, 0, Duration::from_millis(10))
            .await
            .unwrap();
        let snapshot = registry.snapshot(id).await.unwrap();
        assert_eq!(snapshot.stage, FlowStage::Upload);

        // A stale timer from an earlier cycle leaves the session alone
        {
            let mut session = registry.acquire(id).await.unwrap();
            session.stage = FlowStage::Complete;
        }
        registry
            .schedule_reset(id, 0, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(
            registry.snapshot(id).await.unwrap().stage,
            FlowStage::Complete
        );
    }

    #[tokio::test]
    async fn test_reap_idle() {
        let registry = SessionRegistry::default();
        let stale = registry.create().await.id;
        let fresh = registry.create().await.id;
        {
            let mut session = registry.acquire(stale).await.unwrap();
            session.last_active = chrono::Utc::now() - chrono::Duration::seconds(120);
        }

        let reaped = registry.reap_idle(Duration::from_secs(60)).await;
        assert_eq!(reaped, 1);
        assert!(registry.snapshot(stale).await.is_err());
        assert!(registry.snapshot(fresh).await.is_ok());
    }
}
