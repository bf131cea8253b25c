use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::area::AreaPolicy;
use super::record::PrivilegedRecord;
use super::resolver::{Resolution, SessionResolver};
use crate::auth::SessionKey;

/// What a scoped context currently knows about its session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextSnapshot<R> {
    pub record: Option<R>,
    /// True during the initial resolution and any event-triggered re-resolution
    pub loading: bool,
    /// Last resolution failure; cleared by the next successful resolution
    pub error: Option<String>,
}

impl<R> ContextSnapshot<R> {
    fn mounting() -> Self {
        Self {
            record: None,
            loading: true,
            error: None,
        }
    }
}

/// Cached view of one session's privileged record for one area.
///
/// Resolves once on mount and again on every auth event for its session.
/// Resolutions may finish out of order; each takes a ticket from `latest` and
/// is only applied if its ticket is still the latest. Dropping the context
/// takes one more ticket, so nothing in flight is applied afterwards.
pub struct ScopedContext<R: PrivilegedRecord> {
    shared: Arc<Shared<R>>,
    listener: JoinHandle<()>,
}

struct Shared<R: PrivilegedRecord> {
    session: SessionKey,
    resolver: SessionResolver,
    latest: AtomicU64,
    snapshot: watch::Sender<ContextSnapshot<R>>,
}

impl<R: PrivilegedRecord> ScopedContext<R> {
    /// Must be called from within a tokio runtime
    pub fn mount(resolver: SessionResolver, session: SessionKey) -> Self {
        let (snapshot, _) = watch::channel(ContextSnapshot::mounting());
        // Subscribe before the first resolution so no event can slip in between
        let mut events = resolver.auth().subscribe();

        let shared = Arc::new(Shared {
            session,
            resolver,
            latest: AtomicU64::new(0),
            snapshot,
        });

        debug!("Mounting {} context for session {}", R::POLICY.area, session);
        Shared::spawn_resolution(&shared);

        let weak: Weak<Shared<R>> = Arc::downgrade(&shared);
        let listener = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) if event.session != session => continue,
                    Ok(event) => debug!("{:?} for session {}, re-resolving", event.kind, session),
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Context for session {} missed {} auth events, re-resolving", session, missed);
                    }
                    Err(RecvError::Closed) => break,
                }

                let Some(shared) = weak.upgrade() else {
                    break;
                };
                Shared::spawn_resolution(&shared);
            }
        });

        Self { shared, listener }
    }

    pub fn session(&self) -> SessionKey {
        self.shared.session
    }

    pub fn policy(&self) -> &'static AreaPolicy {
        R::POLICY
    }

    pub fn snapshot(&self) -> ContextSnapshot<R> {
        self.shared.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ContextSnapshot<R>> {
        self.shared.snapshot.subscribe()
    }

    /// Start a re-resolution outside of an auth event
    pub fn refresh(&self) {
        Shared::spawn_resolution(&self.shared);
    }

    /// Snapshot once no resolution is in flight
    pub async fn settled(&self) -> ContextSnapshot<R> {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(|s| !s.loading).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => return self.snapshot(),
        };
        settled
    }
}

impl<R: PrivilegedRecord> Shared<R> {
    fn spawn_resolution(shared: &Arc<Self>) {
        let ticket = shared.latest.fetch_add(1, Ordering::SeqCst) + 1;
        shared.snapshot.send_if_modified(|s| {
            let was_loading = s.loading;
            s.loading = true;
            !was_loading
        });

        let shared = Arc::clone(shared);
        tokio::spawn(async move {
            let outcome = shared.resolver.resolve::<R>(Some(shared.session)).await;
            shared.apply(ticket, outcome);
        });
    }

    fn apply(&self, ticket: u64, outcome: Resolution<R>) {
        let applied = self.snapshot.send_if_modified(|s| {
            if self.latest.load(Ordering::SeqCst) != ticket {
                return false;
            }

            s.loading = false;
            match outcome {
                Resolution::Authorized(record) => {
                    s.record = Some(record);
                    s.error = None;
                }
                Resolution::Unauthorized(_) => {
                    s.record = None;
                    s.error = None;
                }
                // Keep whatever we had; the failure may be transient
                Resolution::Failed(err) => s.error = Some(err.to_string()),
            }
            true
        });

        if !applied {
            debug!("Discarded stale resolution #{} for session {}", ticket, self.session);
        }
    }
}

impl<R: PrivilegedRecord> Drop for ScopedContext<R> {
    fn drop(&mut self) {
        // Under the snapshot lock, so an `apply` that already passed its ticket
        // check publishes before this returns, never after
        let latest = &self.shared.latest;
        self.shared.snapshot.send_if_modified(|_| {
            latest.fetch_add(1, Ordering::SeqCst);
            false
        });
        self.listener.abort();
        debug!("Unmounted {} context for session {}", R::POLICY.area, self.shared.session);
    }
}
