use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::context::ScopedContext;
use super::record::PrivilegedRecord;
use super::resolver::SessionResolver;
use crate::auth::{AuthEventKind, SessionKey};
use crate::database::models::{AdminRecord, BusinessRecord};

struct ContextMap<R: PrivilegedRecord> {
    contexts: RwLock<HashMap<SessionKey, Arc<ScopedContext<R>>>>,
}

impl<R: PrivilegedRecord> ContextMap<R> {
    fn new() -> Self {
        Self {
            contexts: RwLock::new(HashMap::new()),
        }
    }

    async fn get_or_mount(&self, resolver: &SessionResolver, key: SessionKey) -> Arc<ScopedContext<R>> {
        if let Some(ctx) = self.contexts.read().await.get(&key) {
            return Arc::clone(ctx);
        }

        let mut contexts = self.contexts.write().await;
        let ctx = contexts
            .entry(key)
            .or_insert_with(|| Arc::new(ScopedContext::mount(resolver.clone(), key)));
        Arc::clone(ctx)
    }

    async fn get(&self, key: SessionKey) -> Option<Arc<ScopedContext<R>>> {
        self.contexts.read().await.get(&key).cloned()
    }

    async fn remove(&self, key: SessionKey) -> bool {
        self.contexts.write().await.remove(&key).is_some()
    }

    async fn keys(&self) -> Vec<SessionKey> {
        self.contexts.read().await.keys().copied().collect()
    }

    async fn len(&self) -> usize {
        self.contexts.read().await.len()
    }
}

/// All live scoped contexts, per area, keyed by session.
///
/// Contexts are mounted lazily on first use and unmounted when their session
/// signs out or goes idle. Admin and business contexts are kept apart even for
/// one identity.
#[derive(Clone)]
pub struct ContextRegistry {
    resolver: SessionResolver,
    admin: Arc<ContextMap<AdminRecord>>,
    business: Arc<ContextMap<BusinessRecord>>,
}

impl ContextRegistry {
    pub fn new(resolver: SessionResolver) -> Self {
        Self {
            resolver,
            admin: Arc::new(ContextMap::new()),
            business: Arc::new(ContextMap::new()),
        }
    }

    pub async fn admin(&self, key: SessionKey) -> Arc<ScopedContext<AdminRecord>> {
        self.admin.get_or_mount(&self.resolver, key).await
    }

    pub async fn business(&self, key: SessionKey) -> Arc<ScopedContext<BusinessRecord>> {
        self.business.get_or_mount(&self.resolver, key).await
    }

    pub async fn mounted_business(&self, key: SessionKey) -> Option<Arc<ScopedContext<BusinessRecord>>> {
        self.business.get(key).await
    }

    /// Drop every context of a session. Returns whether anything was mounted.
    pub async fn unmount(&self, key: SessionKey) -> bool {
        let admin = self.admin.remove(key).await;
        let business = self.business.remove(key).await;
        if admin || business {
            debug!("Unmounted contexts for session {}", key);
        }
        admin || business
    }

    pub async fn mounted(&self) -> usize {
        self.admin.len().await + self.business.len().await
    }

    /// Expire idle sessions, then unmount every context whose session is gone.
    /// Returns how many sessions had contexts unmounted.
    pub async fn sweep(&self) -> usize {
        let auth = self.resolver.auth();
        let expired = auth.expire_idle().await;

        let mut keys: HashSet<SessionKey> = self.admin.keys().await.into_iter().collect();
        keys.extend(self.business.keys().await);

        let mut unmounted = 0;
        for key in keys {
            if !auth.is_live(key).await && self.unmount(key).await {
                unmounted += 1;
            }
        }

        if expired > 0 || unmounted > 0 {
            info!("Sweep expired {} idle sessions, unmounted {} contexts", expired, unmounted);
        }
        unmounted
    }

    /// Unmount contexts whenever their session signs out, and sweep idle sessions every `sweep_every`
    pub fn spawn_janitor(&self, sweep_every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        let mut events = self.resolver.auth().subscribe();

        tokio::spawn(async move {
            let mut sweep = tokio::time::interval(sweep_every);
            sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            sweep.tick().await;

            info!("Context janitor started");
            loop {
                tokio::select! {
                    event = events.recv() => match event {
                        Ok(event) if event.kind == AuthEventKind::SignedOut => {
                            registry.unmount(event.session).await;
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(missed)) => {
                            // The next sweep picks up whatever sign-outs were missed
                            warn!("Context janitor missed {} auth events", missed);
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = sweep.tick() => {
                        registry.sweep().await;
                    }
                }
            }
            info!("Context janitor stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthClient;
    use crate::testing::{admin_row, business_row, FakeAuth, MemoryRecordSource};
    use std::time::Duration;

    #[tokio::test]
    async fn contexts_are_mounted_once_per_session_and_area() {
        let fake = Arc::new(FakeAuth::new());
        let identity = fake.add_user("ana@caminar.ar", "password123");
        let auth = AuthClient::new(fake);
        let records = Arc::new(MemoryRecordSource::new());
        records.insert("admin_users", admin_row(identity.id, Some("active")));
        records.insert("businesses", business_row(identity.id, Some("pending")));
        let registry = ContextRegistry::new(SessionResolver::new(auth.clone(), records));

        let (key, _) = auth.sign_in_with_password("ana@caminar.ar", "password123").await.unwrap();

        let a = registry.admin(key).await;
        let b = registry.admin(key).await;
        assert!(Arc::ptr_eq(&a, &b));

        let business = registry.business(key).await;
        assert_eq!(registry.mounted().await, 2);
        assert!(a.settled().await.record.is_some());
        assert!(business.settled().await.record.is_some());
    }

    #[tokio::test]
    async fn janitor_unmounts_on_sign_out() {
        let fake = Arc::new(FakeAuth::new());
        let identity = fake.add_user("ana@caminar.ar", "password123");
        let auth = AuthClient::new(fake);
        let records = Arc::new(MemoryRecordSource::new());
        records.insert("businesses", business_row(identity.id, Some("active")));
        let registry = ContextRegistry::new(SessionResolver::new(auth.clone(), records));
        let janitor = registry.spawn_janitor(Duration::from_secs(60));

        let (key, _) = auth.sign_in_with_password("ana@caminar.ar", "password123").await.unwrap();
        registry.business(key).await;
        assert!(registry.mounted_business(key).await.is_some());

        auth.sign_out(key).await;

        let mut unmounted = false;
        for _ in 0..100 {
            if registry.mounted_business(key).await.is_none() {
                unmounted = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(unmounted);
        janitor.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn janitor_sweeps_idle_sessions_and_their_contexts() {
        let fake = Arc::new(FakeAuth::new());
        let identity = fake.add_user("ana@caminar.ar", "password123");
        let auth = AuthClient::with_idle_timeout(fake, Duration::from_secs(60));
        let records = Arc::new(MemoryRecordSource::new());
        records.insert("admin_users", admin_row(identity.id, Some("active")));
        records.insert("businesses", business_row(identity.id, Some("active")));
        let registry = ContextRegistry::new(SessionResolver::new(auth.clone(), records));
        let janitor = registry.spawn_janitor(Duration::from_secs(10));

        let (abandoned, _) = auth.sign_in_with_password("ana@caminar.ar", "password123").await.unwrap();
        registry.admin(abandoned).await.settled().await;
        registry.business(abandoned).await.settled().await;

        tokio::time::advance(Duration::from_secs(45)).await;
        let (recent, _) = auth.sign_in_with_password("ana@caminar.ar", "password123").await.unwrap();
        registry.business(recent).await.settled().await;
        assert_eq!(registry.mounted().await, 3);

        tokio::time::advance(Duration::from_secs(30)).await;
        for _ in 0..10 {
            if registry.mounted().await == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        assert_eq!(registry.mounted().await, 1);
        assert!(registry.mounted_business(abandoned).await.is_none());
        assert!(registry.mounted_business(recent).await.is_some());
        assert!(!auth.is_live(abandoned).await);
        janitor.abort();
    }

    #[tokio::test]
    async fn sweep_unmounts_contexts_of_vanished_sessions() {
        let fake = Arc::new(FakeAuth::new());
        let identity = fake.add_user("ana@caminar.ar", "password123");
        let auth = AuthClient::new(fake);
        let records = Arc::new(MemoryRecordSource::new());
        records.insert("businesses", business_row(identity.id, Some("active")));
        let registry = ContextRegistry::new(SessionResolver::new(auth.clone(), records));

        // No janitor: the sign-out event goes unobserved
        let (key, _) = auth.sign_in_with_password("ana@caminar.ar", "password123").await.unwrap();
        registry.business(key).await.settled().await;
        auth.sign_out(key).await;
        assert_eq!(registry.mounted().await, 1);

        assert_eq!(registry.sweep().await, 1);
        assert_eq!(registry.mounted().await, 0);
    }
}
