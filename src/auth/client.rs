use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{AuthError, AuthEvent, AuthEventKind, AuthIdentity, AuthService, Session, SessionKey};

const EVENT_CAPACITY: usize = 64;
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60 * 24 * 7);

/// Owner of every live session and the source of auth-state change notifications.
///
/// Guards and contexts never see tokens; they address sessions by [`SessionKey`].
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<Inner>,
}

struct Inner {
    service: Arc<dyn AuthService>,
    sessions: RwLock<HashMap<SessionKey, Entry>>,
    events: broadcast::Sender<AuthEvent>,
    idle_timeout: Duration,
}

struct Entry {
    session: Session,
    last_seen: Instant,
}

/// Receiving end of [`AuthClient::subscribe`]; dropping it unsubscribes
pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
    pub async fn recv(&mut self) -> Result<AuthEvent, RecvError> {
        self.receiver.recv().await
    }
}

impl AuthClient {
    pub fn new(service: Arc<dyn AuthService>) -> Self {
        Self::with_idle_timeout(service, DEFAULT_IDLE_TIMEOUT)
    }

    /// Sessions not used for `idle_timeout` are dropped on next access or by [`AuthClient::expire_idle`]
    pub fn with_idle_timeout(service: Arc<dyn AuthService>, idle_timeout: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                service,
                sessions: RwLock::new(HashMap::new()),
                events,
                idle_timeout,
            }),
        }
    }

    /// Subscribe to sign-in, sign-out and token-refresh notifications for all sessions
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            receiver: self.inner.events.subscribe(),
        }
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(SessionKey, Session), AuthError> {
        let session = self.inner.service.sign_in_with_password(email, password).await?;
        let key = SessionKey::generate();
        self.store(key, session.clone()).await;

        info!("User {} signed in (session {})", session.user.id, key);
        self.emit(AuthEventKind::SignedIn, key);
        Ok((key, session))
    }

    /// Create an account. A session is opened only when the service hands one back
    /// (i.e. no email confirmation step is pending).
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(AuthIdentity, Option<SessionKey>), AuthError> {
        let signup = self.inner.service.sign_up(email, password).await?;
        let key = match signup.session {
            Some(session) => {
                let key = SessionKey::generate();
                self.store(key, session).await;
                self.emit(AuthEventKind::SignedIn, key);
                Some(key)
            }
            None => None,
        };

        info!("Registered auth user {}", signup.user.id);
        Ok((signup.user, key))
    }

    /// The stored session, marking it as used. An idle one is expired instead.
    pub async fn current_session(&self, key: SessionKey) -> Option<Session> {
        let now = Instant::now();
        let mut sessions = self.inner.sessions.write().await;
        let entry = sessions.get_mut(&key)?;
        if now.duration_since(entry.last_seen) < self.inner.idle_timeout {
            entry.last_seen = now;
            return Some(entry.session.clone());
        }

        let stale = sessions.remove(&key);
        drop(sessions);
        if let Some(entry) = stale {
            info!("Session {} expired after being idle", key);
            self.retire(key, entry.session).await;
        }
        None
    }

    /// Whether a session is stored, without touching it
    pub async fn is_live(&self, key: SessionKey) -> bool {
        self.inner.sessions.read().await.contains_key(&key)
    }

    /// Revoke and sign out every session idle for longer than the idle timeout.
    /// Returns how many were expired.
    pub async fn expire_idle(&self) -> usize {
        let now = Instant::now();
        let idle_timeout = self.inner.idle_timeout;

        let stale: Vec<(SessionKey, Session)> = {
            let mut sessions = self.inner.sessions.write().await;
            let keys: Vec<SessionKey> = sessions
                .iter()
                .filter(|(_, entry)| now.duration_since(entry.last_seen) >= idle_timeout)
                .map(|(key, _)| *key)
                .collect();
            keys.into_iter()
                .filter_map(|key| sessions.remove(&key).map(|entry| (key, entry.session)))
                .collect()
        };

        let expired = stale.len();
        for (key, session) in stale {
            info!("Session {} expired after being idle", key);
            self.retire(key, session).await;
        }
        expired
    }

    /// Identity behind a session, confirmed with the auth service.
    ///
    /// A rejected access token is refreshed once; if that fails too the session is
    /// dropped and a sign-out is announced. Transport failures are returned as errors
    /// and leave the session untouched.
    pub async fn current_user(&self, key: SessionKey) -> Result<Option<AuthIdentity>, AuthError> {
        let Some(session) = self.current_session(key).await else {
            return Ok(None);
        };

        if let Some(identity) = self.inner.service.get_user(&session.access_token).await? {
            return Ok(Some(identity));
        }

        match self.inner.service.refresh_session(&session.refresh_token).await {
            Ok(fresh) => {
                let identity = fresh.user.clone();
                self.store(key, fresh).await;
                self.emit(AuthEventKind::TokenRefreshed, key);
                Ok(Some(identity))
            }
            Err(AuthError::Transport(msg)) => Err(AuthError::Transport(msg)),
            Err(e) => {
                debug!("Session {} could not be refreshed: {}", key, e);
                if self.forget_if_current(key, &session.access_token).await {
                    self.emit(AuthEventKind::SignedOut, key);
                }
                Ok(None)
            }
        }
    }

    pub async fn refresh(&self, key: SessionKey) -> Result<Session, AuthError> {
        let session = self
            .current_session(key)
            .await
            .ok_or(AuthError::SessionInvalid)?;

        match self.inner.service.refresh_session(&session.refresh_token).await {
            Ok(fresh) => {
                self.store(key, fresh.clone()).await;
                self.emit(AuthEventKind::TokenRefreshed, key);
                Ok(fresh)
            }
            Err(AuthError::Transport(msg)) => Err(AuthError::Transport(msg)),
            Err(e) => {
                debug!("Refresh rejected for session {}: {}", key, e);
                if self.forget_if_current(key, &session.access_token).await {
                    self.emit(AuthEventKind::SignedOut, key);
                }
                Err(AuthError::SessionInvalid)
            }
        }
    }

    /// End a session locally and revoke it remotely. Returns whether the session existed.
    ///
    /// The local session is always dropped, even if the remote revocation fails.
    pub async fn sign_out(&self, key: SessionKey) -> bool {
        let removed = self.inner.sessions.write().await.remove(&key);
        let Some(entry) = removed else {
            return false;
        };

        self.retire(key, entry.session).await;
        true
    }

    async fn retire(&self, key: SessionKey, session: Session) {
        if let Err(e) = self.inner.service.sign_out(&session.access_token).await {
            warn!("Remote sign-out failed for session {}: {}", key, e);
        }

        info!("User {} signed out (session {})", session.user.id, key);
        self.emit(AuthEventKind::SignedOut, key);
    }

    async fn store(&self, key: SessionKey, session: Session) {
        let entry = Entry {
            session,
            last_seen: Instant::now(),
        };
        self.inner.sessions.write().await.insert(key, entry);
    }

    async fn forget_if_current(&self, key: SessionKey, access_token: &str) -> bool {
        let mut sessions = self.inner.sessions.write().await;
        match sessions.get(&key) {
            Some(current) if current.session.access_token == access_token => {
                sessions.remove(&key);
                true
            }
            _ => false,
        }
    }

    fn emit(&self, kind: AuthEventKind, session: SessionKey) {
        debug!("Auth event {:?} for session {}", kind, session);
        // No subscribers is fine
        let _ = self.inner.events.send(AuthEvent { kind, session });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeAuth;

    fn client_with_user(email: &str, password: &str) -> (AuthClient, Arc<FakeAuth>, AuthIdentity) {
        let fake = Arc::new(FakeAuth::new());
        let identity = fake.add_user(email, password);
        (AuthClient::new(fake.clone()), fake, identity)
    }

    #[tokio::test]
    async fn sign_in_stores_session_and_announces_it() {
        let (client, _fake, identity) = client_with_user("owner@caminar.ar", "secret123");
        let mut events = client.subscribe();

        let (key, _) = client
            .sign_in_with_password("owner@caminar.ar", "secret123")
            .await
            .unwrap();

        assert_eq!(client.current_user(key).await.unwrap(), Some(identity));
        let event = events.recv().await.unwrap();
        assert_eq!(event.kind, AuthEventKind::SignedIn);
        assert_eq!(event.session, key);
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let (client, _fake, _) = client_with_user("owner@caminar.ar", "secret123");
        let err = client
            .sign_in_with_password("owner@caminar.ar", "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unknown_session_has_no_user() {
        let (client, _fake, _) = client_with_user("a@caminar.ar", "secret123");
        assert_eq!(client.current_user(SessionKey::generate()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn revoked_session_is_dropped_and_signed_out() {
        let (client, fake, identity) = client_with_user("a@caminar.ar", "secret123");
        let (key, _) = client.sign_in_with_password("a@caminar.ar", "secret123").await.unwrap();
        let mut events = client.subscribe();

        fake.revoke_user(identity.id);

        assert_eq!(client.current_user(key).await.unwrap(), None);
        assert!(client.current_session(key).await.is_none());
        assert_eq!(events.recv().await.unwrap().kind, AuthEventKind::SignedOut);
    }

    #[tokio::test]
    async fn expired_access_token_is_refreshed_transparently() {
        let (client, fake, identity) = client_with_user("a@caminar.ar", "secret123");
        let (key, session) = client.sign_in_with_password("a@caminar.ar", "secret123").await.unwrap();
        let mut events = client.subscribe();

        fake.expire_access_token(&session.access_token);

        assert_eq!(client.current_user(key).await.unwrap(), Some(identity));
        assert_eq!(events.recv().await.unwrap().kind, AuthEventKind::TokenRefreshed);
        let fresh = client.current_session(key).await.unwrap();
        assert_ne!(fresh.access_token, session.access_token);
    }

    #[tokio::test]
    async fn transport_failure_is_an_error_not_a_sign_out() {
        let (client, fake, _) = client_with_user("a@caminar.ar", "secret123");
        let (key, _) = client.sign_in_with_password("a@caminar.ar", "secret123").await.unwrap();

        fake.set_unreachable(true);

        assert!(matches!(client.current_user(key).await, Err(AuthError::Transport(_))));
        assert!(client.current_session(key).await.is_some());
    }

    #[tokio::test]
    async fn sign_out_announces_and_forgets() {
        let (client, _fake, _) = client_with_user("a@caminar.ar", "secret123");
        let (key, _) = client.sign_in_with_password("a@caminar.ar", "secret123").await.unwrap();
        let mut events = client.subscribe();

        assert!(client.sign_out(key).await);
        assert!(!client.sign_out(key).await);
        assert_eq!(events.recv().await.unwrap().kind, AuthEventKind::SignedOut);
        assert_eq!(client.current_user(key).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_expire_and_recent_ones_stay() {
        let fake = Arc::new(FakeAuth::new());
        fake.add_user("a@caminar.ar", "secret123");
        let client = AuthClient::with_idle_timeout(fake, Duration::from_secs(60));

        let (idle, _) = client.sign_in_with_password("a@caminar.ar", "secret123").await.unwrap();
        tokio::time::advance(Duration::from_secs(50)).await;
        let (recent, _) = client.sign_in_with_password("a@caminar.ar", "secret123").await.unwrap();
        let mut events = client.subscribe();
        tokio::time::advance(Duration::from_secs(20)).await;

        assert_eq!(client.expire_idle().await, 1);
        assert!(!client.is_live(idle).await);
        assert!(client.is_live(recent).await);

        let event = events.recv().await.unwrap();
        assert_eq!(event.kind, AuthEventKind::SignedOut);
        assert_eq!(event.session, idle);
    }

    #[tokio::test(start_paused = true)]
    async fn use_keeps_a_session_alive_until_it_goes_idle() {
        let fake = Arc::new(FakeAuth::new());
        let identity = fake.add_user("a@caminar.ar", "secret123");
        let client = AuthClient::with_idle_timeout(fake, Duration::from_secs(60));
        let (key, _) = client.sign_in_with_password("a@caminar.ar", "secret123").await.unwrap();

        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(client.current_user(key).await.unwrap(), Some(identity));
        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(client.expire_idle().await, 0);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(client.current_session(key).await.is_none());
        assert!(!client.is_live(key).await);
    }
}
