//! In-memory stand-ins for the hosted backend, used by unit and router tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tokio::sync::{oneshot, Notify};
use uuid::Uuid;

use crate::auth::{AuthError, AuthIdentity, AuthService, Session, SignUp};
use crate::database::{DatabaseError, RecordSource};

/// Auth service with a fixed user list and opaque random tokens
#[derive(Default)]
pub struct FakeAuth {
    state: Mutex<FakeAuthState>,
    unreachable: AtomicBool,
}

#[derive(Default)]
struct FakeAuthState {
    passwords: HashMap<String, (String, Uuid)>,
    identities: HashMap<Uuid, AuthIdentity>,
    access: HashMap<String, Uuid>,
    refresh: HashMap<String, Uuid>,
}

impl FakeAuthState {
    fn issue(&mut self, user: Uuid) -> Result<Session, AuthError> {
        let identity = self
            .identities
            .get(&user)
            .cloned()
            .ok_or(AuthError::SessionInvalid)?;

        let access_token = format!("at-{}", Uuid::new_v4().simple());
        let refresh_token = format!("rt-{}", Uuid::new_v4().simple());
        self.access.insert(access_token.clone(), user);
        self.refresh.insert(refresh_token.clone(), user);

        Ok(Session {
            access_token,
            refresh_token,
            expires_at: Some(Utc::now() + Duration::hours(1)),
            user: identity,
        })
    }
}

impl FakeAuth {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeAuthState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_user(&self, email: &str, password: &str) -> AuthIdentity {
        let identity = AuthIdentity {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        };
        let mut state = self.state();
        state
            .passwords
            .insert(email.to_string(), (password.to_string(), identity.id));
        state.identities.insert(identity.id, identity.clone());
        identity
    }

    /// Invalidate every access and refresh token of a user
    pub fn revoke_user(&self, user: Uuid) {
        let mut state = self.state();
        state.access.retain(|_, owner| *owner != user);
        state.refresh.retain(|_, owner| *owner != user);
    }

    /// Invalidate one access token, leaving its refresh token usable
    pub fn expire_access_token(&self, access_token: &str) {
        self.state().access.remove(access_token);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<(), AuthError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(AuthError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthService for FakeAuth {
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthIdentity>, AuthError> {
        self.check_reachable()?;
        let state = self.state();
        Ok(state
            .access
            .get(access_token)
            .and_then(|user| state.identities.get(user))
            .cloned())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.check_reachable()?;
        let mut state = self.state();
        let user = match state.passwords.get(email) {
            Some((expected, user)) if expected == password => *user,
            _ => return Err(AuthError::InvalidCredentials),
        };
        state.issue(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError> {
        self.check_reachable()?;
        if self.state().passwords.contains_key(email) {
            return Err(AuthError::AlreadyRegistered);
        }

        let user = self.add_user(email, password);
        let session = self.state().issue(user.id)?;
        Ok(SignUp {
            user,
            session: Some(session),
        })
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        self.check_reachable()?;
        let mut state = self.state();
        let user = state
            .refresh
            .remove(refresh_token)
            .ok_or(AuthError::SessionInvalid)?;
        state.issue(user)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.check_reachable()?;
        self.state().access.remove(access_token);
        Ok(())
    }
}

/// Privileged rows held in memory, matched on their `auth_user_id` field
#[derive(Default)]
pub struct MemoryRecordSource {
    rows: Mutex<HashMap<String, Vec<Value>>>,
    failing: AtomicBool,
    lookups: AtomicUsize,
}

impl MemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, table: &str, row: Value) {
        self.rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of lookups served so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for MemoryRecordSource {
    async fn find_by_auth_user(&self, table: &str, auth_user_id: Uuid) -> Result<Option<Value>, DatabaseError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DatabaseError::QueryError("simulated outage".to_string()));
        }

        let rows = self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let owner = auth_user_id.to_string();
        let matches: Vec<&Value> = rows
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.get("auth_user_id").and_then(Value::as_str) == Some(owner.as_str()))
                    .collect()
            })
            .unwrap_or_default();

        if matches.len() > 1 {
            return Err(DatabaseError::QueryError(format!(
                "multiple {} rows for auth user {}",
                table, auth_user_id
            )));
        }
        Ok(matches.first().map(|row| (*row).clone()))
    }
}

struct ScriptedStep {
    gate: Option<oneshot::Receiver<()>>,
    response: Result<Option<Value>, DatabaseError>,
}

/// Record source answering from a script, one step per lookup.
///
/// Gated steps hold their lookup open until the returned sender fires, which
/// lets tests choose the order in which concurrent resolutions complete.
#[derive(Default)]
pub struct ScriptedRecordSource {
    script: Mutex<VecDeque<ScriptedStep>>,
    calls: AtomicUsize,
    called: Notify,
}

impl ScriptedRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: Result<Option<Value>, DatabaseError>) {
        self.enqueue(ScriptedStep { gate: None, response });
    }

    pub fn push_gated(&self, response: Result<Option<Value>, DatabaseError>) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.enqueue(ScriptedStep {
            gate: Some(gate),
            response,
        });
        release
    }

    fn enqueue(&self, step: ScriptedStep) {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(step);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` lookups have started
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let notified = self.called.notified();
            if self.calls() >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl RecordSource for ScriptedRecordSource {
    async fn find_by_auth_user(&self, _table: &str, _auth_user_id: Uuid) -> Result<Option<Value>, DatabaseError> {
        let step = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();

        self.calls.fetch_add(1, Ordering::SeqCst);
        self.called.notify_waiters();

        let Some(step) = step else {
            return Ok(None);
        };
        if let Some(gate) = step.gate {
            let _ = gate.await;
        }
        step.response
    }
}

pub fn admin_row(auth_user_id: Uuid, status: Option<&str>) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "auth_user_id": auth_user_id,
        "status": status,
        "full_name": "Ana Paz",
        "email": "ana@caminar.ar",
        "role": "super_admin"
    })
}

pub fn business_row(auth_user_id: Uuid, status: Option<&str>) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "auth_user_id": auth_user_id,
        "status": status,
        "name": "Café del Cerro",
        "description": "Café de montaña",
        "address": "Ruta 340 km 12",
        "phone": "+54 381 555 0101",
        "contact_email": "hola@cafedelcerro.ar"
    })
}
