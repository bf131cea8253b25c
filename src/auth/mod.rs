//! Authentication against the hosted auth service.
//!
//! The browser only ever holds an opaque [`SessionKey`]; access and refresh tokens
//! stay inside [`AuthClient`], which is also the single place auth-state changes
//! (sign-in, sign-out, token refresh) are announced from.

pub mod client;
pub mod legacy;
pub mod supabase;

pub use client::{AuthClient, AuthSubscription};
pub use supabase::SupabaseAuth;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Opaque handle for one browser session, stored in the session cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(Uuid);

impl SessionKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Identity issued by the auth service for a signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: AuthIdentity,
}

/// Result of a sign-up; `session` is absent when the service requires email confirmation
#[derive(Debug, Clone)]
pub struct SignUp {
    pub user: AuthIdentity,
    pub session: Option<Session>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: SessionKey,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Session expired or revoked")]
    SessionInvalid,

    #[error("User already registered")]
    AlreadyRegistered,

    #[error("Auth service rejected request: {0}")]
    Rejected(String),

    #[error("Auth service unavailable: {0}")]
    Transport(String),

    #[error("Auth service misconfigured: {0}")]
    Config(String),
}

/// Operations consumed from the hosted auth service
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Identity behind an access token; `None` when the token is expired or revoked.
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthIdentity>, AuthError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError>;

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError>;

    /// Revoke the session behind an access token
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}
