use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::{AuthError, AuthIdentity, AuthService, Session, SignUp};
use crate::config::RemoteConfig;

/// [`AuthService`] over the GoTrue-compatible REST API of the hosted project (`{url}/auth/v1`)
pub struct SupabaseAuth {
    http: Client,
    base: Url,
    anon_key: String,
}

impl SupabaseAuth {
    pub fn new(config: &RemoteConfig) -> Result<Self, AuthError> {
        if config.anon_key.is_empty() {
            return Err(AuthError::Config("SUPABASE_ANON_KEY is not set".to_string()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AuthError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base: auth_base_url(&config.url)?,
            anon_key: config.anon_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        self.base
            .join(path)
            .map_err(|e| AuthError::Config(format!("invalid auth endpoint '{}': {}", path, e)))
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.anon_key)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, AuthError> {
        self.request(builder)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> Result<Response, AuthError> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        self.send(self.http.post(url).json(&body)).await
    }
}

#[async_trait]
impl AuthService for SupabaseAuth {
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthIdentity>, AuthError> {
        let url = self.endpoint("user")?;
        let response = self.send(self.http.get(url).bearer_auth(access_token)).await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Access token rejected by auth service");
                Ok(None)
            }
            status if status.is_success() => {
                let user: UserPayload = read_json(response).await?;
                Ok(Some(user.into()))
            }
            status => Err(rejection(status, response).await),
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;

        match response.status() {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => Err(AuthError::InvalidCredentials),
            status if status.is_success() => read_json::<TokenPayload>(response).await.map(Session::from),
            status => Err(rejection(status, response).await),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError> {
        let url = self.endpoint("signup")?;
        let response = self
            .send(self.http.post(url).json(&json!({ "email": email, "password": password })))
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(match rejection(status, response).await {
                AuthError::Rejected(msg) if is_already_registered(&msg) => AuthError::AlreadyRegistered,
                other => other,
            });
        }

        let body: Value = read_json(response).await?;
        parse_signup(body)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let response = self
            .token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await?;

        match response.status() {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => Err(AuthError::SessionInvalid),
            status if status.is_success() => read_json::<TokenPayload>(response).await.map(Session::from),
            status => Err(rejection(status, response).await),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = self.endpoint("logout")?;
        let response = self.send(self.http.post(url).bearer_auth(access_token)).await?;

        match response.status() {
            // Already gone on the remote side
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(rejection(status, response).await),
        }
    }
}

/// `https://x.supabase.co` → `https://x.supabase.co/auth/v1/`
pub(crate) fn auth_base_url(project_url: &str) -> Result<Url, AuthError> {
    let trimmed = project_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AuthError::Config("SUPABASE_URL is not set".to_string()));
    }
    Url::parse(&format!("{}/auth/v1/", trimmed))
        .map_err(|e| AuthError::Config(format!("invalid SUPABASE_URL '{}': {}", project_url, e)))
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserPayload> for AuthIdentity {
    fn from(user: UserPayload) -> Self {
        Self {
            id: user.id,
            email: user.email.filter(|e| !e.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: UserPayload,
}

impl From<TokenPayload> for Session {
    fn from(token: TokenPayload) -> Self {
        let expires_at = token
            .expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .or_else(|| {
                token
                    .expires_in
                    .map(|secs| Utc::now() + chrono::Duration::seconds(secs))
            });

        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            user: token.user.into(),
        }
    }
}

/// Sign-up answers with a full token payload when the project auto-confirms
/// accounts, and with the bare user otherwise.
pub(crate) fn parse_signup(body: Value) -> Result<SignUp, AuthError> {
    let malformed = |e: serde_json::Error| AuthError::Rejected(format!("unexpected signup response: {}", e));

    if body.get("access_token").is_some() {
        let session = Session::from(serde_json::from_value::<TokenPayload>(body).map_err(malformed)?);
        return Ok(SignUp {
            user: session.user.clone(),
            session: Some(session),
        });
    }

    let user = match body.get("user") {
        Some(user) => serde_json::from_value::<UserPayload>(user.clone()),
        None => serde_json::from_value::<UserPayload>(body),
    }
    .map_err(malformed)?;

    Ok(SignUp {
        user: user.into(),
        session: None,
    })
}

/// Human readable message from a GoTrue error body, whichever generation of the API produced it
pub(crate) fn error_message(body: &Value) -> Option<String> {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn is_already_registered(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("already registered") || message.contains("already exists")
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, AuthError> {
    response
        .json::<T>()
        .await
        .map_err(|e| AuthError::Transport(format!("unreadable auth response: {}", e)))
}

async fn rejection(status: StatusCode, response: Response) -> AuthError {
    if status.is_server_error() {
        return AuthError::Transport(format!("auth service returned {}", status));
    }

    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    let message = error_message(&body).unwrap_or_else(|| format!("request failed with {}", status));
    AuthError::Rejected(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let base = auth_base_url("https://demo.supabase.co/").unwrap();
        assert_eq!(base.as_str(), "https://demo.supabase.co/auth/v1/");
        assert_eq!(base.join("token").unwrap().as_str(), "https://demo.supabase.co/auth/v1/token");
    }

    #[test]
    fn missing_project_url_is_config_error() {
        assert!(matches!(auth_base_url("  "), Err(AuthError::Config(_))));
    }

    #[test]
    fn signup_with_session() {
        let id = Uuid::new_v4();
        let signup = parse_signup(json!({
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600,
            "user": { "id": id, "email": "owner@caminar.ar" }
        }))
        .unwrap();

        assert_eq!(signup.user.id, id);
        let session = signup.session.unwrap();
        assert_eq!(session.refresh_token, "rt");
        assert!(session.expires_at.is_some());
    }

    #[test]
    fn signup_pending_confirmation_has_no_session() {
        let id = Uuid::new_v4();
        let signup = parse_signup(json!({ "id": id, "email": "owner@caminar.ar" })).unwrap();
        assert_eq!(signup.user.id, id);
        assert!(signup.session.is_none());
    }

    #[test]
    fn error_message_handles_old_and_new_bodies() {
        assert_eq!(
            error_message(&json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })),
            Some("Invalid login credentials".to_string())
        );
        assert_eq!(
            error_message(&json!({ "code": 422, "msg": "User already registered" })),
            Some("User already registered".to_string())
        );
        assert!(is_already_registered("User already registered"));
        assert_eq!(error_message(&Value::Null), None);
    }
}
