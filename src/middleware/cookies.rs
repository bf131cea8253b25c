use std::convert::Infallible;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::auth::SessionKey;
use crate::config::SessionConfig;
use crate::state::AppState;

/// Value of the first cookie called `name`, across all `Cookie` headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
}

/// Session handle from `Authorization: Bearer <key>`, falling back to the session cookie
pub fn session_key_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<SessionKey> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(SessionKey::parse);

    bearer.or_else(|| cookie_value(headers, cookie_name).and_then(|raw| SessionKey::parse(&raw)))
}

pub fn session_cookie(config: &SessionConfig, key: SessionKey) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name, key, config.cookie_max_age_secs
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn expired_session_cookie(config: &SessionConfig) -> String {
    let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", config.cookie_name);
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Expire a cookie the old browser client wrote itself (not HttpOnly)
pub fn expired_cookie(name: &str) -> String {
    format!("{}=; Path=/; Max-Age=0", name)
}

/// Session handle of the caller, if any. Never rejects.
#[derive(Debug, Clone, Copy)]
pub struct CurrentSession(pub Option<SessionKey>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(CurrentSession(session_key_from_headers(
            &parts.headers,
            &state.config.session.cookie_name,
        )))
    }
}
