use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use super::cookies::{expired_cookie, session_key_from_headers};
use crate::auth::legacy::{legacy_cookies, LegacyCookie};
use crate::auth::SessionKey;
use crate::database::models::{AdminRecord, BusinessRecord};
use crate::error::ApiError;
use crate::session::{Denial, GuardState, PrivilegedRecord, RouteGuard};
use crate::state::AppState;

/// Middleware in front of `/admin/panel`: only sessions with an active `admin_users` row pass.
/// Injects the [`AdminRecord`] and the caller's [`SessionKey`] into the request.
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let legacy = legacy_cookies(request.headers());
    let response = match authorize::<AdminRecord>(&state, request).await {
        Ok((key, request)) => {
            state.contexts.admin(key).await;
            next.run(request).await
        }
        Err(response) => response,
    };
    expire_legacy(response, &legacy)
}

/// Middleware in front of `/business/dashboard`: sessions with an active or
/// pending `businesses` row pass. Injects the [`BusinessRecord`] and [`SessionKey`].
pub async fn require_business(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let legacy = legacy_cookies(request.headers());
    let response = match authorize::<BusinessRecord>(&state, request).await {
        Ok((key, request)) => {
            state.contexts.business(key).await;
            next.run(request).await
        }
        Err(response) => response,
    };
    expire_legacy(response, &legacy)
}

async fn authorize<R: PrivilegedRecord>(
    state: &AppState,
    mut request: Request,
) -> Result<(SessionKey, Request), Response> {
    let session = session_key_from_headers(request.headers(), &state.config.session.cookie_name);
    let guard = RouteGuard::<R>::evaluate(&state.resolver, session).await;

    match (guard.into_state(), session) {
        (GuardState::Authorized(record), Some(key)) => {
            request.extensions_mut().insert(record);
            request.extensions_mut().insert(key);
            Ok((key, request))
        }
        (GuardState::Unauthorized { redirect_to, denial }, _) => {
            if denial == Denial::NotAuthenticated {
                tracing::debug!("Unauthenticated request to {} area, redirecting", R::POLICY.area);
            }
            Err(redirect(redirect_to, denial))
        }
        (GuardState::Failed(err), _) => Err(ApiError::from(err).into_response()),
        (state, _) => {
            tracing::error!("Guard for {} area ended in unexpected state {:?}", R::POLICY.area, state);
            Err(ApiError::internal_server_error("Session check did not complete").into_response())
        }
    }
}

/// `303 See Other` to the login route; the body tells "please log in" apart from "access denied"
fn redirect(redirect_to: &'static str, denial: Denial) -> Response {
    let body = json!({
        "success": false,
        "error": denial.message(),
        "code": denial.code(),
        "redirect": redirect_to,
    });
    (StatusCode::SEE_OTHER, [(header::LOCATION, redirect_to)], Json(body)).into_response()
}

fn expire_legacy(mut response: Response, legacy: &[LegacyCookie]) -> Response {
    for cookie in legacy {
        match &cookie.marker {
            Some(marker) => tracing::warn!(
                "Ignoring deprecated '{}' session marker (role: {}, email: {})",
                cookie.name,
                marker.role.as_deref().unwrap_or("-"),
                marker.email.as_deref().unwrap_or("-")
            ),
            None => tracing::warn!("Ignoring deprecated '{}' session marker", cookie.name),
        }

        if let Ok(value) = HeaderValue::from_str(&expired_cookie(cookie.name)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}
