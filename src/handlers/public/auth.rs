// handlers/public/auth.rs - Sign-in, registration, refresh and sign-out
//
// Sign-in is per area: a session is only handed out if the identity is
// authorized for the area it signed in to. Otherwise the fresh session is
// revoked straight away so no half-authorized session is left behind.

use std::collections::HashMap;
use std::future::Future;

use axum::extract::{Json, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthClient, AuthError, AuthIdentity, SessionKey};
use crate::catalog::{repository, validate_registration, Registration};
use crate::database::models::{AdminRecord, BusinessRecord, RecordStatus};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::cookies::{expired_session_cookie, session_cookie};
use crate::middleware::{ApiResponse, ApiResult, CurrentSession};
use crate::session::{PrivilegedRecord, Resolution, BUSINESS};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse<R> {
    /// Landing route of the area
    pub redirect: &'static str,
    pub user: AuthIdentity,
    pub record: R,
    pub expires_at: Option<DateTime<Utc>>,
}

/// POST /admin/login - Sign in to the admin panel
pub async fn admin_login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<LoginResponse<AdminRecord>> {
    area_login(&state, body).await
}

/// POST /business/login - Sign in to the business dashboard
pub async fn business_login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<LoginResponse<BusinessRecord>> {
    area_login(&state, body).await
}

async fn area_login<R: PrivilegedRecord>(state: &AppState, body: LoginRequest) -> ApiResult<LoginResponse<R>> {
    let policy = R::POLICY;
    let email = body.email.trim();

    let mut missing = HashMap::new();
    if email.is_empty() {
        missing.insert("email".to_string(), "This field is required".to_string());
    }
    if body.password.is_empty() {
        missing.insert("password".to_string(), "This field is required".to_string());
    }
    if !missing.is_empty() {
        return Err(ApiError::validation_error("Email and password are required", Some(missing)));
    }

    let (key, session) = match state.auth.sign_in_with_password(email, &body.password).await {
        Ok(signed_in) => signed_in,
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Failed {} login for {}", policy.area, email);
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(e) => return Err(e.into()),
    };

    match state.resolver.resolve::<R>(Some(key)).await {
        Resolution::Authorized(record) => {
            tracing::info!("{} signed in to {} area", email, policy.area);
            let response = LoginResponse {
                redirect: policy.landing_route,
                user: session.user,
                record,
                expires_at: session.expires_at,
            };
            Ok(ApiResponse::success(response).with_cookie(session_cookie(&state.config.session, key)))
        }
        Resolution::Unauthorized(denial) => {
            state.auth.sign_out(key).await;
            Err(ApiError::access_denied(denial.message()))
        }
        Resolution::Failed(err) => {
            state.auth.sign_out(key).await;
            Err(err.into())
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub business: BusinessRecord,
    /// Where the client should go next: the dashboard when signed in, the login page otherwise
    pub redirect: &'static str,
    /// Email confirmation is pending; no session was opened
    pub confirmation_required: bool,
}

/// POST /business/register - Create an owner account and its pending business
pub async fn business_register(
    State(state): State<AppState>,
    Json(registration): Json<Registration>,
) -> ApiResult<RegisterResponse> {
    let refs = repository::reference_data(&state.pool).await?;
    validate_registration(&registration, &refs, &state.config.catalog.business_category_ids)?;

    let email = registration.email.trim().to_string();
    let password = registration.password.clone();
    let input = registration.into_business_input();
    let pool = &state.pool;

    let (business, key) = open_business_account(&state.auth, &email, &password, |owner| async move {
        repository::insert_business(pool, &input, RecordStatus::Pending, Some(owner)).await
    })
    .await?;

    let response = RegisterResponse {
        business,
        redirect: if key.is_some() { BUSINESS.landing_route } else { BUSINESS.login_route },
        confirmation_required: key.is_none(),
    };

    let mut response = ApiResponse::created(response);
    if let Some(key) = key {
        response = response.with_cookie(session_cookie(&state.config.session, key));
    }
    Ok(response)
}

/// Sign the owner up, then create their business with `create`. If the row cannot be
/// written the new session is signed out again; the auth account itself remains.
async fn open_business_account<F, Fut>(
    auth: &AuthClient,
    email: &str,
    password: &str,
    create: F,
) -> Result<(BusinessRecord, Option<SessionKey>), ApiError>
where
    F: FnOnce(uuid::Uuid) -> Fut,
    Fut: Future<Output = Result<BusinessRecord, DatabaseError>>,
{
    let (user, key) = auth.sign_up(email, password).await?;

    match create(user.id).await {
        Ok(business) => {
            tracing::info!("Registered business {} for user {}", business.id, user.id);
            Ok((business, key))
        }
        Err(e) => {
            tracing::error!("Auth user {} registered but business row was not created: {}", user.id, e);
            if let Some(key) = key {
                auth.sign_out(key).await;
            }
            Err(ApiError::internal_server_error(
                "Your account was created but the business could not be saved. Please contact support to finish registration",
            ))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub user: AuthIdentity,
    pub expires_at: Option<DateTime<Utc>>,
}

/// POST /auth/refresh - Exchange the refresh token for a new access token
pub async fn refresh(State(state): State<AppState>, CurrentSession(session): CurrentSession) -> ApiResult<SessionInfo> {
    let key = session.ok_or_else(|| ApiError::unauthorized("No active session"))?;
    let session = state.auth.refresh(key).await?;

    Ok(ApiResponse::success(SessionInfo {
        user: session.user,
        expires_at: session.expires_at,
    })
    .with_cookie(session_cookie(&state.config.session, key)))
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub signed_out: bool,
}

/// POST /auth/logout - End the session, unmount its contexts and expire the cookie
pub async fn logout(State(state): State<AppState>, CurrentSession(session): CurrentSession) -> ApiResult<LogoutResponse> {
    let signed_out = match session {
        Some(key) => {
            let existed = state.auth.sign_out(key).await;
            state.contexts.unmount(key).await;
            existed
        }
        None => false,
    };

    Ok(ApiResponse::success(LogoutResponse { signed_out })
        .with_cookie(expired_session_cookie(&state.config.session)))
}
