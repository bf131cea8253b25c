use axum::extract::{Extension, Json, State};

use crate::auth::SessionKey;
use crate::catalog::repository::{self, BusinessKey};
use crate::catalog::validate_business;
use crate::database::models::{BusinessInput, BusinessRecord};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /business/dashboard/profile - The caller's own business
pub async fn get(Extension(business): Extension<BusinessRecord>) -> ApiResult<BusinessRecord> {
    Ok(ApiResponse::success(business))
}

/// PUT /business/dashboard/profile - Edit the caller's own business.
///
/// The row is addressed by the session's identity, never by a client-supplied id,
/// and `status` from the payload is ignored.
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<BusinessRecord>,
    Extension(key): Extension<SessionKey>,
    Json(input): Json<BusinessInput>,
) -> ApiResult<BusinessRecord> {
    let refs = repository::reference_data(&state.pool).await?;
    let input = validate_business(
        BusinessInput { status: None, ..input },
        &refs,
        &state.config.catalog.business_category_ids,
    )?;

    let owner = current
        .auth_user_id
        .ok_or_else(|| ApiError::forbidden("This business is not bound to an account"))?;

    let business = repository::update_business(&state.pool, BusinessKey::Owner(owner), &input, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Business profile not found"))?;

    if let Some(context) = state.contexts.mounted_business(key).await {
        context.refresh();
    }

    tracing::info!("Business {} updated its profile", business.id);
    Ok(ApiResponse::success(business))
}
