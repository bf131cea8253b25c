use axum::extract::{Extension, Json, Path, Query, State};
use uuid::Uuid;

use crate::catalog::repository::{self, BusinessKey};
use crate::catalog::{filter_businesses, validate_business, BusinessFilter};
use crate::database::models::{AdminRecord, BusinessInput, BusinessRecord, RecordStatus};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /admin/panel/businesses - Every business regardless of status, `?q=&status=`
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<BusinessFilter>,
) -> ApiResult<Vec<BusinessRecord>> {
    let businesses = repository::list_businesses(&state.pool, None).await?;
    Ok(ApiResponse::success(filter_businesses(businesses, &filter)))
}

/// POST /admin/panel/businesses - Create a business (pending unless the form says otherwise)
pub async fn create(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminRecord>,
    Json(input): Json<BusinessInput>,
) -> ApiResult<BusinessRecord> {
    let input = validated(&state, input).await?;
    let status = match input.status {
        Some(RecordStatus::Unknown) | None => RecordStatus::Pending,
        Some(status) => status,
    };

    let business = repository::insert_business(&state.pool, &input, status, None).await?;

    tracing::info!("Admin {} created business {} ({})", admin.id, business.id, status);
    Ok(ApiResponse::created(business))
}

/// GET /admin/panel/businesses/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<BusinessRecord> {
    let business = repository::find_business(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Business {} not found", id)))?;
    Ok(ApiResponse::success(business))
}

/// PUT /admin/panel/businesses/:id - Edit a business; `status` may be changed here
pub async fn update(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminRecord>,
    Path(id): Path<Uuid>,
    Json(input): Json<BusinessInput>,
) -> ApiResult<BusinessRecord> {
    let input = validated(&state, input).await?;
    let status = input.status.filter(|s| *s != RecordStatus::Unknown);

    let business = repository::update_business(&state.pool, BusinessKey::Id(id), &input, status)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Business {} not found", id)))?;

    tracing::info!("Admin {} updated business {}", admin.id, business.id);
    Ok(ApiResponse::success(business))
}

async fn validated(state: &AppState, input: BusinessInput) -> Result<BusinessInput, ApiError> {
    let refs = repository::reference_data(&state.pool).await?;
    validate_business(input, &refs, &state.config.catalog.business_category_ids)
}
