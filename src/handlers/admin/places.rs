use axum::extract::{Extension, Json, Path, Query, State};
use uuid::Uuid;

use crate::catalog::{filter_places, repository, validate_place, PlaceFilter};
use crate::database::models::{AdminRecord, Place, PlaceInput};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /admin/panel/places - All places, `?q=` searches by name
pub async fn list(State(state): State<AppState>, Query(filter): Query<PlaceFilter>) -> ApiResult<Vec<Place>> {
    let places = repository::list_places(&state.pool).await?;
    Ok(ApiResponse::success(filter_places(places, &filter)))
}

/// POST /admin/panel/places - Create a place
pub async fn create(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminRecord>,
    Json(input): Json<PlaceInput>,
) -> ApiResult<Place> {
    let refs = repository::reference_data(&state.pool).await?;
    let input = validate_place(input, &refs)?;
    let place = repository::insert_place(&state.pool, &input).await?;

    tracing::info!("Admin {} created place {}", admin.id, place.id);
    Ok(ApiResponse::created(place))
}

/// GET /admin/panel/places/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Place> {
    let place = repository::find_place(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Place {} not found", id)))?;
    Ok(ApiResponse::success(place))
}

/// PUT /admin/panel/places/:id - Replace the editable fields of a place
pub async fn update(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminRecord>,
    Path(id): Path<Uuid>,
    Json(input): Json<PlaceInput>,
) -> ApiResult<Place> {
    let refs = repository::reference_data(&state.pool).await?;
    let input = validate_place(input, &refs)?;
    let place = repository::update_place(&state.pool, id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Place {} not found", id)))?;

    tracing::info!("Admin {} updated place {}", admin.id, place.id);
    Ok(ApiResponse::success(place))
}
