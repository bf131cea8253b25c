// handlers/public/catalog.rs - Public directory listings (no session required)

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::catalog::{filter_businesses, filter_places, repository, BusinessFilter, PlaceFilter};
use crate::database::models::{BusinessRecord, Category, Locality, Place, Province, RecordStatus, Subcategory};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/places - Places, with optional `q`, `category_id` and `locality_id` filters
pub async fn places_list(State(state): State<AppState>, Query(filter): Query<PlaceFilter>) -> ApiResult<Vec<Place>> {
    let places = repository::list_places(&state.pool).await?;
    Ok(ApiResponse::success(filter_places(places, &filter)))
}

/// GET /api/places/:id - Single place
pub async fn places_get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Place> {
    let place = repository::find_place(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Place {} not found", id)))?;
    Ok(ApiResponse::success(place))
}

/// GET /api/businesses - Active businesses only, sorted by name
pub async fn businesses_list(State(state): State<AppState>) -> ApiResult<Vec<BusinessRecord>> {
    let businesses = repository::list_businesses(&state.pool, Some(RecordStatus::Active)).await?;
    Ok(ApiResponse::success(filter_businesses(businesses, &BusinessFilter::default())))
}

/// GET /api/businesses/:id - Single active business; anything else is not found
pub async fn businesses_get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<BusinessRecord> {
    let business = repository::find_business(&state.pool, id)
        .await?
        .filter(|b| b.status == RecordStatus::Active)
        .ok_or_else(|| ApiError::not_found(format!("Business {} not found", id)))?;
    Ok(ApiResponse::success(business))
}

#[derive(Debug, Deserialize)]
pub struct SubcategoryQuery {
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct LocalityQuery {
    pub province_id: Option<Uuid>,
}

/// GET /api/categories
pub async fn categories(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    Ok(ApiResponse::success(repository::categories(&state.pool).await?))
}

/// GET /api/subcategories?category_id=
pub async fn subcategories(
    State(state): State<AppState>,
    Query(query): Query<SubcategoryQuery>,
) -> ApiResult<Vec<Subcategory>> {
    Ok(ApiResponse::success(
        repository::subcategories(&state.pool, query.category_id).await?,
    ))
}

/// GET /api/provinces
pub async fn provinces(State(state): State<AppState>) -> ApiResult<Vec<Province>> {
    Ok(ApiResponse::success(repository::provinces(&state.pool).await?))
}

/// GET /api/localities?province_id=
pub async fn localities(State(state): State<AppState>, Query(query): Query<LocalityQuery>) -> ApiResult<Vec<Locality>> {
    Ok(ApiResponse::success(
        repository::localities(&state.pool, query.province_id).await?,
    ))
}
