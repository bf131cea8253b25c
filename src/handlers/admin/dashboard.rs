use axum::extract::{Extension, State};

use crate::auth::SessionKey;
use crate::catalog::{repository, summarize, DashboardSummary};
use crate::database::models::AdminRecord;
use crate::middleware::{ApiResponse, ApiResult};
use crate::session::ContextSnapshot;
use crate::state::AppState;

/// GET /admin/panel - Landing counters
pub async fn summary(State(state): State<AppState>) -> ApiResult<DashboardSummary> {
    let (places, businesses, categories) = futures::try_join!(
        repository::list_places(&state.pool),
        repository::list_businesses(&state.pool, None),
        repository::categories(&state.pool),
    )?;

    Ok(ApiResponse::success(summarize(&places, &businesses, &categories)))
}

/// GET /admin/panel/me - Settled snapshot of the caller's admin context
pub async fn me(
    State(state): State<AppState>,
    Extension(key): Extension<SessionKey>,
) -> ApiResult<ContextSnapshot<AdminRecord>> {
    let context = state.contexts.admin(key).await;
    Ok(ApiResponse::success(context.settled().await))
}
