use axum::extract::{Extension, State};

use crate::auth::SessionKey;
use crate::database::models::BusinessRecord;
use crate::middleware::{ApiResponse, ApiResult};
use crate::session::ContextSnapshot;
use crate::state::AppState;

/// GET /business/dashboard/me - Settled snapshot of the caller's business context
pub async fn me(
    State(state): State<AppState>,
    Extension(key): Extension<SessionKey>,
) -> ApiResult<ContextSnapshot<BusinessRecord>> {
    let context = state.contexts.business(key).await;
    Ok(ApiResponse::success(context.settled().await))
}
