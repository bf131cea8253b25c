// handlers/public/status.rs - Service index and health

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::session::{ADMIN, BUSINESS};
use crate::state::AppState;

/// GET / - Service description and route map
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "CaminAR API",
            "version": version,
            "description": "Tourism directory backend: public catalog, admin panel and business dashboard",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "catalog": "/api/places[/:id], /api/businesses[/:id], /api/categories, /api/subcategories, /api/provinces, /api/localities (public)",
                "admin_login": format!("{} (public)", ADMIN.login_route),
                "business_login": format!("{} (public)", BUSINESS.login_route),
                "business_register": "/business/register (public)",
                "session": "/auth/refresh, /auth/logout (session cookie)",
                "admin": format!("{}/* (admin session)", ADMIN.landing_route),
                "business": format!("{}/me, {}/profile (business session)", BUSINESS.landing_route, BUSINESS.landing_route),
            }
        }
    }))
}

/// GET /health - Database connectivity probe
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database_error": e.to_string()
                    }
                })),
            )
        }
    }
}
