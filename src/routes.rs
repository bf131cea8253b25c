use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::SecurityConfig;
use crate::handlers::{admin, business, public};
use crate::middleware::{require_admin, require_business};
use crate::state::AppState;

/// The full HTTP surface with its guards and global middleware
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(public::status::root))
        .route("/health", get(public::status::health))
        .merge(catalog_routes())
        .merge(auth_routes())
        // Guarded areas
        .nest("/admin/panel", admin_routes(&state))
        .nest("/business/dashboard", business_routes(&state))
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors_layer(&state.config.security) {
        router = router.layer(cors);
    }

    router.with_state(state)
}

fn catalog_routes() -> Router<AppState> {
    use public::catalog;

    Router::new()
        .route("/api/places", get(catalog::places_list))
        .route("/api/places/:id", get(catalog::places_get))
        .route("/api/businesses", get(catalog::businesses_list))
        .route("/api/businesses/:id", get(catalog::businesses_get))
        .route("/api/categories", get(catalog::categories))
        .route("/api/subcategories", get(catalog::subcategories))
        .route("/api/provinces", get(catalog::provinces))
        .route("/api/localities", get(catalog::localities))
}

fn auth_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/admin/login", post(auth::admin_login))
        .route("/business/login", post(auth::business_login))
        .route("/business/register", post(auth::business_register))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard::summary))
        .route("/me", get(admin::dashboard::me))
        .route("/places", get(admin::places::list).post(admin::places::create))
        .route("/places/:id", get(admin::places::get).put(admin::places::update))
        .route("/businesses", get(admin::businesses::list).post(admin::businesses::create))
        .route(
            "/businesses/:id",
            get(admin::businesses::get).put(admin::businesses::update),
        )
        .route_layer(from_fn_with_state(state.clone(), require_admin))
}

fn business_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(business::dashboard::me))
        .route(
            "/profile",
            get(business::profile::get).put(business::profile::update),
        )
        .route_layer(from_fn_with_state(state.clone(), require_business))
}

/// Credentialed CORS for the configured origins; permissive when none are listed
fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return Some(CorsLayer::permissive());
    }

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true),
    )
}
