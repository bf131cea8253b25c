use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{AuthClient, AuthService};
use crate::config::AppConfig;
use crate::database::RecordSource;
use crate::session::{ContextRegistry, SessionResolver};

/// Shared handles injected into every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthClient,
    pub resolver: SessionResolver,
    pub contexts: ContextRegistry,
    pub pool: PgPool,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        auth_service: Arc<dyn AuthService>,
        records: Arc<dyn RecordSource>,
        pool: PgPool,
    ) -> Self {
        let auth = AuthClient::with_idle_timeout(auth_service, config.session.idle_timeout());
        let resolver = SessionResolver::new(auth.clone(), records);
        let contexts = ContextRegistry::new(resolver.clone());

        Self {
            config: Arc::new(config),
            auth,
            resolver,
            contexts,
            pool,
        }
    }
}
