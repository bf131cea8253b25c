use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub remote: RemoteConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub security: SecurityConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Hosted backend (auth REST API) connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secure_cookie: bool,
    pub cookie_max_age_secs: u64,
    /// How often idle sessions and their contexts are swept
    pub sweep_interval_secs: u64,
}

impl SessionConfig {
    /// A session unused for longer than its cookie lives is dropped
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.cookie_max_age_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Categories a business may be filed under. Empty means any category.
    pub business_category_ids: Vec<Uuid>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Remote overrides
        if let Ok(v) = env::var("SUPABASE_URL") {
            self.remote.url = v;
        }
        if let Ok(v) = env::var("SUPABASE_ANON_KEY") {
            self.remote.anon_key = v;
        }
        if let Ok(v) = env::var("REMOTE_REQUEST_TIMEOUT_SECS") {
            self.remote.request_timeout_secs = v.parse().unwrap_or(self.remote.request_timeout_secs);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            self.session.cookie_name = v;
        }
        if let Ok(v) = env::var("SESSION_SECURE_COOKIE") {
            self.session.secure_cookie = v.parse().unwrap_or(self.session.secure_cookie);
        }
        if let Ok(v) = env::var("SESSION_COOKIE_MAX_AGE_SECS") {
            self.session.cookie_max_age_secs = v.parse().unwrap_or(self.session.cookie_max_age_secs);
        }
        if let Ok(v) = env::var("SESSION_SWEEP_INTERVAL_SECS") {
            self.session.sweep_interval_secs = v.parse().unwrap_or(self.session.sweep_interval_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }

        // Catalog overrides
        if let Ok(v) = env::var("CATALOG_BUSINESS_CATEGORY_IDS") {
            self.catalog.business_category_ids = split_list(&v)
                .iter()
                .filter_map(|s| Uuid::parse_str(s).ok())
                .collect();
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            remote: RemoteConfig {
                url: "http://localhost:54321".to_string(),
                anon_key: String::new(),
                request_timeout_secs: 10,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            session: SessionConfig {
                cookie_name: "caminar_session".to_string(),
                secure_cookie: false,
                cookie_max_age_secs: 60 * 60 * 24 * 7, // 1 week
                sweep_interval_secs: 60,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:5173".to_string()],
            },
            catalog: CatalogConfig {
                business_category_ids: Vec::new(),
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            remote: RemoteConfig {
                url: String::new(),
                anon_key: String::new(),
                request_timeout_secs: 10,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
            },
            session: SessionConfig {
                cookie_name: "caminar_session".to_string(),
                secure_cookie: true,
                cookie_max_age_secs: 60 * 60 * 24,
                sweep_interval_secs: 300,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.caminar.ar".to_string()],
            },
            catalog: CatalogConfig {
                business_category_ids: Vec::new(),
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            remote: RemoteConfig {
                url: String::new(),
                anon_key: String::new(),
                request_timeout_secs: 5,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
            },
            session: SessionConfig {
                cookie_name: "caminar_session".to_string(),
                secure_cookie: true,
                cookie_max_age_secs: 60 * 60 * 8,
                sweep_interval_secs: 300,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://caminar.ar".to_string()],
            },
            catalog: CatalogConfig {
                business_category_ids: Vec::new(),
            },
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(!config.session.secure_cookie);
        assert_eq!(config.session.cookie_name, "caminar_session");
        assert!(config.catalog.business_category_ids.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.session.secure_cookie);
        assert_eq!(config.environment, Environment::Production);
        assert!(config.session.cookie_max_age_secs < AppConfig::development().session.cookie_max_age_secs);
    }

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(
            split_list(" a, ,b ,"),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
