use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::models::AdapterError;

/// Errors from the database layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Unknown table: {0}")]
    InvalidTable(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Tables of the hosted backend this service is allowed to touch
pub const KNOWN_TABLES: &[&str] = &[
    "places",
    "businesses",
    "categories",
    "subcategories",
    "provinces",
    "localities",
    "admin_users",
];

/// Connection pool construction and helpers for the hosted Postgres database
pub struct DatabaseManager;

impl DatabaseManager {
    /// Build the pool without connecting; connections are opened on first use so the
    /// server can start (and report degraded health) while the database is unreachable.
    pub fn lazy_pool(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy(url)?;

        info!("Configured database pool (max {} connections)", config.max_connections);
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Quote SQL identifier to prevent injection
    pub fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Resolve a table name against the known backend tables, quoted for SQL
    pub fn table(name: &str) -> Result<String, DatabaseError> {
        if KNOWN_TABLES.contains(&name) {
            Ok(Self::quote_identifier(name))
        } else {
            Err(DatabaseError::InvalidTable(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_tables_only() {
        assert_eq!(DatabaseManager::table("admin_users").unwrap(), "\"admin_users\"");
        assert!(DatabaseManager::table("businesses").is_ok());
        assert!(matches!(
            DatabaseManager::table("users; DROP TABLE places"),
            Err(DatabaseError::InvalidTable(_))
        ));
    }

    #[test]
    fn quotes_embedded_quotes() {
        assert_eq!(DatabaseManager::quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn lazy_pool_requires_url() {
        let config = DatabaseConfig {
            url: None,
            max_connections: 1,
            connection_timeout: 1,
        };
        assert!(matches!(
            DatabaseManager::lazy_pool(&config),
            Err(DatabaseError::ConfigMissing("DATABASE_URL"))
        ));
    }
}
