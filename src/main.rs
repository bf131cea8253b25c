use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use caminar_api::auth::SupabaseAuth;
use caminar_api::config;
use caminar_api::database::{DatabaseManager, PgRecordSource};
use caminar_api::{app, AppState};

#[derive(Parser)]
#[command(name = "caminar-api")]
#[command(about = "CaminAR directory API server")]
#[command(version)]
struct Args {
    /// Port to listen on (falls back to PORT, then 3000)
    #[arg(long, env = "CAMINAR_API_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SUPABASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("caminar_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let config = config::config().clone();
    tracing::info!("Starting CaminAR API in {:?} mode", config.environment);

    let auth = SupabaseAuth::new(&config.remote).context("auth service configuration")?;
    let pool = DatabaseManager::lazy_pool(&config.database).context("database configuration")?;
    let records = PgRecordSource::new(pool.clone());

    let state = AppState::new(config, Arc::new(auth), Arc::new(records), pool);
    let _janitor = state.contexts.spawn_janitor(state.config.session.sweep_interval());

    let port = args
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|s| s.parse::<u16>().ok()))
        .unwrap_or(3000);

    let bind_addr = format!("{}:{}", args.bind, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("CaminAR API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server")?;
    Ok(())
}
