//! ecomm API Server
//!
//! REST API server for ecomm authentication and session management.

use anyhow::Context;
use ecomm_api::{create_router, init_tracing, shutdown_signal, AppState};
use ecomm_core::config::AppConfig;
use ecomm_core::{InMemoryStore, PgStore};
use std::sync::Arc;

/// Configuration file path, if any; environment variables override it
const CONFIG_PATH_VAR: &str = "ECOMM_CONFIG";

fn load_config() -> anyhow::Result<AppConfig> {
    let config = match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) => AppConfig::from_file(&path)
            .with_context(|| format!("loading {CONFIG_PATH_VAR}={path}"))?
            .with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };
    Ok(config)
}

async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    let state = match config.database.postgres_url.clone() {
        Some(url) => {
            let store = PgStore::connect(&url, config.database.pool_size).await?;
            store.ensure_schema().await?;
            tracing::info!(pool_size = config.database.pool_size, "using PostgreSQL store");
            let store = Arc::new(store);
            AppState::new(config, store.clone(), store)?
        }
        None => {
            tracing::warn!("DATABASE_URL not set, sessions and accounts are kept in memory only");
            let store = Arc::new(InMemoryStore::new());
            AppState::new(config, store.clone(), store)?
        }
    };
    Ok(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_tracing(&config.logging);

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state
    let state = Arc::new(build_state(config).await?);

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("ecomm API Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
