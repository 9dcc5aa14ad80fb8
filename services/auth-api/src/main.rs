//! Warden Auth API
//!
//! Authentication service: password login, sessions and API keys over REST.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use warden_auth_core::AuthService;
use warden_auth_api::config::{Config, LogFormat};
use warden_auth_api::state::{AppState, Postgres, ReadinessProbe};
use warden_db::{ConnectionManager, Repositories};

/// How often expired session rows are purged
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("invalid configuration")?;

    init_tracing(config.log_format);
    tracing::info!(environment = ?config.auth.environment, "Starting Warden Auth API");

    // Database
    let manager = Arc::new(ConnectionManager::new(
        config.database_url.clone(),
        config.pool.clone(),
    ));
    let pool = manager.connect_or_exit().await;
    if config.run_migrations {
        manager.migrate().await.context("failed to apply migrations")?;
    }

    let repos = Repositories::new(pool);
    let auth = AuthService::new(
        config.auth.clone(),
        Arc::new(repos.users),
        Arc::new(repos.sessions),
        Arc::new(repos.api_keys),
    )
    .context("failed to initialise auth service")?;

    let readiness: Arc<dyn ReadinessProbe> = manager.clone();
    let state = AppState::<Postgres>::new(auth, readiness);

    let purge = tokio::spawn(purge_expired_sessions(state.clone()));

    // Start server
    let app = warden_auth_api::router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge.abort();
    manager.disconnect().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn purge_expired_sessions(state: AppState<Postgres>) {
    let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
    loop {
        interval.tick().await;
        if let Err(e) = state.auth.sessions().purge_expired().await {
            tracing::warn!("Session purge failed: {}", e);
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
