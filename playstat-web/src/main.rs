use anyhow::Context;
use playstat_db::{Database, SessionCache};
use playstat_web::config::Config;
use playstat_web::{create_app, flush_active_sessions};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for structured logging
    #[cfg(debug_assertions)]
    let log_level = tracing::Level::DEBUG;
    #[cfg(not(debug_assertions))]
    let log_level = tracing::Level::INFO;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::builder().with_default_directive(log_level.into()).from_env_lossy())
        .with_target(false)
        .compact()
        .init();
    tracing::info!("Starting playstat web server...");

    // Load configuration from environment variables or use defaults
    let config = Config::from_env();
    tracing::info!(
        "Configuration: port={}, db_path={}, web_dir={}, body_limit={}KB, timeout={}s, auth_required={}",
        config.port,
        config.database_path,
        config.web_directory.display(),
        config.request_body_limit / 1024,
        config.request_timeout.as_secs(),
        config.auth_required
    );
    if config.rate_limit_enabled {
        tracing::info!(
            "Rate limits: ingest={}/sec (burst {}), admin={}/sec (burst {})",
            config.rate_limit_ingest_per_sec,
            config.rate_limit_ingest_burst,
            config.rate_limit_general_per_sec,
            config.rate_limit_general_burst
        );
    }
    if config.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN is not set, /connect and /users will refuse every request");
    }

    let db = Database::open(&config.database_path)
        .await
        .with_context(|| format!("failed to open database at {}", config.database_path))?;
    let sessions = SessionCache::new();
    let app = create_app(db.clone(), sessions.clone(), &config)?;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let stored = flush_active_sessions(&db, &sessions).await?;
    tracing::info!(stored, "stored active sessions, shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
