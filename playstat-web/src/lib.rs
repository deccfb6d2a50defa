mod cache;
pub mod config;
mod dispatch;
mod error;
pub mod helpers;
pub mod mime;
pub mod request;
pub mod resolver;
pub mod resolvers;
pub mod response;
mod routes;
mod validation;

pub use cache::ResourceCache;
pub use error::{ErrorResponse, SetupError, WebError};

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use playstat_db::{Database, SessionCache, epoch_millis};
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::config::Config;
use crate::resolver::CompositeResolver;
use crate::resolvers::{ResolverContext, build_resolver_tree};

pub struct AppState {
    pub db: Database,
    pub sessions: SessionCache,
    pub resolver: Arc<CompositeResolver>,
    /// Whether resolver routes demand a web user token
    pub auth_required: bool,
    pub admin_token: Option<String>,
}

/// Create the application router with the given database, session cache and configuration
pub fn create_app(db: Database, sessions: SessionCache, config: &Config) -> Result<Router, SetupError> {
    let resolver = build_resolver_tree(ResolverContext {
        db: db.clone(),
        sessions: sessions.clone(),
        web_directory: config.web_directory.clone(),
        resources: Arc::new(ResourceCache::new(config.resource_cache_ttl)),
        activity_threshold_ms: config.active_playtime_threshold.as_millis() as i64,
    })?;

    let state = Arc::new(AppState {
        db,
        sessions,
        resolver: Arc::new(resolver),
        auth_required: config.auth_required,
        admin_token: config.admin_token.clone(),
    });

    // Lenient rate limit for ingest endpoints - many players join/leave at once
    let mut ingest_routes = Router::new()
        .route("/join", post(routes::join))
        .route("/leave", post(routes::leave))
        .route("/world", post(routes::world))
        .route("/kill", post(routes::kill))
        .route("/afk", post(routes::afk))
        .route("/status", post(routes::status))
        .route("/tps", post(routes::tps))
        .route("/ping", post(routes::ping))
        .route("/extension", post(routes::extension));

    // Admin routes are called once per server or user setup
    let mut admin_routes = Router::new()
        .route("/connect", post(routes::connect))
        .route("/users", post(routes::register_web_user));

    if config.rate_limit_enabled {
        let ingest_governor = GovernorConfigBuilder::default()
            .per_second(config.rate_limit_ingest_per_sec)
            .burst_size(config.rate_limit_ingest_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or(SetupError::RateLimit("ingest"))?;

        let general_governor = GovernorConfigBuilder::default()
            .per_second(config.rate_limit_general_per_sec)
            .burst_size(config.rate_limit_general_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or(SetupError::RateLimit("admin"))?;

        ingest_routes = ingest_routes.layer(GovernorLayer::new(ingest_governor));
        admin_routes = admin_routes.layer(GovernorLayer::new(general_governor));
    }

    Ok(Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .merge(ingest_routes)
        .merge(admin_routes)
        .fallback(dispatch::dispatch)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(RequestBodyLimitLayer::new(config.request_body_limit))
        .with_state(state))
}

/// End every active session now and store it. Called on shutdown so
/// in-progress sessions are not lost.
pub async fn flush_active_sessions(db: &Database, sessions: &SessionCache) -> playstat_db::Result<usize> {
    let now = epoch_millis();
    let mut stored = 0;
    for player in sessions.active_sessions().into_keys() {
        if let Some(session) = sessions.end_session(&player, now) {
            db.store_session(session).await?;
            stored += 1;
        }
    }
    Ok(stored)
}
