use std::env::var;
use std::path::PathBuf;
use std::time::Duration;

use dotenvy::dotenv;

/// Application configuration with environment variable overrides
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    /// Env: PORT (default: 8804)
    pub port: u16,

    /// Database file path
    /// Env: DATABASE_PATH (default: "playstat.db")
    pub database_path: String,

    /// Request body size limit in bytes
    /// Env: REQUEST_BODY_LIMIT (default: 1048576 = 1MB)
    pub request_body_limit: usize,

    /// Request timeout in seconds
    /// Env: REQUEST_TIMEOUT_SECS (default: 30)
    pub request_timeout: Duration,

    /// Directory static files are served from
    /// Env: WEB_DIRECTORY (default: "web")
    pub web_directory: PathBuf,

    /// How long a static file stays cached in memory
    /// Env: RESOURCE_CACHE_SECS (default: 60)
    pub resource_cache_ttl: Duration,

    /// Weekly playtime that counts as fully active for the activity index
    /// Env: ACTIVE_PLAYTIME_THRESHOLD_MINS (default: 30)
    pub active_playtime_threshold: Duration,

    /// Require a web user token for the analytics pages
    /// Env: AUTH_REQUIRED (default: true)
    pub auth_required: bool,

    /// Bearer token for /connect and /users. Admin routes refuse every
    /// request while unset.
    /// Env: ADMIN_TOKEN (optional)
    pub admin_token: Option<String>,

    /// Env: RATE_LIMIT_ENABLED (default: true)
    pub rate_limit_enabled: bool,

    /// Rate limit for ingest endpoints like /join, /leave, /kill (requests per second)
    /// Env: RATE_LIMIT_INGEST_PER_SEC (default: 50)
    /// This is lenient to handle many players joining/leaving at once
    pub rate_limit_ingest_per_sec: u64,

    /// Burst size for ingest endpoints
    /// Env: RATE_LIMIT_INGEST_BURST (default: 100)
    pub rate_limit_ingest_burst: u32,

    /// Rate limit for admin endpoints (requests per second)
    /// Env: RATE_LIMIT_GENERAL_PER_SEC (default: 10)
    pub rate_limit_general_per_sec: u64,

    /// Burst size for admin endpoints
    /// Env: RATE_LIMIT_GENERAL_BURST (default: 20)
    pub rate_limit_general_burst: u32,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let _ = dotenv(); //for debugging mostly
        let defaults = Self::default();
        Self {
            port: env_or_default("PORT", defaults.port),
            database_path: env_or_default_string("DATABASE_PATH", &defaults.database_path),
            request_body_limit: env_or_default("REQUEST_BODY_LIMIT", defaults.request_body_limit),
            request_timeout: Duration::from_secs(env_or_default("REQUEST_TIMEOUT_SECS", 30)),
            web_directory: PathBuf::from(env_or_default_string("WEB_DIRECTORY", "web")),
            resource_cache_ttl: Duration::from_secs(env_or_default("RESOURCE_CACHE_SECS", 60)),
            active_playtime_threshold: Duration::from_secs(
                60 * env_or_default("ACTIVE_PLAYTIME_THRESHOLD_MINS", 30),
            ),
            auth_required: env_or_default("AUTH_REQUIRED", defaults.auth_required),
            admin_token: var("ADMIN_TOKEN").ok().filter(|token| !token.is_empty()),
            rate_limit_enabled: env_or_default("RATE_LIMIT_ENABLED", defaults.rate_limit_enabled),
            rate_limit_ingest_per_sec: env_or_default("RATE_LIMIT_INGEST_PER_SEC", defaults.rate_limit_ingest_per_sec),
            rate_limit_ingest_burst: env_or_default("RATE_LIMIT_INGEST_BURST", defaults.rate_limit_ingest_burst),
            rate_limit_general_per_sec: env_or_default(
                "RATE_LIMIT_GENERAL_PER_SEC",
                defaults.rate_limit_general_per_sec,
            ),
            rate_limit_general_burst: env_or_default("RATE_LIMIT_GENERAL_BURST", defaults.rate_limit_general_burst),
        }
    }
}

impl Default for Config {
    /// Create configuration with all default values
    fn default() -> Self {
        Self {
            port: 8804,
            database_path: "playstat.db".to_string(),
            request_body_limit: 1024 * 1024, // 1 MB
            request_timeout: Duration::from_secs(30),
            web_directory: PathBuf::from("web"),
            resource_cache_ttl: Duration::from_secs(60),
            active_playtime_threshold: Duration::from_secs(30 * 60),
            auth_required: true,
            admin_token: None,
            rate_limit_enabled: true,
            rate_limit_ingest_per_sec: 50,
            rate_limit_ingest_burst: 100,
            rate_limit_general_per_sec: 10,
            rate_limit_general_burst: 20,
        }
    }
}

/// Parse environment variable or return default value
fn env_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    var(key)
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(default)
}

/// Parse environment variable string or return default value
fn env_or_default_string(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|_| default.to_string())
}
