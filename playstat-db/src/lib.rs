mod cache;
mod error;
mod models;
pub mod queries;
mod transactions;

pub use cache::SessionCache;
pub use error::{DbError, Result};
pub use models::{
  ActiveSession, BaseUser, ExtensionValue, FinishedSession, GeoInfo, Nickname, PeakPlayers, Ping,
  PlayerKill, PlayerName, Server, TpsEntry, UserInfo, WebUser, WorldStint, WorldTimes,
};

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_rusqlite::Connection;
use tokio_rusqlite::rusqlite;
use tracing::info;

/// Current time as Unix milliseconds.
pub fn epoch_millis() -> i64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_millis() as i64)
    .unwrap_or_default()
}

/// A single read against the database, executed exactly once.
///
/// Query constructors live in [`queries`]; the database handle runs them on
/// its connection thread.
pub struct Query<T> {
  run: Box<dyn FnOnce(&rusqlite::Connection) -> rusqlite::Result<T> + Send>,
}

impl<T: Send + 'static> Query<T> {
  pub fn new(run: impl FnOnce(&rusqlite::Connection) -> rusqlite::Result<T> + Send + 'static) -> Self {
    Self { run: Box::new(run) }
  }

  /// Transform the result once the query has run.
  pub fn map<U: Send + 'static>(self, f: impl FnOnce(T) -> U + Send + 'static) -> Query<U> {
    Query::new(move |conn| self.execute(conn).map(f))
  }

  pub fn execute(self, conn: &rusqlite::Connection) -> rusqlite::Result<T> {
    (self.run)(conn)
  }
}

/// Database wrapper for all storage operations.
#[derive(Clone)]
pub struct Database {
  conn: Connection,
}

impl Database {
  /// Open or create a database at the given path.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = Connection::open(path).await.map_err(DbError::Sqlite)?;
    let db = Self { conn };
    db.initialize().await?;
    Ok(db)
  }

  /// Create an in-memory database (useful for testing).
  pub async fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .await
      .map_err(DbError::Sqlite)?;
    let db = Self { conn };
    db.initialize().await?;
    Ok(db)
  }

  /// Run a query on the connection thread.
  pub async fn query<T: Send + 'static>(&self, query: Query<T>) -> Result<T> {
    let value = self.conn.call(move |conn| query.execute(conn)).await?;
    Ok(value)
  }

  /// Run a query and wait for it on the calling thread.
  ///
  /// Meant for synchronous callers such as container suppliers evaluated on
  /// a blocking request thread; do not call from an async task.
  pub fn query_blocking<T: Send + 'static>(&self, query: Query<T>) -> Result<T> {
    futures::executor::block_on(self.query(query))
  }

  /// Initialize the database schema.
  async fn initialize(&self) -> Result<()> {
    self.conn
      .call(|conn| {
        // Enable WAL mode for better concurrent read/write performance
        conn.pragma_update(None, "journal_mode", "WAL")?;

        // Enable foreign key constraints (must be set per-connection)
        conn.pragma_update(None, "foreign_keys", "ON")?;

        conn.execute_batch(
          r#"
          CREATE TABLE IF NOT EXISTS servers (
              server_uuid TEXT PRIMARY KEY,
              name TEXT NOT NULL UNIQUE,
              is_proxy INTEGER NOT NULL DEFAULT 0,
              api_key_hash TEXT UNIQUE,
              registered INTEGER NOT NULL
          );

          CREATE TABLE IF NOT EXISTS users (
              uuid TEXT PRIMARY KEY,
              name TEXT NOT NULL,
              registered INTEGER NOT NULL,
              times_kicked INTEGER NOT NULL DEFAULT 0
          );

          -- Per-server player state
          CREATE TABLE IF NOT EXISTS user_info (
              uuid TEXT NOT NULL REFERENCES users(uuid) ON DELETE CASCADE,
              server_uuid TEXT NOT NULL REFERENCES servers(server_uuid) ON DELETE CASCADE,
              registered INTEGER NOT NULL,
              join_address TEXT,
              banned INTEGER NOT NULL DEFAULT 0,
              opped INTEGER NOT NULL DEFAULT 0,
              PRIMARY KEY (uuid, server_uuid)
          );

          CREATE TABLE IF NOT EXISTS geolocations (
              uuid TEXT NOT NULL REFERENCES users(uuid) ON DELETE CASCADE,
              geolocation TEXT NOT NULL,
              last_used INTEGER NOT NULL,
              PRIMARY KEY (uuid, geolocation)
          );

          CREATE TABLE IF NOT EXISTS nicknames (
              uuid TEXT NOT NULL REFERENCES users(uuid) ON DELETE CASCADE,
              server_uuid TEXT NOT NULL REFERENCES servers(server_uuid) ON DELETE CASCADE,
              nickname TEXT NOT NULL,
              last_used INTEGER NOT NULL,
              PRIMARY KEY (uuid, server_uuid, nickname)
          );

          CREATE TABLE IF NOT EXISTS ping (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              uuid TEXT NOT NULL REFERENCES users(uuid) ON DELETE CASCADE,
              server_uuid TEXT NOT NULL REFERENCES servers(server_uuid) ON DELETE CASCADE,
              date INTEGER NOT NULL,
              min_ping INTEGER NOT NULL,
              max_ping INTEGER NOT NULL,
              avg_ping REAL NOT NULL
          );

          CREATE TABLE IF NOT EXISTS sessions (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              uuid TEXT NOT NULL REFERENCES users(uuid) ON DELETE CASCADE,
              server_uuid TEXT NOT NULL REFERENCES servers(server_uuid) ON DELETE CASCADE,
              session_start INTEGER NOT NULL,
              session_end INTEGER NOT NULL,
              afk_time INTEGER NOT NULL,
              mob_kills INTEGER NOT NULL,
              deaths INTEGER NOT NULL
          );

          CREATE TABLE IF NOT EXISTS world_times (
              session_id INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
              world_name TEXT NOT NULL,
              gamemode TEXT NOT NULL,
              time INTEGER NOT NULL,
              PRIMARY KEY (session_id, world_name, gamemode)
          );

          -- Kills between players, attached to the killer's session
          CREATE TABLE IF NOT EXISTS kills (
              session_id INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
              killer_uuid TEXT NOT NULL,
              victim_uuid TEXT NOT NULL,
              server_uuid TEXT NOT NULL,
              weapon TEXT NOT NULL,
              date INTEGER NOT NULL
          );

          CREATE TABLE IF NOT EXISTS tps (
              server_uuid TEXT NOT NULL REFERENCES servers(server_uuid) ON DELETE CASCADE,
              date INTEGER NOT NULL,
              tps REAL NOT NULL,
              players_online INTEGER NOT NULL,
              cpu_usage REAL NOT NULL,
              ram_usage INTEGER NOT NULL,
              entities INTEGER NOT NULL,
              chunks_loaded INTEGER NOT NULL
          );

          CREATE TABLE IF NOT EXISTS extension_data (
              server_uuid TEXT NOT NULL REFERENCES servers(server_uuid) ON DELETE CASCADE,
              provider TEXT NOT NULL,
              name TEXT NOT NULL,
              value TEXT NOT NULL,
              PRIMARY KEY (server_uuid, provider, name)
          );

          CREATE TABLE IF NOT EXISTS web_users (
              username TEXT PRIMARY KEY,
              token_hash TEXT NOT NULL UNIQUE,
              linked_uuid TEXT,
              permissions TEXT NOT NULL
          );

          CREATE INDEX IF NOT EXISTS idx_users_name ON users(name);
          CREATE INDEX IF NOT EXISTS idx_sessions_uuid ON sessions(uuid);
          CREATE INDEX IF NOT EXISTS idx_sessions_server ON sessions(server_uuid);
          CREATE INDEX IF NOT EXISTS idx_kills_victim ON kills(victim_uuid);
          CREATE INDEX IF NOT EXISTS idx_tps_server_date ON tps(server_uuid, date);
          "#,
        )?;
        Ok(())
      })
      .await?;

    info!("database initialized");
    Ok(())
  }
}
