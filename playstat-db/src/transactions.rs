//! Write operations. Each method runs in its own transaction on the
//! connection thread.

use tokio_rusqlite::rusqlite::{OptionalExtension, params};
use tracing::debug;
use uuid::Uuid;

use crate::queries::uuid_at;
use crate::{
  Database, DbError, ExtensionValue, FinishedSession, GeoInfo, Nickname, Ping, Result, Server,
  TpsEntry, WebUser,
};

impl Database {
  // ========================================================================
  // Servers
  // ========================================================================

  /// Register a new server.
  /// Returns an error if a server with that name already exists.
  pub async fn register_server(
    &self,
    uuid: Uuid,
    name: String,
    is_proxy: bool,
    api_key_hash: String,
    now: i64,
  ) -> Result<Server> {
    let server = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists: bool = tx
          .prepare_cached("SELECT EXISTS(SELECT 1 FROM servers WHERE name = ?1)")?
          .query_row(params![&name], |row| row.get(0))?;

        if exists {
          return Ok(Err(DbError::ServerNameConflict));
        }

        tx.prepare_cached(
          "INSERT INTO servers (server_uuid, name, is_proxy, api_key_hash, registered) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?
        .execute(params![uuid.to_string(), &name, is_proxy, &api_key_hash, now])?;

        tx.commit()?;
        Ok(Ok(Server {
          uuid,
          name,
          is_proxy,
          registered: now,
        }))
      })
      .await??;

    debug!(%server.uuid, %server.name, "registered server");
    Ok(server)
  }

  /// Get a server by API key hash.
  pub async fn get_server_by_api_key(&self, api_key_hash: String) -> Result<Option<Server>> {
    let server = self
      .conn
      .call(move |conn| {
        conn
          .prepare_cached(
            "SELECT server_uuid, name, is_proxy, registered FROM servers WHERE api_key_hash = ?1",
          )?
          .query_row(params![&api_key_hash], |row| {
            Ok(Server {
              uuid: uuid_at(row, 0)?,
              name: row.get(1)?,
              is_proxy: row.get(2)?,
              registered: row.get(3)?,
            })
          })
          .optional()
      })
      .await?;

    Ok(server)
  }

  // ========================================================================
  // Users
  // ========================================================================

  /// Record a player, keeping the original registration date on conflict.
  pub async fn register_user(&self, uuid: Uuid, name: String, registered: i64) -> Result<()> {
    let name_log = name.clone();

    self
      .conn
      .call(move |conn| {
        conn
          .prepare_cached(
            r#"
            INSERT INTO users (uuid, name, registered) VALUES (?1, ?2, ?3)
            ON CONFLICT(uuid) DO UPDATE SET name = excluded.name
            "#,
          )?
          .execute(params![uuid.to_string(), &name, registered])?;
        Ok(())
      })
      .await?;

    debug!(name = %name_log, "registered user");
    Ok(())
  }

  /// Record a player's first join on a server. The join address is
  /// refreshed on every call that provides one.
  pub async fn register_user_on_server(
    &self,
    uuid: Uuid,
    server_uuid: Uuid,
    registered: i64,
    join_address: Option<String>,
  ) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.prepare_cached(
          "INSERT OR IGNORE INTO user_info (uuid, server_uuid, registered, join_address) VALUES (?1, ?2, ?3, ?4)",
        )?
        .execute(params![
          uuid.to_string(),
          server_uuid.to_string(),
          registered,
          &join_address
        ])?;

        if join_address.is_some() {
          tx.prepare_cached(
            "UPDATE user_info SET join_address = ?3 WHERE uuid = ?1 AND server_uuid = ?2",
          )?
          .execute(params![uuid.to_string(), server_uuid.to_string(), &join_address])?;
        }

        tx.commit()?;
        Ok(())
      })
      .await?;

    debug!(%uuid, %server_uuid, "registered user on server");
    Ok(())
  }

  pub async fn set_banned(&self, uuid: Uuid, server_uuid: Uuid, banned: bool) -> Result<()> {
    self
      .update_user_info_flag("UPDATE user_info SET banned = ?3 WHERE uuid = ?1 AND server_uuid = ?2", uuid, server_uuid, banned)
      .await?;
    debug!(%uuid, banned, "updated ban status");
    Ok(())
  }

  pub async fn set_operator(&self, uuid: Uuid, server_uuid: Uuid, operator: bool) -> Result<()> {
    self
      .update_user_info_flag("UPDATE user_info SET opped = ?3 WHERE uuid = ?1 AND server_uuid = ?2", uuid, server_uuid, operator)
      .await?;
    debug!(%uuid, operator, "updated operator status");
    Ok(())
  }

  async fn update_user_info_flag(
    &self,
    sql: &'static str,
    uuid: Uuid,
    server_uuid: Uuid,
    value: bool,
  ) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let updated = conn
          .prepare_cached(sql)?
          .execute(params![uuid.to_string(), server_uuid.to_string(), value])?;

        if updated == 0 {
          return Ok(Err(DbError::UserNotFound));
        }
        Ok(Ok(()))
      })
      .await?
  }

  pub async fn increment_kick_count(&self, uuid: Uuid) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let updated = conn
          .prepare_cached("UPDATE users SET times_kicked = times_kicked + 1 WHERE uuid = ?1")?
          .execute(params![uuid.to_string()])?;

        if updated == 0 {
          return Ok(Err(DbError::UserNotFound));
        }
        Ok(Ok(()))
      })
      .await??;

    debug!(%uuid, "incremented kick count");
    Ok(())
  }

  pub async fn store_geo_info(&self, uuid: Uuid, geo_info: GeoInfo) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn
          .prepare_cached(
            r#"
            INSERT INTO geolocations (uuid, geolocation, last_used) VALUES (?1, ?2, ?3)
            ON CONFLICT(uuid, geolocation) DO UPDATE SET last_used = excluded.last_used
            "#,
          )?
          .execute(params![uuid.to_string(), &geo_info.geolocation, geo_info.date])?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  pub async fn store_nickname(&self, uuid: Uuid, nickname: Nickname) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn
          .prepare_cached(
            r#"
            INSERT INTO nicknames (uuid, server_uuid, nickname, last_used) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(uuid, server_uuid, nickname) DO UPDATE SET last_used = excluded.last_used
            "#,
          )?
          .execute(params![
            uuid.to_string(),
            nickname.server_uuid.to_string(),
            &nickname.name,
            nickname.date
          ])?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  pub async fn store_ping(&self, uuid: Uuid, ping: Ping) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn
          .prepare_cached(
            "INSERT INTO ping (uuid, server_uuid, date, min_ping, max_ping, avg_ping) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          )?
          .execute(params![
            uuid.to_string(),
            ping.server_uuid.to_string(),
            ping.date,
            ping.min,
            ping.max,
            ping.avg
          ])?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  // ========================================================================
  // Sessions
  // ========================================================================

  /// Store a finished session together with its world times and kills.
  /// Returns the new session id.
  pub async fn store_session(&self, session: FinishedSession) -> Result<i64> {
    let player_uuid = session.player_uuid;

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.prepare_cached(
          r#"
          INSERT INTO sessions (uuid, server_uuid, session_start, session_end, afk_time, mob_kills, deaths)
          VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
          "#,
        )?
        .execute(params![
          session.player_uuid.to_string(),
          session.server_uuid.to_string(),
          session.start,
          session.end,
          session.afk_time,
          session.mob_kills,
          session.deaths
        ])?;
        let id = tx.last_insert_rowid();

        {
          let mut world_stmt = tx.prepare_cached(
            "INSERT INTO world_times (session_id, world_name, gamemode, time) VALUES (?1, ?2, ?3, ?4)",
          )?;
          for (world, gamemodes) in &session.world_times.times {
            for (gamemode, time) in gamemodes {
              world_stmt.execute(params![id, world, gamemode, time])?;
            }
          }

          let mut kill_stmt = tx.prepare_cached(
            r#"
            INSERT INTO kills (session_id, killer_uuid, victim_uuid, server_uuid, weapon, date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
          )?;
          for kill in &session.player_kills {
            kill_stmt.execute(params![
              id,
              kill.killer.to_string(),
              kill.victim.to_string(),
              kill.server_uuid.to_string(),
              &kill.weapon,
              kill.date
            ])?;
          }
        }

        tx.commit()?;
        Ok(id)
      })
      .await?;

    debug!(%player_uuid, id, "stored session");
    Ok(id)
  }

  // ========================================================================
  // Server data
  // ========================================================================

  pub async fn store_tps(&self, server_uuid: Uuid, entry: TpsEntry) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn
          .prepare_cached(
            r#"
            INSERT INTO tps (server_uuid, date, tps, players_online, cpu_usage, ram_usage, entities, chunks_loaded)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
          )?
          .execute(params![
            server_uuid.to_string(),
            entry.date,
            entry.tps,
            entry.players_online,
            entry.cpu_usage,
            entry.ram_usage,
            entry.entities,
            entry.chunks_loaded
          ])?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  pub async fn store_extension_value(&self, server_uuid: Uuid, value: ExtensionValue) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn
          .prepare_cached(
            r#"
            INSERT INTO extension_data (server_uuid, provider, name, value) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(server_uuid, provider, name) DO UPDATE SET value = excluded.value
            "#,
          )?
          .execute(params![
            server_uuid.to_string(),
            &value.provider,
            &value.name,
            &value.value
          ])?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  // ========================================================================
  // Web users
  // ========================================================================

  pub async fn register_web_user(&self, user: WebUser, token_hash: String) -> Result<()> {
    let username_log = user.username.clone();

    self
      .conn
      .call(move |conn| {
        conn
          .prepare_cached(
            r#"
            INSERT INTO web_users (username, token_hash, linked_uuid, permissions) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(username) DO UPDATE SET
                token_hash = excluded.token_hash,
                linked_uuid = excluded.linked_uuid,
                permissions = excluded.permissions
            "#,
          )?
          .execute(params![
            &user.username,
            &token_hash,
            user.linked_uuid.map(|u| u.to_string()),
            user.permissions.join(",")
          ])?;
        Ok(())
      })
      .await?;

    debug!(username = %username_log, "registered web user");
    Ok(())
  }

  /// Get a web user by the hash of their access token.
  pub async fn get_web_user_by_token(&self, token_hash: String) -> Result<Option<WebUser>> {
    let user = self
      .conn
      .call(move |conn| {
        conn
          .prepare_cached(
            "SELECT username, linked_uuid, permissions FROM web_users WHERE token_hash = ?1",
          )?
          .query_row(params![&token_hash], |row| {
            let linked: Option<String> = row.get(1)?;
            let permissions: String = row.get(2)?;
            Ok(WebUser {
              username: row.get(0)?,
              linked_uuid: linked.and_then(|l| Uuid::parse_str(&l).ok()),
              permissions: permissions
                .split(',')
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            })
          })
          .optional()
      })
      .await?;

    Ok(user)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::queries::{servers, sessions, users};

  fn now() -> i64 {
    1_700_000_000_000 // Fixed timestamp for testing
  }

  #[tokio::test]
  async fn test_server_registration_conflict() {
    let db = Database::open_in_memory().await.unwrap();

    db.register_server(Uuid::new_v4(), "Survival".to_string(), false, "hash1".to_string(), now())
      .await
      .unwrap();

    let result = db
      .register_server(Uuid::new_v4(), "Survival".to_string(), false, "hash2".to_string(), now())
      .await;
    assert!(matches!(result, Err(DbError::ServerNameConflict)));

    let server = db
      .get_server_by_api_key("hash1".to_string())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(server.name, "Survival");
    assert!(db.get_server_by_api_key("nope".to_string()).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_register_user_keeps_first_registration() {
    let db = Database::open_in_memory().await.unwrap();
    let uuid = Uuid::new_v4();

    db.register_user(uuid, "Steve".to_string(), now()).await.unwrap();
    db.register_user(uuid, "Steve2".to_string(), now() + 5000).await.unwrap();

    let user = db
      .query(users::fetch_base_user_of_player(uuid))
      .await
      .unwrap()
      .unwrap();
    assert_eq!(user.name.as_str(), "Steve2");
    assert_eq!(user.registered, now());
  }

  #[tokio::test]
  async fn test_flags_require_user_info() {
    let db = Database::open_in_memory().await.unwrap();
    let uuid = Uuid::new_v4();
    let server = Uuid::new_v4();
    db.register_server(server, "Survival".to_string(), false, "hash".to_string(), now())
      .await
      .unwrap();

    let result = db.set_banned(uuid, server, true).await;
    assert!(matches!(result, Err(DbError::UserNotFound)));

    db.register_user(uuid, "Steve".to_string(), now()).await.unwrap();
    db.register_user_on_server(uuid, server, now(), Some("play.example.com".to_string()))
      .await
      .unwrap();
    db.set_banned(uuid, server, true).await.unwrap();
    db.set_operator(uuid, server, true).await.unwrap();

    let info = db
      .query(users::fetch_user_information_of_player(uuid))
      .await
      .unwrap();
    assert_eq!(info.len(), 1);
    assert!(info[0].banned);
    assert!(info[0].operator);
    assert_eq!(info[0].join_address.as_deref(), Some("play.example.com"));
  }

  #[tokio::test]
  async fn test_store_session_with_details() {
    let db = Database::open_in_memory().await.unwrap();
    let uuid = Uuid::new_v4();
    let victim = Uuid::new_v4();
    let server = Uuid::new_v4();
    db.register_server(server, "Survival".to_string(), false, "hash".to_string(), now())
      .await
      .unwrap();
    db.register_user(uuid, "Steve".to_string(), now()).await.unwrap();

    let mut world_times = crate::WorldTimes::new();
    world_times.add_time("world", "SURVIVAL", 60_000);
    let id = db
      .store_session(FinishedSession {
        id: None,
        player_uuid: uuid,
        server_uuid: server,
        start: now(),
        end: now() + 60_000,
        afk_time: 1_000,
        mob_kills: 3,
        deaths: 1,
        world_times,
        player_kills: vec![crate::PlayerKill {
          killer: uuid,
          victim,
          server_uuid: server,
          weapon: "Bow".to_string(),
          date: now() + 100,
        }],
      })
      .await
      .unwrap();

    let by_server = db
      .query(sessions::fetch_sessions_of_player(uuid))
      .await
      .unwrap();
    let stored = &by_server[&server][0];
    assert_eq!(stored.id, Some(id));
    assert_eq!(stored.world_times.total(), 60_000);
    assert_eq!(stored.player_kills.len(), 1);
    assert_eq!(stored.player_kills[0].victim, victim);
  }

  #[tokio::test]
  async fn test_web_user_lookup() {
    let db = Database::open_in_memory().await.unwrap();
    let linked = Uuid::new_v4();

    db.register_web_user(
      WebUser {
        username: "admin".to_string(),
        linked_uuid: Some(linked),
        permissions: vec!["page.server".to_string(), "page.player.self".to_string()],
      },
      "tokenhash".to_string(),
    )
    .await
    .unwrap();

    let user = db
      .get_web_user_by_token("tokenhash".to_string())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(user.linked_uuid, Some(linked));
    assert!(user.has_permission("page.server"));
    assert!(!user.has_permission("page.player.other"));
    assert!(db.get_web_user_by_token("other".to_string()).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_server_matching_identifier() {
    let db = Database::open_in_memory().await.unwrap();
    let uuid = Uuid::new_v4();
    db.register_server(uuid, "Lobby".to_string(), true, "hash".to_string(), now())
      .await
      .unwrap();

    let by_name = db
      .query(servers::fetch_server_matching_identifier("Lobby".to_string()))
      .await
      .unwrap();
    let by_uuid = db
      .query(servers::fetch_server_matching_identifier(uuid.to_string()))
      .await
      .unwrap();
    assert_eq!(by_name.as_ref().map(|s| s.uuid), Some(uuid));
    assert_eq!(by_name, by_uuid);
    assert!(by_name.unwrap().is_proxy);
  }
}
