use std::collections::HashMap;

use tokio_rusqlite::rusqlite::{OptionalExtension, Row, params};
use tokio_rusqlite::rusqlite;
use uuid::Uuid;

use super::{player_name_at, uuid_at};
use crate::{BaseUser, Query, UserInfo};

fn base_user(row: &Row<'_>) -> rusqlite::Result<BaseUser> {
  Ok(BaseUser {
    uuid: uuid_at(row, 0)?,
    name: player_name_at(row, 1)?,
    registered: row.get(2)?,
    times_kicked: row.get(3)?,
  })
}

fn user_info(row: &Row<'_>) -> rusqlite::Result<UserInfo> {
  Ok(UserInfo {
    player_uuid: uuid_at(row, 0)?,
    server_uuid: uuid_at(row, 1)?,
    registered: row.get(2)?,
    join_address: row.get(3)?,
    banned: row.get(4)?,
    operator: row.get(5)?,
  })
}

pub fn fetch_base_user_of_player(uuid: Uuid) -> Query<Option<BaseUser>> {
  Query::new(move |conn| {
    conn
      .prepare_cached("SELECT uuid, name, registered, times_kicked FROM users WHERE uuid = ?1")?
      .query_row(params![uuid.to_string()], base_user)
      .optional()
  })
}

/// Every player that has joined the given server.
pub fn fetch_server_base_users(server_uuid: Uuid) -> Query<Vec<BaseUser>> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(
      r#"
      SELECT u.uuid, u.name, u.registered, u.times_kicked
      FROM users u
      JOIN user_info ui ON ui.uuid = u.uuid
      WHERE ui.server_uuid = ?1
      ORDER BY u.name
      "#,
    )?;
    let users = stmt
      .query_map(params![server_uuid.to_string()], base_user)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(users)
  })
}

/// Resolve a player name (case-insensitive) to a UUID.
pub fn fetch_player_uuid(name: String) -> Query<Option<Uuid>> {
  Query::new(move |conn| {
    conn
      .prepare_cached("SELECT uuid FROM users WHERE name = ?1 COLLATE NOCASE LIMIT 1")?
      .query_row(params![&name], |row| uuid_at(row, 0))
      .optional()
  })
}

pub fn fetch_user_information_of_player(uuid: Uuid) -> Query<Vec<UserInfo>> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(
      "SELECT uuid, server_uuid, registered, join_address, banned, opped FROM user_info WHERE uuid = ?1",
    )?;
    let info = stmt
      .query_map(params![uuid.to_string()], user_info)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(info)
  })
}

/// User info of every player on a server, keyed by player UUID.
pub fn fetch_user_information_of_server(server_uuid: Uuid) -> Query<HashMap<Uuid, UserInfo>> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(
      "SELECT uuid, server_uuid, registered, join_address, banned, opped FROM user_info WHERE server_uuid = ?1",
    )?;
    let info = stmt
      .query_map(params![server_uuid.to_string()], |row| {
        let info = user_info(row)?;
        Ok((info.player_uuid, info))
      })?
      .collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(info)
  })
}
