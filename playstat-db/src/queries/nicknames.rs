use std::collections::HashMap;

use tokio_rusqlite::rusqlite::{self, params};
use uuid::Uuid;

use super::{group_rows, uuid_at};
use crate::{Nickname, Query};

pub fn fetch_nickname_data_of_player(uuid: Uuid) -> Query<Vec<Nickname>> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(
      "SELECT nickname, last_used, server_uuid FROM nicknames WHERE uuid = ?1 ORDER BY last_used DESC",
    )?;
    let nicknames = stmt
      .query_map(params![uuid.to_string()], |row| {
        Ok(Nickname {
          name: row.get(0)?,
          date: row.get(1)?,
          server_uuid: uuid_at(row, 2)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(nicknames)
  })
}

/// Nicknames used on a server, keyed by player UUID.
pub fn fetch_nickname_data_of_server(server_uuid: Uuid) -> Query<HashMap<Uuid, Vec<Nickname>>> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(
      r#"
      SELECT uuid, nickname, last_used, server_uuid
      FROM nicknames
      WHERE server_uuid = ?1
      ORDER BY last_used DESC
      "#,
    )?;
    let rows = stmt.query_map(params![server_uuid.to_string()], |row| {
      Ok((
        uuid_at(row, 0)?,
        Nickname {
          name: row.get(1)?,
          date: row.get(2)?,
          server_uuid: uuid_at(row, 3)?,
        },
      ))
    })?;
    group_rows(rows)
  })
}
