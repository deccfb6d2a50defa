use std::collections::HashMap;

use tokio_rusqlite::rusqlite::{self, Row, params};
use uuid::Uuid;

use super::{group_rows, uuid_at};
use crate::{Ping, Query};

fn ping(row: &Row<'_>, offset: usize) -> rusqlite::Result<Ping> {
  Ok(Ping {
    server_uuid: uuid_at(row, offset)?,
    date: row.get(offset + 1)?,
    min: row.get(offset + 2)?,
    max: row.get(offset + 3)?,
    avg: row.get(offset + 4)?,
  })
}

pub fn fetch_ping_data_of_player(uuid: Uuid) -> Query<Vec<Ping>> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(
      "SELECT server_uuid, date, min_ping, max_ping, avg_ping FROM ping WHERE uuid = ?1 ORDER BY date",
    )?;
    let pings = stmt
      .query_map(params![uuid.to_string()], |row| ping(row, 0))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(pings)
  })
}

/// Ping samples taken on a server, keyed by player UUID.
pub fn fetch_ping_data_of_server(server_uuid: Uuid) -> Query<HashMap<Uuid, Vec<Ping>>> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(
      r#"
      SELECT uuid, server_uuid, date, min_ping, max_ping, avg_ping
      FROM ping
      WHERE server_uuid = ?1
      ORDER BY date
      "#,
    )?;
    let rows = stmt.query_map(params![server_uuid.to_string()], |row| {
      Ok((uuid_at(row, 0)?, ping(row, 1)?))
    })?;
    group_rows(rows)
  })
}
