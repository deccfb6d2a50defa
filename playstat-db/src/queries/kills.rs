use std::collections::HashMap;

use tokio_rusqlite::rusqlite::{self, Row, params};
use uuid::Uuid;

use super::uuid_at;
use crate::{PlayerKill, Query};

fn player_kill(row: &Row<'_>) -> rusqlite::Result<PlayerKill> {
  Ok(PlayerKill {
    killer: uuid_at(row, 0)?,
    victim: uuid_at(row, 1)?,
    server_uuid: uuid_at(row, 2)?,
    weapon: row.get(3)?,
    date: row.get(4)?,
  })
}

/// Number of players killed by the player, per server.
pub fn player_kill_counts_per_server(uuid: Uuid) -> Query<HashMap<Uuid, i64>> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(
      "SELECT server_uuid, COUNT(*) FROM kills WHERE killer_uuid = ?1 GROUP BY server_uuid",
    )?;
    let counts = stmt
      .query_map(params![uuid.to_string()], |row| {
        Ok((uuid_at(row, 0)?, row.get::<_, i64>(1)?))
      })?
      .collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(counts)
  })
}

/// Kills where the player was the victim, newest first.
pub fn fetch_deaths_of_player(uuid: Uuid) -> Query<Vec<PlayerKill>> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(
      r#"
      SELECT killer_uuid, victim_uuid, server_uuid, weapon, date
      FROM kills
      WHERE victim_uuid = ?1
      ORDER BY date DESC
      "#,
    )?;
    let deaths = stmt
      .query_map(params![uuid.to_string()], player_kill)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(deaths)
  })
}

/// Most recent kills on a server.
pub fn fetch_player_kills_on_server(server_uuid: Uuid, limit: u32) -> Query<Vec<PlayerKill>> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(
      r#"
      SELECT killer_uuid, victim_uuid, server_uuid, weapon, date
      FROM kills
      WHERE server_uuid = ?1
      ORDER BY date DESC
      LIMIT ?2
      "#,
    )?;
    let kills = stmt
      .query_map(params![server_uuid.to_string(), limit], player_kill)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(kills)
  })
}
