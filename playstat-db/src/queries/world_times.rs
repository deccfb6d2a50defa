use std::collections::HashMap;

use tokio_rusqlite::rusqlite::params;
use uuid::Uuid;

use super::uuid_at;
use crate::{Query, WorldTimes};

/// World times of a player summed per server.
pub fn fetch_player_world_times_on_servers(uuid: Uuid) -> Query<HashMap<Uuid, WorldTimes>> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(
      r#"
      SELECT s.server_uuid, wt.world_name, wt.gamemode, SUM(wt.time)
      FROM world_times wt
      JOIN sessions s ON s.id = wt.session_id
      WHERE s.uuid = ?1
      GROUP BY s.server_uuid, wt.world_name, wt.gamemode
      "#,
    )?;
    let mut rows = stmt.query(params![uuid.to_string()])?;
    let mut by_server: HashMap<Uuid, WorldTimes> = HashMap::new();
    while let Some(row) = rows.next()? {
      let world: String = row.get(1)?;
      let gamemode: String = row.get(2)?;
      let time: i64 = row.get(3)?;
      by_server
        .entry(uuid_at(row, 0)?)
        .or_default()
        .add_time(&world, &gamemode, time);
    }
    Ok(by_server)
  })
}

/// World times of every player on a server, summed.
pub fn fetch_server_total_world_times(server_uuid: Uuid) -> Query<WorldTimes> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(
      r#"
      SELECT wt.world_name, wt.gamemode, SUM(wt.time)
      FROM world_times wt
      JOIN sessions s ON s.id = wt.session_id
      WHERE s.server_uuid = ?1
      GROUP BY wt.world_name, wt.gamemode
      "#,
    )?;
    let mut rows = stmt.query(params![server_uuid.to_string()])?;
    let mut times = WorldTimes::new();
    while let Some(row) = rows.next()? {
      let world: String = row.get(0)?;
      let gamemode: String = row.get(1)?;
      times.add_time(&world, &gamemode, row.get(2)?);
    }
    Ok(times)
  })
}
