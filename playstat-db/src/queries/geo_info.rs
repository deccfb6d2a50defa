use std::collections::HashMap;

use tokio_rusqlite::rusqlite::{self, params};
use uuid::Uuid;

use super::{group_rows, uuid_at};
use crate::{GeoInfo, Query};

/// Geolocations of a player, most recent first.
pub fn fetch_player_geo_information(uuid: Uuid) -> Query<Vec<GeoInfo>> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(
      "SELECT geolocation, last_used FROM geolocations WHERE uuid = ?1 ORDER BY last_used DESC",
    )?;
    let geo = stmt
      .query_map(params![uuid.to_string()], |row| {
        Ok(GeoInfo {
          geolocation: row.get(0)?,
          date: row.get(1)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(geo)
  })
}

/// Geolocations of every player that has joined the server.
pub fn fetch_server_geo_information(server_uuid: Uuid) -> Query<HashMap<Uuid, Vec<GeoInfo>>> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(
      r#"
      SELECT g.uuid, g.geolocation, g.last_used
      FROM geolocations g
      JOIN user_info ui ON ui.uuid = g.uuid
      WHERE ui.server_uuid = ?1
      ORDER BY g.last_used DESC
      "#,
    )?;
    let rows = stmt.query_map(params![server_uuid.to_string()], |row| {
      Ok((
        uuid_at(row, 0)?,
        GeoInfo {
          geolocation: row.get(1)?,
          date: row.get(2)?,
        },
      ))
    })?;
    group_rows(rows)
  })
}
