use tokio_rusqlite::rusqlite::{self, OptionalExtension, params};
use uuid::Uuid;

use crate::{PeakPlayers, Query, TpsEntry};

/// TPS samples of a server taken after `after`, oldest first.
pub fn fetch_tps_data_of_server(server_uuid: Uuid, after: i64) -> Query<Vec<TpsEntry>> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(
      r#"
      SELECT date, tps, players_online, cpu_usage, ram_usage, entities, chunks_loaded
      FROM tps
      WHERE server_uuid = ?1 AND date > ?2
      ORDER BY date
      "#,
    )?;
    let entries = stmt
      .query_map(params![server_uuid.to_string(), after], |row| {
        Ok(TpsEntry {
          date: row.get(0)?,
          tps: row.get(1)?,
          players_online: row.get(2)?,
          cpu_usage: row.get(3)?,
          ram_usage: row.get(4)?,
          entities: row.get(5)?,
          chunks_loaded: row.get(6)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
  })
}

/// Highest player count recorded after `after`. Earliest sample wins ties.
pub fn fetch_peak_player_count(server_uuid: Uuid, after: i64) -> Query<Option<PeakPlayers>> {
  Query::new(move |conn| {
    conn
      .prepare_cached(
        r#"
        SELECT date, players_online
        FROM tps
        WHERE server_uuid = ?1 AND date > ?2
        ORDER BY players_online DESC, date ASC
        LIMIT 1
        "#,
      )?
      .query_row(params![server_uuid.to_string(), after], |row| {
        Ok(PeakPlayers {
          date: row.get(0)?,
          players: row.get(1)?,
        })
      })
      .optional()
  })
}

pub fn fetch_all_time_peak_player_count(server_uuid: Uuid) -> Query<Option<PeakPlayers>> {
  fetch_peak_player_count(server_uuid, i64::MIN)
}
