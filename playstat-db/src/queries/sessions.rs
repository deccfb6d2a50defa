use std::collections::HashMap;

use tokio_rusqlite::rusqlite::{self, Connection, params};
use uuid::Uuid;

use super::{group_rows, uuid_at};
use crate::{FinishedSession, PlayerKill, Query, WorldTimes};

/// Which sessions to load: those of one player or those on one server.
#[derive(Clone, Copy)]
enum SessionFilter {
  Player,
  Server,
}

impl SessionFilter {
  fn column(self) -> &'static str {
    match self {
      SessionFilter::Player => "s.uuid",
      SessionFilter::Server => "s.server_uuid",
    }
  }
}

/// Load sessions with their world times and kills in three statements.
fn load_sessions(
  conn: &Connection,
  filter: SessionFilter,
  id: Uuid,
) -> rusqlite::Result<Vec<FinishedSession>> {
  let column = filter.column();
  let id = id.to_string();

  let mut world_times: HashMap<i64, WorldTimes> = HashMap::new();
  {
    let mut stmt = conn.prepare_cached(&format!(
      r#"
      SELECT wt.session_id, wt.world_name, wt.gamemode, wt.time
      FROM world_times wt
      JOIN sessions s ON s.id = wt.session_id
      WHERE {column} = ?1
      "#
    ))?;
    let mut rows = stmt.query(params![&id])?;
    while let Some(row) = rows.next()? {
      let session_id: i64 = row.get(0)?;
      let world: String = row.get(1)?;
      let gamemode: String = row.get(2)?;
      let time: i64 = row.get(3)?;
      world_times
        .entry(session_id)
        .or_default()
        .add_time(&world, &gamemode, time);
    }
  }

  let mut kills = {
    let mut stmt = conn.prepare_cached(&format!(
      r#"
      SELECT k.session_id, k.killer_uuid, k.victim_uuid, k.server_uuid, k.weapon, k.date
      FROM kills k
      JOIN sessions s ON s.id = k.session_id
      WHERE {column} = ?1
      ORDER BY k.date
      "#
    ))?;
    let rows = stmt.query_map(params![&id], |row| {
      Ok((
        row.get::<_, i64>(0)?,
        PlayerKill {
          killer: uuid_at(row, 1)?,
          victim: uuid_at(row, 2)?,
          server_uuid: uuid_at(row, 3)?,
          weapon: row.get(4)?,
          date: row.get(5)?,
        },
      ))
    })?;
    group_rows(rows)?
  };

  let mut stmt = conn.prepare_cached(&format!(
    r#"
    SELECT s.id, s.uuid, s.server_uuid, s.session_start, s.session_end, s.afk_time, s.mob_kills, s.deaths
    FROM sessions s
    WHERE {column} = ?1
    ORDER BY s.session_start
    "#
  ))?;
  let sessions = stmt
    .query_map(params![&id], |row| {
      let session_id: i64 = row.get(0)?;
      Ok(FinishedSession {
        id: Some(session_id),
        player_uuid: uuid_at(row, 1)?,
        server_uuid: uuid_at(row, 2)?,
        start: row.get(3)?,
        end: row.get(4)?,
        afk_time: row.get(5)?,
        mob_kills: row.get(6)?,
        deaths: row.get(7)?,
        world_times: WorldTimes::new(),
        player_kills: Vec::new(),
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(
    sessions
      .into_iter()
      .map(|mut session| {
        if let Some(id) = session.id {
          session.world_times = world_times.remove(&id).unwrap_or_default();
          session.player_kills = kills.remove(&id).unwrap_or_default();
        }
        session
      })
      .collect(),
  )
}

/// Sessions of a player, grouped by server.
pub fn fetch_sessions_of_player(uuid: Uuid) -> Query<HashMap<Uuid, Vec<FinishedSession>>> {
  Query::new(move |conn| {
    let mut by_server: HashMap<Uuid, Vec<FinishedSession>> = HashMap::new();
    for session in load_sessions(conn, SessionFilter::Player, uuid)? {
      by_server.entry(session.server_uuid).or_default().push(session);
    }
    Ok(by_server)
  })
}

/// Every stored session on a server, oldest first.
pub fn fetch_sessions_of_server(server_uuid: Uuid) -> Query<Vec<FinishedSession>> {
  Query::new(move |conn| load_sessions(conn, SessionFilter::Server, server_uuid))
}

/// Run a `SELECT server_uuid, <aggregate>` grouped per server for one player.
fn per_server_aggregate(uuid: Uuid, sql: &'static str) -> Query<HashMap<Uuid, i64>> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(sql)?;
    let values = stmt
      .query_map(params![uuid.to_string()], |row| {
        Ok((uuid_at(row, 0)?, row.get::<_, i64>(1)?))
      })?
      .collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(values)
  })
}

pub fn last_seen_per_server(uuid: Uuid) -> Query<HashMap<Uuid, i64>> {
  per_server_aggregate(
    uuid,
    "SELECT server_uuid, MAX(session_end) FROM sessions WHERE uuid = ?1 GROUP BY server_uuid",
  )
}

pub fn playtime_per_server(uuid: Uuid) -> Query<HashMap<Uuid, i64>> {
  per_server_aggregate(
    uuid,
    "SELECT server_uuid, SUM(session_end - session_start) FROM sessions WHERE uuid = ?1 GROUP BY server_uuid",
  )
}

pub fn mob_kills_per_server(uuid: Uuid) -> Query<HashMap<Uuid, i64>> {
  per_server_aggregate(
    uuid,
    "SELECT server_uuid, SUM(mob_kills) FROM sessions WHERE uuid = ?1 GROUP BY server_uuid",
  )
}

pub fn deaths_per_server(uuid: Uuid) -> Query<HashMap<Uuid, i64>> {
  per_server_aggregate(
    uuid,
    "SELECT server_uuid, SUM(deaths) FROM sessions WHERE uuid = ?1 GROUP BY server_uuid",
  )
}

fn server_total(server_uuid: Uuid, sql: &'static str) -> Query<i64> {
  Query::new(move |conn| {
    conn
      .prepare_cached(sql)?
      .query_row(params![server_uuid.to_string()], |row| row.get(0))
  })
}

pub fn server_mob_kill_count(server_uuid: Uuid) -> Query<i64> {
  server_total(
    server_uuid,
    "SELECT COALESCE(SUM(mob_kills), 0) FROM sessions WHERE server_uuid = ?1",
  )
}

pub fn server_death_count(server_uuid: Uuid) -> Query<i64> {
  server_total(
    server_uuid,
    "SELECT COALESCE(SUM(deaths), 0) FROM sessions WHERE server_uuid = ?1",
  )
}
