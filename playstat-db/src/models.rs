use std::collections::BTreeMap;

use arrayvec::ArrayString;
use serde::Serialize;
use uuid::Uuid;

/// Minecraft player name - max 16 characters, stored inline (no heap allocation).
pub type PlayerName = ArrayString<16>;

/// A game server reporting to this service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Server {
  pub uuid: Uuid,
  pub name: String,
  /// Proxies (BungeeCord/Velocity) aggregate several backend servers
  pub is_proxy: bool,
  /// Unix timestamp (ms) of registration
  pub registered: i64,
}

/// Identity of a player shared by every server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseUser {
  pub uuid: Uuid,
  pub name: PlayerName,
  pub registered: i64,
  pub times_kicked: u32,
}

/// A player's state on one server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserInfo {
  pub player_uuid: Uuid,
  pub server_uuid: Uuid,
  pub registered: i64,
  pub join_address: Option<String>,
  pub banned: bool,
  pub operator: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoInfo {
  pub geolocation: String,
  /// Last time the player connected from this location
  pub date: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Nickname {
  pub name: String,
  pub date: i64,
  pub server_uuid: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ping {
  pub server_uuid: Uuid,
  pub date: i64,
  pub min: i32,
  pub max: i32,
  pub avg: f64,
}

/// One server performance sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TpsEntry {
  pub date: i64,
  pub tps: f64,
  pub players_online: i32,
  pub cpu_usage: f64,
  pub ram_usage: i64,
  pub entities: i32,
  pub chunks_loaded: i32,
}

/// Highest online player count and when it happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakPlayers {
  pub date: i64,
  pub players: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerKill {
  pub killer: Uuid,
  pub victim: Uuid,
  pub server_uuid: Uuid,
  pub weapon: String,
  pub date: i64,
}

/// Milliseconds spent per world and gamemode.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorldTimes {
  pub times: BTreeMap<String, BTreeMap<String, i64>>,
}

impl WorldTimes {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_time(&mut self, world: &str, gamemode: &str, ms: i64) {
    *self
      .times
      .entry(world.to_string())
      .or_default()
      .entry(gamemode.to_string())
      .or_insert(0) += ms;
  }

  /// Fold another breakdown into this one.
  pub fn add(&mut self, other: &WorldTimes) {
    for (world, gamemodes) in &other.times {
      for (gamemode, ms) in gamemodes {
        self.add_time(world, gamemode, *ms);
      }
    }
  }

  pub fn world_total(&self, world: &str) -> i64 {
    self
      .times
      .get(world)
      .map(|gamemodes| gamemodes.values().sum())
      .unwrap_or(0)
  }

  pub fn gamemode_total(&self, gamemode: &str) -> i64 {
    self
      .times
      .values()
      .filter_map(|gamemodes| gamemodes.get(gamemode))
      .sum()
  }

  pub fn total(&self) -> i64 {
    self.times.values().flat_map(|g| g.values()).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.times.is_empty()
  }
}

/// A session that has ended (or an active one converted with a provisional end).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishedSession {
  /// Row id, None until stored
  pub id: Option<i64>,
  pub player_uuid: Uuid,
  pub server_uuid: Uuid,
  pub start: i64,
  pub end: i64,
  pub afk_time: i64,
  pub mob_kills: i32,
  pub deaths: i32,
  pub world_times: WorldTimes,
  pub player_kills: Vec<PlayerKill>,
}

impl FinishedSession {
  pub fn length(&self) -> i64 {
    (self.end - self.start).max(0)
  }

  /// Length without the time spent AFK.
  pub fn active_time(&self) -> i64 {
    (self.length() - self.afk_time).max(0)
  }
}

/// The world a player is currently in and since when.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldStint {
  pub world: String,
  pub gamemode: String,
  pub since: i64,
}

/// A session that has not ended yet, tracked in the session cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveSession {
  pub player_uuid: Uuid,
  pub server_uuid: Uuid,
  pub start: i64,
  pub afk_time: i64,
  pub mob_kills: i32,
  pub deaths: i32,
  /// Completed world stints, the current one lives in `current_world`
  pub world_times: WorldTimes,
  pub player_kills: Vec<PlayerKill>,
  pub current_world: Option<WorldStint>,
}

impl ActiveSession {
  pub fn new(player_uuid: Uuid, server_uuid: Uuid, start: i64) -> Self {
    Self {
      player_uuid,
      server_uuid,
      start,
      afk_time: 0,
      mob_kills: 0,
      deaths: 0,
      world_times: WorldTimes::new(),
      player_kills: Vec::new(),
      current_world: None,
    }
  }

  /// Close the current world stint and open a new one.
  pub fn change_world(&mut self, world: &str, gamemode: &str, now: i64) {
    if let Some(stint) = self.current_world.take() {
      self
        .world_times
        .add_time(&stint.world, &stint.gamemode, (now - stint.since).max(0));
    }
    self.current_world = Some(WorldStint {
      world: world.to_string(),
      gamemode: gamemode.to_string(),
      since: now,
    });
  }

  /// World times including the still-open stint up to `now`.
  pub fn world_times_until(&self, now: i64) -> WorldTimes {
    let mut times = self.world_times.clone();
    if let Some(stint) = &self.current_world {
      times.add_time(&stint.world, &stint.gamemode, (now - stint.since).max(0));
    }
    times
  }

  /// Convert into the finished shape, ending at `end`.
  pub fn to_finished_session(&self, end: i64) -> FinishedSession {
    FinishedSession {
      id: None,
      player_uuid: self.player_uuid,
      server_uuid: self.server_uuid,
      start: self.start,
      end,
      afk_time: self.afk_time,
      mob_kills: self.mob_kills,
      deaths: self.deaths,
      world_times: self.world_times_until(end),
      player_kills: self.player_kills.clone(),
    }
  }
}

/// A value reported by a server-side extension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionValue {
  pub provider: String,
  pub name: String,
  pub value: String,
}

/// A user allowed to view the web pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebUser {
  pub username: String,
  /// Player this user is linked to, for `page.player.self`
  pub linked_uuid: Option<Uuid>,
  pub permissions: Vec<String>,
}

impl WebUser {
  pub fn has_permission(&self, permission: &str) -> bool {
    self.permissions.iter().any(|p| p == permission)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_world_times_accumulate() {
    let mut times = WorldTimes::new();
    times.add_time("world", "SURVIVAL", 1000);
    times.add_time("world", "SURVIVAL", 500);
    times.add_time("world_nether", "CREATIVE", 200);

    assert_eq!(times.world_total("world"), 1500);
    assert_eq!(times.gamemode_total("CREATIVE"), 200);
    assert_eq!(times.total(), 1700);
  }

  #[test]
  fn test_active_session_folds_open_stint() {
    let player = Uuid::new_v4();
    let server = Uuid::new_v4();
    let mut session = ActiveSession::new(player, server, 1_000);
    session.change_world("world", "SURVIVAL", 1_000);
    session.change_world("world_nether", "SURVIVAL", 4_000);

    let finished = session.to_finished_session(10_000);

    assert_eq!(finished.end, 10_000);
    assert_eq!(finished.length(), 9_000);
    assert_eq!(finished.world_times.world_total("world"), 3_000);
    assert_eq!(finished.world_times.world_total("world_nether"), 6_000);
    // The stored breakdown is untouched by the conversion
    assert_eq!(session.world_times.world_total("world_nether"), 0);
  }
}
