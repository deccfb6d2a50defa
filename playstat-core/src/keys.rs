//! Keys of the domain containers.
//!
//! Key names double as field names in [`map_to_normal_map`](crate::ContainerExt::map_to_normal_map)
//! output, so they are part of the JSON the web layer serves.

/// Keys of a [`PlayerContainer`](crate::PlayerContainer).
pub mod player {
    use playstat_db::{ActiveSession, FinishedSession, GeoInfo, Nickname, Ping, PlayerKill, PlayerName, WorldTimes};
    use uuid::Uuid;

    use crate::{Key, PerServerContainer};

    pub const UUID: Key<Uuid> = Key::new("uuid");
    pub const NAME: Key<PlayerName> = Key::new("name");
    pub const REGISTERED: Key<i64> = Key::new("registered");
    pub const KICK_COUNT: Key<u32> = Key::new("kick_count");

    pub const GEO_INFO: Key<Vec<GeoInfo>> = Key::new("geo_info");
    pub const PING: Key<Vec<Ping>> = Key::new("ping");
    pub const NICKNAMES: Key<Vec<Nickname>> = Key::new("nicknames");

    pub const PER_SERVER: Key<PerServerContainer> = Key::new("per_server");
    /// Banned on at least one server
    pub const BANNED: Key<bool> = Key::new("banned");
    /// Operator on at least one server
    pub const OPERATOR: Key<bool> = Key::new("operator");

    /// Every session including the active one, oldest first
    pub const SESSIONS: Key<Vec<FinishedSession>> = Key::new("sessions");
    pub const ACTIVE_SESSION: Key<ActiveSession> = Key::new("active_session");
    pub const SESSION_COUNT: Key<usize> = Key::new("session_count");
    pub const PLAYTIME: Key<i64> = Key::new("playtime");
    pub const ACTIVE_PLAYTIME: Key<i64> = Key::new("active_playtime");
    pub const WORLD_TIMES: Key<WorldTimes> = Key::new("world_times");
    pub const LAST_SEEN: Key<i64> = Key::new("last_seen");

    /// Kills performed by the player
    pub const PLAYER_KILLS: Key<Vec<PlayerKill>> = Key::new("player_kills");
    /// Kills where the player was the victim
    pub const PLAYER_DEATHS_KILLS: Key<Vec<PlayerKill>> = Key::new("player_deaths_kills");
    pub const PLAYER_KILL_COUNT: Key<usize> = Key::new("player_kill_count");
    pub const MOB_KILL_COUNT: Key<i64> = Key::new("mob_kill_count");
    pub const DEATH_COUNT: Key<i64> = Key::new("death_count");
}

/// Keys of the per-server sub-containers of a
/// [`PerServerContainer`](crate::PerServerContainer).
pub mod per_server {
    use playstat_db::{FinishedSession, WorldTimes};

    use crate::Key;

    pub const REGISTERED: Key<i64> = Key::new("registered");
    pub const BANNED: Key<bool> = Key::new("banned");
    pub const OPERATOR: Key<bool> = Key::new("operator");
    pub const JOIN_ADDRESS: Key<String> = Key::new("join_address");

    pub const SESSIONS: Key<Vec<FinishedSession>> = Key::new("sessions");
    pub const SESSION_COUNT: Key<usize> = Key::new("session_count");
    pub const LAST_SEEN: Key<i64> = Key::new("last_seen");
    pub const PLAYTIME: Key<i64> = Key::new("playtime");
    pub const WORLD_TIMES: Key<WorldTimes> = Key::new("world_times");

    pub const PLAYER_KILL_COUNT: Key<i64> = Key::new("player_kill_count");
    pub const MOB_KILL_COUNT: Key<i64> = Key::new("mob_kill_count");
    pub const DEATH_COUNT: Key<i64> = Key::new("death_count");
}

/// Keys of a [`ServerContainer`](crate::ServerContainer).
pub mod server {
    use playstat_db::{ExtensionValue, FinishedSession, PeakPlayers, Ping, PlayerKill, TpsEntry, WorldTimes};
    use uuid::Uuid;

    use crate::{Key, PlayerContainer};

    pub const SERVER_UUID: Key<Uuid> = Key::new("server_uuid");
    pub const NAME: Key<String> = Key::new("name");
    pub const IS_PROXY: Key<bool> = Key::new("is_proxy");
    pub const REGISTERED: Key<i64> = Key::new("registered");

    pub const PLAYERS: Key<Vec<PlayerContainer>> = Key::new("players");
    pub const PLAYER_COUNT: Key<usize> = Key::new("player_count");
    pub const OPERATORS: Key<Vec<Uuid>> = Key::new("operators");
    pub const ONLINE_PLAYERS: Key<Vec<Uuid>> = Key::new("online_players");

    /// Samples of the last 30 days, oldest first
    pub const TPS: Key<Vec<TpsEntry>> = Key::new("tps");
    pub const PING: Key<Vec<Ping>> = Key::new("ping");
    pub const ALL_TIME_PEAK_PLAYERS: Key<PeakPlayers> = Key::new("all_time_peak_players");
    /// Peak of the last two days
    pub const RECENT_PEAK_PLAYERS: Key<PeakPlayers> = Key::new("recent_peak_players");

    pub const WORLD_TIMES: Key<WorldTimes> = Key::new("world_times");
    pub const SESSIONS: Key<Vec<FinishedSession>> = Key::new("sessions");
    pub const SESSION_COUNT: Key<usize> = Key::new("session_count");
    /// Most recent kills on the server
    pub const PLAYER_KILLS: Key<Vec<PlayerKill>> = Key::new("player_kills");
    pub const PLAYER_KILL_COUNT: Key<usize> = Key::new("player_kill_count");
    pub const MOB_KILL_COUNT: Key<i64> = Key::new("mob_kill_count");
    pub const DEATH_COUNT: Key<i64> = Key::new("death_count");

    pub const EXTENSION_DATA: Key<Vec<ExtensionValue>> = Key::new("extension_data");
}
