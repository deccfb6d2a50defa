//! JSON views of the domain containers.

use std::cmp::Reverse;

use playstat_core::keys::{per_server, player, server};
use playstat_core::mutators::{PerServerMutator, SessionsMutator};
use playstat_core::{ContainerExt, ContainerValue, DataContainer, DynamicDataContainer, Key, PlayerContainer, ServerContainer};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::WebError;

/// Sessions listed by `/v1/sessions`.
pub(crate) const RECENT_SESSION_LIMIT: usize = 50;

/// The value under `key` as JSON, `null` when there is none.
fn value_of<C, T>(container: &C, key: &Key<T>) -> Result<Value, WebError>
where
    C: DataContainer + ?Sized,
    T: ContainerValue,
{
    Ok(match container.get_value(key)? {
        Some(value) => serde_json::to_value(&*value)?,
        None => Value::Null,
    })
}

fn per_server_json(server: &Uuid, data: &DynamicDataContainer) -> Result<Value, WebError> {
    Ok(json!({
        "server_uuid": server,
        "registered": value_of(data, &per_server::REGISTERED)?,
        "join_address": value_of(data, &per_server::JOIN_ADDRESS)?,
        "banned": value_of(data, &per_server::BANNED)?,
        "operator": value_of(data, &per_server::OPERATOR)?,
        "session_count": value_of(data, &per_server::SESSION_COUNT)?,
        "playtime": value_of(data, &per_server::PLAYTIME)?,
        "last_seen": value_of(data, &per_server::LAST_SEEN)?,
        "mob_kill_count": value_of(data, &per_server::MOB_KILL_COUNT)?,
        "player_kill_count": value_of(data, &per_server::PLAYER_KILL_COUNT)?,
        "death_count": value_of(data, &per_server::DEATH_COUNT)?,
    }))
}

pub(crate) fn player_json(data: &PlayerContainer, now: i64, threshold_ms: i64) -> Result<Value, WebError> {
    let activity = data.get_activity_index(now, threshold_ms)?;

    let per_server = data.get_value(&player::PER_SERVER)?;
    let (servers, favorite_server) = match per_server.as_deref() {
        Some(per_server) => {
            let servers = per_server
                .iter()
                .map(|(server, container)| per_server_json(server, container))
                .collect::<Result<Vec<_>, _>>()?;
            (servers, PerServerMutator::new(per_server).favorite_server()?)
        }
        None => (Vec::new(), None),
    };

    Ok(json!({
        "uuid": value_of(data, &player::UUID)?,
        "name": value_of(data, &player::NAME)?,
        "registered": value_of(data, &player::REGISTERED)?,
        "kick_count": value_of(data, &player::KICK_COUNT)?,
        "banned": value_of(data, &player::BANNED)?,
        "operator": value_of(data, &player::OPERATOR)?,
        "online": data.get_value(&player::ACTIVE_SESSION)?.is_some(),
        "last_seen": value_of(data, &player::LAST_SEEN)?,
        "session_count": value_of(data, &player::SESSION_COUNT)?,
        "playtime": value_of(data, &player::PLAYTIME)?,
        "active_playtime": value_of(data, &player::ACTIVE_PLAYTIME)?,
        "mob_kill_count": value_of(data, &player::MOB_KILL_COUNT)?,
        "player_kill_count": value_of(data, &player::PLAYER_KILL_COUNT)?,
        "death_count": value_of(data, &player::DEATH_COUNT)?,
        "activity_index": {
            "value": activity.value(),
            "group": activity.group(),
            "label": activity.group().to_string(),
        },
        "favorite_server": favorite_server,
        "servers": servers,
        "world_times": value_of(data, &player::WORLD_TIMES)?,
        "nicknames": value_of(data, &player::NICKNAMES)?,
        "geo_info": value_of(data, &player::GEO_INFO)?,
        "player_kills": value_of(data, &player::PLAYER_KILLS)?,
        "player_deaths": value_of(data, &player::PLAYER_DEATHS_KILLS)?,
    }))
}

/// One row of the players table of a server.
fn player_row(data: &PlayerContainer, now: i64, threshold_ms: i64) -> Result<Value, WebError> {
    let activity = data.get_activity_index(now, threshold_ms)?;
    let geolocation = data.get_value(&player::GEO_INFO)?.and_then(|geo_info| {
        geo_info
            .iter()
            .max_by_key(|geo| geo.date)
            .map(|geo| geo.geolocation.clone())
    });

    Ok(json!({
        "uuid": value_of(data, &player::UUID)?,
        "name": value_of(data, &player::NAME)?,
        "registered": value_of(data, &player::REGISTERED)?,
        "online": data.get_value(&player::ACTIVE_SESSION)?.is_some(),
        "session_count": value_of(data, &player::SESSION_COUNT)?,
        "playtime": value_of(data, &player::PLAYTIME)?,
        "active_playtime": value_of(data, &player::ACTIVE_PLAYTIME)?,
        "last_seen": value_of(data, &player::LAST_SEEN)?,
        "activity_index": activity.value(),
        "activity_group": activity.group(),
        "geolocation": geolocation,
    }))
}

pub(crate) fn players_table_json(players: &[PlayerContainer], now: i64, threshold_ms: i64) -> Result<Value, WebError> {
    let rows = players
        .iter()
        .map(|data| player_row(data, now, threshold_ms))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(json!({ "players": rows }))
}

pub(crate) fn server_overview_json(data: &ServerContainer) -> Result<Value, WebError> {
    let average_tps = data
        .get_value(&server::TPS)?
        .filter(|entries| !entries.is_empty())
        .map(|entries| entries.iter().map(|entry| entry.tps).sum::<f64>() / entries.len() as f64);
    let playtime = data
        .get_value(&server::SESSIONS)?
        .map(|sessions| SessionsMutator::new(sessions.to_vec()).playtime());
    let online_players = data.get_value(&server::ONLINE_PLAYERS)?.map_or(0, |online| online.len());
    let operators = data.get_value(&server::OPERATORS)?.map_or(0, |operators| operators.len());

    Ok(json!({
        "server_uuid": value_of(data, &server::SERVER_UUID)?,
        "name": value_of(data, &server::NAME)?,
        "is_proxy": value_of(data, &server::IS_PROXY)?,
        "registered": value_of(data, &server::REGISTERED)?,
        "player_count": value_of(data, &server::PLAYER_COUNT)?,
        "online_players": online_players,
        "operators": operators,
        "session_count": value_of(data, &server::SESSION_COUNT)?,
        "playtime": playtime,
        "player_kill_count": value_of(data, &server::PLAYER_KILL_COUNT)?,
        "mob_kill_count": value_of(data, &server::MOB_KILL_COUNT)?,
        "death_count": value_of(data, &server::DEATH_COUNT)?,
        "average_tps": average_tps,
        "all_time_peak_players": value_of(data, &server::ALL_TIME_PEAK_PLAYERS)?,
        "recent_peak_players": value_of(data, &server::RECENT_PEAK_PLAYERS)?,
        "world_times": value_of(data, &server::WORLD_TIMES)?,
        "extension_data": value_of(data, &server::EXTENSION_DATA)?,
    }))
}

/// Most recent sessions of a server, newest first.
pub(crate) fn sessions_json(data: &ServerContainer, limit: usize) -> Result<Value, WebError> {
    let sessions = data.get_value(&server::SESSIONS)?.unwrap_or_default();
    let mut recent: Vec<_> = sessions.iter().collect();
    recent.sort_by_key(|session| Reverse(session.start));

    let rows: Vec<Value> = recent
        .into_iter()
        .take(limit)
        .map(|session| {
            json!({
                "player_uuid": session.player_uuid,
                "start": session.start,
                "end": session.end,
                "length": session.length(),
                "afk_time": session.afk_time,
                "mob_kills": session.mob_kills,
                "deaths": session.deaths,
                "player_kills": session.player_kills.len(),
            })
        })
        .collect();
    Ok(json!({ "sessions": rows }))
}
