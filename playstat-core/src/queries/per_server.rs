use std::sync::Arc;

use playstat_db::queries::{kills, sessions, users, world_times};
use playstat_db::{ActiveSession, Database, SessionCache, epoch_millis};
use tracing::debug;
use uuid::Uuid;

use crate::container::{ContainerExt, DynamicDataContainer};
use crate::error::Result;
use crate::key::{ContainerValue, Key};
use crate::keys::per_server;
use crate::per_server::PerServerContainer;

/// Loads a player's data on every server, one query per data kind.
///
/// Unlike the other queries this one runs eagerly: it is meant to be the
/// body of a caching supplier.
pub struct PerServerContainerQuery {
    player: Uuid,
}

impl PerServerContainerQuery {
    pub fn new(player: Uuid) -> Self {
        Self { player }
    }

    pub fn execute(&self, db: &Database, cache: &SessionCache) -> Result<PerServerContainer> {
        let player = self.player;
        debug!(%player, "executing per-server container query");

        let mut data = PerServerContainer::new();
        for info in db.query_blocking(users::fetch_user_information_of_player(player))? {
            let container = data.container_of_server_mut(info.server_uuid);
            container.put_raw_data(per_server::REGISTERED, info.registered);
            container.put_raw_data(per_server::BANNED, info.banned);
            container.put_raw_data(per_server::OPERATOR, info.operator);
            container.put_raw_data(per_server::JOIN_ADDRESS, info.join_address);
        }

        data.matching_entry_set(db, per_server::SESSIONS, sessions::fetch_sessions_of_player(player))?;
        data.matching_entry_set(db, per_server::LAST_SEEN, sessions::last_seen_per_server(player))?;
        data.matching_entry_set(db, per_server::PLAYTIME, sessions::playtime_per_server(player))?;
        data.matching_entry_set(db, per_server::MOB_KILL_COUNT, sessions::mob_kills_per_server(player))?;
        data.matching_entry_set(db, per_server::DEATH_COUNT, sessions::deaths_per_server(player))?;
        data.matching_entry_set(db, per_server::PLAYER_KILL_COUNT, kills::player_kill_counts_per_server(player))?;
        data.matching_entry_set(
            db,
            per_server::WORLD_TIMES,
            world_times::fetch_player_world_times_on_servers(player),
        )?;

        if let Some(active) = cache.cached_session(&player) {
            fold_active_session(&mut data, &active, epoch_millis())?;
        }

        let servers: Vec<Uuid> = data.servers().copied().collect();
        for server in servers {
            data.container_of_server_mut(server)
                .put_supplier(per_server::SESSION_COUNT, |root| {
                    Ok(root.get_value(&per_server::SESSIONS)?.map(|sessions| sessions.len()))
                });
        }

        Ok(data)
    }
}

fn current<T: ContainerValue + Clone + Default>(container: &DynamicDataContainer, key: &Key<T>) -> Result<T> {
    Ok(container
        .get_value(key)?
        .map(Arc::unwrap_or_clone)
        .unwrap_or_default())
}

/// Count the in-progress session into the container of its server.
fn fold_active_session(data: &mut PerServerContainer, active: &ActiveSession, now: i64) -> Result<()> {
    let finished = active.to_finished_session(now);
    let container = data.container_of_server_mut(active.server_uuid);

    let playtime = current(container, &per_server::PLAYTIME)? + finished.length();
    let mob_kills = current(container, &per_server::MOB_KILL_COUNT)? + i64::from(finished.mob_kills);
    let deaths = current(container, &per_server::DEATH_COUNT)? + i64::from(finished.deaths);
    let player_kills = current(container, &per_server::PLAYER_KILL_COUNT)? + finished.player_kills.len() as i64;
    let mut world_times = current(container, &per_server::WORLD_TIMES)?;
    world_times.add(&finished.world_times);
    let mut sessions = current(container, &per_server::SESSIONS)?;
    sessions.push(finished);

    container.put_raw_data(per_server::LAST_SEEN, now);
    container.put_raw_data(per_server::PLAYTIME, playtime);
    container.put_raw_data(per_server::MOB_KILL_COUNT, mob_kills);
    container.put_raw_data(per_server::DEATH_COUNT, deaths);
    container.put_raw_data(per_server::PLAYER_KILL_COUNT, player_kills);
    container.put_raw_data(per_server::WORLD_TIMES, world_times);
    container.put_raw_data(per_server::SESSIONS, sessions);
    Ok(())
}
