use std::collections::HashMap;

use playstat_db::queries::{geo_info, nicknames, ping, sessions, users};
use playstat_db::{ActiveSession, Database, FinishedSession, SessionCache, epoch_millis};
use tracing::debug;
use uuid::Uuid;

use super::{put_session_totals, sessions_of, with_active_session};
use crate::container::ContainerExt;
use crate::error::Result;
use crate::keys::{per_server, player};
use crate::mutators::SessionsMutator;
use crate::per_server::PerServerContainer;
use crate::player::PlayerContainer;

/// Builds the containers of every player of a server.
///
/// Each data kind is fetched for the whole server in one statement and then
/// split per player, so the number of queries does not grow with the number
/// of players. World times and player kills are only available on the
/// player level, the per-server containers it produces carry neither.
pub struct ServerPlayerContainersQuery {
    server: Uuid,
}

impl ServerPlayerContainersQuery {
    pub fn new(server: Uuid) -> Self {
        Self { server }
    }

    pub fn execute(&self, db: &Database, cache: &SessionCache) -> Result<Vec<PlayerContainer>> {
        let server = self.server;
        debug!(%server, "executing server players query");

        let base_users = db.query_blocking(users::fetch_server_base_users(server))?;
        let mut geo_information = db.query_blocking(geo_info::fetch_server_geo_information(server))?;
        let mut nickname_data = db.query_blocking(nicknames::fetch_nickname_data_of_server(server))?;
        let mut pings = db.query_blocking(ping::fetch_ping_data_of_server(server))?;
        let mut user_information = db.query_blocking(users::fetch_user_information_of_server(server))?;

        let mut sessions_by_player: HashMap<Uuid, Vec<FinishedSession>> = HashMap::new();
        for session in db.query_blocking(sessions::fetch_sessions_of_server(server))? {
            sessions_by_player
                .entry(session.player_uuid)
                .or_default()
                .push(session);
        }
        let active: HashMap<Uuid, ActiveSession> = cache
            .active_sessions()
            .into_iter()
            .filter(|(_, session)| session.server_uuid == server)
            .collect();
        let now = epoch_millis();

        let players = base_users
            .into_iter()
            .map(|user| {
                let uuid = user.uuid;
                let mut container = PlayerContainer::new();
                container.put_raw_data(player::UUID, uuid);
                container.put_raw_data(player::NAME, user.name);
                container.put_raw_data(player::REGISTERED, user.registered);
                container.put_raw_data(player::KICK_COUNT, user.times_kicked);
                container.put_raw_data(player::GEO_INFO, geo_information.remove(&uuid).unwrap_or_default());
                container.put_raw_data(player::NICKNAMES, nickname_data.remove(&uuid).unwrap_or_default());
                container.put_raw_data(player::PING, pings.remove(&uuid).unwrap_or_default());

                let active_session = active.get(&uuid);
                let sessions = with_active_session(
                    sessions_by_player.remove(&uuid).unwrap_or_default(),
                    active_session,
                    now,
                );
                let totals = SessionsMutator::new(sessions.clone());

                let mut per_server_data = PerServerContainer::new();
                let data = per_server_data.container_of_server_mut(server);
                if let Some(info) = user_information.remove(&uuid) {
                    data.put_raw_data(per_server::REGISTERED, info.registered);
                    data.put_raw_data(per_server::BANNED, info.banned);
                    data.put_raw_data(per_server::OPERATOR, info.operator);
                    data.put_raw_data(per_server::JOIN_ADDRESS, info.join_address);
                    container.put_raw_data(player::BANNED, info.banned);
                    container.put_raw_data(player::OPERATOR, info.operator);
                }
                data.put_raw_data(per_server::SESSION_COUNT, totals.count());
                data.put_raw_data(per_server::LAST_SEEN, totals.last_seen());
                data.put_raw_data(per_server::PLAYTIME, totals.playtime());
                data.put_raw_data(per_server::MOB_KILL_COUNT, totals.mob_kill_count());
                data.put_raw_data(per_server::DEATH_COUNT, totals.death_count());
                data.put_raw_data(per_server::SESSIONS, sessions.clone());

                container.put_raw_data(player::PER_SERVER, per_server_data);
                container.put_raw_data(player::SESSIONS, sessions);
                container.put_raw_data(player::ACTIVE_SESSION, active_session.cloned());
                put_session_totals(&mut container);
                container.put_caching_supplier(player::WORLD_TIMES, |root| {
                    Ok(Some(sessions_of(root)?.world_times()))
                });
                container.put_supplier(player::PLAYER_KILLS, |root| Ok(Some(sessions_of(root)?.player_kills())));
                container.put_supplier(player::PLAYER_KILL_COUNT, |root| {
                    Ok(root.get_value(&player::PLAYER_KILLS)?.map(|kills| kills.len()))
                });
                container
            })
            .collect();

        Ok(players)
    }
}
