use std::collections::HashMap;
use std::sync::Arc;

use playstat_db::queries::{extensions, kills, ping, servers, sessions, tps, users, world_times};
use playstat_db::{ActiveSession, Database, Server, SessionCache, UserInfo, epoch_millis};
use tracing::debug;
use uuid::Uuid;

use super::ServerPlayerContainersQuery;
use crate::container::{CachingSupplier, ContainerExt, DataContainer};
use crate::keys::server;
use crate::mutators::SessionsMutator;
use crate::server::ServerContainer;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const TPS_WINDOW_MS: i64 = 30 * DAY_MS;
const RECENT_PEAK_WINDOW_MS: i64 = 2 * DAY_MS;
const RECENT_KILL_LIMIT: u32 = 50;

/// Builds the container of a single server.
pub struct ServerContainerQuery {
    server: Uuid,
}

impl ServerContainerQuery {
    pub fn new(server: Uuid) -> Self {
        Self { server }
    }

    pub fn execute(&self, db: &Database, cache: &SessionCache) -> ServerContainer {
        let server_uuid = self.server;
        debug!(server = %server_uuid, "executing server container query");

        let mut container = ServerContainer::new();
        container.put_raw_data(server::SERVER_UUID, server_uuid);

        let info: Arc<CachingSupplier<Server>> = Arc::new(CachingSupplier::new({
            let db = db.clone();
            move |_: &dyn DataContainer| {
                Ok(db.query_blocking(servers::fetch_server_matching_identifier(server_uuid.to_string()))?)
            }
        }));
        {
            let info = info.clone();
            container.put_supplier(server::NAME, move |root| Ok(info.get(root)?.map(|s| s.name)));
        }
        {
            let info = info.clone();
            container.put_supplier(server::IS_PROXY, move |root| Ok(info.get(root)?.map(|s| s.is_proxy)));
        }
        container.put_supplier(server::REGISTERED, move |root| Ok(info.get(root)?.map(|s| s.registered)));

        let user_info: Arc<CachingSupplier<HashMap<Uuid, UserInfo>>> = Arc::new(CachingSupplier::new({
            let db = db.clone();
            move |_: &dyn DataContainer| {
                Ok(Some(db.query_blocking(users::fetch_user_information_of_server(server_uuid))?))
            }
        }));
        {
            let user_info = user_info.clone();
            container.put_supplier(server::PLAYER_COUNT, move |root| Ok(user_info.get(root)?.map(|info| info.len())));
        }
        container.put_supplier(server::OPERATORS, move |root| {
            Ok(user_info.get(root)?.map(|info| {
                let mut operators: Vec<Uuid> = info
                    .values()
                    .filter(|user| user.operator)
                    .map(|user| user.player_uuid)
                    .collect();
                operators.sort();
                operators
            }))
        });
        {
            let cache = cache.clone();
            container.put_supplier(server::ONLINE_PLAYERS, move |_| {
                let mut online: Vec<Uuid> = active_sessions_on(&cache, &server_uuid)
                    .iter()
                    .map(|session| session.player_uuid)
                    .collect();
                online.sort();
                Ok(Some(online))
            });
        }
        {
            let (db, cache) = (db.clone(), cache.clone());
            container.put_caching_supplier(server::PLAYERS, move |_| {
                ServerPlayerContainersQuery::new(server_uuid)
                    .execute(&db, &cache)
                    .map(Some)
            });
        }

        {
            let db = db.clone();
            container.put_caching_supplier(server::TPS, move |_| {
                let after = epoch_millis() - TPS_WINDOW_MS;
                Ok(Some(db.query_blocking(tps::fetch_tps_data_of_server(server_uuid, after))?))
            });
        }
        {
            let db = db.clone();
            container.put_caching_supplier(server::PING, move |_| {
                let by_player = db.query_blocking(ping::fetch_ping_data_of_server(server_uuid))?;
                let mut pings: Vec<_> = by_player.into_values().flatten().collect();
                pings.sort_by_key(|ping| ping.date);
                Ok(Some(pings))
            });
        }
        {
            let db = db.clone();
            container.put_caching_supplier(server::ALL_TIME_PEAK_PLAYERS, move |_| {
                Ok(db.query_blocking(tps::fetch_all_time_peak_player_count(server_uuid))?)
            });
        }
        {
            let db = db.clone();
            container.put_caching_supplier(server::RECENT_PEAK_PLAYERS, move |_| {
                let after = epoch_millis() - RECENT_PEAK_WINDOW_MS;
                Ok(db.query_blocking(tps::fetch_peak_player_count(server_uuid, after))?)
            });
        }

        {
            let (db, cache) = (db.clone(), cache.clone());
            container.put_caching_supplier(server::SESSIONS, move |_| {
                let now = epoch_millis();
                let mut stored = db.query_blocking(sessions::fetch_sessions_of_server(server_uuid))?;
                stored.extend(
                    active_sessions_on(&cache, &server_uuid)
                        .iter()
                        .map(|session| session.to_finished_session(now)),
                );
                Ok(Some(SessionsMutator::new(stored).sorted().into_sessions()))
            });
        }
        container.put_supplier(server::SESSION_COUNT, |root| {
            Ok(root.get_value(&server::SESSIONS)?.map(|sessions| sessions.len()))
        });
        {
            let (db, cache) = (db.clone(), cache.clone());
            container.put_caching_supplier(server::WORLD_TIMES, move |_| {
                let now = epoch_millis();
                let mut total = db.query_blocking(world_times::fetch_server_total_world_times(server_uuid))?;
                for session in active_sessions_on(&cache, &server_uuid) {
                    total.add(&session.world_times_until(now));
                }
                Ok(Some(total))
            });
        }
        {
            let (db, cache) = (db.clone(), cache.clone());
            container.put_caching_supplier(server::PLAYER_KILLS, move |_| {
                let mut recent = db.query_blocking(kills::fetch_player_kills_on_server(server_uuid, RECENT_KILL_LIMIT))?;
                for session in active_sessions_on(&cache, &server_uuid) {
                    recent.extend(session.player_kills);
                }
                recent.sort_by_key(|kill| std::cmp::Reverse(kill.date));
                recent.truncate(RECENT_KILL_LIMIT as usize);
                Ok(Some(recent))
            });
        }
        container.put_supplier(server::PLAYER_KILL_COUNT, |root| {
            Ok(root
                .get_value(&server::SESSIONS)?
                .map(|sessions| sessions.iter().map(|s| s.player_kills.len()).sum()))
        });
        {
            let (db, cache) = (db.clone(), cache.clone());
            container.put_caching_supplier(server::MOB_KILL_COUNT, move |_| {
                let stored = db.query_blocking(sessions::server_mob_kill_count(server_uuid))?;
                let active: i64 = active_sessions_on(&cache, &server_uuid)
                    .iter()
                    .map(|session| i64::from(session.mob_kills))
                    .sum();
                Ok(Some(stored + active))
            });
        }
        {
            let (db, cache) = (db.clone(), cache.clone());
            container.put_caching_supplier(server::DEATH_COUNT, move |_| {
                let stored = db.query_blocking(sessions::server_death_count(server_uuid))?;
                let active: i64 = active_sessions_on(&cache, &server_uuid)
                    .iter()
                    .map(|session| i64::from(session.deaths))
                    .sum();
                Ok(Some(stored + active))
            });
        }

        {
            let db = db.clone();
            container.put_caching_supplier(server::EXTENSION_DATA, move |_| {
                Ok(Some(db.query_blocking(extensions::fetch_extension_data_of_server(server_uuid))?))
            });
        }

        container
    }
}

/// Snapshot of the sessions currently in progress on `server`.
fn active_sessions_on(cache: &SessionCache, server: &Uuid) -> Vec<ActiveSession> {
    cache
        .active_sessions()
        .into_values()
        .filter(|session| session.server_uuid == *server)
        .collect()
}
