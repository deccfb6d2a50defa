use std::sync::Arc;

use playstat_db::queries::{geo_info, kills, nicknames, ping, users};
use playstat_db::{BaseUser, Database, SessionCache};
use tracing::debug;
use uuid::Uuid;

use super::{PerServerContainerQuery, put_session_totals, sessions_of};
use crate::container::{CachingSupplier, ContainerExt, DataContainer};
use crate::keys::player;
use crate::mutators::PerServerMutator;
use crate::player::PlayerContainer;

/// Builds the container of a single player.
pub struct PlayerContainerQuery {
    player: Uuid,
}

impl PlayerContainerQuery {
    pub fn new(player: Uuid) -> Self {
        Self { player }
    }

    pub fn execute(&self, db: &Database, cache: &SessionCache) -> PlayerContainer {
        let uuid = self.player;
        debug!(player = %uuid, "executing player container query");

        let mut container = PlayerContainer::new();
        container.put_raw_data(player::UUID, uuid);

        let base_user: Arc<CachingSupplier<BaseUser>> = Arc::new(CachingSupplier::new({
            let db = db.clone();
            move |_: &dyn DataContainer| Ok(db.query_blocking(users::fetch_base_user_of_player(uuid))?)
        }));
        {
            let base_user = base_user.clone();
            container.put_supplier(player::NAME, move |root| Ok(base_user.get(root)?.map(|user| user.name)));
        }
        {
            let base_user = base_user.clone();
            container.put_supplier(player::REGISTERED, move |root| {
                Ok(base_user.get(root)?.map(|user| user.registered))
            });
        }
        container.put_supplier(player::KICK_COUNT, move |root| {
            Ok(base_user.get(root)?.map(|user| user.times_kicked))
        });

        {
            let db = db.clone();
            container.put_caching_supplier(player::GEO_INFO, move |_| {
                Ok(Some(db.query_blocking(geo_info::fetch_player_geo_information(uuid))?))
            });
        }
        {
            let db = db.clone();
            container.put_caching_supplier(player::PING, move |_| {
                Ok(Some(db.query_blocking(ping::fetch_ping_data_of_player(uuid))?))
            });
        }
        {
            let db = db.clone();
            container.put_caching_supplier(player::NICKNAMES, move |_| {
                Ok(Some(db.query_blocking(nicknames::fetch_nickname_data_of_player(uuid))?))
            });
        }

        {
            let (db, cache) = (db.clone(), cache.clone());
            container.put_caching_supplier(player::PER_SERVER, move |_| {
                PerServerContainerQuery::new(uuid).execute(&db, &cache).map(Some)
            });
        }
        container.put_supplier(player::BANNED, |root| match root.get_value(&player::PER_SERVER)? {
            Some(data) => Ok(Some(PerServerMutator::new(&data).is_banned()?)),
            None => Ok(None),
        });
        container.put_supplier(player::OPERATOR, |root| match root.get_value(&player::PER_SERVER)? {
            Some(data) => Ok(Some(PerServerMutator::new(&data).is_operator()?)),
            None => Ok(None),
        });

        {
            let cache = cache.clone();
            container.put_supplier(player::ACTIVE_SESSION, move |_| Ok(cache.cached_session(&uuid)));
        }
        container.put_caching_supplier(player::SESSIONS, |root| match root.get_value(&player::PER_SERVER)? {
            Some(data) => Ok(Some(PerServerMutator::new(&data).flat_map_sessions()?)),
            None => Ok(None),
        });
        put_session_totals(&mut container);
        container.put_caching_supplier(player::WORLD_TIMES, |root| Ok(Some(sessions_of(root)?.world_times())));

        container.put_supplier(player::PLAYER_KILLS, |root| Ok(Some(sessions_of(root)?.player_kills())));
        container.put_supplier(player::PLAYER_KILL_COUNT, |root| {
            Ok(root.get_value(&player::PLAYER_KILLS)?.map(|kills| kills.len()))
        });
        {
            let db = db.clone();
            container.put_caching_supplier(player::PLAYER_DEATHS_KILLS, move |_| {
                Ok(Some(db.query_blocking(kills::fetch_deaths_of_player(uuid))?))
            });
        }

        container
    }
}
