//! Queries that populate the domain containers.
//!
//! A query is built for one identity, executed once, and returns a container
//! whose entries are mostly suppliers. SQL runs only for the keys a caller
//! actually reads. Sessions still in progress are read from the
//! [`SessionCache`](playstat_db::SessionCache) and appear as finished
//! sessions ending at the moment their supplier is evaluated.

mod per_server;
mod player;
mod server;
mod server_players;

pub use per_server::PerServerContainerQuery;
pub use player::PlayerContainerQuery;
pub use server::ServerContainerQuery;
pub use server_players::ServerPlayerContainersQuery;

use std::sync::Arc;

use playstat_db::FinishedSession;

use crate::container::{ContainerExt, DataContainer, DynamicDataContainer};
use crate::error::Result;
use crate::keys::player as player_keys;
use crate::mutators::SessionsMutator;

/// Sessions of a container as a mutator, empty if the container has none.
fn sessions_of(root: &dyn DataContainer) -> Result<SessionsMutator> {
    let sessions = root
        .get_value(&player_keys::SESSIONS)?
        .map(Arc::unwrap_or_clone)
        .unwrap_or_default();
    Ok(SessionsMutator::new(sessions))
}

/// Player-level totals derived from [`player_keys::SESSIONS`].
fn put_session_totals(container: &mut DynamicDataContainer) {
    container.put_supplier(player_keys::SESSION_COUNT, |root| Ok(Some(sessions_of(root)?.count())));
    container.put_supplier(player_keys::PLAYTIME, |root| Ok(Some(sessions_of(root)?.playtime())));
    container.put_supplier(player_keys::ACTIVE_PLAYTIME, |root| {
        Ok(Some(sessions_of(root)?.active_playtime()))
    });
    container.put_supplier(player_keys::LAST_SEEN, |root| Ok(sessions_of(root)?.last_seen()));
    container.put_supplier(player_keys::MOB_KILL_COUNT, |root| {
        Ok(Some(sessions_of(root)?.mob_kill_count()))
    });
    container.put_supplier(player_keys::DEATH_COUNT, |root| Ok(Some(sessions_of(root)?.death_count())));
}

/// Append the in-progress session, if any, as ended at `now`.
fn with_active_session(
    mut sessions: Vec<FinishedSession>,
    active: Option<&playstat_db::ActiveSession>,
    now: i64,
) -> Vec<FinishedSession> {
    if let Some(active) = active {
        sessions.push(active.to_finished_session(now));
    }
    sessions
}
