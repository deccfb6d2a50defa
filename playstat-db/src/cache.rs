//! In-memory cache for in-progress sessions.
//!
//! This module provides lock-free storage for sessions that have not ended
//! yet. Ingest handlers write to it; container queries read snapshots from it
//! and must not assume an entry is still present after the read.

use std::collections::HashMap;
use std::sync::Arc;

use scc::HashMap as SccHashMap;
use uuid::Uuid;

use crate::models::{ActiveSession, FinishedSession, PlayerKill};

/// Thread-safe cache of active sessions, keyed by player UUID.
///
/// Cloning yields another handle to the same cache.
#[derive(Clone, Default)]
pub struct SessionCache {
    sessions: Arc<SccHashMap<Uuid, ActiveSession>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a session. Returns the session it replaced, if the
    /// player already had one (missed quit event).
    pub fn start_session(&self, session: ActiveSession) -> Option<ActiveSession> {
        let player = session.player_uuid;
        let previous = self.sessions.remove_sync(&player).map(|(_, s)| s);
        let _ = self.sessions.insert_sync(player, session);
        previous
    }

    /// Stop tracking a player's session and return it ended at `now`.
    pub fn end_session(&self, player: &Uuid, now: i64) -> Option<FinishedSession> {
        self.sessions
            .remove_sync(player)
            .map(|(_, session)| session.to_finished_session(now))
    }

    /// Returns false when the player has no active session.
    pub fn change_world(&self, player: &Uuid, world: &str, gamemode: &str, now: i64) -> bool {
        self.sessions
            .update_sync(player, |_, session| session.change_world(world, gamemode, now))
            .is_some()
    }

    pub fn record_mob_kill(&self, player: &Uuid) -> bool {
        self.sessions
            .update_sync(player, |_, session| session.mob_kills += 1)
            .is_some()
    }

    pub fn record_death(&self, player: &Uuid) -> bool {
        self.sessions
            .update_sync(player, |_, session| session.deaths += 1)
            .is_some()
    }

    /// Attach a kill to the killer's session.
    pub fn record_player_kill(&self, kill: PlayerKill) -> bool {
        let killer = kill.killer;
        self.sessions
            .update_sync(&killer, move |_, session| session.player_kills.push(kill))
            .is_some()
    }

    pub fn add_afk_time(&self, player: &Uuid, ms: i64) -> bool {
        self.sessions
            .update_sync(player, |_, session| session.afk_time += ms.max(0))
            .is_some()
    }

    /// Snapshot of a player's active session.
    pub fn cached_session(&self, player: &Uuid) -> Option<ActiveSession> {
        self.sessions.read_sync(player, |_, session| session.clone())
    }

    /// Snapshot of every active session, keyed by player UUID.
    pub fn active_sessions(&self) -> HashMap<Uuid, ActiveSession> {
        let mut snapshot = HashMap::with_capacity(self.sessions.len());
        // Keeps every entry; retain is the locking scan over all buckets
        self.sessions.retain_sync(|player, session| {
            snapshot.insert(*player, session.clone());
            true
        });
        snapshot
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let cache = SessionCache::new();
        let player = Uuid::new_v4();
        let server = Uuid::new_v4();

        assert!(cache.start_session(ActiveSession::new(player, server, 1_000)).is_none());
        assert!(cache.record_mob_kill(&player));
        assert!(cache.record_death(&player));
        assert!(cache.change_world(&player, "world", "SURVIVAL", 1_000));

        let snapshot = cache.cached_session(&player).unwrap();
        assert_eq!(snapshot.mob_kills, 1);
        assert_eq!(snapshot.deaths, 1);

        let finished = cache.end_session(&player, 5_000).unwrap();
        assert_eq!(finished.start, 1_000);
        assert_eq!(finished.end, 5_000);
        assert_eq!(finished.world_times.world_total("world"), 4_000);
        assert!(cache.cached_session(&player).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_updates_without_session_are_rejected() {
        let cache = SessionCache::new();
        let player = Uuid::new_v4();

        assert!(!cache.record_mob_kill(&player));
        assert!(!cache.change_world(&player, "world", "SURVIVAL", 0));
        assert!(cache.end_session(&player, 0).is_none());
    }

    #[test]
    fn test_restart_replaces_previous_session() {
        let cache = SessionCache::new();
        let player = Uuid::new_v4();
        let server = Uuid::new_v4();

        cache.start_session(ActiveSession::new(player, server, 1_000));
        let previous = cache.start_session(ActiveSession::new(player, server, 2_000));

        assert_eq!(previous.map(|s| s.start), Some(1_000));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.active_sessions()[&player].start, 2_000);
    }

    #[test]
    fn test_player_kill_goes_to_killer_session() {
        let cache = SessionCache::new();
        let killer = Uuid::new_v4();
        let victim = Uuid::new_v4();
        let server = Uuid::new_v4();
        cache.start_session(ActiveSession::new(killer, server, 0));

        assert!(cache.record_player_kill(PlayerKill {
            killer,
            victim,
            server_uuid: server,
            weapon: "Diamond Sword".to_string(),
            date: 10,
        }));

        assert_eq!(cache.cached_session(&killer).unwrap().player_kills.len(), 1);
    }
}
