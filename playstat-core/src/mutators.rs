//! Aggregations over session lists and per-server data.

use std::collections::HashMap;
use std::sync::Arc;

use playstat_db::{FinishedSession, PlayerKill, WorldTimes};
use uuid::Uuid;

use crate::container::{ContainerExt, DynamicDataContainer};
use crate::error::Result;
use crate::keys::per_server;
use crate::per_server::PerServerContainer;

/// Filters and totals over a list of sessions.
pub struct SessionsMutator {
    sessions: Vec<FinishedSession>,
}

impl SessionsMutator {
    pub fn new(sessions: Vec<FinishedSession>) -> Self {
        Self { sessions }
    }

    pub fn for_server(self, server: &Uuid) -> Self {
        self.filter(|s| s.server_uuid == *server)
    }

    /// Sessions that ended in `(after, before]`.
    pub fn ended_between(self, after: i64, before: i64) -> Self {
        self.filter(|s| s.end > after && s.end <= before)
    }

    pub fn filter(self, predicate: impl Fn(&FinishedSession) -> bool) -> Self {
        Self::new(self.sessions.into_iter().filter(|s| predicate(s)).collect())
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn playtime(&self) -> i64 {
        self.sessions.iter().map(FinishedSession::length).sum()
    }

    pub fn active_playtime(&self) -> i64 {
        self.sessions.iter().map(FinishedSession::active_time).sum()
    }

    pub fn afk_time(&self) -> i64 {
        self.sessions.iter().map(|s| s.afk_time).sum()
    }

    pub fn mob_kill_count(&self) -> i64 {
        self.sessions.iter().map(|s| i64::from(s.mob_kills)).sum()
    }

    pub fn death_count(&self) -> i64 {
        self.sessions.iter().map(|s| i64::from(s.deaths)).sum()
    }

    pub fn player_kills(&self) -> Vec<PlayerKill> {
        self.sessions
            .iter()
            .flat_map(|s| s.player_kills.iter().cloned())
            .collect()
    }

    pub fn world_times(&self) -> WorldTimes {
        let mut total = WorldTimes::new();
        for session in &self.sessions {
            total.add(&session.world_times);
        }
        total
    }

    pub fn last_seen(&self) -> Option<i64> {
        self.sessions.iter().map(|s| s.end).max()
    }

    pub fn longest(&self) -> Option<&FinishedSession> {
        self.sessions.iter().max_by_key(|s| s.length())
    }

    /// Sessions oldest first.
    pub fn sorted(mut self) -> Self {
        self.sessions.sort_by_key(|s| s.start);
        self
    }

    pub fn into_sessions(self) -> Vec<FinishedSession> {
        self.sessions
    }
}

/// Reads across every per-server container of a player.
pub struct PerServerMutator<'a> {
    data: &'a PerServerContainer,
}

impl<'a> PerServerMutator<'a> {
    pub fn new(data: &'a PerServerContainer) -> Self {
        Self { data }
    }

    /// Sessions of every server, oldest first.
    pub fn flat_map_sessions(&self) -> Result<Vec<FinishedSession>> {
        let mut sessions = Vec::new();
        for (_, container) in self.data.iter() {
            if let Some(server_sessions) = container.get_value(&per_server::SESSIONS)? {
                sessions.extend(server_sessions.iter().cloned());
            }
        }
        Ok(SessionsMutator::new(sessions).sorted().into_sessions())
    }

    pub fn is_banned(&self) -> Result<bool> {
        self.any_flag(|container| container.get_value(&per_server::BANNED))
    }

    pub fn is_operator(&self) -> Result<bool> {
        self.any_flag(|container| container.get_value(&per_server::OPERATOR))
    }

    fn any_flag(&self, read: impl Fn(&DynamicDataContainer) -> Result<Option<Arc<bool>>>) -> Result<bool> {
        for (_, container) in self.data.iter() {
            if read(container)?.is_some_and(|flag| *flag) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn playtime_per_server(&self) -> Result<HashMap<Uuid, i64>> {
        let mut playtime = HashMap::new();
        for (server, container) in self.data.iter() {
            if let Some(value) = container.get_value(&per_server::PLAYTIME)? {
                playtime.insert(*server, *value);
            }
        }
        Ok(playtime)
    }

    /// Server with the most playtime.
    pub fn favorite_server(&self) -> Result<Option<Uuid>> {
        Ok(self
            .playtime_per_server()?
            .into_iter()
            .max_by_key(|(_, playtime)| *playtime)
            .map(|(server, _)| server))
    }
}
