use std::ops::{Deref, DerefMut};

use serde::{Serialize, Serializer};

use crate::activity::ActivityIndex;
use crate::container::{ContainerExt, DataContainer, DynamicDataContainer, StoredValue, serialize_container};
use crate::error::Result;
use crate::keys::player;

/// Everything known about one player.
///
/// Activity indexes are computed from [`player::SESSIONS`] and kept for the
/// lifetime of the container, one per (date, threshold) pair.
#[derive(Default)]
pub struct PlayerContainer {
    container: DynamicDataContainer,
    activity_indexes: scc::HashMap<(i64, i64), ActivityIndex>,
}

impl PlayerContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_activity_index(&self, date: i64, threshold_ms: i64) -> Result<ActivityIndex> {
        if let Some(index) = self
            .activity_indexes
            .read_sync(&(date, threshold_ms), |_, index| *index)
        {
            return Ok(index);
        }

        let sessions = self.get_value(&player::SESSIONS)?.unwrap_or_default();
        let index = ActivityIndex::new(&sessions, date, threshold_ms);
        let _ = self.activity_indexes.insert_sync((date, threshold_ms), index);
        Ok(index)
    }
}

impl Deref for PlayerContainer {
    type Target = DynamicDataContainer;

    fn deref(&self) -> &Self::Target {
        &self.container
    }
}

impl DerefMut for PlayerContainer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.container
    }
}

impl DataContainer for PlayerContainer {
    fn supports_name(&self, name: &str) -> bool {
        self.container.supports_name(name)
    }

    fn fetch(&self, name: &str) -> Result<Option<StoredValue>> {
        self.container.fetch(name)
    }

    fn key_names(&self) -> Vec<&'static str> {
        self.container.key_names()
    }

    fn clear(&mut self) {
        self.container.clear();
        self.activity_indexes.clear_sync();
    }
}

impl Serialize for PlayerContainer {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_container(self, serializer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use playstat_db::{FinishedSession, WorldTimes};
    use uuid::Uuid;

    use super::*;

    fn session(end: i64) -> FinishedSession {
        FinishedSession {
            id: None,
            player_uuid: Uuid::nil(),
            server_uuid: Uuid::nil(),
            start: end - 3_600_000,
            end,
            afk_time: 0,
            mob_kills: 0,
            deaths: 0,
            world_times: WorldTimes::new(),
            player_kills: Vec::new(),
        }
    }

    #[test]
    fn test_activity_index_is_memoized_per_pair() {
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = reads.clone();
        let mut container = PlayerContainer::new();
        container.put_supplier(player::SESSIONS, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Some(vec![session(1_000_000_000)]))
        });

        let first = container.get_activity_index(1_000_000_000, 1_800_000).unwrap();
        let again = container.get_activity_index(1_000_000_000, 1_800_000).unwrap();
        let other = container.get_activity_index(1_000_000_000, 3_600_000).unwrap();

        assert_eq!(first, again);
        assert!(other.value() < first.value());
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_missing_sessions_is_inactive() {
        let container = PlayerContainer::new();

        let index = container.get_activity_index(0, 1_800_000).unwrap();

        assert_eq!(index.value(), 0.0);
    }
}
