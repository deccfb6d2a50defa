use std::collections::HashMap;

use playstat_db::{Database, Query};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::container::DynamicDataContainer;
use crate::error::Result;
use crate::key::{ContainerValue, Key};

/// One [`DynamicDataContainer`] per server a player has data on.
#[derive(Clone, Default)]
pub struct PerServerContainer {
    servers: HashMap<Uuid, DynamicDataContainer>,
}

impl PerServerContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value in the container of `server`, creating it if needed.
    pub fn put_to_container_of_server<T: ContainerValue>(
        &mut self,
        server: Uuid,
        key: Key<T>,
        value: impl Into<Option<T>>,
    ) {
        self.container_of_server_mut(server).put_raw_data(key, value);
    }

    /// The container of `server`, created empty if it does not exist yet.
    pub fn container_of_server_mut(&mut self, server: Uuid) -> &mut DynamicDataContainer {
        self.servers.entry(server).or_default()
    }

    /// The container of `server`, or an empty one for an unknown server.
    pub fn get_container_of(&self, server: &Uuid) -> DynamicDataContainer {
        self.servers.get(server).cloned().unwrap_or_default()
    }

    /// Fan per-server values out into the matching containers.
    pub fn put_matching_entries<T: ContainerValue>(&mut self, key: Key<T>, values: HashMap<Uuid, T>) {
        for (server, value) in values {
            self.put_to_container_of_server(server, key, value);
        }
    }

    /// Run a per-server query and fan its result out under `key`.
    pub fn matching_entry_set<T: ContainerValue>(
        &mut self,
        db: &Database,
        key: Key<T>,
        query: Query<HashMap<Uuid, T>>,
    ) -> Result<()> {
        let values = db.query_blocking(query)?;
        self.put_matching_entries(key, values);
        Ok(())
    }

    pub fn contains(&self, server: &Uuid) -> bool {
        self.servers.contains_key(server)
    }

    pub fn servers(&self) -> impl Iterator<Item = &Uuid> {
        self.servers.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &DynamicDataContainer)> {
        self.servers.iter()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

impl Serialize for PerServerContainer {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.servers.len()))?;
        for (server, container) in &self.servers {
            map.serialize_entry(&server.to_string(), container)?;
        }
        map.end()
    }
}
