use std::ops::{Deref, DerefMut};

use serde::{Serialize, Serializer};

use crate::container::{DataContainer, DynamicDataContainer, StoredValue, serialize_container};
use crate::error::Result;

/// Everything known about one server, almost entirely behind caching
/// suppliers.
#[derive(Clone, Default)]
pub struct ServerContainer {
    container: DynamicDataContainer,
}

impl ServerContainer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Deref for ServerContainer {
    type Target = DynamicDataContainer;

    fn deref(&self) -> &Self::Target {
        &self.container
    }
}

impl DerefMut for ServerContainer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.container
    }
}

impl DataContainer for ServerContainer {
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
    }
}

impl Serialize for ServerContainer {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_container(self, serializer)
    }
}
