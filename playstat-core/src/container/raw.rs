use std::collections::HashMap;

use serde::{Serialize, Serializer};

use super::{DataContainer, StoredValue, serialize_container};
use crate::error::Result;
use crate::key::{ContainerValue, Key};

/// Container whose values are stored eagerly.
#[derive(Clone, Default)]
pub struct RawDataContainer {
    values: HashMap<&'static str, StoredValue>,
}

impl RawDataContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value. `None` leaves the container untouched.
    pub fn put_raw_data<T: ContainerValue>(&mut self, key: Key<T>, value: impl Into<Option<T>>) {
        if let Some(value) = value.into() {
            self.values.insert(key.name(), StoredValue::new(value));
        }
    }

    /// Copy every value of `other` into this container, replacing values
    /// under the same key.
    pub fn put_all(&mut self, other: &RawDataContainer) {
        for (name, value) in &other.values {
            self.values.insert(name, value.clone());
        }
    }

    pub(crate) fn insert(&mut self, name: &'static str, value: StoredValue) {
        self.values.insert(name, value);
    }

    pub(crate) fn remove(&mut self, name: &str) {
        self.values.remove(name);
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&'static str, &StoredValue)> {
        self.values.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl DataContainer for RawDataContainer {
    fn supports_name(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn fetch(&self, name: &str) -> Result<Option<StoredValue>> {
        Ok(self.values.get(name).cloned())
    }

    fn key_names(&self) -> Vec<&'static str> {
        self.values.keys().copied().collect()
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

impl Serialize for RawDataContainer {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_container(self, serializer)
    }
}
