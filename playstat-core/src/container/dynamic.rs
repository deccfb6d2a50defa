use std::time::Duration;

use serde::{Serialize, Serializer};

use super::{DataContainer, RawDataContainer, StoredValue, SupplierDataContainer, serialize_container};
use crate::error::Result;
use crate::key::{ContainerValue, Key};

/// Raw values and suppliers in one container.
///
/// A raw value wins over a supplier registered under the same key.
/// Clones share supplier caches but own their entry maps.
#[derive(Clone, Default)]
pub struct DynamicDataContainer {
    raw: RawDataContainer,
    suppliers: SupplierDataContainer,
}

impl DynamicDataContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_raw_data<T: ContainerValue>(&mut self, key: Key<T>, value: impl Into<Option<T>>) {
        self.raw.put_raw_data(key, value);
    }

    pub fn put_supplier<T, F>(&mut self, key: Key<T>, supplier: F)
    where
        T: ContainerValue,
        F: Fn(&dyn DataContainer) -> Result<Option<T>> + Send + Sync + 'static,
    {
        self.suppliers.put_supplier(key, supplier);
    }

    pub fn put_caching_supplier<T, F>(&mut self, key: Key<T>, supplier: F)
    where
        T: ContainerValue,
        F: Fn(&dyn DataContainer) -> Result<Option<T>> + Send + Sync + 'static,
    {
        self.suppliers.put_caching_supplier(key, supplier);
    }

    pub fn put_caching_supplier_with_ttl<T, F>(&mut self, key: Key<T>, supplier: F, ttl: Duration)
    where
        T: ContainerValue,
        F: Fn(&dyn DataContainer) -> Result<Option<T>> + Send + Sync + 'static,
    {
        self.suppliers.put_caching_supplier_with_ttl(key, supplier, ttl);
    }

    /// Merge `other` into this container. For every key `other` holds, its
    /// entry replaces whatever this container had, raw or supplier.
    pub fn put_all(&mut self, other: &DynamicDataContainer) {
        for (name, value) in other.raw.entries() {
            self.suppliers.remove(name);
            self.raw.insert(name, value.clone());
        }
        for (name, supplier) in other.suppliers.entries() {
            if !other.raw.supports_name(name) {
                self.raw.remove(name);
            }
            self.suppliers.insert(name, supplier.clone());
        }
    }

    /// Drop the entry under `key`, raw or supplier.
    pub fn remove<T>(&mut self, key: &Key<T>) {
        self.raw.remove(key.name());
        self.suppliers.remove(key.name());
    }
}

impl DataContainer for DynamicDataContainer {
    fn supports_name(&self, name: &str) -> bool {
        self.raw.supports_name(name) || self.suppliers.supports_name(name)
    }

    fn fetch(&self, name: &str) -> Result<Option<StoredValue>> {
        if self.raw.supports_name(name) {
            return self.raw.fetch(name);
        }
        self.suppliers.fetch_with_root(name, self)
    }

    fn key_names(&self) -> Vec<&'static str> {
        let mut names = self.raw.key_names();
        names.extend(
            self.suppliers
                .key_names()
                .into_iter()
                .filter(|name| !self.raw.supports_name(name)),
        );
        names
    }

    fn clear(&mut self) {
        self.raw.clear();
        self.suppliers.clear();
    }
}

impl Serialize for DynamicDataContainer {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_container(self, serializer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::container::ContainerExt;

    const NAME: Key<String> = Key::new("name");
    const NAME_LENGTH: Key<usize> = Key::new("name_length");
    const NESTED: Key<DynamicDataContainer> = Key::new("nested");

    #[test]
    fn test_raw_value_overrides_supplier() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut container = DynamicDataContainer::new();
        {
            let calls = calls.clone();
            container.put_supplier(NAME, move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Some("supplied".to_string()))
            });
        }
        container.put_raw_data(NAME, "raw".to_string());

        assert_eq!(container.get_unsafe(&NAME).unwrap().as_str(), "raw");
        assert_eq!(container.get_value(&NAME).unwrap().as_deref().map(String::as_str), Some("raw"));
        assert_eq!(container.key_names(), vec!["name"]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_merge_incoming_entries_win() {
        // GIVEN a container with a raw value and one with a supplier for the same key
        let mut base = DynamicDataContainer::new();
        base.put_raw_data(NAME, "old".to_string());
        let mut incoming = DynamicDataContainer::new();
        incoming.put_supplier(NAME, |_| Ok(Some("new".to_string())));

        // WHEN merging
        base.put_all(&incoming);

        // THEN the incoming supplier is what the key resolves to
        assert_eq!(base.get_unsafe(&NAME).unwrap().as_str(), "new");
    }

    #[test]
    fn test_merged_supplier_reads_from_merged_container() {
        let mut base = DynamicDataContainer::new();
        base.put_raw_data(NAME, "Notch".to_string());
        let mut incoming = DynamicDataContainer::new();
        incoming.put_supplier(NAME_LENGTH, |root| Ok(root.get_value(&NAME)?.map(|name| name.len())));

        base.put_all(&incoming);

        assert_eq!(*base.get_unsafe(&NAME_LENGTH).unwrap(), 5);
        assert!(incoming.get_value(&NAME_LENGTH).unwrap().is_none());
    }

    #[test]
    fn test_caching_supplier_instance_is_stable() {
        let mut container = DynamicDataContainer::new();
        container.put_caching_supplier(NAME, |_| Ok(Some("cached".to_string())));

        let first = container.get_value(&NAME).unwrap().unwrap();
        let second = container.get_value(&NAME).unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_nested_container_serializes_as_object() {
        let mut inner = DynamicDataContainer::new();
        inner.put_raw_data(NAME, "inner".to_string());
        let mut outer = DynamicDataContainer::new();
        outer.put_raw_data(NESTED, inner);
        outer.put_supplier(NAME_LENGTH, |_| Ok(None));

        let map = outer.map_to_normal_map().unwrap();

        assert_eq!(map["nested"]["name"], "inner");
        assert!(!map.contains_key("name_length"));
    }

    #[test]
    fn test_remove_drops_both_disciplines() {
        let mut container = DynamicDataContainer::new();
        container.put_raw_data(NAME, "raw".to_string());
        container.put_supplier(NAME, |_| Ok(Some("supplied".to_string())));

        container.remove(&NAME);

        assert!(!container.supports(&NAME));
    }
}
