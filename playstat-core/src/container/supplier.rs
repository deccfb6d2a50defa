use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Serializer};

use super::{CachingSupplier, DataContainer, Producer, StoredValue, erase, serialize_container};
use crate::error::Result;
use crate::key::{ContainerValue, Key};

#[derive(Clone)]
pub(crate) enum Supplier {
    Plain(Producer),
    Caching(Arc<CachingSupplier<StoredValue>>),
}

impl Supplier {
    fn get(&self, root: &dyn DataContainer) -> Result<Option<StoredValue>> {
        match self {
            Supplier::Plain(producer) => producer(root),
            Supplier::Caching(supplier) => supplier.get(root),
        }
    }
}

/// Container whose values are produced on read.
///
/// Producers are shared between clones, so a caching supplier copied into
/// another container keeps a single cache.
#[derive(Clone, Default)]
pub struct SupplierDataContainer {
    suppliers: HashMap<&'static str, Supplier>,
}

impl SupplierDataContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a producer that runs on every read.
    pub fn put_supplier<T, F>(&mut self, key: Key<T>, supplier: F)
    where
        T: ContainerValue,
        F: Fn(&dyn DataContainer) -> Result<Option<T>> + Send + Sync + 'static,
    {
        self.suppliers.insert(key.name(), Supplier::Plain(erase(supplier)));
    }

    /// Register a producer whose result is kept for [`DEFAULT_TTL`](super::DEFAULT_TTL).
    pub fn put_caching_supplier<T, F>(&mut self, key: Key<T>, supplier: F)
    where
        T: ContainerValue,
        F: Fn(&dyn DataContainer) -> Result<Option<T>> + Send + Sync + 'static,
    {
        self.put_caching_supplier_with_ttl(key, supplier, super::DEFAULT_TTL);
    }

    pub fn put_caching_supplier_with_ttl<T, F>(&mut self, key: Key<T>, supplier: F, ttl: Duration)
    where
        T: ContainerValue,
        F: Fn(&dyn DataContainer) -> Result<Option<T>> + Send + Sync + 'static,
    {
        let producer = erase(supplier);
        let caching = CachingSupplier::with_ttl(move |root: &dyn DataContainer| producer(root), ttl);
        self.suppliers
            .insert(key.name(), Supplier::Caching(Arc::new(caching)));
    }

    /// Copy every producer of `other` into this container, replacing
    /// producers under the same key.
    pub fn put_all(&mut self, other: &SupplierDataContainer) {
        for (name, supplier) in &other.suppliers {
            self.suppliers.insert(name, supplier.clone());
        }
    }

    /// Run the producer under `name`, handing it `root` as the container to
    /// read dependencies from.
    pub(crate) fn fetch_with_root(&self, name: &str, root: &dyn DataContainer) -> Result<Option<StoredValue>> {
        match self.suppliers.get(name) {
            Some(supplier) => supplier.get(root),
            None => Ok(None),
        }
    }

    pub(crate) fn insert(&mut self, name: &'static str, supplier: Supplier) {
        self.suppliers.insert(name, supplier);
    }

    pub(crate) fn remove(&mut self, name: &str) {
        self.suppliers.remove(name);
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&'static str, &Supplier)> {
        self.suppliers.iter().map(|(name, supplier)| (*name, supplier))
    }

    pub fn len(&self) -> usize {
        self.suppliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suppliers.is_empty()
    }
}

impl DataContainer for SupplierDataContainer {
    fn supports_name(&self, name: &str) -> bool {
        self.suppliers.contains_key(name)
    }

    fn fetch(&self, name: &str) -> Result<Option<StoredValue>> {
        self.fetch_with_root(name, self)
    }

    fn key_names(&self) -> Vec<&'static str> {
        self.suppliers.keys().copied().collect()
    }

    fn clear(&mut self) {
        self.suppliers.clear();
    }
}

impl Serialize for SupplierDataContainer {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_container(self, serializer)
    }
}
