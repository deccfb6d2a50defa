//! Typed, lazily evaluated key/value containers.
//!
//! A container maps [`Key`]s to values stored under one of three
//! disciplines:
//!
//! - raw: the value is stored eagerly ([`RawDataContainer`]),
//! - supplier: a producer runs on every read ([`SupplierDataContainer`]),
//! - caching supplier: a producer whose result is kept for a time-to-live
//!   ([`CachingSupplier`]).
//!
//! [`DynamicDataContainer`] combines the first two containers and is what
//! the domain containers build on. Producers receive the container they are
//! read through, so a producer depending on another key reads it with the
//! normal accessors and shares that key's caching.

mod caching;
mod dynamic;
mod raw;
mod supplier;

pub use caching::{CachingSupplier, DEFAULT_TTL};
pub use dynamic::DynamicDataContainer;
pub use raw::RawDataContainer;
pub use supplier::SupplierDataContainer;

use std::any::{Any, type_name};
use std::sync::Arc;

use serde::Serializer;
use serde_json::{Map, Value};

use crate::error::{ContainerError, Result};
use crate::key::{ContainerValue, Key};

type AnyValue = dyn Any + Send + Sync;

/// A type-erased value together with what is needed to inspect it later.
#[derive(Clone)]
pub struct StoredValue {
    value: Arc<AnyValue>,
    type_name: &'static str,
    to_json: fn(&AnyValue) -> serde_json::Result<Value>,
}

impl StoredValue {
    pub fn new<T: ContainerValue>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
            to_json: json_of::<T>,
        }
    }

    /// The stored value if it is a `T`.
    pub fn downcast<T: ContainerValue>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn to_json(&self) -> serde_json::Result<Value> {
        (self.to_json)(self.value.as_ref())
    }
}

fn json_of<T: ContainerValue>(value: &AnyValue) -> serde_json::Result<Value> {
    match value.downcast_ref::<T>() {
        Some(value) => serde_json::to_value(value),
        None => Err(serde::ser::Error::custom(format!(
            "stored value is not a {}",
            type_name::<T>()
        ))),
    }
}

/// Producer as stored in a supplier container.
pub(crate) type Producer = Arc<dyn Fn(&dyn DataContainer) -> Result<Option<StoredValue>> + Send + Sync>;

/// Wrap a typed producer so it can be stored next to producers of other types.
pub(crate) fn erase<T, F>(supplier: F) -> Producer
where
    T: ContainerValue,
    F: Fn(&dyn DataContainer) -> Result<Option<T>> + Send + Sync + 'static,
{
    Arc::new(move |container: &dyn DataContainer| -> Result<Option<StoredValue>> {
        Ok(supplier(container)?.map(StoredValue::new))
    })
}

/// Storage side of a container, on type-erased entries.
///
/// Reads go through [`ContainerExt`], which every container gets for free.
pub trait DataContainer: Send + Sync {
    /// Whether an entry (value or producer) is registered under `name`.
    fn supports_name(&self, name: &str) -> bool;

    /// Evaluate the entry under `name`. `Ok(None)` when there is no entry
    /// or its producer yielded nothing.
    fn fetch(&self, name: &str) -> Result<Option<StoredValue>>;

    /// Names of every registered entry.
    fn key_names(&self) -> Vec<&'static str>;

    /// Remove every entry.
    fn clear(&mut self);
}

/// Typed accessors over [`DataContainer`].
pub trait ContainerExt: DataContainer {
    /// True iff [`get_unsafe`](ContainerExt::get_unsafe) would not fail
    /// with [`ContainerError::UnsupportedKey`].
    fn supports<T>(&self, key: &Key<T>) -> bool {
        self.supports_name(key.name())
    }

    /// Read a value, degrading to `None` when the key is unsupported, the
    /// producer yielded nothing or the stored value is not a `T`. Only
    /// storage failures raised by a producer are returned as errors.
    fn get_value<T: ContainerValue>(&self, key: &Key<T>) -> Result<Option<Arc<T>>> {
        Ok(self
            .fetch(key.name())?
            .and_then(|stored| stored.downcast::<T>()))
    }

    /// Read a value that must be present and of the expected type.
    fn get_unsafe<T: ContainerValue>(&self, key: &Key<T>) -> Result<Arc<T>> {
        if !self.supports(key) {
            return Err(ContainerError::UnsupportedKey(key.name().to_string()));
        }
        let stored = self
            .fetch(key.name())?
            .ok_or_else(|| ContainerError::NoValue(key.name().to_string()))?;
        stored
            .downcast::<T>()
            .ok_or_else(|| ContainerError::TypeMismatch {
                key: key.name().to_string(),
                expected: type_name::<T>(),
                found: stored.type_name(),
            })
    }

    /// Evaluate every entry and unwrap the container into plain JSON keyed
    /// by key name. Nested containers become nested objects.
    fn map_to_normal_map(&self) -> Result<Map<String, Value>> {
        let mut map = Map::new();
        for name in self.key_names() {
            if let Some(stored) = self.fetch(name)? {
                map.insert(name.to_string(), stored.to_json()?);
            }
        }
        Ok(map)
    }
}

impl<C: DataContainer + ?Sized> ContainerExt for C {}

/// Serialize a container as its normal map.
pub(crate) fn serialize_container<C, S>(container: &C, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    C: DataContainer + ?Sized,
    S: Serializer,
{
    use serde::Serialize;
    use serde::ser::Error;

    container
        .map_to_normal_map()
        .map_err(S::Error::custom)?
        .serialize(serializer)
}
