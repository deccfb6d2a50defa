use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;

/// Anything a container can hold.
pub trait ContainerValue: Any + Serialize + Send + Sync {}

impl<T: Any + Serialize + Send + Sync> ContainerValue for T {}

/// Typed identifier of a container entry.
///
/// Containers index entries by name; the type parameter is checked when a
/// value is read back. Two keys are equal when both name and type match.
pub struct Key<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: 'static> Key<T> {
    pub fn type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T: 'static, U: 'static> PartialEq<Key<U>> for Key<T> {
    fn eq(&self, other: &Key<U>) -> bool {
        self.name == other.name && TypeId::of::<T>() == TypeId::of::<U>()
    }
}

impl<T: 'static> Eq for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({}: {})", self.name, std::any::type_name::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_equality_needs_name_and_type() {
        const A: Key<String> = Key::new("name");
        const B: Key<String> = Key::new("name");
        const C: Key<i32> = Key::new("name");
        const D: Key<String> = Key::new("other");

        assert_eq!(A, B);
        assert!(A != C);
        assert!(A != D);
    }
}
