//! Typed data containers for player analytics.
//!
//! [`Key`]s address values in a [`DataContainer`]; the domain containers
//! ([`PlayerContainer`], [`ServerContainer`], [`PerServerContainer`]) are
//! filled by the [`queries`] with suppliers that hit the database only when
//! their key is read.

mod activity;
mod container;
mod error;
mod key;
pub mod keys;
pub mod mutators;
mod per_server;
mod player;
pub mod queries;
mod server;

pub use activity::{ActivityGroup, ActivityIndex};
pub use container::{
    CachingSupplier, ContainerExt, DEFAULT_TTL, DataContainer, DynamicDataContainer, RawDataContainer, StoredValue,
    SupplierDataContainer,
};
pub use error::{ContainerError, Result};
pub use key::{ContainerValue, Key};
pub use per_server::PerServerContainer;
pub use player::PlayerContainer;
pub use server::ServerContainer;
