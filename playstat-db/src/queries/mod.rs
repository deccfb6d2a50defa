//! Read queries. Every function builds a [`Query`](crate::Query) that the
//! [`Database`](crate::Database) runs on its connection thread.
//!
//! Queries returning a `HashMap` keyed by UUID fetch one data kind for many
//! players or servers in a single statement, so callers can demultiplex the
//! result without issuing a query per entry.

pub mod extensions;
pub mod geo_info;
pub mod kills;
pub mod nicknames;
pub mod ping;
pub mod servers;
pub mod sessions;
pub mod tps;
pub mod users;
pub mod world_times;

use std::collections::HashMap;
use std::hash::Hash;

use tokio_rusqlite::rusqlite::{self, Row, types::Type};
use uuid::Uuid;

use crate::PlayerName;

/// Read a UUID stored as text.
pub(crate) fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
  let text: String = row.get(idx)?;
  Uuid::parse_str(&text)
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn player_name_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<PlayerName> {
  let text: String = row.get(idx)?;
  PlayerName::from(&text)
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e.simplify())))
}

/// Group `(key, value)` rows into lists, keeping row order inside each list.
pub(crate) fn group_rows<K: Eq + Hash, V>(
  rows: impl IntoIterator<Item = rusqlite::Result<(K, V)>>,
) -> rusqlite::Result<HashMap<K, Vec<V>>> {
  let mut grouped: HashMap<K, Vec<V>> = HashMap::new();
  for row in rows {
    let (key, value) = row?;
    grouped.entry(key).or_default().push(value);
  }
  Ok(grouped)
}
