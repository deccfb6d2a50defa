use tokio_rusqlite::rusqlite::{self, params};
use uuid::Uuid;

use crate::{ExtensionValue, Query};

pub fn fetch_extension_data_of_server(server_uuid: Uuid) -> Query<Vec<ExtensionValue>> {
  Query::new(move |conn| {
    let mut stmt = conn.prepare_cached(
      "SELECT provider, name, value FROM extension_data WHERE server_uuid = ?1 ORDER BY provider, name",
    )?;
    let values = stmt
      .query_map(params![server_uuid.to_string()], |row| {
        Ok(ExtensionValue {
          provider: row.get(0)?,
          name: row.get(1)?,
          value: row.get(2)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(values)
  })
}
