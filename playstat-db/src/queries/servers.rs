use tokio_rusqlite::rusqlite::{self, OptionalExtension, Row, params};

use super::uuid_at;
use crate::{Query, Server};

fn server(row: &Row<'_>) -> rusqlite::Result<Server> {
  Ok(Server {
    uuid: uuid_at(row, 0)?,
    name: row.get(1)?,
    is_proxy: row.get(2)?,
    registered: row.get(3)?,
  })
}

/// Find a server by UUID string or by exact name.
pub fn fetch_server_matching_identifier(identifier: String) -> Query<Option<Server>> {
  Query::new(move |conn| {
    conn
      .prepare_cached(
        r#"
        SELECT server_uuid, name, is_proxy, registered
        FROM servers
        WHERE server_uuid = ?1 OR name = ?1
        ORDER BY server_uuid = ?1 DESC
        LIMIT 1
        "#,
      )?
      .query_row(params![&identifier], server)
      .optional()
  })
}

pub fn fetch_all_servers() -> Query<Vec<Server>> {
  Query::new(|conn| {
    let mut stmt = conn
      .prepare_cached("SELECT server_uuid, name, is_proxy, registered FROM servers ORDER BY name")?;
    let servers = stmt
      .query_map([], server)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(servers)
  })
}
