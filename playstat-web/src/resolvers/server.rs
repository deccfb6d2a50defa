use playstat_core::queries::ServerContainerQuery;
use playstat_db::queries;
use tracing::debug;

use super::json::server_overview_json;
use super::{PERMISSION_SERVER, ResolverContext, json_response, redirect};
use crate::error::WebError;
use crate::request::Request;
use crate::resolver::Resolver;
use crate::response::Response;

/// `/server/<name|uuid>`. Names redirect to the canonical UUID path.
pub struct ServerPageResolver {
    context: ResolverContext,
}

impl ServerPageResolver {
    pub fn new(context: ResolverContext) -> Self {
        Self { context }
    }
}

impl Resolver for ServerPageResolver {
    fn can_access(&self, request: &Request) -> bool {
        request.has_permission(PERMISSION_SERVER)
    }

    fn resolve(&self, request: &Request) -> Result<Option<Response>, WebError> {
        let (Some(identifier), 1) = (request.path.part(0), request.path.len()) else {
            return Ok(None);
        };

        let Some(server) = self
            .context
            .db
            .query_blocking(queries::servers::fetch_server_matching_identifier(identifier.to_string()))?
        else {
            return Ok(None);
        };
        if server.uuid.to_string() != identifier {
            return redirect(format!("/server/{}", server.uuid)).map(Some);
        }

        debug!(server = %server.uuid, "resolving server page");
        let data = ServerContainerQuery::new(server.uuid).execute(&self.context.db, &self.context.sessions);
        Ok(Some(json_response(&server_overview_json(&data)?)?))
    }
}
