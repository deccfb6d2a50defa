//! The resolver tree behind every page and JSON route.

mod json;
mod player;
mod server;
mod static_files;
mod v1;

use std::path::PathBuf;
use std::sync::Arc;

use playstat_db::{Database, SessionCache, queries};
use serde::Serialize;
use uuid::Uuid;

use crate::cache::ResourceCache;
use crate::error::{ErrorResponse, WebError};
use crate::request::Request;
use crate::resolver::{CompositeResolver, NoAuthResolver, Resolver, RouteError};
use crate::response::Response;

pub use player::PlayerPageResolver;
pub use server::ServerPageResolver;
pub use static_files::StaticFileResolver;

/// Where resolvers get their data from.
#[derive(Clone)]
pub struct ResolverContext {
    pub db: Database,
    pub sessions: SessionCache,
    pub web_directory: PathBuf,
    pub resources: Arc<ResourceCache>,
    pub activity_threshold_ms: i64,
}

pub const PERMISSION_SERVER: &str = "page.server";
pub const PERMISSION_PLAYER_OTHER: &str = "page.player.other";
pub const PERMISSION_PLAYER_SELF: &str = "page.player.self";

/// Build the full tree:
///
/// ```text
/// /                  -> /v1/servers
/// /static/<file>
/// /player/<name|uuid>[/raw]
/// /server/<name|uuid>
/// /v1/{servers,players,player,serverOverview,sessions}
/// ```
pub fn build_resolver_tree(context: ResolverContext) -> Result<CompositeResolver, RouteError> {
    CompositeResolver::builder()
        .add("", NoAuthResolver::new(RootResolver))
        .add("static", NoAuthResolver::new(StaticFileResolver::new(context.clone())))
        .add("player", PlayerPageResolver::new(context.clone()))
        .add("server", ServerPageResolver::new(context.clone()))
        .add("v1", v1::build(context)?)
        .build()
}

/// Sends visitors of `/` to the server list.
pub struct RootResolver;

impl Resolver for RootResolver {
    fn can_access(&self, _request: &Request) -> bool {
        true
    }

    fn resolve(&self, request: &Request) -> Result<Option<Response>, WebError> {
        if !request.path.is_empty() {
            return Ok(None);
        }
        Ok(Some(Response::builder().redirect_to("/v1/servers").build()?))
    }
}

pub(crate) fn json_response<T: Serialize + ?Sized>(value: &T) -> Result<Response, WebError> {
    Ok(Response::builder().set_json_content(value)?.build()?)
}

pub(crate) fn bad_request(message: &str) -> Result<Response, WebError> {
    Ok(Response::builder()
        .set_status(400)
        .set_json_content(&ErrorResponse::new(message))?
        .build()?)
}

pub(crate) fn redirect(location: String) -> Result<Response, WebError> {
    Ok(Response::builder().redirect_to(location).build()?)
}

/// How a player was named in a URL or query parameter.
pub(crate) enum PlayerIdentifier {
    Uuid(Uuid),
    /// Known player addressed by name
    Name(Uuid),
}

impl PlayerIdentifier {
    pub(crate) fn uuid(&self) -> Uuid {
        match self {
            PlayerIdentifier::Uuid(uuid) | PlayerIdentifier::Name(uuid) => *uuid,
        }
    }
}

/// Look up a player by UUID or name. `None` when no such player was ever seen.
pub(crate) fn find_player(db: &Database, identifier: &str) -> Result<Option<PlayerIdentifier>, WebError> {
    match Uuid::parse_str(identifier) {
        Ok(uuid) => Ok(db
            .query_blocking(queries::users::fetch_base_user_of_player(uuid))?
            .map(|_| PlayerIdentifier::Uuid(uuid))),
        Err(_) => Ok(db
            .query_blocking(queries::users::fetch_player_uuid(identifier.to_string()))?
            .map(PlayerIdentifier::Name)),
    }
}

/// `page.player.other`, or `page.player.self` for the user's linked player.
pub(crate) fn can_see_player(request: &Request, db: &Database, identifier: &str) -> bool {
    if request.has_permission(PERMISSION_PLAYER_OTHER) {
        return true;
    }
    let Some(linked) = request.user.as_ref().and_then(|user| user.linked_uuid) else {
        return false;
    };
    if !request.has_permission(PERMISSION_PLAYER_SELF) {
        return false;
    }
    match find_player(db, identifier) {
        Ok(Some(player)) => player.uuid() == linked,
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(error = %e, "player lookup failed during permission check");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_redirects_to_server_list() {
        let response = RootResolver.resolve(&Request::new("GET", "/")).unwrap().unwrap();

        assert_eq!(response.status(), 302);
        assert_eq!(response.header("location"), Some("/v1/servers"));
        assert!(response.content().is_empty());
    }

    #[test]
    fn test_root_only_answers_empty_path() {
        assert!(RootResolver.resolve(&Request::new("GET", "/anything")).unwrap().is_none());
    }
}
