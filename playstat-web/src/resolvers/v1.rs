//! `/v1/*` JSON endpoints, addressed by query parameters.

use playstat_core::queries::{PlayerContainerQuery, ServerContainerQuery, ServerPlayerContainersQuery};
use playstat_db::{Server, epoch_millis, queries};

use super::json::{RECENT_SESSION_LIMIT, player_json, players_table_json, server_overview_json, sessions_json};
use super::{PERMISSION_SERVER, ResolverContext, bad_request, can_see_player, find_player, json_response};
use crate::error::WebError;
use crate::request::Request;
use crate::resolver::{CompositeResolver, Resolver, RouteError};
use crate::response::Response;

pub(super) fn build(context: ResolverContext) -> Result<CompositeResolver, RouteError> {
    CompositeResolver::builder()
        .add("servers", ServersJson { context: context.clone() })
        .add("players", ServerJson::new(context.clone(), ServerView::Players))
        .add("serverOverview", ServerJson::new(context.clone(), ServerView::Overview))
        .add("sessions", ServerJson::new(context.clone(), ServerView::Sessions))
        .add("player", PlayerJson { context })
        .build()
}

/// Every registered server.
struct ServersJson {
    context: ResolverContext,
}

impl Resolver for ServersJson {
    fn can_access(&self, request: &Request) -> bool {
        request.has_permission(PERMISSION_SERVER)
    }

    fn resolve(&self, request: &Request) -> Result<Option<Response>, WebError> {
        if !request.path.is_empty() {
            return Ok(None);
        }
        let servers = self.context.db.query_blocking(queries::servers::fetch_all_servers())?;
        Ok(Some(json_response(&servers)?))
    }
}

#[derive(Clone, Copy)]
enum ServerView {
    Players,
    Overview,
    Sessions,
}

/// Data of the server named by `?server=<name|uuid>`.
struct ServerJson {
    context: ResolverContext,
    view: ServerView,
}

impl ServerJson {
    fn new(context: ResolverContext, view: ServerView) -> Self {
        Self { context, view }
    }

    fn find_server(&self, identifier: &str) -> Result<Option<Server>, WebError> {
        Ok(self
            .context
            .db
            .query_blocking(queries::servers::fetch_server_matching_identifier(identifier.to_string()))?)
    }
}

impl Resolver for ServerJson {
    fn can_access(&self, request: &Request) -> bool {
        request.has_permission(PERMISSION_SERVER)
    }

    fn resolve(&self, request: &Request) -> Result<Option<Response>, WebError> {
        if !request.path.is_empty() {
            return Ok(None);
        }
        let Some(identifier) = request.query.get("server") else {
            return bad_request("Missing 'server' parameter").map(Some);
        };
        let Some(server) = self.find_server(identifier)? else {
            return Ok(None);
        };

        let db = &self.context.db;
        let sessions = &self.context.sessions;
        let json = match self.view {
            ServerView::Players => {
                let players = ServerPlayerContainersQuery::new(server.uuid).execute(db, sessions)?;
                players_table_json(&players, epoch_millis(), self.context.activity_threshold_ms)?
            }
            ServerView::Overview => server_overview_json(&ServerContainerQuery::new(server.uuid).execute(db, sessions))?,
            ServerView::Sessions => sessions_json(
                &ServerContainerQuery::new(server.uuid).execute(db, sessions),
                RECENT_SESSION_LIMIT,
            )?,
        };
        Ok(Some(json_response(&json)?))
    }
}

/// Data of the player named by `?player=<name|uuid>`.
struct PlayerJson {
    context: ResolverContext,
}

impl Resolver for PlayerJson {
    fn can_access(&self, request: &Request) -> bool {
        match request.query.get("player") {
            Some(identifier) => can_see_player(request, &self.context.db, identifier),
            None => true,
        }
    }

    fn resolve(&self, request: &Request) -> Result<Option<Response>, WebError> {
        if !request.path.is_empty() {
            return Ok(None);
        }
        let Some(identifier) = request.query.get("player") else {
            return bad_request("Missing 'player' parameter").map(Some);
        };
        let Some(player) = find_player(&self.context.db, identifier)? else {
            return Ok(None);
        };

        let data = PlayerContainerQuery::new(player.uuid()).execute(&self.context.db, &self.context.sessions);
        let json = player_json(&data, epoch_millis(), self.context.activity_threshold_ms)?;
        Ok(Some(json_response(&json)?))
    }
}
