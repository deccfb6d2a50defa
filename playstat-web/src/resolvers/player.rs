use playstat_core::ContainerExt;
use playstat_core::queries::PlayerContainerQuery;
use playstat_db::epoch_millis;
use tracing::debug;

use super::json::player_json;
use super::{PlayerIdentifier, ResolverContext, can_see_player, find_player, json_response, redirect};
use crate::error::WebError;
use crate::request::Request;
use crate::resolver::Resolver;
use crate::response::Response;

/// `/player/<name|uuid>` and `/player/<uuid>/raw`.
///
/// Names redirect to the canonical UUID path. The raw variant serves every
/// key of the player container.
pub struct PlayerPageResolver {
    context: ResolverContext,
}

impl PlayerPageResolver {
    pub fn new(context: ResolverContext) -> Self {
        Self { context }
    }
}

impl Resolver for PlayerPageResolver {
    fn can_access(&self, request: &Request) -> bool {
        match request.path.part(0) {
            Some(identifier) => can_see_player(request, &self.context.db, identifier),
            None => true,
        }
    }

    fn resolve(&self, request: &Request) -> Result<Option<Response>, WebError> {
        let Some(identifier) = request.path.part(0) else {
            return Ok(None);
        };
        let raw = match (request.path.part(1), request.path.len()) {
            (None, 1) => false,
            (Some("raw"), 2) => true,
            _ => return Ok(None),
        };

        let uuid = match find_player(&self.context.db, identifier)? {
            None => return Ok(None),
            Some(PlayerIdentifier::Name(uuid)) => {
                let suffix = if raw { "/raw" } else { "" };
                return redirect(format!("/player/{uuid}{suffix}")).map(Some);
            }
            Some(PlayerIdentifier::Uuid(uuid)) => uuid,
        };

        debug!(%uuid, raw, "resolving player page");
        let player = PlayerContainerQuery::new(uuid).execute(&self.context.db, &self.context.sessions);
        let response = if raw {
            json_response(&player.map_to_normal_map()?)?
        } else {
            json_response(&player_json(&player, epoch_millis(), self.context.activity_threshold_ms)?)?
        };
        Ok(Some(response))
    }
}
