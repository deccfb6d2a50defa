//! Fallback handler that runs every non-ingest request through the
//! resolver tree.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};

use crate::AppState;
use crate::error::{AppError, WebError};
use crate::helpers::{bearer_token, hash_api_key};
use crate::request::{Parameters, Request};
use crate::resolver::Resolver;

pub(crate) async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let path = uri.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let base = if trimmed.is_empty() { "/" } else { trimmed };
        let location = match uri.query() {
            Some(query) => format!("{base}?{query}"),
            None => base.to_string(),
        };
        let redirect = crate::response::Response::builder()
            .redirect_to(location)
            .build()
            .map_err(WebError::from)?;
        return Ok(redirect.into_response());
    }

    let user = match bearer_token(&headers) {
        Some(token) => state.db.get_web_user_by_token(hash_api_key(&token)).await?,
        None => None,
    };
    let request = Request::new(method.as_str(), path)
        .with_query(Parameters::new(params))
        .with_user(user);

    let resolver = Arc::clone(&state.resolver);
    let auth_required = state.auth_required;
    let response = tokio::task::spawn_blocking(move || resolve(resolver.as_ref(), &request, auth_required))
        .await
        .map_err(|e| AppError::Internal(format!("resolver task failed: {e}")))??;

    Ok(response.into_response())
}

fn resolve(
    resolver: &dyn Resolver,
    request: &Request,
    auth_required: bool,
) -> Result<crate::response::Response, AppError> {
    if auth_required && resolver.requires_auth(request) {
        let Some(user) = &request.user else {
            return Err(AppError::Unauthorized);
        };
        if !resolver.can_access(request) {
            tracing::warn!(username = %user.username, path = %request.path, "access denied");
            return Err(AppError::Forbidden);
        }
    }

    resolver.resolve(request)?.ok_or(AppError::NotFound)
}
