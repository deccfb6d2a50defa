use crate::error::AppError;
use crate::helpers::{generate_api_key, hash_api_key};
use crate::validation;
use crate::AppState;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::TypedHeader;
use axum_macros::debug_handler;
use headers::authorization::Bearer;
use headers::Authorization;
use playstat_db::{
    epoch_millis, ActiveSession, DbError, ExtensionValue, GeoInfo, Nickname, Ping, PlayerKill, Server, TpsEntry,
    WebUser,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Deserialize)]
pub(crate) struct ConnectRequest {
    name: String,
    #[serde(default)]
    proxy: bool,
}

#[derive(Serialize)]
pub(crate) struct ConnectResponse {
    server_uuid: Uuid,
    api_key: String,
}

#[derive(Deserialize)]
pub(crate) struct WebUserRequest {
    username: String,
    token: String,
    permissions: Vec<String>,
    linked_uuid: Option<Uuid>,
}

#[derive(Deserialize)]
pub(crate) struct JoinRequest {
    uuid: Uuid,
    name: String,
    join_address: Option<String>,
    geolocation: Option<String>,
    nickname: Option<String>,
    world: String,
    gamemode: String,
}

#[derive(Deserialize)]
pub(crate) struct PlayerRequest {
    uuid: Uuid,
}

#[derive(Deserialize)]
pub(crate) struct WorldRequest {
    uuid: Uuid,
    world: String,
    gamemode: String,
}

#[derive(Deserialize)]
pub(crate) struct KillRequest {
    killer: Uuid,
    /// Absent for mob kills
    victim: Option<Uuid>,
    weapon: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct AfkRequest {
    uuid: Uuid,
    afk_ms: i64,
}

#[derive(Deserialize)]
pub(crate) struct StatusRequest {
    uuid: Uuid,
    banned: Option<bool>,
    operator: Option<bool>,
    #[serde(default)]
    kicked: bool,
}

#[derive(Deserialize)]
pub(crate) struct TpsRequest {
    tps: f64,
    players_online: i32,
    cpu_usage: f64,
    ram_usage: i64,
    entities: i32,
    chunks_loaded: i32,
}

#[derive(Deserialize)]
pub(crate) struct PingRequest {
    uuid: Uuid,
    min: i32,
    max: i32,
    avg: f64,
}

#[derive(Deserialize)]
pub(crate) struct ExtensionRequest {
    provider: String,
    name: String,
    value: String,
}

/// The server whose API key was presented.
async fn authenticate_server(state: &AppState, auth: &Authorization<Bearer>) -> Result<Server, AppError> {
    let api_key_hash = hash_api_key(auth.token());

    state
        .db
        .get_server_by_api_key(api_key_hash)
        .await?
        .ok_or(AppError::DatabaseError(DbError::InvalidApiKey))
}

fn authenticate_admin(state: &AppState, auth: &Authorization<Bearer>) -> Result<(), AppError> {
    match &state.admin_token {
        Some(token) if token == auth.token() => Ok(()),
        _ => Err(AppError::Unauthorized),
    }
}

#[debug_handler]
pub(crate) async fn connect(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(payload): Json<ConnectRequest>,
) -> Result<impl IntoResponse, AppError> {
    authenticate_admin(&state, &auth)?;
    validation::validate_server_name(&payload.name)?;

    let api_key = generate_api_key();
    let server = state
        .db
        .register_server(
            Uuid::new_v4(),
            payload.name,
            payload.proxy,
            hash_api_key(&api_key),
            epoch_millis(),
        )
        .await?;

    tracing::info!(server = %server.uuid, name = %server.name, "server connected");
    Ok((
        StatusCode::CREATED,
        Json(ConnectResponse {
            server_uuid: server.uuid,
            api_key,
        }),
    ))
}

#[debug_handler]
pub(crate) async fn register_web_user(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(payload): Json<WebUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    authenticate_admin(&state, &auth)?;
    validation::validate_text("username", &payload.username)?;
    validation::validate_token(&payload.token)?;
    validation::validate_permissions(&payload.permissions)?;

    let token_hash = hash_api_key(&payload.token);
    state
        .db
        .register_web_user(
            WebUser {
                username: payload.username,
                linked_uuid: payload.linked_uuid,
                permissions: payload.permissions,
            },
            token_hash,
        )
        .await?;

    Ok(StatusCode::CREATED)
}

#[debug_handler]
pub(crate) async fn join(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(payload): Json<JoinRequest>,
) -> Result<impl IntoResponse, AppError> {
    validation::validate_player_name(&payload.name)?;
    validation::validate_text("world", &payload.world)?;
    validation::validate_text("gamemode", &payload.gamemode)?;
    if let Some(nickname) = &payload.nickname {
        validation::validate_text("nickname", nickname)?;
    }

    let server = authenticate_server(&state, &auth).await?;
    let now = epoch_millis();

    state.db.register_user(payload.uuid, payload.name, now).await?;
    state
        .db
        .register_user_on_server(payload.uuid, server.uuid, now, payload.join_address)
        .await?;
    if let Some(geolocation) = payload.geolocation {
        state
            .db
            .store_geo_info(payload.uuid, GeoInfo { geolocation, date: now })
            .await?;
    }
    if let Some(name) = payload.nickname {
        state
            .db
            .store_nickname(
                payload.uuid,
                Nickname {
                    name,
                    date: now,
                    server_uuid: server.uuid,
                },
            )
            .await?;
    }

    let mut session = ActiveSession::new(payload.uuid, server.uuid, now);
    session.change_world(&payload.world, &payload.gamemode, now);
    if let Some(previous) = state.sessions.start_session(session) {
        // The player never left; close the old session where the new one starts
        tracing::warn!(player = %payload.uuid, "replacing session that was never ended");
        state.db.store_session(previous.to_finished_session(now)).await?;
    }

    Ok(StatusCode::OK)
}

pub(crate) async fn leave(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(payload): Json<PlayerRequest>,
) -> Result<impl IntoResponse, AppError> {
    authenticate_server(&state, &auth).await?;

    let session = state
        .sessions
        .end_session(&payload.uuid, epoch_millis())
        .ok_or(DbError::NoActiveSession)?;
    state.db.store_session(session).await?;

    Ok(StatusCode::OK)
}

pub(crate) async fn world(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(payload): Json<WorldRequest>,
) -> Result<impl IntoResponse, AppError> {
    validation::validate_text("world", &payload.world)?;
    validation::validate_text("gamemode", &payload.gamemode)?;
    authenticate_server(&state, &auth).await?;

    if !state
        .sessions
        .change_world(&payload.uuid, &payload.world, &payload.gamemode, epoch_millis())
    {
        return Err(DbError::NoActiveSession.into());
    }

    Ok(StatusCode::OK)
}

pub(crate) async fn kill(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(payload): Json<KillRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(weapon) = &payload.weapon {
        validation::validate_text("weapon", weapon)?;
    }
    let server = authenticate_server(&state, &auth).await?;

    let recorded = match payload.victim {
        None => state.sessions.record_mob_kill(&payload.killer),
        Some(victim) => {
            // The victim may have no session (e.g. killed while joining)
            state.sessions.record_death(&victim);
            state.sessions.record_player_kill(PlayerKill {
                killer: payload.killer,
                victim,
                server_uuid: server.uuid,
                weapon: payload.weapon.unwrap_or_else(|| "Unknown".to_string()),
                date: epoch_millis(),
            })
        }
    };
    if !recorded {
        return Err(DbError::NoActiveSession.into());
    }

    Ok(StatusCode::OK)
}

pub(crate) async fn afk(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(payload): Json<AfkRequest>,
) -> Result<impl IntoResponse, AppError> {
    authenticate_server(&state, &auth).await?;

    if !state.sessions.add_afk_time(&payload.uuid, payload.afk_ms) {
        return Err(DbError::NoActiveSession.into());
    }

    Ok(StatusCode::OK)
}

pub(crate) async fn status(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(payload): Json<StatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let server = authenticate_server(&state, &auth).await?;

    if let Some(banned) = payload.banned {
        state.db.set_banned(payload.uuid, server.uuid, banned).await?;
    }
    if let Some(operator) = payload.operator {
        state.db.set_operator(payload.uuid, server.uuid, operator).await?;
    }
    if payload.kicked {
        state.db.increment_kick_count(payload.uuid).await?;
    }

    Ok(StatusCode::OK)
}

pub(crate) async fn tps(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(payload): Json<TpsRequest>,
) -> Result<impl IntoResponse, AppError> {
    validation::validate_tps(
        payload.tps,
        payload.players_online,
        payload.entities,
        payload.chunks_loaded,
    )?;
    let server = authenticate_server(&state, &auth).await?;

    state
        .db
        .store_tps(
            server.uuid,
            TpsEntry {
                date: epoch_millis(),
                tps: payload.tps,
                players_online: payload.players_online,
                cpu_usage: payload.cpu_usage,
                ram_usage: payload.ram_usage,
                entities: payload.entities,
                chunks_loaded: payload.chunks_loaded,
            },
        )
        .await?;

    Ok(StatusCode::OK)
}

pub(crate) async fn ping(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(payload): Json<PingRequest>,
) -> Result<impl IntoResponse, AppError> {
    validation::validate_ping(payload.min, payload.max, payload.avg)?;
    let server = authenticate_server(&state, &auth).await?;

    state
        .db
        .store_ping(
            payload.uuid,
            Ping {
                server_uuid: server.uuid,
                date: epoch_millis(),
                min: payload.min,
                max: payload.max,
                avg: payload.avg,
            },
        )
        .await?;

    Ok(StatusCode::OK)
}

pub(crate) async fn extension(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(payload): Json<ExtensionRequest>,
) -> Result<impl IntoResponse, AppError> {
    validation::validate_text("provider", &payload.provider)?;
    validation::validate_text("name", &payload.name)?;
    validation::validate_text("value", &payload.value)?;
    let server = authenticate_server(&state, &auth).await?;

    state
        .db
        .store_extension_value(
            server.uuid,
            ExtensionValue {
                provider: payload.provider,
                name: payload.name,
                value: payload.value,
            },
        )
        .await?;

    Ok(StatusCode::OK)
}
