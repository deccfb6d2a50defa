/// Input validation functions for all ingest and admin routes
use thiserror::Error;

/// Permissions a web user can be granted.
pub const PERMISSIONS: [&str; 3] = ["page.server", "page.player.other", "page.player.self"];

const MAX_TEXT_LEN: usize = 100;
const MIN_TOKEN_LEN: usize = 16;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Player name cannot be empty")]
    PlayerNameEmpty,

    #[error("Player name too long (max 16 characters, got {0})")]
    PlayerNameTooLong(usize),

    #[error("Player name contains invalid characters (only alphanumeric and underscore allowed)")]
    PlayerNameInvalidChars,

    #[error("Server name cannot be empty")]
    ServerNameEmpty,

    #[error("Server name too long (max 100 characters, got {0})")]
    ServerNameTooLong(usize),

    #[error("Server name cannot contain '/'")]
    ServerNameInvalidChars,

    #[error("{field} cannot be empty")]
    FieldEmpty { field: &'static str },

    #[error("{field} too long (max 100 characters, got {actual})")]
    FieldTooLong { field: &'static str, actual: usize },

    #[error("Web user token too short (min 16 characters)")]
    TokenTooShort,

    #[error("Unknown permission '{0}'")]
    UnknownPermission(String),

    #[error("Ping values must satisfy 0 <= min <= avg <= max")]
    InvalidPing,

    #[error("Server performance values cannot be negative")]
    InvalidTps,
}

/// Validates a Minecraft player name
///
/// Rules:
/// - Cannot be empty
/// - Max 16 characters (Minecraft username limit)
/// - Only alphanumeric characters and underscores
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::PlayerNameEmpty);
    }

    if name.len() > 16 {
        return Err(ValidationError::PlayerNameTooLong(name.len()));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::PlayerNameInvalidChars);
    }

    Ok(())
}

/// Validates a server name
///
/// Server names become URL segments, so they cannot contain '/'.
pub fn validate_server_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::ServerNameEmpty);
    }

    if name.len() > MAX_TEXT_LEN {
        return Err(ValidationError::ServerNameTooLong(name.len()));
    }

    if name.contains('/') {
        return Err(ValidationError::ServerNameInvalidChars);
    }

    Ok(())
}

/// Validates free text such as world names, weapons or extension values
pub fn validate_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::FieldEmpty { field });
    }

    if value.len() > MAX_TEXT_LEN {
        return Err(ValidationError::FieldTooLong {
            field,
            actual: value.len(),
        });
    }

    Ok(())
}

pub fn validate_token(token: &str) -> Result<(), ValidationError> {
    if token.len() < MIN_TOKEN_LEN {
        return Err(ValidationError::TokenTooShort);
    }

    Ok(())
}

pub fn validate_permissions(permissions: &[String]) -> Result<(), ValidationError> {
    match permissions
        .iter()
        .find(|permission| !PERMISSIONS.contains(&permission.as_str()))
    {
        Some(unknown) => Err(ValidationError::UnknownPermission(unknown.clone())),
        None => Ok(()),
    }
}

pub fn validate_ping(min: i32, max: i32, avg: f64) -> Result<(), ValidationError> {
    if min < 0 || min > max || avg < f64::from(min) || avg > f64::from(max) {
        return Err(ValidationError::InvalidPing);
    }

    Ok(())
}

pub fn validate_tps(tps: f64, players_online: i32, entities: i32, chunks_loaded: i32) -> Result<(), ValidationError> {
    if tps < 0.0 || players_online < 0 || entities < 0 || chunks_loaded < 0 {
        return Err(ValidationError::InvalidTps);
    }

    Ok(())
}
