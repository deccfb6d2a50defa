use playstat_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("unsupported key: {0}")]
    UnsupportedKey(String),

    #[error("value of key '{key}' is a {found}, not a {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("key '{0}' produced no value")]
    NoValue(String),

    #[error("storage query failed: {0}")]
    Storage(#[from] DbError),

    #[error("failed to serialize container: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ContainerError>;
