use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use playstat_core::ContainerError;
use playstat_db::DbError;
use serde::Serialize;
use thiserror::Error;

use crate::resolver::RouteError;
use crate::response::InvalidResponseError;

/// API error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub error: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub details: Option<String>,
}

impl ErrorResponse {
  pub fn new(error: impl Into<String>) -> Self {
    Self {
      error: error.into(),
      details: None,
    }
  }

  pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
    Self {
      error: error.into(),
      details: Some(details.into()),
    }
  }
}

/// Failure while a resolver builds its response.
#[derive(Debug, Error)]
pub enum WebError {
  #[error(transparent)]
  Container(#[from] ContainerError),

  #[error(transparent)]
  Database(#[from] DbError),

  #[error(transparent)]
  InvalidResponse(#[from] InvalidResponseError),

  #[error("failed to serialize response: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("failed to read resource: {0}")]
  Io(#[from] std::io::Error),
}

/// Failure while assembling the router.
#[derive(Debug, Error)]
pub enum SetupError {
  #[error(transparent)]
  Route(#[from] RouteError),

  #[error("rate limit for {0} routes needs a non-zero rate and burst")]
  RateLimit(&'static str),
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
  DatabaseError(DbError),
  ValidationError(String),
  WebError(WebError),
  Unauthorized,
  Forbidden,
  NotFound,
  Internal(String),
}

fn internal_error() -> (StatusCode, &'static str) {
  (
    StatusCode::INTERNAL_SERVER_ERROR,
    "An internal error occurred. Please try again later.",
  )
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    match self {
      AppError::DatabaseError(db_err) => {
        // Return user-friendly error to client
        let (status, message) = match db_err {
          DbError::ServerNameConflict => (
            StatusCode::CONFLICT,
            "A server with this name already exists",
          ),
          DbError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "Invalid API key"),
          DbError::ServerNotFound => (StatusCode::NOT_FOUND, "Server not found"),
          DbError::UserNotFound => (StatusCode::NOT_FOUND, "Player not found on this server"),
          DbError::NoActiveSession => (StatusCode::NOT_FOUND, "Player has no active session"),
          DbError::Sqlite(_) | DbError::Connection(_) => {
            // Don't expose internal database errors
            tracing::error!("Internal database error: {:?}", db_err);
            internal_error()
          }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
      }
      AppError::ValidationError(msg) => {
        tracing::warn!(validation_error = %msg, "Validation failed");
        let error_response = ErrorResponse::new(msg);
        (StatusCode::BAD_REQUEST, Json(error_response)).into_response()
      }
      AppError::WebError(web_err) => {
        tracing::error!(error = %web_err, "Failed to resolve request");
        let (status, message) = internal_error();
        (status, Json(ErrorResponse::new(message))).into_response()
      }
      AppError::Unauthorized => (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Authentication required")),
      )
        .into_response(),
      AppError::Forbidden => (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse::new("You do not have permission to view this page")),
      )
        .into_response(),
      AppError::NotFound => (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found"))).into_response(),
      AppError::Internal(details) => {
        tracing::error!(%details, "Internal error");
        let (status, message) = internal_error();
        (status, Json(ErrorResponse::new(message))).into_response()
      }
    }
  }
}

impl From<DbError> for AppError {
  fn from(err: DbError) -> Self {
    AppError::DatabaseError(err)
  }
}

impl From<WebError> for AppError {
  fn from(err: WebError) -> Self {
    AppError::WebError(err)
  }
}

impl From<crate::validation::ValidationError> for AppError {
  fn from(err: crate::validation::ValidationError) -> Self {
    AppError::ValidationError(err.to_string())
  }
}
