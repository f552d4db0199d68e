// Error types for the level store and the HTTP boundary.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::levels::LevelId;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("Puzzle {0} does not exist.")]
    NotFound(LevelId),
    #[error("No puzzles available.")]
    NoLevels,
    #[error("IO error reading {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by request handlers. Each maps to one status code.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Holds the id as the client wrote it, which may not fit a `LevelId`.
    #[error("Puzzle {0} does not exist.")]
    NotFound(String),
    #[error("No puzzles available.")]
    NoLevels,
    #[error("{0}")]
    BadRequest(String),
    #[error("not modified")]
    NotModified,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<LevelError> for ApiError {
    fn from(e: LevelError) -> Self {
        match e {
            LevelError::NotFound(id) => ApiError::NotFound(id.to_string()),
            LevelError::NoLevels => ApiError::NoLevels,
            LevelError::Io { path, source } => {
                ApiError::Internal(format!("{}: {source}", path.display()))
            }
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) | ApiError::NoLevels => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotModified => StatusCode::NOT_MODIFIED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn json_error(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::NotModified => status.into_response(),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                json_error(status, "Internal server error")
            }
            other => json_error(status, &other.to_string()),
        }
    }
}
