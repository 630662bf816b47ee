//! Error types shared by the storage and domain layers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures talking to the remote file store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Timeout or connection failure
    #[error("Network error: {0}")]
    Network(String),

    /// The concurrency token no longer matches the stored version
    #[error("Conflicting write to {path}; reload and try again")]
    Conflict { path: String },

    /// Any other non-success response from the store
    #[error("Store responded with {status}: {message}")]
    Api { status: u16, message: String },

    /// The store answered with something we could not read
    #[error("Invalid response from store: {0}")]
    InvalidResponse(String),

    #[error("Failed to encode {path}: {source}")]
    Codec {
        path: String,
        #[source]
        source: CodecError,
    },
}

/// Malformed persisted content.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output was not valid UTF-8")]
    Utf8,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Song {0} has already been suggested")]
    DuplicateSong(String),

    #[error("Song {0} not found")]
    SongNotFound(String),

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Username {0} is already in use")]
    UserExists(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("You must be logged in")]
    Unauthorized,

    #[error("Administrator role required")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateSong(_) | Self::UserExists(_) => StatusCode::CONFLICT,
            Self::SongNotFound(_) | Self::UserNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidCredentials | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Store(StoreError::Conflict { .. }) => StatusCode::CONFLICT,
            Self::Store(StoreError::Network(_)) | Self::Store(StoreError::Api { .. }) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.as_status_code(), self.to_string()).into_response()
    }
}
