use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use snip_assign::{AssignError, ValidationError};
use snip_store::StoreError;
use snip_types::ErrorKind;
use thiserror::Error;

/// Errors from building or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("assignment error: {0}")]
    Assign(#[from] AssignError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// Per-request failure, rendered as a plain-text HTTP response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing url parameter")]
    MissingUrl,

    #[error("invalid url: {0}")]
    Validation(#[from] ValidationError),

    /// The path segment does not decode to a key.
    #[error("unknown identifier: {0}")]
    UnknownId(String),

    #[error(transparent)]
    Assign(#[from] AssignError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stored payload cannot be sent as a `Location` header.
    #[error("stored payload is not a valid redirect target")]
    BadTarget,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingUrl | Self::Validation(_) => ErrorKind::Validation,
            Self::UnknownId(_) => ErrorKind::KeyNotFound,
            Self::Assign(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::BadTarget => ErrorKind::Backend,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::KeyNotFound => StatusCode::NOT_FOUND,
            ErrorKind::DuplicateKey | ErrorKind::Backend | ErrorKind::AssignmentExhausted => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Backend details stay in the log.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, kind = %self.kind(), "request failed");
            match self.kind() {
                ErrorKind::AssignmentExhausted => "could not assign an identifier".to_string(),
                _ => "internal error".to_string(),
            }
        } else {
            self.to_string()
        };
        (status, message).into_response()
    }
}
