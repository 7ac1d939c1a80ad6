//! services/api/src/web/error.rs
//!
//! How handler failures reach the UI: a status code and a message it can show.

use axum::{http::StatusCode, Json};
use datum_core::errors::{AuthError, RemoteFetchError, SaveError, UploadError};
use serde::Serialize;
use utoipa::ToSchema;

/// The body of every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub type HandlerError = (StatusCode, Json<ErrorResponse>);
pub type HandlerResult<T> = Result<T, HandlerError>;

pub fn fail(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

impl From<AuthError> for ErrorResponse {
    fn from(err: AuthError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

pub fn auth_failure(err: AuthError) -> HandlerError {
    let status = match err {
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::WeakPassword | AuthError::Provider(_) => StatusCode::BAD_REQUEST,
        AuthError::Unexpected => StatusCode::BAD_GATEWAY,
    };
    (status, Json(err.into()))
}

pub fn fetch_failure(err: RemoteFetchError) -> HandlerError {
    if err.not_found {
        fail(StatusCode::NOT_FOUND, "Book not found.")
    } else {
        fail(StatusCode::BAD_GATEWAY, err.to_string())
    }
}

pub fn upload_failure(err: UploadError) -> HandlerError {
    fail(StatusCode::BAD_GATEWAY, err.to_string())
}

pub fn save_failure(err: SaveError) -> HandlerError {
    let status = match err {
        SaveError::Invalid(_) => StatusCode::BAD_REQUEST,
        SaveError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    fail(status, err.to_string())
}
