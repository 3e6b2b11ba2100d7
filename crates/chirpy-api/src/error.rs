use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use chirpy_auth::AuthError;
use chirpy_db::DbError;
use chirpy_types::api::ErrorResponse;
use chirpy_types::error::ErrorKind;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or malformed Authorization header")]
    MissingToken,

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("invalid chirp id: {0:?}")]
    InvalidId(String),

    #[error("invalid request body: {}", .0.body_text())]
    Body(#[from] JsonRejection),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("background task failed")]
    Internal,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::MissingToken | ApiError::InvalidApiKey => ErrorKind::Auth,
            ApiError::InvalidId(_) | ApiError::Body(_) => ErrorKind::Validation,
            ApiError::Auth(e) => e.kind(),
            ApiError::Db(e) => e.kind(),
            ApiError::Internal => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            // 415 for a missing content type, 422 for a well-formed body of the wrong shape
            ApiError::Body(rejection) => rejection.status(),
            _ => status_for(self.kind()),
        }
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Auth => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Storage | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Something went wrong".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
