use chirpy_db::DbError;
use chirpy_types::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email and password are required")]
    MissingCredentials,

    #[error("password does not match")]
    Mismatch,

    #[error("access token has expired")]
    Expired,

    #[error("access token signature is invalid")]
    InvalidSignature,

    #[error("malformed access token: {0}")]
    Malformed(String),

    #[error("refresh token does not exist")]
    UnknownRefreshToken,

    #[error("refresh token has expired")]
    RefreshExpired,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MissingCredentials => ErrorKind::Validation,
            AuthError::Mismatch
            | AuthError::Expired
            | AuthError::InvalidSignature
            | AuthError::Malformed(_)
            | AuthError::UnknownRefreshToken
            | AuthError::RefreshExpired => ErrorKind::Auth,
            AuthError::Hashing(_) | AuthError::Signing(_) => ErrorKind::Internal,
            AuthError::Db(e) => e.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
