use chirpy_types::error::ErrorKind;
use thiserror::Error;

/// Errors surfaced by the snapshot store and the repositories built on it.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("chirp is too long: {len} characters, limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("invalid author filter: {0:?}")]
    InvalidFilter(String),

    #[error("chirp {0} not found")]
    ChirpNotFound(u64),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("refresh token not found")]
    TokenNotFound,

    #[error("user already exists: {0}")]
    AlreadyExists(String),

    #[error("user {requester} is not the author of chirp {chirp_id}")]
    Forbidden { chirp_id: u64, requester: u64 },

    #[error("database lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::TooLong { .. } | DbError::InvalidFilter(_) => ErrorKind::Validation,
            DbError::ChirpNotFound(_) | DbError::UserNotFound(_) | DbError::TokenNotFound => {
                ErrorKind::NotFound
            }
            DbError::AlreadyExists(_) => ErrorKind::Conflict,
            DbError::Forbidden { .. } => ErrorKind::Forbidden,
            DbError::LockPoisoned | DbError::Io(_) | DbError::Json(_) => ErrorKind::Storage,
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
