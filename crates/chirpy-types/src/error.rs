use serde::Serialize;

/// Coarse failure category every service error reduces to.
///
/// Only the HTTP layer turns a kind into a status code; services never
/// produce user-facing text of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input shape, oversized chirp, unparseable filter, missing credentials.
    Validation,
    NotFound,
    /// Duplicate email.
    Conflict,
    /// Author mismatch on delete.
    Forbidden,
    /// Bad, expired or missing token, or password mismatch.
    Auth,
    /// File I/O, serialization or lock failure.
    Storage,
    /// Hashing or signing failure, or a task that never finished.
    Internal,
}
