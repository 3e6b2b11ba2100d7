//! Chirpy authentication.
//!
//! - `password`: Argon2id hashing and verification, no storage involved.
//! - `tokens`: HS256 access tokens and opaque refresh-token generation.
//! - `session`: login, refresh and revoke on top of the JSON database.

pub mod error;
pub mod password;
pub mod session;
pub mod tokens;

pub use error::{AuthError, Result};
pub use session::{Session, SessionService};
pub use tokens::TokenSigner;
