pub mod auth;
pub mod chirps;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod webhooks;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use routes::router;
