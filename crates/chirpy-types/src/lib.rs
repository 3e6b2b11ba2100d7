//! Types shared between the HTTP layer and the chirpy services.

pub mod api;
pub mod error;
pub mod events;
