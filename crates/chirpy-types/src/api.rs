use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// Access-token claims. Shared by the session service (issuing and
/// verifying) and anything that needs to inspect a decoded token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    /// User id in decimal form.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

// -- Users --

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: u64,
    pub email: String,
    pub is_chirpy_red: bool,
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Requested access-token lifetime. Zero or anything above an hour is
    /// clamped to an hour.
    #[serde(default)]
    pub expires_in_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: u64,
    pub email: String,
    pub is_chirpy_red: bool,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

// -- Chirps --

#[derive(Debug, Deserialize)]
pub struct CreateChirpRequest {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChirpResponse {
    pub id: u64,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChirpQuery {
    /// Kept as a raw string; the repository rejects values that are not ids.
    pub author_id: Option<String>,
    pub sort: Option<String>,
}

// -- Errors --

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
