use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::error;

use chirpy_auth::SessionService;
use chirpy_db::{Database, User};
use chirpy_types::api::{
    CredentialsRequest, LoginRequest, LoginResponse, RefreshResponse, UserResponse,
};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::{AuthUser, bearer_token};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub sessions: SessionService,
    /// Shared secret the payment provider sends with webhooks.
    pub polka_key: String,
}

impl AppStateInner {
    pub fn db(&self) -> &Database {
        self.sessions.db()
    }
}

/// Run store work off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
}

fn user_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email,
        is_chirpy_red: user.is_chirpy_red,
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_blocking(&state, move |s| {
        Ok(s.sessions.signup(&req.email, &req.password)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(user_response(user))))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_blocking(&state, move |s| {
        Ok(s.sessions
            .update_credentials(user_id, &req.email, &req.password)?)
    })
    .await?;

    Ok(Json(user_response(user)))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = run_blocking(&state, move |s| {
        Ok(s.sessions
            .login(&req.email, &req.password, req.expires_in_seconds)?)
    })
    .await?;

    Ok(Json(LoginResponse {
        id: session.user.id,
        email: session.user.email,
        is_chirpy_red: session.user.is_chirpy_red,
        token: session.access_token,
        refresh_token: session.refresh_token,
    }))
}

pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = bearer_token(&headers)?.to_string();
    let token = run_blocking(&state, move |s| Ok(s.sessions.refresh(&refresh_token)?)).await?;

    Ok(Json(RefreshResponse { token }))
}

pub async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = bearer_token(&headers)?.to_string();
    run_blocking(&state, move |s| Ok(s.sessions.revoke(&refresh_token)?)).await?;

    Ok(StatusCode::NO_CONTENT)
}
