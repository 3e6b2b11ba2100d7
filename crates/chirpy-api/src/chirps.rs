use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use chirpy_db::{Chirp, SortOrder};
use chirpy_types::api::{ChirpQuery, ChirpResponse, CreateChirpRequest};

use crate::auth::{AppState, run_blocking};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::AuthUser;

fn chirp_response(chirp: Chirp) -> ChirpResponse {
    ChirpResponse {
        id: chirp.id,
        body: chirp.body,
        author_id: chirp.author_id,
    }
}

fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| ApiError::InvalidId(raw.to_string()))
}

pub async fn create_chirp(
    State(state): State<AppState>,
    Extension(AuthUser(author_id)): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateChirpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let chirp = run_blocking(&state, move |s| Ok(s.db().create_chirp(&req.body, author_id)?)).await?;

    Ok((StatusCode::CREATED, Json(chirp_response(chirp))))
}

pub async fn list_chirps(
    State(state): State<AppState>,
    Query(query): Query<ChirpQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let order = SortOrder::from_query(query.sort.as_deref());
    let chirps = run_blocking(&state, move |s| {
        Ok(s.db().list_chirps(query.author_id.as_deref(), order)?)
    })
    .await?;

    Ok(Json(
        chirps.into_iter().map(chirp_response).collect::<Vec<_>>(),
    ))
}

pub async fn get_chirp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let chirp = run_blocking(&state, move |s| Ok(s.db().get_chirp(id)?)).await?;

    Ok(Json(chirp_response(chirp)))
}

pub async fn delete_chirp(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    run_blocking(&state, move |s| Ok(s.db().delete_chirp(id, user_id)?)).await?;

    Ok(StatusCode::NO_CONTENT)
}
