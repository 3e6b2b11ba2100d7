use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{debug, info, warn};

use chirpy_types::events::WebhookEvent;

use crate::auth::{AppState, run_blocking};
use crate::error::ApiError;
use crate::middleware::api_key;

/// Payment-provider webhook. Only `user.upgraded` does anything; every other
/// event is acknowledged and ignored.
///
/// The API key is checked before the body is decoded.
pub async fn polka_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let key = api_key(&headers)?;
    if key != state.polka_key {
        warn!("Webhook rejected: API key mismatch");
        return Err(ApiError::InvalidApiKey);
    }

    let Json(event) = Json::<WebhookEvent>::from_bytes(&body)?;
    if !event.is_user_upgraded() {
        debug!("Ignoring webhook event {:?}", event.event);
        return Ok(StatusCode::NO_CONTENT);
    }

    let user_id = event.data.user_id;
    run_blocking(&state, move |s| Ok(s.db().upgrade_user_by_id(user_id)?)).await?;

    info!("User {} upgraded", user_id);
    Ok(StatusCode::NO_CONTENT)
}
