use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderValue,
    response::IntoResponse,
    Json,
};
use tracing::info;

use super::dto::{
    MessageResponse, RegisterDeviceRequest, ScheduleBody, DEVICE_REGISTERED, ROOT_MESSAGE,
};
use super::error::AppError;
use super::state::AppState;

pub const VERSION_HEADER: &str = "x-schedule-version";

/// GET /
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new(ROOT_MESSAGE))
}

/// GET /turnos
///
/// La lecture du fichier est bloquante : elle part sur le pool dédié.
pub async fn get_turnos(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let cache = state.cache.clone();
    let snapshot = tokio::task::spawn_blocking(move || cache.get_or_load())
        .await
        .map_err(|e| AppError::Internal(format!("schedule load task failed: {e}")))??;

    let version = HeaderValue::from(snapshot.version);
    Ok(([(VERSION_HEADER, version)], Json(ScheduleBody(snapshot))))
}

/// POST /register_device
///
/// Token en paramètre de requête (`?device_token=`) ou en corps JSON ;
/// la requête prime. Pas de persistance : le token est seulement journalisé.
pub async fn register_device(
    Query(query): Query<RegisterDeviceRequest>,
    body: Bytes,
) -> Result<Json<MessageResponse>, AppError> {
    let from_body = if body.iter().all(u8::is_ascii_whitespace) {
        RegisterDeviceRequest::default()
    } else {
        serde_json::from_slice::<RegisterDeviceRequest>(&body)
            .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))?
    };

    let token = [query.device_token, from_body.device_token]
        .into_iter()
        .flatten()
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("device_token is required".to_string()))?;

    let preview: String = token.chars().take(8).collect();
    info!(token = %preview, len = token.len(), "device registered");
    Ok(Json(MessageResponse::new(DEVICE_REGISTERED)))
}
