use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::auth::CallerId;
use crate::errors::AppError;
use crate::models::ticket::SupportTicket;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub session: Option<Value>,
    pub tickets: Vec<SupportTicket>,
}

/// GET /api/v1/auth/session
pub async fn handle_get_session(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
) -> Result<Json<Value>, AppError> {
    state
        .sessions
        .load(&user_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No session snapshot for user {user_id}")))
}

/// PUT /api/v1/auth/session
///
/// Store failures are logged only; the snapshot is best-effort.
pub async fn handle_put_session(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Json(snapshot): Json<Value>,
) -> Result<StatusCode, AppError> {
    if !snapshot.is_object() {
        return Err(AppError::Validation(
            "session snapshot must be a JSON object".to_string(),
        ));
    }
    if !state.sessions.save(&user_id, &snapshot).await {
        warn!(user_id = %user_id, "session snapshot not persisted");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/auth/session
pub async fn handle_delete_session(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
) -> StatusCode {
    if !state.sessions.clear(&user_id).await {
        warn!(user_id = %user_id, "session snapshot not cleared; it expires with its TTL");
    }
    StatusCode::NO_CONTENT
}

/// GET /api/v1/auth/profile
pub async fn handle_profile(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
) -> Result<Json<ProfileResponse>, AppError> {
    let session = state.sessions.load(&user_id).await;
    let tickets = state.tickets.list_for_user(&user_id).await?;

    Ok(Json(ProfileResponse {
        user_id,
        session,
        tickets,
    }))
}
