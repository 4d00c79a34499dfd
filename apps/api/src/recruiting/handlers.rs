use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CallerId;
use crate::errors::AppError;
use crate::models::batch::{CandidateBatch, NewBatch};
use crate::models::ticket::{NewTicket, SupportTicket, TicketStatus, TicketStatusUpdate};
use crate::recruiting::{overview, Overview};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TicketQuery {
    pub status: Option<String>,
}

/// GET /api/v1/cv-intelligence/batches
pub async fn handle_list_batches(
    State(state): State<AppState>,
) -> Result<Json<Vec<CandidateBatch>>, AppError> {
    Ok(Json(state.batches.list().await?))
}

/// GET /api/v1/cv-intelligence/batches/:id
pub async fn handle_get_batch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CandidateBatch>, AppError> {
    state
        .batches
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Batch {id} not found")))
}

/// POST /api/v1/cv-intelligence/batches
pub async fn handle_create_batch(
    State(state): State<AppState>,
    caller: Option<CallerId>,
    Json(req): Json<NewBatch>,
) -> Result<(StatusCode, Json<CandidateBatch>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if req.candidate_count < 0 {
        return Err(AppError::Validation(
            "candidate_count cannot be negative".to_string(),
        ));
    }

    let created_by = caller.as_ref().map(|c| c.0.as_str());
    let batch = state.batches.create(created_by, req).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// GET /api/v1/support/tickets?status=open
pub async fn handle_list_tickets(
    State(state): State<AppState>,
    Query(params): Query<TicketQuery>,
) -> Result<Json<Vec<SupportTicket>>, AppError> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<TicketStatus>)
        .transpose()
        .map_err(AppError::Validation)?;
    Ok(Json(state.tickets.list(status).await?))
}

/// POST /api/v1/support/tickets
pub async fn handle_create_ticket(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Json(req): Json<NewTicket>,
) -> Result<(StatusCode, Json<SupportTicket>), AppError> {
    if req.subject.trim().is_empty() {
        return Err(AppError::Validation("subject cannot be empty".to_string()));
    }
    let ticket = state.tickets.create(&user_id, req).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// PATCH /api/v1/support/tickets/:id
pub async fn handle_update_ticket_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TicketStatusUpdate>,
) -> Result<Json<SupportTicket>, AppError> {
    state
        .tickets
        .update_status(id, req.status)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Ticket {id} not found")))
}

/// GET /api/v1/analytics/overview
pub async fn handle_analytics_overview(
    State(state): State<AppState>,
) -> Result<Json<Overview>, AppError> {
    let overview = overview(state.batches.as_ref(), state.tickets.as_ref()).await?;
    Ok(Json(overview))
}
