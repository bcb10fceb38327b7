//! Axum route handlers for the screening dialogue.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::dialogue::{ConversationSession, DialogueReply, SessionSummary};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub vacancy_text: String,
    #[serde(default)]
    pub cv_text: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SessionDetailResponse {
    #[serde(flatten)]
    pub session: ConversationSession,
    pub message_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
    pub total: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /chat/start
///
/// Opens a screening session: the reply is either the first question or,
/// when the resume already answers everything, the final verdict.
pub async fn handle_start(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> Result<(StatusCode, Json<DialogueReply>), AppError> {
    let (_, reply) = state
        .dialogue
        .start(
            &request.vacancy_text,
            request.cv_text.as_deref(),
            request.session_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

/// POST /chat/turn
pub async fn handle_turn(
    State(state): State<AppState>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<DialogueReply>, AppError> {
    let reply = state
        .dialogue
        .turn(&request.session_id, &request.message)
        .await?;
    Ok(Json(reply))
}

/// GET /sessions
pub async fn handle_list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionListResponse>, AppError> {
    let sessions = state.dialogue.list_sessions().await?;
    Ok(Json(SessionListResponse {
        total: sessions.len(),
        sessions,
    }))
}

/// GET /sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionDetailResponse>, AppError> {
    let session = state.dialogue.get_session(&session_id).await?;
    Ok(Json(SessionDetailResponse {
        message_count: session.message_count(),
        session,
    }))
}

/// DELETE /sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.dialogue.delete_session(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
