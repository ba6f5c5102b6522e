//! Chat routes: turns, history, saved chats and diagram rendering.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::SessionToken;
use crate::chat::{ArchiveError, ChatMessage, ChatSummary, DiagramBlock, DiagramError};
use crate::error::ApiError;
use crate::llm::LlmStatus;
use crate::services::assistant::{self, ASSISTANT_NAME, AssistantError, Reply};
use crate::state::AppState;

fn assistant_error(err: &AssistantError) -> ApiError {
    let status = match err {
        AssistantError::EmptyPrompt => StatusCode::BAD_REQUEST,
        AssistantError::LlmNotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        AssistantError::Llm(_) => StatusCode::BAD_GATEWAY,
    };
    ApiError::from_error(status, err)
}

fn archive_error(err: &ArchiveError) -> ApiError {
    tracing::error!(error = %err, "chat archive failure");
    ApiError::from_error(StatusCode::INTERNAL_SERVER_ERROR, err)
}

fn diagram_error(err: &DiagramError) -> ApiError {
    let status = match err {
        DiagramError::Spawn { .. } => StatusCode::SERVICE_UNAVAILABLE,
        DiagramError::Failed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DiagramError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        DiagramError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    ApiError::from_error(status, err)
}

// =============================================================================
// CURRENT CHAT
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ChatView {
    pub chat_id: Uuid,
    pub messages: Vec<ChatMessage>,
    pub llm: LlmStatus,
}

async fn chat_view(state: &AppState, token: &str) -> ChatView {
    let snapshot = assistant::current_chat(state, token).await;
    ChatView { chat_id: snapshot.chat_id, messages: snapshot.history.messages().to_vec(), llm: state.llm_status().await }
}

/// `GET /api/chat`: the session's current chat.
pub async fn get_chat(State(state): State<AppState>, SessionToken(token): SessionToken) -> Json<ChatView> {
    Json(chat_view(&state, &token).await)
}

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

/// `POST /api/chat`: run one turn. History is untouched on failure.
pub async fn post_chat(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Json(body): Json<PromptRequest>,
) -> Result<Json<Reply>, ApiError> {
    assistant::handle_prompt(&state, &token, &body.prompt)
        .await
        .map(Json)
        .map_err(|e| assistant_error(&e))
}

/// `DELETE /api/chat`: clear the current chat's history.
pub async fn clear_chat(State(state): State<AppState>, SessionToken(token): SessionToken) -> StatusCode {
    state.sessions.clear(&token).await;
    StatusCode::NO_CONTENT
}

// =============================================================================
// SAVED CHATS
// =============================================================================

/// `GET /api/chats`: every saved chat, newest first.
pub async fn list_chats(State(state): State<AppState>) -> Result<Json<Vec<ChatSummary>>, ApiError> {
    state.archive.all(ASSISTANT_NAME).await.map(Json).map_err(|e| archive_error(&e))
}

#[derive(Debug, Serialize)]
pub struct NewChat {
    pub chat_id: Uuid,
}

/// `POST /api/chats/new`: start an empty chat under a new id.
pub async fn new_chat(State(state): State<AppState>, SessionToken(token): SessionToken) -> Json<NewChat> {
    Json(NewChat { chat_id: state.sessions.start_new(&token).await })
}

/// `POST /api/chats/{id}/load`: make a saved chat the current one.
pub async fn load_chat(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<ChatView>, ApiError> {
    let history = state
        .archive
        .load(ASSISTANT_NAME, chat_id)
        .await
        .map_err(|e| archive_error(&e))?
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "E_CHAT_NOT_FOUND", format!("no saved chat {chat_id}")))?;
    tracing::info!(%chat_id, messages = history.len(), "chat loaded");
    state.sessions.replace(&token, chat_id, history).await;
    Ok(Json(chat_view(&state, &token).await))
}

// =============================================================================
// DIAGRAMS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct RenderedDiagram {
    pub svg: String,
}

/// `POST /api/diagram/render`: render a diagram block to SVG.
pub async fn render_diagram(
    State(state): State<AppState>,
    Json(block): Json<DiagramBlock>,
) -> Result<Json<RenderedDiagram>, ApiError> {
    match state.diagrams.render(&block).await {
        Ok(svg) => Ok(Json(RenderedDiagram { svg })),
        Err(e) => {
            tracing::warn!(error = %e, kind = block.kind.as_str(), "diagram render failed");
            Err(diagram_error(&e))
        }
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
