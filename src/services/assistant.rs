//! Assistant service: one chat turn from prompt to stored reply.
//!
//! DESIGN
//! ======
//! A turn snapshots the session history, sends it plus the new prompt to the
//! active LLM, and only on success appends the user message, the reply and
//! any detected diagram block. A failed call leaves the history untouched.
//! After a successful turn the whole chat is mirrored to the archive; archive
//! failures are logged and reported with the reply rather than failing it.
//! A reply that lands after the chat was cleared or switched is dropped and
//! not archived.
//!
//! A brand-new session picks up the most recently saved chat when
//! `assistant.resume_last_chat` is on.

use std::sync::OnceLock;

use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::diagram::{self, Detection};
use crate::chat::{ArchiveError, ChatArchive, ChatHistory, ChatMessage, DiagramBlock, SessionSnapshot, prepare_messages};
use crate::config::Persona;
use crate::llm::LlmChat;
use crate::llm::types::{LlmError, Role};
use crate::state::{AppState, LlmSlot};

/// Archive directory prefix for the chat page.
pub const ASSISTANT_NAME: &str = "chat";

const DEFAULT_LLM_MAX_TOKENS: u32 = 4096;

fn llm_max_tokens() -> u32 {
    static VALUE: OnceLock<u32> = OnceLock::new();
    *VALUE.get_or_init(|| {
        std::env::var("LLM_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LLM_MAX_TOKENS)
    })
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("{0}")]
    LlmNotConfigured(String),
    #[error("I'm very sorry but an error occurred: {0}")]
    Llm(#[from] LlmError),
}

impl crate::error::ErrorCode for AssistantError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyPrompt => "E_EMPTY_PROMPT",
            Self::LlmNotConfigured(_) => "E_LLM_NOT_CONFIGURED",
            Self::Llm(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Llm(e) if e.retryable())
    }
}

/// Model output for one turn, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub text: String,
    pub model: String,
    pub detection: Detection,
}

/// What `POST /api/chat` returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub chat_id: Uuid,
    pub text: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagram: Option<DiagramBlock>,
    /// Non-fatal problems to show next to the reply.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
}

// =============================================================================
// SYSTEM PROMPT
// =============================================================================

/// Persona template filled with the current date and time.
#[must_use]
pub fn build_system_prompt(persona: Persona, now: OffsetDateTime) -> String {
    let stamp = now
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_else(|_| now.to_string());
    let (role, description) = match persona {
        Persona::Helpful => (
            "Helpful AI Assistant for answering questions and having a dialog",
            "You are an expert AI assistant specializing in answering user queries.",
        ),
        Persona::IronicComedian => (
            "Lazy and ironic comedian",
            "You are a very lazy and ironic assistant that resents having to answer the user's questions and makes fun of them.",
        ),
    };

    format!(
        "<system_message>\n\
         \x20   <role>{role}</role>\n\
         \x20   <description>\n\
         \x20       {description}\n\
         \x20   </description>\n\
         \x20   <current_datetime>{stamp}</current_datetime>\n\
         \x20   <instruction>\n\
         \x20       ALWAYS answer the user question as best you can in a style and manner true to your character!\n\
         \x20   </instruction>\n\
         </system_message>\n"
    )
}

// =============================================================================
// SESSION
// =============================================================================

/// The live chat for `token`, resuming the last saved chat for a new session.
pub async fn current_chat(state: &AppState, token: &str) -> SessionSnapshot {
    let snapshot = state.sessions.snapshot(token).await;
    if !snapshot.created || !state.settings.read().await.app.assistant.resume_last_chat {
        return snapshot;
    }
    match latest_saved_chat(&state.archive).await {
        Ok(Some((chat_id, history))) => {
            info!(%chat_id, messages = history.len(), "resuming last saved chat");
            state.sessions.resume(token, &snapshot, chat_id, history).await
        }
        Ok(None) => snapshot,
        Err(e) => {
            warn!(error = %e, "could not read last saved chat");
            snapshot
        }
    }
}

async fn latest_saved_chat(archive: &ChatArchive) -> Result<Option<(Uuid, ChatHistory)>, ArchiveError> {
    let Some(latest) = archive.recent(ASSISTANT_NAME, 1).await?.into_iter().next() else {
        return Ok(None);
    };
    Ok(archive.load(ASSISTANT_NAME, latest.chat_id).await?.map(|history| (latest.chat_id, history)))
}

// =============================================================================
// TURN
// =============================================================================

/// Send `prompt` after `history` and classify the reply.
///
/// # Errors
///
/// Returns the provider error, or [`LlmError::EmptyResponse`] when the model
/// answers with blank text.
pub async fn send(llm: &dyn LlmChat, system: &str, history: &[ChatMessage], prompt: &str) -> Result<Turn, LlmError> {
    let mut transcript = history.to_vec();
    transcript.push(ChatMessage::text(Role::User, prompt));
    let messages = prepare_messages(&transcript);

    let response = llm.chat(llm_max_tokens(), system, &messages).await?;
    if response.text.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    info!(
        model = %response.model,
        stop_reason = %response.stop_reason,
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        "llm reply"
    );

    let detection = diagram::detect(prompt, &response.text);
    Ok(Turn { text: response.text, model: response.model, detection })
}

/// Run one chat turn for the session behind `token`.
///
/// # Errors
///
/// Returns an error for a blank prompt, a missing LLM configuration, or a
/// failed provider call. The session history is unchanged in every case.
pub async fn handle_prompt(state: &AppState, token: &str, prompt: &str) -> Result<Reply, AssistantError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AssistantError::EmptyPrompt);
    }
    let llm = match state.llm_slot().await {
        LlmSlot::Ready(llm) => llm,
        LlmSlot::Unavailable(reason) => return Err(AssistantError::LlmNotConfigured(reason)),
    };

    let snapshot = current_chat(state, token).await;
    let persona = state.settings.read().await.app.assistant.persona;
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let system = build_system_prompt(persona, now);

    let turn = match send(llm.as_ref(), &system, snapshot.history.messages(), prompt).await {
        Ok(turn) => turn,
        Err(e) => {
            warn!(error = %e, chat_id = %snapshot.chat_id, "chat turn failed");
            return Err(e.into());
        }
    };

    let mut notices = Vec::new();
    let diagram = match turn.detection {
        Detection::Found(block) => Some(block),
        Detection::Rejected(reason) => {
            notices.push(reason.to_string());
            None
        }
        Detection::NotRequested => None,
    };

    let mut added = vec![ChatMessage::text(Role::User, prompt), ChatMessage::text(Role::Assistant, &turn.text)];
    if let Some(block) = &diagram {
        added.push(ChatMessage::diagram(block.clone()));
    }

    if let Some(history) = state.sessions.append(token, &snapshot, added).await {
        if let Err(e) = state.archive.save(ASSISTANT_NAME, snapshot.chat_id, &history).await {
            warn!(error = %e, chat_id = %snapshot.chat_id, "chat archive save failed");
            notices.push(format!("An error occurred while saving the chat: {e}"));
        }
    }

    Ok(Reply { chat_id: snapshot.chat_id, text: turn.text, model: turn.model, diagram, notices })
}

#[cfg(test)]
#[path = "assistant_test.rs"]
mod tests;
