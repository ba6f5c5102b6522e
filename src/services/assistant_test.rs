use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use super::*;
use crate::chat::DiagramKind;
use crate::llm::types::{ChatResponse, Message};
use crate::state::test_helpers;

// =========================================================================
// MockLlm
// =========================================================================

struct MockLlm {
    responses: Mutex<Vec<Result<ChatResponse, LlmError>>>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl MockLlm {
    fn new(responses: Vec<Result<ChatResponse, LlmError>>) -> Self {
        Self { responses: Mutex::new(responses), seen: Mutex::new(Vec::new()) }
    }

    fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(reply(t))).collect())
    }
}

fn reply(text: &str) -> ChatResponse {
    ChatResponse {
        text: text.into(),
        model: "mock".into(),
        stop_reason: "end_turn".into(),
        input_tokens: 3,
        output_tokens: 2,
    }
}

#[async_trait::async_trait]
impl LlmChat for MockLlm {
    async fn chat(&self, _max_tokens: u32, _system: &str, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() { Ok(reply("done")) } else { responses.remove(0) }
    }

    fn model(&self) -> &str {
        "mock"
    }
}

const TOKEN: &str = "session-token";

// =========================================================================
// build_system_prompt
// =========================================================================

#[test]
fn system_prompt_includes_persona_and_time() {
    let now = time::macros::datetime!(2025-03-01 14:05:09 UTC);
    let prompt = build_system_prompt(Persona::IronicComedian, now);
    assert!(prompt.contains("<role>Lazy and ironic comedian</role>"));
    assert!(prompt.contains("<current_datetime>2025-03-01 14:05:09</current_datetime>"));

    let helpful = build_system_prompt(Persona::Helpful, now);
    assert!(helpful.contains("Helpful AI Assistant"));
}

// =========================================================================
// send
// =========================================================================

#[tokio::test]
async fn send_replays_history_and_prompt() {
    let mock = MockLlm::replying(&["sure"]);
    let history = vec![ChatMessage::text(Role::User, "hi"), ChatMessage::text(Role::Assistant, "hello")];

    let turn = send(&mock, "sys", &history, "how are you").await.unwrap();
    assert_eq!(turn.text, "sure");
    assert_eq!(turn.detection, Detection::NotRequested);

    let seen = mock.seen.lock().unwrap();
    assert_eq!(seen[0], vec![Message::user("hi"), Message::assistant("hello"), Message::user("how are you")]);
}

#[tokio::test]
async fn send_rejects_blank_reply() {
    let mock = MockLlm::replying(&["   "]);
    let err = send(&mock, "sys", &[], "hello").await.unwrap_err();
    assert!(matches!(err, LlmError::EmptyResponse));
}

// =========================================================================
// handle_prompt
// =========================================================================

#[tokio::test]
async fn handle_prompt_appends_turn_and_archives() {
    let (state, _dir) = test_helpers::test_app_state_with_llm(Arc::new(MockLlm::replying(&["Here's my answer"]))).await;

    let reply = handle_prompt(&state, TOKEN, "  What is Rust?  ").await.unwrap();
    assert_eq!(reply.text, "Here's my answer");
    assert!(reply.notices.is_empty());

    let snap = state.sessions.snapshot(TOKEN).await;
    assert_eq!(snap.chat_id, reply.chat_id);
    assert_eq!(snap.history.len(), 2);
    assert_eq!(snap.history.messages()[0].content.as_text(), Some("What is Rust?"));

    let saved = state.archive.load(ASSISTANT_NAME, reply.chat_id).await.unwrap().unwrap();
    assert_eq!(saved.len(), 2);
}

#[tokio::test]
async fn handle_prompt_stores_diagram_block() {
    let answer = "Sure:\n```mermaid\ngraph TD\n  A --> B\n```";
    let (state, _dir) = test_helpers::test_app_state_with_llm(Arc::new(MockLlm::replying(&[answer]))).await;

    let reply = handle_prompt(&state, TOKEN, "draw a mermaid diagram of A to B").await.unwrap();
    let block = reply.diagram.unwrap();
    assert_eq!(block.kind, DiagramKind::Mermaid);

    let snap = state.sessions.snapshot(TOKEN).await;
    assert_eq!(snap.history.len(), 3);
    assert_eq!(snap.history.messages()[2].content, crate::chat::MessageContent::Diagram(block));
}

#[tokio::test]
async fn handle_prompt_reports_rejected_diagram() {
    let (state, _dir) = test_helpers::test_app_state_with_llm(Arc::new(MockLlm::replying(&["no code, sorry"]))).await;
    let reply = handle_prompt(&state, TOKEN, "d2 diagram of the network").await.unwrap();
    assert!(reply.diagram.is_none());
    assert_eq!(reply.notices.len(), 1);
    assert_eq!(state.sessions.snapshot(TOKEN).await.history.len(), 2);
}

#[tokio::test]
async fn failed_call_leaves_history_unchanged() {
    let mock = MockLlm::new(vec![
        Ok(reply("first")),
        Err(LlmError::ApiResponse { status: 429, body: "slow down".into() }),
    ]);
    let (state, _dir) = test_helpers::test_app_state_with_llm(Arc::new(mock)).await;

    handle_prompt(&state, TOKEN, "one").await.unwrap();
    let before = state.sessions.snapshot(TOKEN).await;

    let err = handle_prompt(&state, TOKEN, "two").await.unwrap_err();
    assert!(matches!(err, AssistantError::Llm(LlmError::ApiResponse { status: 429, .. })));
    {
        use crate::error::ErrorCode;
        assert_eq!(err.error_code(), "E_API_RATE_LIMITED");
        assert!(err.retryable());
    }

    let after = state.sessions.snapshot(TOKEN).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn blank_prompt_is_rejected_before_llm() {
    let mock = Arc::new(MockLlm::replying(&[]));
    let (state, _dir) = test_helpers::test_app_state_with_llm(mock.clone()).await;
    assert!(matches!(handle_prompt(&state, TOKEN, "   ").await, Err(AssistantError::EmptyPrompt)));
    assert!(mock.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_llm_configuration_is_reported() {
    let (state, _dir) = test_helpers::test_app_state();
    let err = handle_prompt(&state, TOKEN, "hello").await.unwrap_err();
    assert!(matches!(err, AssistantError::LlmNotConfigured(ref reason) if reason.contains("API key")));
    assert!(state.sessions.snapshot(TOKEN).await.history.is_empty());
}

// =========================================================================
// Late replies and resumed sessions
// =========================================================================

/// Holds its reply until the test releases it.
#[derive(Default)]
struct GatedLlm {
    started: Notify,
    release: Notify,
}

#[async_trait::async_trait]
impl LlmChat for GatedLlm {
    async fn chat(&self, _max_tokens: u32, _system: &str, _messages: &[Message]) -> Result<ChatResponse, LlmError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(reply("too late"))
    }

    fn model(&self) -> &str {
        "gated"
    }
}

#[tokio::test]
async fn reply_after_clear_is_neither_stored_nor_archived() {
    let gate = Arc::new(GatedLlm::default());
    let (state, _dir) = test_helpers::test_app_state_with_llm(gate.clone()).await;

    let turn = tokio::spawn({
        let state = state.clone();
        async move { handle_prompt(&state, TOKEN, "slow question").await }
    });
    gate.started.notified().await;
    state.sessions.clear(TOKEN).await;
    gate.release.notify_one();

    let reply = turn.await.unwrap().unwrap();
    assert_eq!(reply.text, "too late");
    assert!(state.sessions.snapshot(TOKEN).await.history.is_empty());
    assert!(state.archive.load(ASSISTANT_NAME, reply.chat_id).await.unwrap().is_none());
}

#[tokio::test]
async fn new_session_resumes_last_saved_chat() {
    let (state, _dir) = test_helpers::test_app_state_with_llm(Arc::new(MockLlm::replying(&["saved answer"]))).await;
    let first = handle_prompt(&state, TOKEN, "keep this").await.unwrap();

    let other = current_chat(&state, "another-browser").await;
    assert_eq!(other.chat_id, first.chat_id);
    assert_eq!(other.history.len(), 2);
    assert_eq!(other.history.messages()[0].content.as_text(), Some("keep this"));
}

#[tokio::test]
async fn resume_can_be_turned_off() {
    let (state, _dir) = test_helpers::test_app_state_with_llm(Arc::new(MockLlm::replying(&["saved answer"]))).await;
    state.settings.write().await.app.assistant.resume_last_chat = false;
    let first = handle_prompt(&state, TOKEN, "keep this").await.unwrap();

    let other = current_chat(&state, "another-browser").await;
    assert_ne!(other.chat_id, first.chat_id);
    assert!(other.history.is_empty());
}
