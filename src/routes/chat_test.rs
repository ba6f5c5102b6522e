use super::*;
use crate::llm::types::LlmError;

#[test]
fn assistant_errors_map_to_statuses() {
    assert_eq!(assistant_error(&AssistantError::EmptyPrompt).status, StatusCode::BAD_REQUEST);
    assert_eq!(
        assistant_error(&AssistantError::LlmNotConfigured("no key".into())).status,
        StatusCode::SERVICE_UNAVAILABLE
    );

    let err = assistant_error(&AssistantError::Llm(LlmError::ApiResponse { status: 429, body: String::new() }));
    assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    assert_eq!(err.code, "E_API_RATE_LIMITED");
    assert!(err.retryable);
}

#[test]
fn diagram_errors_map_to_statuses() {
    let missing = DiagramError::Spawn { tool: "mmdc", message: "not found".into() };
    assert_eq!(diagram_error(&missing).status, StatusCode::SERVICE_UNAVAILABLE);

    let timeout = diagram_error(&DiagramError::Timeout { tool: "d2", secs: 30 });
    assert_eq!(timeout.status, StatusCode::GATEWAY_TIMEOUT);
    assert!(timeout.retryable);

    let failed = DiagramError::Failed { tool: "d2", stderr: "syntax".into() };
    assert_eq!(diagram_error(&failed).code, "E_DIAGRAM_FAILED");
}

#[tokio::test]
async fn chat_view_starts_empty() {
    let (state, _dir) = crate::state::test_helpers::test_app_state();
    let view = chat_view(&state, "token").await;
    assert!(view.messages.is_empty());
    assert!(matches!(view.llm, LlmStatus::Unavailable { .. }));
}
