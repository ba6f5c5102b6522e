use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use super::*;
use crate::llm::LlmChat;
use crate::llm::types::{ChatResponse, LlmError, Message};
use crate::state::test_helpers;

const COOKIE: &str = "multipage_session=route-test-token";

struct EchoLlm;

#[async_trait::async_trait]
impl LlmChat for EchoLlm {
    async fn chat(&self, _max_tokens: u32, _system: &str, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        if last == "fail" {
            return Err(LlmError::ApiResponse { status: 500, body: "boom".into() });
        }
        Ok(ChatResponse {
            text: format!("echo: {last}"),
            model: "echo".into(),
            stop_reason: "end_turn".into(),
            input_tokens: 1,
            output_tokens: 1,
        })
    }

    fn model(&self) -> &str {
        "echo"
    }
}

struct Response {
    status: StatusCode,
    set_cookie: Option<String>,
    body: String,
}

impl Response {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri).header(header::COOKIE, COOKIE);
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let res = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let set_cookie = res.headers().get(header::SET_COOKIE).map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    Response { status, set_cookie, body: String::from_utf8(bytes.to_vec()).unwrap() }
}

// =============================================================================
// SESSION + PAGES
// =============================================================================

#[tokio::test]
async fn healthz_ok() {
    let (state, _dir) = test_helpers::test_app_state();
    let res = call(&app(state), "GET", "/healthz", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.set_cookie.is_none());
}

#[tokio::test]
async fn first_visit_gets_session_cookie() {
    let (state, _dir) = test_helpers::test_app_state();
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let res = app(state).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("multipage_session="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn index_renders_default_page() {
    let (state, _dir) = test_helpers::test_app_state();
    let res = call(&app(state), "GET", "/", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("<title>Home Page</title>"));
    assert!(res.body.contains("Menu Demo"));
}

#[tokio::test]
async fn unknown_page_falls_back_to_default() {
    let (state, _dir) = test_helpers::test_app_state();
    let res = call(&app(state), "GET", "/page/does_not_exist", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("<title>Home Page</title>"));
}

#[tokio::test]
async fn nav_reports_tree_and_selection() {
    let (state, _dir) = test_helpers::test_app_state();
    let res = call(&app(state), "GET", "/api/nav?selected=nested_level2", None).await;
    let json = res.json();
    assert_eq!(json["nested"], true);
    assert_eq!(json["default_key"], "home");
    assert_eq!(json["selected"], "nested_level2");
    assert_eq!(json["menu"][0]["key"], "home");
    assert!(json.get("rejected").is_none());
}

#[tokio::test]
async fn nav_flat_when_nesting_disabled() {
    let (state, _dir) = test_helpers::test_app_state();
    state.settings.write().await.app.menu.use_multi_icon_menu = false;
    let json = call(&app(state), "GET", "/api/nav", None).await.json();
    assert_eq!(json["nested"], false);
    assert_eq!(json["menu"].as_array().unwrap().len(), 15);
    assert!(json["menu"].as_array().unwrap().iter().all(|m| m.get("children").is_none()));
}

#[tokio::test]
async fn page_json_unknown_key_is_404() {
    let (state, _dir) = test_helpers::test_app_state();
    let router = app(state);
    let ok = call(&router, "GET", "/api/pages/menu_demo", None).await.json();
    assert_eq!(ok["key"], "menu_demo");
    assert_eq!(ok["title"], "Menu Demo Parent");
    assert_eq!(ok["blocks"][0]["type"], "paragraph");

    let missing = call(&router, "GET", "/api/pages/nope", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.json()["code"], "E_PAGE_NOT_FOUND");
}

// =============================================================================
// CHAT
// =============================================================================

#[tokio::test]
async fn chat_turn_roundtrip() {
    let (state, _dir) = test_helpers::test_app_state_with_llm(Arc::new(EchoLlm)).await;
    let router = app(state);

    let reply = call(&router, "POST", "/api/chat", Some(json!({"prompt": "hello"}))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["text"], "echo: hello");

    let chat = call(&router, "GET", "/api/chat", None).await.json();
    assert_eq!(chat["messages"].as_array().unwrap().len(), 2);
    assert_eq!(chat["messages"][1]["content"], "echo: hello");

    let page = call(&router, "GET", "/page/chat_assistant_page", None).await;
    assert!(page.body.contains("<div class=\"msg assistant\">echo: hello</div>"));

    let cleared = call(&router, "DELETE", "/api/chat", None).await;
    assert_eq!(cleared.status, StatusCode::NO_CONTENT);
    let chat = call(&router, "GET", "/api/chat", None).await.json();
    assert!(chat["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn llm_failure_is_502_and_keeps_history() {
    let (state, _dir) = test_helpers::test_app_state_with_llm(Arc::new(EchoLlm)).await;
    let router = app(state);
    call(&router, "POST", "/api/chat", Some(json!({"prompt": "first"}))).await;

    let failed = call(&router, "POST", "/api/chat", Some(json!({"prompt": "fail"}))).await;
    assert_eq!(failed.status, StatusCode::BAD_GATEWAY);
    let body = failed.json();
    assert_eq!(body["code"], "E_API_RESPONSE");
    assert_eq!(body["retryable"], true);

    let chat = call(&router, "GET", "/api/chat", None).await.json();
    assert_eq!(chat["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unconfigured_llm_is_503() {
    let (state, _dir) = test_helpers::test_app_state();
    let res = call(&app(state), "POST", "/api/chat", Some(json!({"prompt": "hi"}))).await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.json()["code"], "E_LLM_NOT_CONFIGURED");
}

#[tokio::test]
async fn saved_chat_can_be_listed_and_loaded() {
    let (state, _dir) = test_helpers::test_app_state_with_llm(Arc::new(EchoLlm)).await;
    let router = app(state);

    let first = call(&router, "POST", "/api/chat", Some(json!({"prompt": "remember me"}))).await.json();
    let first_id = first["chat_id"].as_str().unwrap().to_string();

    let fresh = call(&router, "POST", "/api/chats/new", None).await.json();
    assert_ne!(fresh["chat_id"], first["chat_id"]);
    assert!(call(&router, "GET", "/api/chat", None).await.json()["messages"].as_array().unwrap().is_empty());

    let listed = call(&router, "GET", "/api/chats", None).await.json();
    assert_eq!(listed[0]["chat_id"], first_id.as_str());

    let loaded = call(&router, "POST", &format!("/api/chats/{first_id}/load"), None).await;
    assert_eq!(loaded.status, StatusCode::OK);
    let loaded = loaded.json();
    assert_eq!(loaded["chat_id"], first_id.as_str());
    assert_eq!(loaded["messages"][0]["content"], "remember me");

    let missing = call(&router, "POST", &format!("/api/chats/{}/load", uuid::Uuid::new_v4()), None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// SETTINGS
// =============================================================================

#[tokio::test]
async fn api_settings_save_rebuilds_llm_and_hides_keys() {
    let (state, _dir) = test_helpers::test_app_state();
    let router = app(state.clone());

    let res = call(&router, "PUT", "/api/settings/api", Some(json!({"openai_api_key": "  sk-new  "}))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(!res.body.contains("sk-new"));
    assert!(res.json()["warnings"].as_array().unwrap().is_empty());

    let saved = state.config.load().unwrap();
    assert_eq!(saved.app.llm.openai_api_key, "sk-new");
    assert!(matches!(state.llm_status().await, crate::llm::LlmStatus::Ready { .. }));
}

#[tokio::test]
async fn api_settings_reject_unknown_model() {
    let (state, _dir) = test_helpers::test_app_state();
    let res = call(&app(state), "PUT", "/api/settings/api", Some(json!({"large_model": "gpt-2"}))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["code"], "E_INVALID_MODEL");
}

#[tokio::test]
async fn theme_update_persists_layout() {
    let (state, _dir) = test_helpers::test_app_state();
    let router = app(state.clone());

    let body = json!({"status": "light", "orientation": "horizontal", "wide_mode": true});
    let res = call(&router, "PUT", "/api/settings/theme", Some(body)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["status"], "light");

    let saved = state.config.load().unwrap();
    assert_eq!(saved.host.theme, crate::theme::Theme::light());
    assert!(saved.app.menu.wide_mode);

    let page = call(&router, "GET", "/", None).await;
    assert!(page.body.contains("<body class=\"horizontal\">"));
}

#[tokio::test]
async fn theme_update_rejects_bad_colour() {
    let (state, _dir) = test_helpers::test_app_state();
    let body = json!({"status": "custom", "primary_color": "red"});
    let res = call(&app(state), "PUT", "/api/settings/theme", Some(body)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["code"], "E_INVALID_COLOR");
}

// =============================================================================
// CORS
// =============================================================================

async fn preflight(router: &Router, origin: &str) -> Option<String> {
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/settings/api")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
        .body(Body::empty())
        .unwrap();
    let res = router.clone().oneshot(req).await.unwrap();
    res.headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .map(|v| v.to_str().unwrap().to_string())
}

#[test]
fn cors_layer_needs_a_valid_origin() {
    assert!(cors_layer(None).is_none());
    assert!(cors_layer(Some("  ")).is_none());
    assert!(cors_layer(Some("https://bad\norigin")).is_none());
    assert!(cors_layer(Some("https://app.example.com")).is_some());
}

#[tokio::test]
async fn cross_origin_calls_are_refused_by_default() {
    let (state, _dir) = test_helpers::test_app_state();
    let router = app_with_cors(state, None);
    assert_eq!(preflight(&router, "https://evil.example").await, None);
}

#[tokio::test]
async fn configured_origin_is_the_only_one_allowed() {
    let (state, _dir) = test_helpers::test_app_state();
    let router = app_with_cors(state, cors_layer(Some("https://app.example.com")));
    assert_eq!(preflight(&router, "https://app.example.com").await.as_deref(), Some("https://app.example.com"));
    assert_eq!(preflight(&router, "https://evil.example").await, None);
}
