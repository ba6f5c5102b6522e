use super::*;

#[test]
fn parse_text_response() {
    let json = serde_json::json!({
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": "Hello!" },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
    })
    .to_string();
    let resp = parse_chat_completions_response(&json).unwrap();
    assert_eq!(resp.text, "Hello!");
    assert_eq!(resp.model, "gpt-4o");
    assert_eq!(resp.stop_reason, "end_turn");
    assert_eq!(resp.input_tokens, 10);
    assert_eq!(resp.output_tokens, 5);
}

#[test]
fn parse_length_finish_reason() {
    let json = serde_json::json!({
        "model": "gpt-4o",
        "choices": [{ "message": { "content": "trunc" }, "finish_reason": "length" }]
    })
    .to_string();
    let resp = parse_chat_completions_response(&json).unwrap();
    assert_eq!(resp.stop_reason, "max_tokens");
    assert_eq!(resp.input_tokens, 0);
}

#[test]
fn parse_null_content_is_empty_text() {
    let json = serde_json::json!({
        "model": "gpt-4o",
        "choices": [{ "message": { "content": null }, "finish_reason": "stop" }]
    })
    .to_string();
    let resp = parse_chat_completions_response(&json).unwrap();
    assert!(resp.text.is_empty());
}

#[test]
fn parse_missing_choices_errors() {
    let err = parse_chat_completions_response(r#"{"model":"gpt-4o","choices":[]}"#).unwrap_err();
    assert!(matches!(err, LlmError::ApiParse(msg) if msg.contains("choices[0]")));
}

#[test]
fn parse_invalid_json_errors() {
    assert!(matches!(parse_chat_completions_response("nope"), Err(LlmError::ApiParse(_))));
}

#[test]
fn build_messages_prepends_system() {
    let history = vec![Message::user("hi"), Message::assistant("hello")];
    let msgs = build_messages("be nice", &history);
    assert_eq!(msgs.len(), 3);
    assert_eq!(msgs[0], CcMessage { role: "system", content: "be nice" });
    assert_eq!(msgs[1], CcMessage { role: "user", content: "hi" });
    assert_eq!(msgs[2], CcMessage { role: "assistant", content: "hello" });
}

#[test]
fn build_messages_skips_blank_system() {
    let history = vec![Message::user("hi")];
    assert_eq!(build_messages("  ", &history).len(), 1);
}

#[test]
fn reasoning_models_omit_temperature() {
    assert!(is_reasoning_model("o1-mini"));
    assert!(is_reasoning_model("o3-mini"));
    assert!(!is_reasoning_model("gpt-4o"));

    let msgs = build_messages("", &[]);
    let body = CcRequest { model: "o3-mini", max_completion_tokens: 10, temperature: None, messages: &msgs };
    let json = serde_json::to_value(&body).unwrap();
    assert!(json.get("temperature").is_none());
    assert_eq!(json["max_completion_tokens"], 10);
}
