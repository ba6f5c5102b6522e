use super::*;

fn settings_with_keys() -> LlmSettings {
    LlmSettings {
        openai_api_key: "sk-openai".into(),
        anthropic_api_key: "  sk-ant  ".into(),
        google_api_key: String::new(),
        ..LlmSettings::default()
    }
}

#[test]
fn provider_inferred_from_model_prefix() {
    assert_eq!(LlmProviderKind::from_model("gpt-4o").unwrap(), LlmProviderKind::OpenAi);
    assert_eq!(LlmProviderKind::from_model("o1-mini").unwrap(), LlmProviderKind::OpenAi);
    assert_eq!(LlmProviderKind::from_model("o3-mini").unwrap(), LlmProviderKind::OpenAi);
    assert_eq!(LlmProviderKind::from_model("claude-3-haiku-20240307").unwrap(), LlmProviderKind::Anthropic);
    assert_eq!(LlmProviderKind::from_model("gemini-1.5-pro-latest").unwrap(), LlmProviderKind::Google);
}

#[test]
fn unknown_model_is_rejected() {
    let err = LlmProviderKind::from_model("llama3").unwrap_err();
    assert!(matches!(err, LlmError::UnknownModel(m) if m == "llama3"));
}

#[test]
fn every_offered_model_has_a_provider() {
    for model in LARGE_MODEL_CHOICES.iter().chain(SMALL_MODEL_CHOICES.iter()) {
        assert!(LlmProviderKind::from_model(model).is_ok(), "no provider for {model}");
    }
}

#[test]
fn for_model_picks_trimmed_provider_key() {
    let cfg = LlmConfig::for_model(&settings_with_keys(), "claude-3-5-sonnet-20241022", LlmTimeouts::default()).unwrap();
    assert_eq!(cfg.provider, LlmProviderKind::Anthropic);
    assert_eq!(cfg.api_key, "sk-ant");
    assert_eq!(cfg.model, "claude-3-5-sonnet-20241022");
    assert!(cfg.temperature.abs() < f32::EPSILON);
}

#[test]
fn for_model_without_key_reports_provider() {
    let err = LlmConfig::for_model(&settings_with_keys(), "gemini-1.5-flash-latest", LlmTimeouts::default()).unwrap_err();
    assert!(matches!(err, LlmError::MissingApiKey { provider: "Google" }));
}

#[test]
fn large_uses_configured_model() {
    let settings = settings_with_keys();
    assert_eq!(LlmConfig::large(&settings, LlmTimeouts::default()).unwrap().model, "gpt-4o");
}

#[test]
fn display_name_strips_compact_date() {
    assert_eq!(display_model_name("claude-3-5-sonnet-20241022"), "Claude-3-5-Sonnet");
}

#[test]
fn display_name_strips_dashed_date() {
    assert_eq!(display_model_name("gpt-4o-mini-2024-07-18"), "Gpt-4o-Mini");
}

#[test]
fn display_name_without_date_is_capitalized() {
    assert_eq!(display_model_name("gpt-4o"), "Gpt-4o");
    assert_eq!(display_model_name("gemini-1.5-pro-latest"), "Gemini-1.5-Pro-Latest");
}

#[test]
fn timeouts_default() {
    let t = LlmTimeouts::default();
    assert_eq!(t.request_secs, DEFAULT_LLM_REQUEST_TIMEOUT_SECS);
    assert_eq!(t.connect_secs, DEFAULT_LLM_CONNECT_TIMEOUT_SECS);
}
