use super::*;
use crate::state::test_helpers;

#[tokio::test]
async fn get_api_settings_reports_presence_only() {
    let (state, _dir) = test_helpers::test_app_state();
    state.settings.write().await.app.llm.anthropic_api_key = "sk-ant".into();

    let Json(view) = get_api_settings(State(state)).await;
    let anthropic = view.keys.iter().find(|k| k.name == "anthropic_api_key").unwrap();
    assert!(anthropic.set);
    assert!(!serde_json::to_string(&view).unwrap().contains("sk-ant"));
}

#[tokio::test]
async fn blank_key_clears_saved_value() {
    let (state, _dir) = test_helpers::test_app_state();
    state.replace_settings(test_helpers::settings_with_openai_key()).await;

    let update = ApiSettingsUpdate { openai_api_key: Some(String::new()), ..ApiSettingsUpdate::default() };
    let Json(view) = put_api_settings(State(state.clone()), Json(update)).await.unwrap();
    assert!(!view.warnings.is_empty());
    assert!(state.settings().await.app.llm.openai_api_key.is_empty());
}

#[test]
fn invalid_settings_are_bad_requests() {
    let err = invalid(&SettingsError::InvalidFont("comic".into()));
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.code, "E_INVALID_FONT");
}
