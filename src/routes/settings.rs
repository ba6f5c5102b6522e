//! Settings routes: API keys/models and theme/menu layout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

use crate::config::{ConfigError, Settings};
use crate::error::ApiError;
use crate::services::settings::{
    self as settings_svc, ApiSettingsUpdate, ApiSettingsView, SettingsError, ThemeUpdate, ThemeView,
};
use crate::state::AppState;

fn invalid(err: &SettingsError) -> ApiError {
    ApiError::from_error(StatusCode::BAD_REQUEST, err)
}

fn save_failed(err: &ConfigError) -> ApiError {
    tracing::error!(error = %err, "saving settings failed");
    ApiError::from_error(StatusCode::INTERNAL_SERVER_ERROR, err)
}

/// `GET /api/settings/api`: key presence, models and warnings. Never returns key values.
pub async fn get_api_settings(State(state): State<AppState>) -> Json<ApiSettingsView> {
    Json(settings_svc::api_settings_view(&state.settings.read().await.app))
}

/// `PUT /api/settings/api`: save keys and models, then rebuild the LLM client.
pub async fn put_api_settings(
    State(state): State<AppState>,
    Json(update): Json<ApiSettingsUpdate>,
) -> Result<Json<ApiSettingsView>, ApiError> {
    let current = state.settings().await;
    let app = settings_svc::apply_api_update(&current.app, update).map_err(|e| invalid(&e))?;
    state.config.save_app(&app).await.map_err(|e| save_failed(&e))?;

    let view = settings_svc::api_settings_view(&app);
    for warning in &view.warnings {
        tracing::warn!(warning = %warning, "api settings saved with missing key");
    }
    state.replace_settings(Settings { app, ..current }).await;
    tracing::info!("api settings saved");
    Ok(Json(view))
}

/// `GET /api/settings/theme`: theme status, palette and menu layout.
pub async fn get_theme(State(state): State<AppState>) -> Json<ThemeView> {
    Json(settings_svc::theme_view(&*state.settings.read().await))
}

/// `PUT /api/settings/theme`: save the theme and menu layout.
pub async fn put_theme(
    State(state): State<AppState>,
    Json(update): Json<ThemeUpdate>,
) -> Result<Json<ThemeView>, ApiError> {
    let current = state.settings().await;
    let next = settings_svc::apply_theme_update(&current, update).map_err(|e| invalid(&e))?;
    if next.host != current.host {
        state.config.save_host(&next.host).await.map_err(|e| save_failed(&e))?;
    }
    if next.app != current.app {
        state.config.save_app(&next.app).await.map_err(|e| save_failed(&e))?;
    }

    let view = settings_svc::theme_view(&next);
    state.replace_settings(next).await;
    tracing::info!(status = ?view.status, "theme settings saved");
    Ok(Json(view))
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
