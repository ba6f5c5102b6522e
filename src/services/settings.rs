//! Settings service: validate and apply edits from the settings pages.
//!
//! DESIGN
//! ======
//! Both editors work on a copy of the loaded [`Settings`]. An update is
//! trimmed and validated first; only a fully valid result is written to disk
//! and swapped into the shared state by the caller. Missing provider keys
//! are not errors: they come back as warnings for the page to show inline.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, LlmSettings, Orientation, Settings};
use crate::llm::config::{LARGE_MODEL_CHOICES, LlmProviderKind, SMALL_MODEL_CHOICES};
use crate::llm::types::LlmError;
use crate::theme::{FONTS, Theme, ThemeStatus};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("{slot} model '{model}' is not one of the offered choices")]
    InvalidModel { slot: &'static str, model: String },

    #[error("{field} must be a #RRGGBB colour, got '{value}'")]
    InvalidColor { field: &'static str, value: String },

    #[error("unsupported font '{0}'")]
    InvalidFont(String),
}

impl crate::error::ErrorCode for SettingsError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidModel { .. } => "E_INVALID_MODEL",
            Self::InvalidColor { .. } => "E_INVALID_COLOR",
            Self::InvalidFont(_) => "E_INVALID_FONT",
        }
    }
}

// =============================================================================
// API SETTINGS
// =============================================================================

/// Partial edit of the API settings. Absent fields keep their saved value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiSettingsUpdate {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub langchain_api_key: Option<String>,
    pub large_model: Option<String>,
    pub small_model: Option<String>,
    pub perplexity_api_key: Option<String>,
    pub brave_api_key: Option<String>,
    pub exa_ai_api_key: Option<String>,
    pub db_file_path: Option<String>,
    pub eod_api_key: Option<String>,
}

/// Whether a credential is saved, without revealing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyStatus {
    pub name: &'static str,
    pub label: &'static str,
    pub set: bool,
}

/// What the API settings page and `GET /api/settings/api` show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiSettingsView {
    pub keys: Vec<KeyStatus>,
    pub large_model: String,
    pub small_model: String,
    pub large_model_choices: Vec<&'static str>,
    pub small_model_choices: Vec<&'static str>,
    pub db_file_path: String,
    pub warnings: Vec<String>,
}

/// Credential fields in display order: form name and label.
pub const SECRET_FIELDS: [(&str, &str); 8] = [
    ("openai_api_key", "OpenAI API Key"),
    ("anthropic_api_key", "Anthropic API Key"),
    ("google_api_key", "Google API Key"),
    ("langchain_api_key", "Langchain API Key"),
    ("exa_ai_api_key", "Exa API Key"),
    ("perplexity_api_key", "Perplexity API Key"),
    ("brave_api_key", "Brave API Key"),
    ("eod_api_key", "EOD API Key"),
];

fn secret_value<'a>(app: &'a AppConfig, name: &str) -> &'a str {
    match name {
        "openai_api_key" => &app.llm.openai_api_key,
        "anthropic_api_key" => &app.llm.anthropic_api_key,
        "google_api_key" => &app.llm.google_api_key,
        "langchain_api_key" => &app.llm.langchain_api_key,
        "exa_ai_api_key" => &app.rag.exa_ai_api_key,
        "perplexity_api_key" => &app.search.perplexity_api_key,
        "brave_api_key" => &app.search.brave_api_key,
        "eod_api_key" => &app.database.eod_api_key,
        _ => "",
    }
}

#[must_use]
pub fn api_settings_view(app: &AppConfig) -> ApiSettingsView {
    let keys = SECRET_FIELDS
        .iter()
        .map(|&(name, label)| KeyStatus { name, label, set: !secret_value(app, name).trim().is_empty() })
        .collect();

    ApiSettingsView {
        keys,
        large_model: app.llm.large_model.clone(),
        small_model: app.llm.small_model.clone(),
        large_model_choices: LARGE_MODEL_CHOICES.to_vec(),
        small_model_choices: SMALL_MODEL_CHOICES.to_vec(),
        db_file_path: app.database.db_file_path.clone(),
        warnings: missing_key_warnings(&app.llm),
    }
}

/// Apply `update` to a copy of `app`, trimming every value.
///
/// # Errors
///
/// Returns an error if a model is not one of the offered choices.
pub fn apply_api_update(app: &AppConfig, update: ApiSettingsUpdate) -> Result<AppConfig, SettingsError> {
    let mut next = app.clone();

    let assign = |slot: &mut String, value: Option<String>| {
        if let Some(v) = value {
            *slot = v.trim().to_string();
        }
    };
    assign(&mut next.llm.openai_api_key, update.openai_api_key);
    assign(&mut next.llm.anthropic_api_key, update.anthropic_api_key);
    assign(&mut next.llm.google_api_key, update.google_api_key);
    assign(&mut next.llm.langchain_api_key, update.langchain_api_key);
    assign(&mut next.search.perplexity_api_key, update.perplexity_api_key);
    assign(&mut next.search.brave_api_key, update.brave_api_key);
    assign(&mut next.rag.exa_ai_api_key, update.exa_ai_api_key);
    assign(&mut next.database.db_file_path, update.db_file_path);
    assign(&mut next.database.eod_api_key, update.eod_api_key);

    if let Some(model) = update.large_model {
        next.llm.large_model = validate_model("large", model.trim(), &LARGE_MODEL_CHOICES)?;
    }
    if let Some(model) = update.small_model {
        next.llm.small_model = validate_model("small", model.trim(), &SMALL_MODEL_CHOICES)?;
    }

    Ok(next)
}

fn validate_model(slot: &'static str, model: &str, choices: &[&str]) -> Result<String, SettingsError> {
    if choices.contains(&model) && LlmProviderKind::from_model(model).is_ok() {
        Ok(model.to_string())
    } else {
        Err(SettingsError::InvalidModel { slot, model: model.to_string() })
    }
}

/// One line per provider used by the large or small model that has no key.
#[must_use]
pub fn missing_key_warnings(llm: &LlmSettings) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut checked = Vec::new();
    for model in [&llm.large_model, &llm.small_model] {
        match LlmProviderKind::from_model(model) {
            Ok(provider) if !checked.contains(&provider) => {
                checked.push(provider);
                if provider.api_key(llm).trim().is_empty() {
                    warnings.push(LlmError::MissingApiKey { provider: provider.display_name() }.to_string());
                }
            }
            Ok(_) => {}
            Err(e) => warnings.push(e.to_string()),
        }
    }
    warnings
}

// =============================================================================
// THEME SETTINGS
// =============================================================================

/// Edit from the theme settings page. Colours and font apply to `custom` only.
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeUpdate {
    pub status: ThemeStatus,
    #[serde(default)]
    pub orientation: Option<Orientation>,
    #[serde(default)]
    pub wide_mode: Option<bool>,
    #[serde(default)]
    pub use_multi_icon_menu: Option<bool>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub secondary_background_color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub font: Option<String>,
}

/// What `GET /api/settings/theme` returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeView {
    pub status: ThemeStatus,
    pub theme: Theme,
    pub orientation: Orientation,
    pub wide_mode: bool,
    pub use_multi_icon_menu: bool,
    pub fonts: Vec<&'static str>,
}

#[must_use]
pub fn theme_view(settings: &Settings) -> ThemeView {
    ThemeView {
        status: settings.theme_status(),
        theme: settings.host.theme.clone(),
        orientation: settings.app.menu.orientation,
        wide_mode: settings.app.menu.wide_mode,
        use_multi_icon_menu: settings.app.menu.use_multi_icon_menu,
        fonts: FONTS.to_vec(),
    }
}

/// Apply `update` to a copy of `settings`.
///
/// # Errors
///
/// Returns an error if a custom colour or font is malformed.
pub fn apply_theme_update(settings: &Settings, update: ThemeUpdate) -> Result<Settings, SettingsError> {
    let mut next = settings.clone();

    next.host.theme = match update.status {
        ThemeStatus::Light => Theme::light(),
        ThemeStatus::Dark => Theme::dark(),
        ThemeStatus::Custom => {
            let current = &settings.host.theme;
            let font = update.font.map_or_else(|| current.font.clone(), |f| f.trim().to_string());
            if !FONTS.contains(&font.as_str()) {
                return Err(SettingsError::InvalidFont(font));
            }
            Theme {
                base: current.base,
                primary_color: color("primary_color", update.primary_color, &current.primary_color)?,
                background_color: color("background_color", update.background_color, &current.background_color)?,
                secondary_background_color: color(
                    "secondary_background_color",
                    update.secondary_background_color,
                    &current.secondary_background_color,
                )?,
                text_color: color("text_color", update.text_color, &current.text_color)?,
                font,
            }
        }
    };

    if let Some(orientation) = update.orientation {
        next.app.menu.orientation = orientation;
    }
    if let Some(wide) = update.wide_mode {
        next.app.menu.wide_mode = wide;
    }
    if let Some(multi) = update.use_multi_icon_menu {
        next.app.menu.use_multi_icon_menu = multi;
    }
    Ok(next)
}

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("hex colour regex"));

fn color(field: &'static str, value: Option<String>, current: &str) -> Result<String, SettingsError> {
    let value = value.map_or_else(|| current.to_string(), |v| v.trim().to_string());
    if HEX_COLOR_RE.is_match(&value) {
        Ok(value)
    } else {
        Err(SettingsError::InvalidColor { field, value })
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
