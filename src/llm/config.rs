//! LLM configuration derived from the saved settings plus environment.

use std::sync::LazyLock;

use regex::Regex;

use super::types::LlmError;
use crate::config::LlmSettings;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LLM_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Models offered for the "large" slot on the API settings page.
pub const LARGE_MODEL_CHOICES: [&str; 8] = [
    "o3-mini",
    "o1-mini",
    "gpt-4o",
    "gpt-4o-mini-2024-07-18",
    "claude-3-7-sonnet-20250219",
    "claude-3-5-sonnet-20241022",
    "claude-3-haiku-20240307",
    "gemini-1.5-pro-latest",
];

/// Models offered for the "small" slot on the API settings page.
pub const SMALL_MODEL_CHOICES: [&str; 5] =
    ["o3-mini", "gpt-4o-mini", "gpt-4o-mini-2024-07-18", "claude-3-haiku-20240620", "gemini-1.5-flash-latest"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    OpenAi,
    Anthropic,
    Google,
}

impl LlmProviderKind {
    /// Infer the provider from a model name prefix.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::UnknownModel`] for names no provider claims.
    pub fn from_model(model: &str) -> Result<Self, LlmError> {
        if model.starts_with("gpt") || model.starts_with("o1") || model.starts_with("o3") {
            Ok(Self::OpenAi)
        } else if model.starts_with("claude") {
            Ok(Self::Anthropic)
        } else if model.starts_with("gemini") {
            Ok(Self::Google)
        } else {
            Err(LlmError::UnknownModel(model.to_string()))
        }
    }

    /// Human-facing provider name used in settings messages.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Google => "Google",
        }
    }

    /// The saved API key for this provider (may be empty).
    #[must_use]
    pub fn api_key(self, settings: &LlmSettings) -> &str {
        match self {
            Self::OpenAi => &settings.openai_api_key,
            Self::Anthropic => &settings.anthropic_api_key,
            Self::Google => &settings.google_api_key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl LlmTimeouts {
    /// `LLM_REQUEST_TIMEOUT_SECS` (default 120), `LLM_CONNECT_TIMEOUT_SECS` (default 10).
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            request_secs: env_parse_u64("LLM_REQUEST_TIMEOUT_SECS", DEFAULT_LLM_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("LLM_CONNECT_TIMEOUT_SECS", DEFAULT_LLM_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Default for LlmTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_LLM_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_LLM_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub openai_base_url: String,
    pub timeouts: LlmTimeouts,
}

impl LlmConfig {
    /// Build a config for `model` using the key saved for its provider.
    ///
    /// `LLM_OPENAI_BASE_URL` overrides the `OpenAI` endpoint for compatible APIs.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is unknown or its provider has no key.
    pub fn for_model(settings: &LlmSettings, model: &str, timeouts: LlmTimeouts) -> Result<Self, LlmError> {
        let provider = LlmProviderKind::from_model(model)?;
        let api_key = provider.api_key(settings).trim();
        if api_key.is_empty() {
            return Err(LlmError::MissingApiKey { provider: provider.display_name() });
        }
        let openai_base_url = std::env::var("LLM_OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            provider,
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            openai_base_url,
            timeouts,
        })
    }

    /// Config for the configured large model.
    ///
    /// # Errors
    ///
    /// See [`LlmConfig::for_model`].
    pub fn large(settings: &LlmSettings, timeouts: LlmTimeouts) -> Result<Self, LlmError> {
        Self::for_model(settings, &settings.large_model, timeouts)
    }
}

static DATE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?(\d{4}(-?\d{2}){2})$").expect("date suffix regex"));

/// Model name without a trailing date version, each dash-separated word capitalized.
///
/// `claude-3-5-sonnet-20241022` becomes `Claude-3-5-Sonnet`.
#[must_use]
pub fn display_model_name(model: &str) -> String {
    let name = match DATE_SUFFIX_RE.find(model) {
        Some(m) => model[..m.start()].trim_end_matches('-'),
        None => model,
    };

    name.split('-').map(capitalize).collect::<Vec<_>>().join("-")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
