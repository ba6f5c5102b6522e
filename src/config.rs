//! Application configuration files.
//!
//! DESIGN
//! ======
//! Two TOML files live in the config directory (`MULTIPAGE_CONFIG_DIR`,
//! default `.config`):
//!
//! - `host.toml` holds what the page host itself reads: the theme and the
//!   `[client] show_sidebar_navigation` toggle. The toggle must stay `false`
//!   for the custom navigation menu to be the only one rendered, so loading
//!   rewrites the file whenever it finds `true`.
//! - `app_config.toml` holds menu preferences, provider credentials, model
//!   choices and the remaining third-party keys.
//!
//! Missing files are created with defaults on first load. The settings pages
//! are the only writers afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::theme::{Theme, ThemeOverrides, ThemeStatus};

pub const CONFIG_DIR_ENV: &str = "MULTIPAGE_CONFIG_DIR";
pub const DEFAULT_CONFIG_DIR: &str = ".config";
pub const HOST_CONFIG_FILE: &str = "host.toml";
pub const APP_CONFIG_FILE: &str = "app_config.toml";

pub const DEFAULT_LARGE_MODEL: &str = "gpt-4o";
pub const DEFAULT_SMALL_MODEL: &str = "gpt-4o-mini";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("cannot write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("cannot serialize config: {0}")]
    Serialize(String),
}

impl crate::error::ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "E_CONFIG_READ",
            Self::Parse { .. } => "E_CONFIG_PARSE",
            Self::Write { .. } => "E_CONFIG_WRITE",
            Self::Serialize(_) => "E_CONFIG_SERIALIZE",
        }
    }
}

// =============================================================================
// HOST CONFIG
// =============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawClientSection {
    show_sidebar_navigation: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawHostConfig {
    #[serde(default)]
    client: RawClientSection,
    #[serde(default)]
    theme: ThemeOverrides,
}

/// Resolved host settings. Sidebar generation is always off.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostConfig {
    pub theme: Theme,
}

impl HostConfig {
    fn to_raw(&self) -> RawHostConfig {
        RawHostConfig {
            client: RawClientSection { show_sidebar_navigation: Some(false) },
            theme: self.theme.clone().into(),
        }
    }
}

// =============================================================================
// APP CONFIG
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuSettings {
    pub orientation: Orientation,
    pub wide_mode: bool,
    /// Nested icon menu when `true`, flat label list otherwise.
    pub use_multi_icon_menu: bool,
}

impl Default for MenuSettings {
    fn default() -> Self {
        Self { orientation: Orientation::Vertical, wide_mode: false, use_multi_icon_menu: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub openai_api_key: String,
    pub anthropic_api_key: String,
    pub google_api_key: String,
    pub langchain_api_key: String,
    pub large_model: String,
    pub small_model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            anthropic_api_key: String::new(),
            google_api_key: String::new(),
            langchain_api_key: String::new(),
            large_model: DEFAULT_LARGE_MODEL.into(),
            small_model: DEFAULT_SMALL_MODEL.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub perplexity_api_key: String,
    pub brave_api_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub exa_ai_api_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub db_file_path: String,
    pub eod_api_key: String,
}

/// Persona used for the chat assistant's system prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Helpful,
    #[default]
    IronicComedian,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantSettings {
    pub persona: Persona,
    /// A new browser session continues the most recently saved chat.
    pub resume_last_chat: bool,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self { persona: Persona::default(), resume_last_chat: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(alias = "streamlit-option-menu")]
    pub menu: MenuSettings,
    #[serde(alias = "LLM")]
    pub llm: LlmSettings,
    pub search: SearchSettings,
    #[serde(alias = "RAG")]
    pub rag: RagSettings,
    pub database: DatabaseSettings,
    pub assistant: AssistantSettings,
}

/// Everything loaded from both files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub host: HostConfig,
    pub app: AppConfig,
}

impl Settings {
    #[must_use]
    pub fn theme_status(&self) -> ThemeStatus {
        self.host.theme.status()
    }
}

/// Drop doubled backslashes and unescape `\ ` so shell-copied paths work.
#[must_use]
pub fn clean_path_string(path: &str) -> String {
    path.replace("\\\\", "").replace("\\ ", " ")
}

// =============================================================================
// STORE
// =============================================================================

/// Reads and writes the two config files in one directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Config directory from `MULTIPAGE_CONFIG_DIR`, else `.config`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(std::env::var(CONFIG_DIR_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_DIR.into()))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn host_path(&self) -> PathBuf {
        self.dir.join(HOST_CONFIG_FILE)
    }

    #[must_use]
    pub fn app_path(&self) -> PathBuf {
        self.dir.join(APP_CONFIG_FILE)
    }

    /// Load both files, creating whichever is missing with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read, parsed or (re)written.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let host_path = self.host_path();
        if !host_path.exists() {
            tracing::info!(path = %host_path.display(), "creating default host config");
            write_toml(&host_path, &HostConfig::default().to_raw())?;
        }
        let app_path = self.app_path();
        if !app_path.exists() {
            tracing::info!(path = %app_path.display(), "creating default app config");
            write_toml(&app_path, &AppConfig::default())?;
        }

        let raw_host: RawHostConfig = read_toml(&host_path)?;
        let sidebar_enabled = raw_host.client.show_sidebar_navigation == Some(true);
        let host = HostConfig { theme: raw_host.theme.resolve() };
        if sidebar_enabled {
            tracing::warn!(path = %host_path.display(), "show_sidebar_navigation was enabled; forcing it off");
            write_toml(&host_path, &host.to_raw())?;
        }

        let mut app: AppConfig = read_toml(&app_path)?;
        app.database.db_file_path = clean_path_string(&app.database.db_file_path);

        Ok(Settings { host, app })
    }

    /// Rewrite `host.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save_host(&self, host: &HostConfig) -> Result<(), ConfigError> {
        write_toml_async(&self.host_path(), &host.to_raw()).await
    }

    /// Rewrite `app_config.toml`, cleaning the database path first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save_app(&self, app: &AppConfig) -> Result<(), ConfigError> {
        let mut app = app.clone();
        app.database.db_file_path = clean_path_string(&app.database.db_file_path);
        write_toml_async(&self.app_path(), &app).await
    }
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw =
        fs::read_to_string(path).map_err(|e| ConfigError::Read { path: path.to_path_buf(), message: e.to_string() })?;
    toml::from_str(&raw).map_err(|e| ConfigError::Parse { path: path.to_path_buf(), message: e.to_string() })
}

fn write_error(path: &Path, e: &std::io::Error) -> ConfigError {
    ConfigError::Write { path: path.to_path_buf(), message: e.to_string() }
}

fn to_toml<T: Serialize>(value: &T) -> Result<String, ConfigError> {
    toml::to_string_pretty(value).map_err(|e| ConfigError::Serialize(e.to_string()))
}

/// Startup-time writer used by [`ConfigStore::load`].
fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let text = to_toml(value)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| write_error(parent, &e))?;
    }
    fs::write(path, text).map_err(|e| write_error(path, &e))
}

async fn write_toml_async<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let text = to_toml(value)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| write_error(parent, &e))?;
    }
    tokio::fs::write(path, text).await.map_err(|e| write_error(path, &e))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
