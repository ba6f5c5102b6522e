//! LLM: multi-provider adapter for the chat assistant.
//!
//! DESIGN
//! ======
//! The provider is inferred from the configured model name, and the key comes
//! from the API settings page. `LlmClient` dispatches to the matching HTTP
//! client; everything above this module only sees the [`LlmChat`] trait.

pub mod anthropic;
pub mod config;
pub mod google;
pub mod openai;
pub mod types;

use std::time::Duration;

use config::{LlmConfig, LlmProviderKind, LlmTimeouts};
use serde::Serialize;
pub use types::LlmChat;
use types::{ChatResponse, LlmError, Message};

/// Whether the chat assistant can currently reach a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LlmStatus {
    Ready { model: String, display_name: String },
    Unavailable { reason: String },
}

impl LlmStatus {
    #[must_use]
    pub fn ready(model: &str) -> Self {
        Self::Ready { model: model.to_string(), display_name: config::display_model_name(model) }
    }
}

// =============================================================================
// CLIENT DISPATCH
// =============================================================================

/// Concrete LLM client that dispatches to `OpenAI`, Anthropic or Google.
pub struct LlmClient {
    inner: LlmProvider,
    model: String,
}

enum LlmProvider {
    OpenAi(openai::OpenAiClient),
    Anthropic(anthropic::AnthropicClient),
    Google(google::GoogleClient),
}

impl LlmClient {
    /// Build an LLM client from a resolved config.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let model = config.model.clone();
        let inner = match config.provider {
            LlmProviderKind::OpenAi => LlmProvider::OpenAi(openai::OpenAiClient::new(
                config.api_key,
                config.openai_base_url,
                config.temperature,
                config.timeouts,
            )?),
            LlmProviderKind::Anthropic => LlmProvider::Anthropic(anthropic::AnthropicClient::new(
                config.api_key,
                config.temperature,
                config.timeouts,
            )?),
            LlmProviderKind::Google => {
                LlmProvider::Google(google::GoogleClient::new(config.api_key, config.temperature, config.timeouts)?)
            }
        };
        Ok(Self { inner, model })
    }

    async fn chat_inner(&self, max_tokens: u32, system: &str, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        match &self.inner {
            LlmProvider::OpenAi(c) => c.chat(&self.model, max_tokens, system, messages).await,
            LlmProvider::Anthropic(c) => c.chat(&self.model, max_tokens, system, messages).await,
            LlmProvider::Google(c) => c.chat(&self.model, max_tokens, system, messages).await,
        }
    }
}

#[async_trait::async_trait]
impl LlmChat for LlmClient {
    async fn chat(&self, max_tokens: u32, system: &str, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        self.chat_inner(max_tokens, system, messages).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// =============================================================================
// HTTP
// =============================================================================

fn http_client(timeouts: LlmTimeouts) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeouts.request_secs))
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .build()
        .map_err(|e| LlmError::HttpClientBuild(e.to_string()))
}

/// Send a provider request and return the body of a 2xx response.
async fn send_json(request: reqwest::RequestBuilder) -> Result<String, LlmError> {
    let response = request.send().await.map_err(|e| LlmError::ApiRequest(e.to_string()))?;
    let status = response.status();
    let body = response.text().await.map_err(|e| LlmError::ApiRequest(e.to_string()))?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(LlmError::ApiResponse { status: status.as_u16(), body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmSettings;
    use config::LlmTimeouts;

    #[test]
    fn client_keeps_configured_model() {
        let settings = LlmSettings { google_api_key: "g-key".into(), ..LlmSettings::default() };
        let cfg = LlmConfig::for_model(&settings, "gemini-1.5-flash-latest", LlmTimeouts::default()).unwrap();
        let client = LlmClient::from_config(cfg).unwrap();
        assert_eq!(client.model(), "gemini-1.5-flash-latest");
        assert!(matches!(client.inner, LlmProvider::Google(_)));
    }

    #[test]
    fn ready_status_carries_display_name() {
        assert_eq!(
            LlmStatus::ready("gpt-4o-mini-2024-07-18"),
            LlmStatus::Ready { model: "gpt-4o-mini-2024-07-18".into(), display_name: "Gpt-4o-Mini".into() }
        );
    }

    #[test]
    fn client_dispatches_on_provider() {
        let settings = LlmSettings { openai_api_key: "sk".into(), anthropic_api_key: "ak".into(), ..LlmSettings::default() };
        let openai = LlmClient::from_config(LlmConfig::large(&settings, LlmTimeouts::default()).unwrap()).unwrap();
        assert!(matches!(openai.inner, LlmProvider::OpenAi(_)));

        let claude =
            LlmConfig::for_model(&settings, "claude-3-haiku-20240307", LlmTimeouts::default()).unwrap();
        let anthropic = LlmClient::from_config(claude).unwrap();
        assert!(matches!(anthropic.inner, LlmProvider::Anthropic(_)));
    }
}
