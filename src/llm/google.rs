//! Google Gemini `generateContent` client.
//!
//! Assistant turns are sent with role `model`; the system prompt travels as
//! `systemInstruction`. The dangerous-content filter is relaxed so technical
//! answers are not blocked mid-conversation.

use serde::Serialize;
use serde_json::Value;

use super::config::LlmTimeouts;
use super::types::{ChatResponse, LlmError, Message, Role};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GoogleClient {
    http: reqwest::Client,
    api_key: String,
    temperature: f32,
}

impl GoogleClient {
    pub fn new(api_key: String, temperature: f32, timeouts: LlmTimeouts) -> Result<Self, LlmError> {
        let http = super::http_client(timeouts)?;
        Ok(Self { http, api_key, temperature })
    }

    pub async fn chat(
        &self,
        model: &str,
        max_tokens: u32,
        system: &str,
        messages: &[Message],
    ) -> Result<ChatResponse, LlmError> {
        let body = build_request(system, messages, max_tokens, self.temperature);
        let url = format!("{API_BASE}/{model}:generateContent");

        let request = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        let text = super::send_json(request).await?;

        parse_response(&text, model)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
    safety_settings: [SafetySetting; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

fn build_request<'a>(system: &'a str, messages: &'a [Message], max_tokens: u32, temperature: f32) -> GenerateRequest<'a> {
    let system_instruction =
        (!system.trim().is_empty()).then(|| Content { role: None, parts: [Part { text: system }] });
    let contents = messages
        .iter()
        .map(|m| Content {
            role: Some(match m.role {
                Role::User => "user",
                Role::Assistant => "model",
            }),
            parts: [Part { text: &m.content }],
        })
        .collect();

    GenerateRequest {
        system_instruction,
        contents,
        generation_config: GenerationConfig { temperature, max_output_tokens: max_tokens },
        safety_settings: [SafetySetting { category: "HARM_CATEGORY_DANGEROUS_CONTENT", threshold: "BLOCK_NONE" }],
    }
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

pub(crate) fn parse_response(json_text: &str, requested_model: &str) -> Result<ChatResponse, LlmError> {
    let root: Value = serde_json::from_str(json_text).map_err(|e| LlmError::ApiParse(e.to_string()))?;

    let Some(candidate) = root
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
    else {
        let reason = root
            .get("promptFeedback")
            .and_then(|f| f.get("blockReason"))
            .and_then(Value::as_str)
            .unwrap_or("missing candidates[0]");
        return Err(LlmError::ApiParse(format!("generateContent: {reason}")));
    };

    let text: String = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| parts.iter().filter_map(|p| p.get("text").and_then(Value::as_str)).collect())
        .unwrap_or_default();

    let stop_reason = match candidate.get("finishReason").and_then(Value::as_str) {
        None | Some("STOP") => "end_turn".to_string(),
        Some("MAX_TOKENS") => "max_tokens".to_string(),
        Some(other) => other.to_ascii_lowercase(),
    };

    let usage = root.get("usageMetadata");
    let token_count = |key: &str| usage.and_then(|u| u.get(key)).and_then(Value::as_u64).unwrap_or(0);

    Ok(ChatResponse {
        text,
        model: root
            .get("modelVersion")
            .and_then(Value::as_str)
            .unwrap_or(requested_model)
            .to_string(),
        stop_reason,
        input_tokens: token_count("promptTokenCount"),
        output_tokens: token_count("candidatesTokenCount"),
    })
}

#[cfg(test)]
#[path = "google_test.rs"]
mod tests;
