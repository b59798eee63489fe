//! Gemini `generateContent` client.
//!
//! Thin HTTP wrapper for `models/{model}:generateContent`. Pure parsing in
//! `parse_response` and `classify_error` for testability.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::config::LlmTimeouts;
use super::types::{ChatResponse, LlmError, Message, Role};

const ENTITY_NOT_FOUND: &str = "Requested entity was not found";

// =============================================================================
// CLIENT
// =============================================================================

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String, timeouts: LlmTimeouts) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, api_key, base_url })
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.trim_start_matches("models/");
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    pub async fn chat(
        &self,
        model: &str,
        max_tokens: u32,
        system: &str,
        messages: &[Message],
    ) -> Result<ChatResponse, LlmError> {
        let body = build_request(max_tokens, system, messages);

        let response = self
            .http
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        if status != 200 {
            return Err(classify_error(status, text));
        }

        parse_response(&text, model)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest<'a> {
    contents: Vec<WireContent<'a>>,
    system_instruction: WireSystem<'a>,
    generation_config: WireGenerationConfig,
}

#[derive(Serialize)]
struct WireContent<'a> {
    role: Role,
    parts: [WireTextPart<'a>; 1],
}

#[derive(Serialize)]
struct WireSystem<'a> {
    parts: [WireTextPart<'a>; 1],
}

#[derive(Serialize)]
struct WireTextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    max_output_tokens: u32,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ApiResponse {
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Usage,
    model_version: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Usage {
    prompt_token_count: u64,
    candidates_token_count: u64,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ErrorDetail {
    message: String,
    status: String,
}

// =============================================================================
// PARSING
// =============================================================================

fn build_request<'a>(max_tokens: u32, system: &'a str, messages: &'a [Message]) -> ApiRequest<'a> {
    ApiRequest {
        contents: messages
            .iter()
            .map(|m| WireContent { role: m.role, parts: [WireTextPart { text: &m.text }] })
            .collect(),
        system_instruction: WireSystem { parts: [WireTextPart { text: system }] },
        generation_config: WireGenerationConfig { max_output_tokens: max_tokens },
    }
}

/// Response text is the concatenated text parts of the first candidate.
fn parse_response(json: &str, model: &str) -> Result<ChatResponse, LlmError> {
    let api: ApiResponse = serde_json::from_str(json).map_err(|e| LlmError::ApiParse(e.to_string()))?;

    let Some(candidate) = api.candidates.into_iter().next() else {
        let reason = api
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".into());
        return Err(LlmError::EmptyResponse(reason));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse(candidate.finish_reason.unwrap_or_else(|| "no text".into())));
    }

    Ok(ChatResponse {
        text,
        model: api.model_version.unwrap_or_else(|| model.to_owned()),
        finish_reason: candidate.finish_reason,
        input_tokens: api.usage_metadata.prompt_token_count,
        output_tokens: api.usage_metadata.candidates_token_count,
    })
}

/// A missing model or key is reported distinctly so callers can ask the
/// user to re-authenticate.
fn classify_error(status: u16, body: String) -> LlmError {
    let detail = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error)
        .unwrap_or_default();
    if status == 404 || detail.status == "NOT_FOUND" || detail.message.contains(ENTITY_NOT_FOUND) {
        let message = if detail.message.is_empty() { ENTITY_NOT_FOUND.to_owned() } else { detail.message };
        return LlmError::EntityNotFound(message);
    }
    LlmError::ApiResponse { status, body }
}

#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;
