//! Chat service — visitor question → single generation call → reply text.
//!
//! DESIGN
//! ======
//! The client sends its recent message log plus the new message. History is
//! normalized into the role-tagged turns the provider expects: blank turns
//! are dropped, the window is capped, leading assistant turns (the welcome
//! bubble) are discarded, and consecutive same-role turns are merged so the
//! conversation alternates and starts with the user. The system preamble is
//! built once from the content catalog and held in [`AppState`].

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::llm::types::{LlmError, Message};
use crate::rate_limit::RateLimitError;
use crate::state::AppState;

const DEFAULT_CHAT_HISTORY_LIMIT: usize = 10;
const DEFAULT_CHAT_MAX_OUTPUT_TOKENS: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatConfig {
    pub history_limit: usize,
    pub max_output_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { history_limit: DEFAULT_CHAT_HISTORY_LIMIT, max_output_tokens: DEFAULT_CHAT_MAX_OUTPUT_TOKENS }
    }
}

impl ChatConfig {
    /// `CHAT_HISTORY_LIMIT` (default 10), `CHAT_MAX_OUTPUT_TOKENS` (default 1024).
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            history_limit: get("CHAT_HISTORY_LIMIT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_CHAT_HISTORY_LIMIT),
            max_output_tokens: get("CHAT_MAX_OUTPUT_TOKENS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_CHAT_MAX_OUTPUT_TOKENS),
        }
    }
}

// =============================================================================
// TYPES
// =============================================================================

/// One prior message as the client stores it. Extra fields (ids) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub text: String,
    pub is_user: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatServiceError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("LLM not configured")]
    LlmNotConfigured,
    #[error("rate limited: {0}")]
    RateLimited(#[from] RateLimitError),
    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl ErrorCode for ChatServiceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "E_EMPTY_MESSAGE",
            Self::LlmNotConfigured => "E_LLM_NOT_CONFIGURED",
            Self::RateLimited(e) => e.error_code(),
            Self::Llm(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::EmptyMessage | Self::LlmNotConfigured => false,
            Self::RateLimited(e) => e.retryable(),
            Self::Llm(e) => e.retryable(),
        }
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Answer one visitor message.
///
/// # Errors
///
/// Rejects blank messages, reports a missing LLM configuration, enforces the
/// rate limits, and surfaces provider failures unchanged.
pub async fn handle_chat(state: &AppState, request: ChatRequest) -> Result<ChatReply, ChatServiceError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ChatServiceError::EmptyMessage);
    }
    let Some(llm) = state.llm.as_ref() else {
        return Err(ChatServiceError::LlmNotConfigured);
    };

    let client_id = request.client_id.unwrap_or_else(Uuid::nil);
    state.rate_limiter.check_and_record(client_id)?;

    let contents = build_contents(&request.history, message, state.chat.history_limit);
    info!(%client_id, turns = contents.len(), message_len = message.len(), "chat: request");

    let response = llm
        .chat(state.chat.max_output_tokens, &state.preamble, &contents)
        .await
        .inspect_err(|e| warn!(%client_id, error = %e, "chat: generation failed"))?;

    info!(
        %client_id,
        model = %response.model,
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        finish_reason = ?response.finish_reason,
        "chat: reply"
    );
    Ok(ChatReply { text: response.text })
}

// =============================================================================
// HISTORY
// =============================================================================

/// Role-tagged turns for the provider: normalized history, then the new message.
#[must_use]
pub fn build_contents(history: &[HistoryTurn], message: &str, limit: usize) -> Vec<Message> {
    let mut contents = normalize_history(history, limit);
    push_merged(&mut contents, Message::user(message));
    contents
}

/// Cap to the last `limit` non-blank turns, drop leading model turns, merge runs.
#[must_use]
pub fn normalize_history(history: &[HistoryTurn], limit: usize) -> Vec<Message> {
    let turns: Vec<&HistoryTurn> = history
        .iter()
        .filter(|t| !t.text.trim().is_empty())
        .collect();
    let start = turns.len().saturating_sub(limit);

    let mut out: Vec<Message> = Vec::new();
    for turn in turns[start..]
        .iter()
        .skip_while(|t| !t.is_user)
    {
        let text = turn.text.trim();
        push_merged(&mut out, if turn.is_user { Message::user(text) } else { Message::model(text) });
    }
    out
}

fn push_merged(out: &mut Vec<Message>, message: Message) {
    match out.last_mut() {
        Some(last) if last.role == message.role => {
            last.text.push('\n');
            last.text.push_str(&message.text);
        }
        _ => out.push(message),
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
