//! Text chat: an append-only message log and the single-shot reply path.
//!
//! DESIGN
//! ======
//! Each send takes the last [`HISTORY_WINDOW`] messages as context, appends
//! the user's message, awaits exactly one reply from the [`Responder`], and
//! appends it. Failures become an assistant bubble with a readable message.
//! No streaming, no retry; a slow reply is appended whenever it resolves.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Messages of prior context sent with each request.
pub const HISTORY_WINDOW: usize = 10;

pub const WELCOME_MESSAGE: &str =
    "Hi! I'm the studio assistant. Ask me about services, past projects, results or courses.";

const GENERIC_ERROR: &str = "Sorry, I'm having trouble connecting right now. Please try again in a moment.";
const QUOTA_ERROR: &str = "I'm getting too many questions at once. Please wait a minute and try again.";
const REAUTH_ERROR: &str =
    "The assistant's API key was not recognised. Please re-select your API key and try again.";

// =============================================================================
// MESSAGE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub is_user: bool,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4().to_string(), text: text.into(), is_user: true }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4().to_string(), text: text.into(), is_user: false }
    }
}

// =============================================================================
// RESPONDER
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The hosted model or key was not found; the user must re-authenticate.
    #[error("requested entity was not found: {0}")]
    EntityNotFound(String),
    #[error("quota exceeded: {0}")]
    Quota(String),
    #[error("chat request failed: {0}")]
    Request(String),
}

impl ChatError {
    /// Text shown to the visitor in place of a reply.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EntityNotFound(_) => REAUTH_ERROR,
            Self::Quota(_) => QUOTA_ERROR,
            Self::Request(_) => GENERIC_ERROR,
        }
    }
}

/// One hosted text-generation call.
#[async_trait::async_trait]
pub trait Responder: Send + Sync {
    /// Produce the assistant reply to `message` given prior `history`.
    ///
    /// # Errors
    ///
    /// Returns a [`ChatError`] when the request fails.
    async fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, ChatError>;
}

// =============================================================================
// LOG
// =============================================================================

#[derive(Debug, Clone)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    window: usize,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatLog {
    /// A log seeded with the assistant's welcome message.
    #[must_use]
    pub fn new() -> Self {
        Self { messages: vec![ChatMessage::assistant(WELCOME_MESSAGE)], window: HISTORY_WINDOW }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self { messages: Vec::new(), window: HISTORY_WINDOW }
    }

    #[must_use]
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Append a message produced elsewhere (e.g. a voice transcript).
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// The context window that would accompany the next request.
    #[must_use]
    pub fn history(&self) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(self.window);
        &self.messages[start..]
    }

    /// Send one user message and append the reply (or an error bubble).
    ///
    /// Whitespace-only input is ignored and returns `None`.
    pub async fn send(&mut self, input: &str, responder: &dyn Responder) -> Option<&ChatMessage> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }

        let history = self.history().to_vec();
        self.messages.push(ChatMessage::user(text));
        info!(history = history.len(), chars = text.len(), "chat: sending");

        let reply = match responder.reply(&history, text).await {
            Ok(reply) => ChatMessage::assistant(reply),
            Err(e) => {
                warn!(error = %e, "chat: reply failed");
                ChatMessage::assistant(e.user_message())
            }
        };
        self.messages.push(reply);
        self.messages.last()
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
