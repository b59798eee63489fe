//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! Everything in it is immutable after startup except the rate limiter,
//! which shares its counters across clones.

use std::sync::Arc;

use content::Catalog;

use crate::llm::LlmChat;
use crate::rate_limit::RateLimiter;
use crate::services::chat::ChatConfig;

/// Clone is required by Axum; all inner fields are `Arc`-wrapped or `Copy`.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    /// System instruction for the text-chat path, built once from `catalog`.
    pub preamble: Arc<str>,
    /// Optional LLM client. `None` if LLM env vars are not configured.
    pub llm: Option<Arc<dyn LlmChat>>,
    pub rate_limiter: RateLimiter,
    pub chat: ChatConfig,
}

impl AppState {
    #[must_use]
    pub fn new(llm: Option<Arc<dyn LlmChat>>, chat: ChatConfig, rate_limiter: RateLimiter) -> Self {
        let catalog = content::catalog();
        let preamble = content::preamble::system_preamble(&catalog).into();
        Self { catalog, preamble, llm, rate_limiter, chat }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
