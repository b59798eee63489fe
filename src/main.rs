mod error;
mod llm;
mod rate_limit;
mod routes;
mod services;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use llm::LlmChat;
use rate_limit::{RateLimitConfig, RateLimiter};
use services::chat::ChatConfig;

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() {
    // A missing .env file is normal outside development.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let port = match std::env::var("PORT") {
        Err(_) => DEFAULT_PORT,
        Ok(raw) => match raw.parse::<u16>() {
            Ok(port) => port,
            Err(e) => {
                tracing::error!(%raw, error = %e, "invalid PORT");
                std::process::exit(2);
            }
        },
    };

    // Non-fatal: the content API still works without a key.
    let llm: Option<Arc<dyn LlmChat>> = match llm::LlmClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "LLM client initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM client not configured, chat disabled");
            None
        }
    };

    let site_dir = std::env::var("SITE_DIR").ok().map(PathBuf::from).filter(|dir| {
        let ok = dir.is_dir();
        if !ok {
            tracing::warn!(dir = %dir.display(), "SITE_DIR is not a directory, static site disabled");
        }
        ok
    });

    let rate_limit = RateLimitConfig::from_env();
    let chat = ChatConfig::from_env();
    tracing::info!(
        per_client = rate_limit.per_client_limit,
        global = rate_limit.global_limit,
        history_limit = chat.history_limit,
        "chat limits"
    );

    let state = state::AppState::new(llm, chat, RateLimiter::new(rate_limit));
    let app = routes::app(state, site_dir);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%port, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(%port, "folio listening");
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
