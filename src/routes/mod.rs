//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! JSON API under `/api`, a health check, and (when `SITE_DIR` is set) the
//! prebuilt portfolio site served as static files for every other path.

pub mod catalog;
pub mod chat;

use std::path::PathBuf;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

fn api_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/content", get(catalog::all))
        .route("/api/content/{section}", get(catalog::section))
        .route("/api/projects/{id}", get(catalog::project))
        .route("/api/courses/{id}", get(catalog::course))
        .route("/api/posts/{id}", get(catalog::post))
        .route("/api/chat", post(chat::send))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API routes plus the static site fallback.
pub fn app(state: AppState, site_dir: Option<PathBuf>) -> Router {
    let api = api_routes(state);
    match site_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true)),
        None => api,
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;

    /// Serve `app` on an ephemeral port and return its base URL.
    pub async fn spawn_app(state: AppState, site_dir: Option<PathBuf>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app(state, site_dir)).await.unwrap();
        });
        format!("http://{addr}")
    }
}
