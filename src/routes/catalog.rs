//! Read-only content routes.

use axum::Json;
use axum::extract::{Path, State};
use content::{BlogPost, Catalog, Course, Project};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/content`: the whole catalog.
pub async fn all(State(state): State<AppState>) -> Json<Catalog> {
    Json(state.catalog)
}

/// `GET /api/content/{section}`: one named section (`projects`, `courses`, ...).
pub async fn section(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<Value>, ApiError> {
    state
        .catalog
        .section(&name)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("section '{name}'")))
}

/// `GET /api/projects/{id}`
pub async fn project(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<&'static Project>, ApiError> {
    parse_id(&id)
        .and_then(|n| state.catalog.project(n))
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("project {id}")))
}

/// `GET /api/courses/{id}`
pub async fn course(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<&'static Course>, ApiError> {
    parse_id(&id)
        .and_then(|n| state.catalog.course(n))
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("course {id}")))
}

/// `GET /api/posts/{id}`
pub async fn post(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<&'static BlogPost>, ApiError> {
    parse_id(&id)
        .and_then(|n| state.catalog.post(n))
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("post {id}")))
}

/// A malformed id is reported like a missing one: JSON 404.
fn parse_id(raw: &str) -> Option<u32> {
    raw.parse().ok()
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
