//! HTTP transport
//!
//! Thin axum layer over [`CounselService`]: decode the body, call the
//! service, encode the outcome. Every error body is `{"error": "..."}`.

mod error;
pub mod wire;

pub use error::ApiError;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use counsel_application::CounselService;
use std::sync::Arc;
use tracing::info;
use wire::{
    AskRequest, AskResponse, ClearRequest, ClearResponse, HealthResponse, HistoryResponse,
};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    service: Arc<CounselService>,
}

impl AppState {
    pub fn new(service: Arc<CounselService>) -> Self {
        Self { service }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ask", post(ask_handler))
        .route("/clear", post(clear_handler))
        .route("/health", get(health_handler))
        .route("/history/{user}", get(history_handler))
        .with_state(state)
}

async fn ask_handler(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(request) = payload?;
    let response = state.service.ask(&request.user, &request.question).await?;
    info!(user = %request.user, "Answered");
    Ok(Json(AskResponse {
        user: request.user,
        response,
    }))
}

async fn clear_handler(
    State(state): State<AppState>,
    payload: Result<Json<ClearRequest>, JsonRejection>,
) -> Result<Json<ClearResponse>, ApiError> {
    let Json(request) = payload?;
    let user = state.service.clear(&request.user).await?;
    Ok(Json(ClearResponse {
        message: format!("Conversation history cleared for {}", user),
    }))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.service.health().into())
}

async fn history_handler(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let (user, messages) = state.service.history(&user).await?;
    Ok(Json(HistoryResponse {
        user: user.to_string(),
        messages,
    }))
}
