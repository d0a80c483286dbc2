//! Health and status handlers

use crate::api::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub active_profile: String,
    pub pending_prompts: usize,
    pub active_grants: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
        active_profile: state.engine.profiles().active_profile().await,
        pending_prompts: state.prompts.len(),
        active_grants: state.engine.grants().active_grants().len(),
    })
}
