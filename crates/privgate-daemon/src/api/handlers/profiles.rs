//! Profile management handlers

use crate::api::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use privgate_types::{PolicyEntry, Profile, ProfileTemplate};
use serde::Deserialize;

/// List all profiles
pub async fn list_profiles(State(state): State<AppState>) -> ApiResult<Json<Vec<Profile>>> {
    let profiles = state.engine.profiles().list_profiles().await?;
    Ok(Json(profiles))
}

/// Install profile request: a configured template by name, or an inline one
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InstallProfileRequest {
    Named { template: String },
    Inline(ProfileTemplate),
}

/// Install a template as a new profile and activate it
pub async fn install_profile(
    State(state): State<AppState>,
    Json(request): Json<InstallProfileRequest>,
) -> ApiResult<Json<Profile>> {
    let template = match request {
        InstallProfileRequest::Named { template } => state
            .config
            .template(&template)
            .ok_or_else(|| ApiError::NotFound(format!("Template {} not found", template)))?,
        InstallProfileRequest::Inline(template) => template,
    };

    let profile = state.engine.profiles().install_profile(&template).await?;

    tracing::info!(profile = %profile.name, "Installed profile");

    Ok(Json(profile))
}

/// Switch profile request
#[derive(Debug, Deserialize)]
pub struct SwitchProfileRequest {
    pub name: String,
}

/// Make another profile active
pub async fn switch_profile(
    State(state): State<AppState>,
    Json(request): Json<SwitchProfileRequest>,
) -> ApiResult<Json<Profile>> {
    let profile = state.engine.profiles().switch_profile(&request.name).await?;
    Ok(Json(profile))
}

/// Entries stored under a profile
pub async fn list_profile_entries(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<PolicyEntry>>> {
    let entries = state.engine.profiles().entries_for(&name).await?;
    Ok(Json(entries))
}
