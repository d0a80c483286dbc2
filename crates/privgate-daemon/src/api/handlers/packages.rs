//! Package lifecycle and grant settings

use crate::api::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    Json,
};
use privgate_engine::PackageRemoval;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cascade an uninstall
pub async fn remove_package(
    State(state): State<AppState>,
    Path(package): Path<String>,
) -> ApiResult<Json<PackageRemoval>> {
    let removal = state.engine.on_package_removed(&package).await?;
    Ok(Json(removal))
}

/// Grant timeframe request and response
#[derive(Debug, Serialize, Deserialize)]
pub struct GrantTimeframe {
    pub seconds: u64,
}

/// Change the lifetime of future "allow once" grants
pub async fn set_grant_timeframe(
    State(state): State<AppState>,
    Json(request): Json<GrantTimeframe>,
) -> ApiResult<Json<GrantTimeframe>> {
    state
        .engine
        .set_ask_grant_timeframe(Duration::from_secs(request.seconds))?;
    Ok(Json(GrantTimeframe {
        seconds: state.engine.ask_grant_timeframe().as_secs(),
    }))
}
