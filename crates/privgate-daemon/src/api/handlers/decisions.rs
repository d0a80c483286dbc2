//! Access requests and recorded decisions

use crate::api::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use privgate_engine::{AccessRequest, RecordOutcome};
use privgate_types::{Action, Durability, ScopeDraft, Verdict};
use serde::{Deserialize, Serialize};

/// Verdict delivered for an access request
#[derive(Debug, Serialize, Deserialize)]
pub struct VerdictResponse {
    pub app: String,
    pub permission: String,
    pub verdict: Verdict,
}

/// Mediate an access request
///
/// Blocks until the verdict is known, which may mean waiting for a pending
/// prompt to be answered or to time out.
pub async fn submit_request(
    State(state): State<AppState>,
    Json(request): Json<AccessRequest>,
) -> ApiResult<Json<VerdictResponse>> {
    // Reject malformed requests up front instead of answering Deny.
    state.engine.scope_for(&request)?;

    let app = request.app.clone();
    let permission = request.permission.clone();
    let verdict = state
        .mediator
        .submit(request)
        .await
        .unwrap_or(Verdict::Deny);

    Ok(Json(VerdictResponse {
        app,
        permission,
        verdict,
    }))
}

/// Record decision request
#[derive(Debug, Deserialize)]
pub struct RecordDecisionRequest {
    #[serde(flatten)]
    pub scope: ScopeDraft,
    pub action: Action,
    pub durability: Durability,
}

/// Record a decision for a scope
pub async fn record_decision(
    State(state): State<AppState>,
    Json(request): Json<RecordDecisionRequest>,
) -> ApiResult<Json<RecordOutcome>> {
    let scope = state.engine.build_scope(&request.scope)?;
    let outcome = state
        .engine
        .record(request.action, &scope, request.durability)
        .await?;

    tracing::info!(scope = %scope, action = %request.action, "Recorded decision");

    Ok(Json(outcome))
}
