//! Pending consent prompts

use crate::api::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    Json,
};
use privgate_engine::ConsentRequest;
use privgate_types::UserChoice;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// List prompts waiting for an answer
pub async fn list_prompts(State(state): State<AppState>) -> Json<Vec<ConsentRequest>> {
    Json(state.prompts.pending())
}

/// Answer prompt request
#[derive(Debug, Deserialize)]
pub struct AnswerPromptRequest {
    pub choice: UserChoice,
}

/// Answer prompt response
#[derive(Debug, Serialize)]
pub struct AnswerPromptResponse {
    pub id: Uuid,
    pub choice: UserChoice,
}

/// Answer a pending prompt
pub async fn answer_prompt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AnswerPromptRequest>,
) -> ApiResult<Json<AnswerPromptResponse>> {
    state.prompts.answer(id, request.choice)?;

    tracing::info!(prompt = %id, choice = ?request.choice, "Prompt answered");

    Ok(Json(AnswerPromptResponse {
        id,
        choice: request.choice,
    }))
}
