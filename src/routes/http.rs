//! JSON endpoint handlers. These are thin wrappers that forward to generation and grading.
//! Each handler is instrumented and logs its parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{rejection::JsonRejection, Path, State},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::domain::{QuestionSet, QuestionType};
use crate::error::QuizError;
use crate::grading::GradingRequest;
use crate::playback::PlaybackPlan;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut {
    ok: true,
    provider: state.provider.name().to_string(),
    grading_mode: state.grading_mode().to_string(),
  })
}

/// Six concurrent generations; any failure fails the whole batch.
#[instrument(level = "info", skip(state))]
pub async fn http_generate_all(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, QuizError> {
  let batch = state.generate_batch().await?;
  info!(target: "generation", "HTTP batch served");
  Ok(Json(batch))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_evaluate(
  State(state): State<Arc<AppState>>,
  body: Result<Json<GradingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, QuizError> {
  let Json(req) = body.map_err(|e| QuizError::Validation(format!("Invalid evaluation request. {}", e.body_text())))?;
  let outcome = state.grader.grade(&req).await?;
  info!(
    target: "grading",
    mode = %state.grading_mode(),
    question_type = ?req.question_type,
    answers = req.user_answers.as_ref().map(Vec::len).unwrap_or(0),
    "HTTP evaluation served"
  );
  Ok(Json(outcome))
}

/// Playback plan for the audio cards of a stored batch.
#[instrument(level = "info", skip(state))]
pub async fn http_playback(
  State(state): State<Arc<AppState>>,
  Path((id, kind)): Path<(String, String)>,
) -> Result<impl IntoResponse, axum::response::Response> {
  let kind: QuestionType = kind.parse().map_err(|e: QuizError| e.into_response())?;
  let Some(ctx) = state.get_batch(&id).await else {
    return Err((axum::http::StatusCode::NOT_FOUND, Json(ErrorOut { error: format!("Unknown quiz batch: {id}") })).into_response());
  };

  let plan = match ctx.batch.get(kind) {
    QuestionSet::DialogueComprehension(s) => PlaybackPlan::for_dialogue(s),
    QuestionSet::SpeakerMatching(s) => PlaybackPlan::for_monologues(s),
    _ => {
      return Err(QuizError::Validation(format!("{kind} has no audio playback")).into_response());
    }
  };

  Ok(Json(PlaybackOut { batch_id: id, question_type: kind.to_string(), steps: plan.steps }))
}
