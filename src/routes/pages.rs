//! Server-rendered quiz pages: start a quiz, show it, and take card submissions.

use std::{collections::HashMap, sync::Arc};
use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::{Html, IntoResponse, Redirect, Response},
  Form,
};
use tracing::{info, instrument, warn};

use crate::domain::QuestionType;
use crate::render::{render_error_page, render_page, submit};
use crate::state::AppState;

/// Generate a fresh batch and send the browser to its page.
#[instrument(level = "info", skip(state))]
pub async fn quiz_new(State(state): State<Arc<AppState>>) -> Response {
  match state.start_quiz().await {
    Ok(id) => Redirect::to(&format!("/quiz/{id}")).into_response(),
    Err(e) => (e.status(), Html(render_error_page(&e.public_message()))).into_response(),
  }
}

#[instrument(level = "info", skip(state))]
pub async fn quiz_page(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
  match state.get_batch(&id).await {
    Some(ctx) => Html(render_page(&ctx, state.grading_mode())).into_response(),
    None => not_found(&id),
  }
}

/// Grade one card and re-render the whole page with its feedback.
#[instrument(level = "info", skip(state, form), fields(fields = form.len()))]
pub async fn quiz_submit(
  State(state): State<Arc<AppState>>,
  Path((id, kind)): Path<(String, String)>,
  Form(form): Form<HashMap<String, String>>,
) -> Response {
  let kind: QuestionType = match kind.parse() {
    Ok(k) => k,
    Err(e) => return (StatusCode::BAD_REQUEST, Html(render_error_page(&e.to_string()))).into_response(),
  };
  // Clone out of the store so no lock is held while grading.
  let Some((set, prior)) = state.get_batch(&id).await.map(|ctx| (ctx.batch.get(kind).clone(), ctx.card(kind))) else {
    return not_found(&id);
  };

  let card = submit(&set, &form, state.grader.as_ref(), &prior).await;

  let mut store = state.batches.write().await;
  let Some(ctx) = store.get_mut(&id) else {
    warn!(target: "quizgen", %id, "Batch evicted while grading");
    return not_found(&id);
  };
  ctx.set_card(kind, card);
  info!(target: "quizgen", %id, %kind, "Card graded");
  Html(render_page(ctx, state.grading_mode())).into_response()
}

fn not_found(id: &str) -> Response {
  (
    StatusCode::NOT_FOUND,
    Html(render_error_page(&format!("Quiz {id} is unknown or has expired. Start a new one."))),
  )
    .into_response()
}
