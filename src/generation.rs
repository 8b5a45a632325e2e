//! Batch generation: six provider calls in parallel, joined all-or-nothing.
//!
//! Per template: complete → strip code fences → parse JSON → check the `type`
//! tag → decode the variant → validate its shape. The first failure of any of
//! the six fails the whole batch; the other in-flight calls are dropped.

use std::time::Instant;

use tracing::{error, info, instrument, warn};

use crate::config::GenerationSettings;
use crate::domain::{Batch, QuestionSet, QuestionType};
use crate::error::QuizError;
use crate::prompts::Prompts;
use crate::provider::CompletionProvider;
use crate::util::{strip_code_fences, trunc_for_log};

#[instrument(level = "info", skip_all, fields(provider = %provider.name()))]
pub async fn generate_all(
  provider: &dyn CompletionProvider,
  prompts: &Prompts,
  settings: &GenerationSettings,
) -> Result<Batch, QuizError> {
  let start = Instant::now();
  let one = move |kind| generate_one(provider, prompts, settings, kind);

  let result = tokio::try_join!(
    one(QuestionType::ParagraphMatching),
    one(QuestionType::MultipleChoice),
    one(QuestionType::FillInTheBlank),
    one(QuestionType::SpokenAnswer),
    one(QuestionType::DialogueComprehension),
    one(QuestionType::SpeakerMatching),
  );

  match result {
    Ok((pm, mc, fib, sa, dc, sm)) => {
      info!(target: "generation", elapsed = ?start.elapsed(), "Generated full batch");
      Ok(Batch {
        paragraph_matching: pm,
        multiple_choice: mc,
        fill_in_the_blank: fib,
        spoken_answer: sa,
        dialogue_comprehension: dc,
        speaker_matching: sm,
      })
    }
    Err(e) => {
      error!(target: "generation", elapsed = ?start.elapsed(), error = %e, "Batch generation failed");
      Err(e)
    }
  }
}

/// Generate and validate one question set, re-asking on malformed output
/// up to `settings.malformed_retries` extra times.
#[instrument(level = "info", skip(provider, prompts, settings), fields(%kind))]
pub async fn generate_one(
  provider: &dyn CompletionProvider,
  prompts: &Prompts,
  settings: &GenerationSettings,
  kind: QuestionType,
) -> Result<QuestionSet, QuizError> {
  let prompt = prompts.generation_prompt(kind);
  let mut attempt = 0;
  loop {
    let start = Instant::now();
    let raw = provider.complete(prompt).await?;
    match parse_question_set(kind, &raw) {
      Ok(set) => {
        info!(target: "generation", %kind, attempt, elapsed = ?start.elapsed(), "Question set accepted");
        return Ok(set);
      }
      Err(e) if attempt < settings.malformed_retries => {
        attempt += 1;
        warn!(target: "generation", %kind, attempt, error = %e, raw = %trunc_for_log(&raw, 200), "Malformed output; asking again");
      }
      Err(e) => {
        warn!(target: "generation", %kind, error = %e, raw = %trunc_for_log(&raw, 200), "Malformed output; giving up");
        return Err(e);
      }
    }
  }
}

/// Turn raw provider text into a validated set of the requested kind.
pub fn parse_question_set(kind: QuestionType, raw: &str) -> Result<QuestionSet, QuizError> {
  let value: serde_json::Value = serde_json::from_str(&strip_code_fences(raw))?;
  if !value.is_object() {
    return Err(QuizError::MalformedResponse("expected a JSON object".into()));
  }
  if let Some(tag) = value.get("type") {
    if tag.as_str() != Some(kind.as_str()) {
      return Err(QuizError::MalformedResponse(format!("expected type '{kind}', got {tag}")));
    }
  }
  let set = QuestionSet::from_value(kind, value)?;
  set.validate()?;
  Ok(set)
}
