//! Grading strategies behind one `Grader` interface.
//!
//! - `LocalGrader`: positional, case-insensitive comparison against a supplied answer key.
//! - `AiGrader`: asks the completion provider to judge the answers in context;
//!   spoken answers get a three-criterion rubric instead of per-item verdicts.
//!
//! Which one serves `/evaluate` is decided once at startup from `GradingMode`.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::GradingMode;
use crate::domain::QuestionType;
use crate::error::QuizError;
use crate::prompts::Prompts;
use crate::provider::CompletionProvider;
use crate::util::{strip_code_fences, trunc_for_log};

/// Body of `POST /evaluate`. Everything is optional on the wire so that a
/// missing field is reported as a validation error rather than a decode error.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingRequest {
  #[serde(default)] pub user_answers: Option<Vec<String>>,
  // local comparison
  #[serde(default)] pub correct_answers: Option<Vec<String>>,
  // AI judgement
  #[serde(default)] pub question_type: Option<String>,
  #[serde(default)] pub context: Option<serde_json::Value>,
  #[serde(default)] pub questions: Option<serde_json::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Correctness {
  #[serde(alias = "Correct")]
  Correct,
  #[serde(alias = "Incorrect")]
  Incorrect,
}

/// The expected value echoed back with a verdict; the variant names the JSON key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expected {
  #[serde(rename = "correctAnswer")]
  CorrectAnswer(String),
  #[serde(rename = "correctParagraph")]
  CorrectParagraph(String),
  #[serde(rename = "bestFitSentence")]
  BestFitSentence(String),
}

impl Expected {
  /// Key used by AI grading for `kind`.
  pub fn field_for(kind: QuestionType) -> &'static str {
    match kind {
      QuestionType::ParagraphMatching => "correctParagraph",
      QuestionType::FillInTheBlank => "bestFitSentence",
      _ => "correctAnswer",
    }
  }

  pub fn for_kind(kind: QuestionType, value: String) -> Self {
    match kind {
      QuestionType::ParagraphMatching => Expected::CorrectParagraph(value),
      QuestionType::FillInTheBlank => Expected::BestFitSentence(value),
      _ => Expected::CorrectAnswer(value),
    }
  }

  pub fn value(&self) -> &str {
    match self {
      Expected::CorrectAnswer(v) | Expected::CorrectParagraph(v) | Expected::BestFitSentence(v) => v,
    }
  }

  pub fn into_value(self) -> String {
    match self {
      Expected::CorrectAnswer(v) | Expected::CorrectParagraph(v) | Expected::BestFitSentence(v) => v,
    }
  }
}

/// Per-item judgement, positionally aligned with the submitted answers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
  pub is_correct: Correctness,
  #[serde(flatten)]
  pub expected: Expected,
}

impl Verdict {
  pub fn correct(&self) -> bool {
    self.is_correct == Correctness::Correct
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
  pub score: u8,
  pub comment: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpokenEvaluation {
  pub relevance: Criterion,
  pub clarity: Criterion,
  pub completeness: Criterion,
  pub overall_feedback: String,
}

impl SpokenEvaluation {
  pub fn criteria(&self) -> [(&'static str, &Criterion); 3] {
    [("Relevance", &self.relevance), ("Clarity", &self.clarity), ("Completeness", &self.completeness)]
  }
}

/// What `/evaluate` answers with: `{results: [...]}` or `{evaluation: {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GradingOutcome {
  Results { results: Vec<Verdict> },
  Evaluation { evaluation: SpokenEvaluation },
}

pub trait Grader: Send + Sync {
  fn mode(&self) -> GradingMode;

  fn grade<'a>(&'a self, req: &'a GradingRequest) -> BoxFuture<'a, Result<GradingOutcome, QuizError>>;
}

pub fn build_grader(mode: GradingMode, provider: Arc<dyn CompletionProvider>, prompts: Arc<Prompts>) -> Arc<dyn Grader> {
  match mode {
    GradingMode::Local => Arc::new(LocalGrader),
    GradingMode::Ai => Arc::new(AiGrader { provider, prompts }),
  }
}

// -------- Local comparison --------

pub struct LocalGrader;

impl Grader for LocalGrader {
  fn mode(&self) -> GradingMode {
    GradingMode::Local
  }

  fn grade<'a>(&'a self, req: &'a GradingRequest) -> BoxFuture<'a, Result<GradingOutcome, QuizError>> {
    Box::pin(async move {
      let (Some(user), Some(correct)) = (&req.user_answers, &req.correct_answers) else {
        return Err(mismatch());
      };
      if user.len() != correct.len() {
        return Err(mismatch());
      }
      Ok(GradingOutcome::Results { results: compare_answers(user, correct) })
    })
  }
}

fn mismatch() -> QuizError {
  QuizError::Validation("Invalid evaluation request. Answer data is missing or mismatched.".into())
}

/// verdict[i] is correct iff both sides are equal after lowercasing; nothing else is normalized.
pub fn compare_answers(user: &[String], correct: &[String]) -> Vec<Verdict> {
  user
    .iter()
    .zip(correct)
    .map(|(given, expected)| Verdict {
      is_correct: if given.to_lowercase() == expected.to_lowercase() {
        Correctness::Correct
      } else {
        Correctness::Incorrect
      },
      expected: Expected::CorrectAnswer(expected.clone()),
    })
    .collect()
}

// -------- AI judgement --------

pub struct AiGrader {
  pub provider: Arc<dyn CompletionProvider>,
  pub prompts: Arc<Prompts>,
}

#[derive(Deserialize)]
struct AiResults {
  results: Vec<Verdict>,
}

#[derive(Deserialize)]
struct AiEvaluation {
  evaluation: SpokenEvaluation,
}

impl Grader for AiGrader {
  fn mode(&self) -> GradingMode {
    GradingMode::Ai
  }

  fn grade<'a>(&'a self, req: &'a GradingRequest) -> BoxFuture<'a, Result<GradingOutcome, QuizError>> {
    Box::pin(self.grade_with_provider(req))
  }
}

impl AiGrader {
  #[instrument(level = "info", skip_all, fields(question_type = ?req.question_type, provider = %self.provider.name()))]
  async fn grade_with_provider(&self, req: &GradingRequest) -> Result<GradingOutcome, QuizError> {
    let kind: QuestionType = req
      .question_type
      .as_deref()
      .ok_or_else(|| QuizError::UnsupportedType("(missing questionType)".into()))?
      .parse()?;
    let user = match &req.user_answers {
      Some(u) if !u.is_empty() => u,
      _ => return Err(QuizError::Validation("Invalid evaluation request. userAnswers is missing.".into())),
    };

    if kind == QuestionType::SpokenAnswer {
      return self.evaluate_spoken(req, &user[0]).await;
    }

    let context = pretty(req.context.as_ref());
    let questions = pretty(req.questions.as_ref());
    let answers = serde_json::to_string_pretty(user)?;
    let prompt = self.prompts.grading_prompt(kind, Expected::field_for(kind), &context, &questions, &answers);

    let raw = self.provider.complete(&prompt).await?;
    let parsed: AiResults = serde_json::from_str(&strip_code_fences(&raw)).map_err(|e| {
      warn!(target: "grading", %kind, raw = %trunc_for_log(&raw, 200), "Unparseable grading reply");
      QuizError::from(e)
    })?;
    if parsed.results.len() != user.len() {
      return Err(QuizError::MalformedResponse(format!(
        "expected {} verdicts, got {}",
        user.len(),
        parsed.results.len()
      )));
    }

    // Models mix up the key names; re-key every verdict to the one this type uses.
    let results: Vec<Verdict> = parsed
      .results
      .into_iter()
      .map(|v| Verdict { is_correct: v.is_correct, expected: Expected::for_kind(kind, v.expected.into_value()) })
      .collect();
    let correct = results.iter().filter(|v| v.correct()).count();
    info!(target: "grading", %kind, total = results.len(), correct, "AI grading finished");
    Ok(GradingOutcome::Results { results })
  }

  async fn evaluate_spoken(&self, req: &GradingRequest, answer: &str) -> Result<GradingOutcome, QuizError> {
    let question = first_text(req.questions.as_ref())
      .or_else(|| first_text(req.context.as_ref()))
      .ok_or_else(|| QuizError::Validation("Spoken-answer grading needs the question in 'questions' or 'context'.".into()))?;
    if answer.trim().is_empty() {
      return Err(QuizError::Validation("The spoken answer transcript is empty.".into()));
    }

    let prompt = self.prompts.spoken_prompt(&question, answer);
    let raw = self.provider.complete(&prompt).await?;
    let parsed: AiEvaluation = serde_json::from_str(&strip_code_fences(&raw))?;
    for (name, c) in parsed.evaluation.criteria() {
      if !(1..=5).contains(&c.score) {
        return Err(QuizError::MalformedResponse(format!("{name} score {} is outside 1..=5", c.score)));
      }
    }
    info!(target: "grading", relevance = parsed.evaluation.relevance.score, clarity = parsed.evaluation.clarity.score, completeness = parsed.evaluation.completeness.score, "Spoken answer evaluated");
    Ok(GradingOutcome::Evaluation { evaluation: parsed.evaluation })
  }
}

fn pretty(v: Option<&serde_json::Value>) -> String {
  v.and_then(|v| serde_json::to_string_pretty(v).ok()).unwrap_or_else(|| "(none)".into())
}

/// A bare string, or the first string of an array.
fn first_text(v: Option<&serde_json::Value>) -> Option<String> {
  match v? {
    serde_json::Value::String(s) => Some(s.clone()),
    serde_json::Value::Array(items) => items.iter().find_map(|i| i.as_str().map(str::to_string)),
    _ => None,
  }
}
