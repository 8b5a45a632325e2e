//! Server-side quiz renderer.
//!
//! Every render is a pure function of (question set, card state, render context):
//! nothing is carried over from an earlier batch. Submissions go through
//! `submit`, which collects answers in question order, refuses incomplete
//! forms before any grading call, and turns the grading outcome into feedback.

use std::{collections::HashMap, fmt::Write as _};

use tracing::{info, instrument, warn};

use crate::config::GradingMode;
use crate::domain::{QuestionSet, QuestionType};
use crate::error::QuizError;
use crate::grading::{Grader, GradingOutcome, GradingRequest, SpokenEvaluation, Verdict};
use crate::session::{BatchContext, CardState, Feedback, Notice};
use crate::util::escape_html as esc;

mod cards;

pub const UNANSWERED_ALERT: &str = "Please answer all questions.";
/// Browser player for `data-playback` plans, served from `server.static_dir`.
pub const PLAYER_SCRIPT: &str = "quiz.js";
pub const SPOKEN_NEEDS_AI: &str = "Spoken answers can only be evaluated when AI grading is enabled.";

/// Explicit per-render inputs (no ambient globals).
pub struct RenderContext<'a> {
  pub batch_id: &'a str,
  pub mode: GradingMode,
  pub blank_order: &'a [usize],
}

impl<'a> RenderContext<'a> {
  pub fn for_batch(ctx: &'a BatchContext, mode: GradingMode) -> Self {
    Self { batch_id: &ctx.id, mode, blank_order: &ctx.blank_order }
  }
}

pub fn render_card(set: &QuestionSet, state: &CardState, ctx: &RenderContext) -> String {
  let kind = set.kind();
  let body = match set {
    QuestionSet::ParagraphMatching(s) => cards::paragraph_matching(s, state),
    QuestionSet::MultipleChoice(s) => cards::multiple_choice(s, state),
    QuestionSet::FillInTheBlank(s) => cards::fill_in_the_blank(s, state, ctx),
    QuestionSet::SpokenAnswer(s) => cards::spoken_answer(s, state),
    QuestionSet::DialogueComprehension(s) => cards::dialogue(s, state),
    QuestionSet::SpeakerMatching(s) => cards::speaker_matching(s, state),
  };
  let button = match kind {
    QuestionType::SpokenAnswer => "Evaluate answer",
    _ => "Check answers",
  };
  // Cards already answered keep their audio-gated sections open in the browser.
  let answered = if state.answers.is_empty() { "" } else { " data-answered=\"true\"" };
  format!(
    "<section class=\"card\" id=\"{kind}\"{answered}><h2>{title}</h2>\
     <form method=\"post\" action=\"/quiz/{id}/{kind}\">{body}<button type=\"submit\">{button}</button></form>\
     <div class=\"result\">{feedback}</div></section>",
    title = kind.title(),
    id = esc(ctx.batch_id),
    feedback = render_feedback(set, state),
  )
}

pub fn render_page(batch: &BatchContext, mode: GradingMode) -> String {
  let ctx = RenderContext::for_batch(batch, mode);
  let mut cards = String::new();
  for kind in QuestionType::ALL {
    cards.push_str(&render_card(batch.batch.get(kind), &batch.card(kind), &ctx));
  }
  page(
    "Language Assessment",
    &format!(
      "<header><h1>Language Assessment</h1>\
       <form method=\"get\" action=\"/quiz\"><button type=\"submit\" id=\"new-questions-btn\">New questions</button></form>\
       </header><main data-batch=\"{}\" data-grading=\"{mode}\">{cards}</main>",
      esc(&batch.id)
    ),
  )
}

pub fn render_error_page(message: &str) -> String {
  page(
    "Language Assessment",
    &format!(
      "<main><div class=\"error\" role=\"alert\">{}</div>\
       <form method=\"get\" action=\"/quiz\"><button type=\"submit\">Try again</button></form></main>",
      esc(message)
    ),
  )
}

fn page(title: &str, body: &str) -> String {
  format!(
    "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>{}</title>\
     <link rel=\"stylesheet\" href=\"/style.css\"><script src=\"/{PLAYER_SCRIPT}\" defer></script>\
     </head><body>{}</body></html>",
    esc(title),
    body
  )
}

// -------- feedback --------

fn render_feedback(set: &QuestionSet, state: &CardState) -> String {
  let mut out = match &state.notice {
    None => String::new(),
    Some(Notice::Alert(msg)) => format!("<div class=\"alert\" role=\"alert\">{}</div>", esc(msg)),
    Some(Notice::Error(msg)) => format!("<div class=\"error\" role=\"alert\">{}</div>", esc(msg)),
  };
  match &state.feedback {
    Feedback::None => {}
    Feedback::Verdicts { answers, verdicts } => out.push_str(&render_verdicts(set, answers, verdicts)),
    Feedback::Evaluation(evaluation) => out.push_str(&render_evaluation(evaluation)),
  }
  out
}

/// One line per verdict, matched to its question by position.
pub fn render_verdicts(set: &QuestionSet, answers: &[String], verdicts: &[Verdict]) -> String {
  let letters: Vec<&String> = match set {
    QuestionSet::FillInTheBlank(s) => s.essay.keys().collect(),
    _ => Vec::new(),
  };
  let mut out = String::from("<h3>Results:</h3>");
  for (i, v) in verdicts.iter().enumerate() {
    let outcome = if v.correct() { "correct" } else { "incorrect" };
    let given = answers.get(i).map(String::as_str).unwrap_or("");
    let lead = match set {
      QuestionSet::ParagraphMatching(_) => format!("<strong>Q{}:</strong> Your answer ({}) was {outcome}.", i + 1, esc(given)),
      QuestionSet::FillInTheBlank(_) => format!(
        "<strong>Blank {}:</strong> Your choice was {outcome}.",
        letters.get(i).map(|l| esc(l)).unwrap_or_else(|| (i + 1).to_string())
      ),
      QuestionSet::SpeakerMatching(_) => format!("<strong>Statement {}:</strong> Your answer was {outcome}.", i + 1),
      _ => format!("<strong>Q{}:</strong> Your answer was {outcome}.", i + 1),
    };
    let fix = if v.correct() {
      String::new()
    } else {
      format!(" Correct was: <strong>{}</strong>.", esc(v.expected.value()))
    };
    let _ = write!(out, "<div class=\"result-item {outcome}\">{lead}{fix}</div>");
  }
  out
}

pub fn render_evaluation(e: &SpokenEvaluation) -> String {
  let mut out = String::from("<h3>Evaluation:</h3><ul class=\"rubric\">");
  for (name, c) in e.criteria() {
    let _ = write!(out, "<li><strong>{name}:</strong> {}/5. {}</li>", c.score, esc(&c.comment));
  }
  let _ = write!(out, "</ul><p class=\"overall\">{}</p>", esc(&e.overall_feedback));
  out
}

// -------- answer collection and submission --------

/// Answers in submission order; unanswered positions are empty strings.
pub fn collect_answers(set: &QuestionSet, form: &HashMap<String, String>) -> Vec<String> {
  if let QuestionSet::SpokenAnswer(_) = set {
    return vec![form.get("transcript").map(|t| t.trim().to_string()).unwrap_or_default()];
  }
  (0..set.answer_count())
    .map(|i| form.get(&format!("ans-{i}")).cloned().unwrap_or_default())
    .collect()
}

pub fn ensure_complete(answers: &[String]) -> Result<(), QuizError> {
  if answers.is_empty() || answers.iter().any(|a| a.trim().is_empty()) {
    return Err(QuizError::Validation(UNANSWERED_ALERT.into()));
  }
  Ok(())
}

/// Build the `/evaluate` payload for `set` under `mode`.
pub fn grading_request(set: &QuestionSet, answers: &[String], mode: GradingMode) -> Result<GradingRequest, QuizError> {
  match mode {
    GradingMode::Local => {
      let key = set.answer_key().ok_or_else(|| QuizError::Validation(SPOKEN_NEEDS_AI.into()))?;
      Ok(GradingRequest {
        user_answers: Some(answers.to_vec()),
        correct_answers: Some(key),
        ..Default::default()
      })
    }
    GradingMode::Ai => {
      let (context, questions) = set.grading_material();
      Ok(GradingRequest {
        user_answers: Some(answers.to_vec()),
        question_type: Some(set.kind().as_str().to_string()),
        context: Some(context),
        questions: Some(questions),
        ..Default::default()
      })
    }
  }
}

/// Collect, validate locally, grade, and return the card's new state.
/// When nothing could be graded, the previous feedback stays and a notice is added.
#[instrument(level = "info", skip_all, fields(kind = %set.kind(), mode = %grader.mode()))]
pub async fn submit(set: &QuestionSet, form: &HashMap<String, String>, grader: &dyn Grader, prior: &CardState) -> CardState {
  let answers = collect_answers(set, form);
  let request = ensure_complete(&answers).and_then(|_| grading_request(set, &answers, grader.mode()));
  let request = match request {
    Ok(r) => r,
    Err(e) => {
      info!(target: "grading", kind = %set.kind(), reason = %e, "Submission stopped before grading");
      return CardState { answers, feedback: prior.feedback.clone(), notice: Some(Notice::Alert(e.public_message())) };
    }
  };

  match grader.grade(&request).await {
    Ok(GradingOutcome::Results { results }) => CardState {
      feedback: Feedback::Verdicts { answers: answers.clone(), verdicts: results },
      answers,
      notice: None,
    },
    Ok(GradingOutcome::Evaluation { evaluation }) => {
      CardState { answers, feedback: Feedback::Evaluation(evaluation), notice: None }
    }
    Err(e) => {
      warn!(target: "grading", kind = %set.kind(), error = %e, "Grading failed");
      CardState { answers, feedback: prior.feedback.clone(), notice: Some(Notice::Error(e.public_message())) }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grading::{Correctness, Expected, LocalGrader};
  use crate::testing::{fixtures, ScriptedProvider};
  use std::sync::Arc;

  fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  fn ctx(order: &[usize]) -> RenderContext<'_> {
    RenderContext { batch_id: "b1", mode: GradingMode::Local, blank_order: order }
  }

  #[test]
  fn paragraph_matching_card_lists_letters_and_questions() {
    let html = render_card(&fixtures::paragraph_matching(), &CardState::default(), &ctx(&[]));
    assert!(html.contains("action=\"/quiz/b1/paragraph-matching\""));
    assert!(html.contains("<strong>Paragraph C:</strong>"));
    assert!(html.contains("info about shelter"));
    assert!(html.contains("<select name=\"ans-2\">"));
    assert!(html.contains("<option value=\"E\">E</option>"));
  }

  #[test]
  fn rerender_with_a_new_set_drops_old_content() {
    let old = fixtures::paragraph_matching();
    let state = CardState {
      answers: vec!["B".into(), "D".into(), "A".into()],
      feedback: Feedback::Verdicts { answers: vec![], verdicts: vec![] },
      notice: None,
    };
    assert!(render_card(&old, &state, &ctx(&[])).contains("Silk Road"));

    let mut fresh = fixtures::paragraph_matching();
    if let QuestionSet::ParagraphMatching(s) = &mut fresh {
      s.essay.insert("A".into(), "Volcanoes form at plate boundaries.".into());
    }
    let html = render_card(&fresh, &CardState::default(), &ctx(&[]));
    assert!(!html.contains("Silk Road"));
    assert!(!html.contains("Results:"));
    assert!(!html.contains(" selected"));
  }

  #[test]
  fn text_is_escaped() {
    let set = QuestionSet::SpokenAnswer(crate::domain::SpokenAnswerSet { question: "Is 2 < 3 & why?".into() });
    let html = render_card(&set, &CardState::default(), &ctx(&[]));
    assert!(html.contains("Is 2 &lt; 3 &amp; why?"));
  }

  #[test]
  fn blank_options_follow_the_display_order() {
    let html = render_card(&fixtures::fill_in_the_blank(), &CardState::default(), &ctx(&[4, 0, 3, 1, 2]));
    let first = html.find("Samples returned to Earth.").unwrap();
    let second = html.find("Apollo 11 launched in July.").unwrap();
    assert!(first < second);
    assert!(html.contains("<span class=\"blank\">[A]</span>"));
  }

  #[test]
  fn dialogue_questions_are_tagged_for_playback_and_number_continuously() {
    let html = render_card(&fixtures::dialogue(), &CardState::default(), &ctx(&[]));
    assert!(html.contains("<div class=\"questions\" data-reveal=\"part1\"><h4>"));
    assert!(!html.contains(" hidden"));
    assert!(html.contains("data-playback=\"[{&quot;action&quot;:&quot;speak&quot;"));
    assert!(html.contains("name=\"ans-5\""));
    assert!(html.contains("<strong>4.</strong> When will they meet?"));
  }

  #[test]
  fn unanswered_questions_are_caught_locally() {
    let answers = collect_answers(&fixtures::multiple_choice(), &form(&[("ans-0", "Messaging apps"), ("ans-2", "Phone bans")]));
    assert_eq!(answers, vec!["Messaging apps", "", "Phone bans"]);
    assert!(matches!(ensure_complete(&answers), Err(QuizError::Validation(ref m)) if m == UNANSWERED_ALERT));
  }

  #[tokio::test]
  async fn incomplete_submission_never_reaches_the_grader() {
    let provider = Arc::new(ScriptedProvider::new());
    let grader = crate::grading::AiGrader { provider: provider.clone(), prompts: Arc::new(Default::default()) };
    let state = submit(&fixtures::speaker_matching(), &form(&[("ans-0", "Alex (Manager)")]), &grader, &CardState::default()).await;
    assert_eq!(state.notice, Some(Notice::Alert(UNANSWERED_ALERT.into())));
    assert_eq!(state.feedback, Feedback::None);
    assert_eq!(state.answers.len(), 4);
    assert_eq!(provider.calls(), 0);
  }

  #[tokio::test]
  async fn paragraph_matching_example_grades_case_insensitively() {
    let state = submit(
      &fixtures::paragraph_matching(),
      &form(&[("ans-0", "b"), ("ans-1", "D"), ("ans-2", "a")]),
      &LocalGrader,
      &CardState::default(),
    )
    .await;
    let Feedback::Verdicts { answers, verdicts } = &state.feedback else { panic!("expected verdicts") };
    assert!(verdicts.iter().all(Verdict::correct));
    let html = render_verdicts(&fixtures::paragraph_matching(), answers, verdicts);
    assert!(html.contains("Q1:</strong> Your answer (b) was correct."));
  }

  #[tokio::test]
  async fn blank_grading_is_keyed_by_paragraph_not_display_order() {
    let set = fixtures::fill_in_the_blank();
    let QuestionSet::FillInTheBlank(fib) = &set else { unreachable!() };
    // Answer every paragraph with its own sentence, whatever order the options were shown in.
    let pairs: Vec<(String, String)> = fib.options.iter().enumerate().map(|(i, o)| (format!("ans-{i}"), o.clone())).collect();
    let submitted: HashMap<String, String> = pairs.into_iter().collect();

    for order in [[0, 1, 2, 3, 4], [4, 3, 2, 1, 0], [2, 0, 4, 1, 3]] {
      let html = render_card(&set, &CardState::default(), &ctx(&order));
      assert!(html.contains("Fill blank in Paragraph E"));
      let state = submit(&set, &submitted, &LocalGrader, &CardState::default()).await;
      let Feedback::Verdicts { verdicts, .. } = state.feedback else { panic!("expected verdicts") };
      assert!(verdicts.iter().all(Verdict::correct));
    }
  }

  #[test]
  fn wrong_blank_is_reported_by_paragraph_letter() {
    let verdicts = vec![
      Verdict { is_correct: Correctness::Correct, expected: Expected::CorrectAnswer("a".into()) },
      Verdict { is_correct: Correctness::Incorrect, expected: Expected::CorrectAnswer("Three astronauts were selected.".into()) },
    ];
    let html = render_verdicts(&fixtures::fill_in_the_blank(), &["a".into(), "b".into()], &verdicts);
    assert!(html.contains("Blank B:</strong> Your choice was incorrect. Correct was: <strong>Three astronauts were selected.</strong>."));
  }

  #[tokio::test]
  async fn spoken_answer_in_local_mode_explains_instead_of_grading() {
    let state =
      submit(&fixtures::spoken_answer(), &form(&[("transcript", "Light scatters.")]), &LocalGrader, &CardState::default()).await;
    assert_eq!(state.notice, Some(Notice::Alert(SPOKEN_NEEDS_AI.into())));
    assert_eq!(state.answers, vec!["Light scatters."]);
  }

  #[test]
  fn ai_request_carries_type_context_and_questions() {
    let req = grading_request(&fixtures::multiple_choice(), &["a".into(), "b".into(), "c".into()], GradingMode::Ai).unwrap();
    assert_eq!(req.question_type.as_deref(), Some("multiple-choice"));
    assert!(req.correct_answers.is_none());
    assert_eq!(req.questions.unwrap()[1]["q"], "What do researchers study?");
    assert!(req.context.unwrap()["B"].as_str().unwrap().contains("Messaging"));
  }

  #[test]
  fn page_holds_all_six_cards() {
    let batch = BatchContext::new(fixtures::batch());
    let html = render_page(&batch, GradingMode::Local);
    for kind in QuestionType::ALL {
      assert!(html.contains(&format!("id=\"{kind}\"")), "{kind}");
    }
    assert!(html.contains("id=\"new-questions-btn\""));
  }

  #[test]
  fn fresh_page_loads_the_player_and_leaves_audio_questions_reachable() {
    let batch = BatchContext::new(fixtures::batch());
    let html = render_page(&batch, GradingMode::Local);
    assert!(html.contains("<script src=\"/quiz.js\" defer></script>"));
    assert!(html.contains("data-reveal=\"part1\">"));
    assert!(html.contains("data-reveal=\"questions\">"));
    assert!(!html.contains(" hidden"));
    assert!(!html.contains("data-answered"));
    // Part 1 controls are plain form fields, answerable without playback.
    assert!(html.contains("name=\"ans-0\" value=\"At the library\""));
  }

  #[test]
  fn player_script_ships_with_the_static_files() {
    let script = include_str!("../../public/quiz.js");
    for needle in ["data-playback", "data-reveal", "data-answered", "onend", "pagehide", "speechSynthesis.cancel"] {
      assert!(script.contains(needle), "{needle}");
    }
  }

  #[test]
  fn answered_cards_are_marked_for_the_player() {
    let state = CardState { answers: vec!["Sarah".into()], ..Default::default() };
    let html = render_card(&fixtures::dialogue(), &state, &ctx(&[]));
    assert!(html.contains("id=\"dialogue-comprehension\" data-answered=\"true\">"));
  }

  struct Failing;

  impl Grader for Failing {
    fn mode(&self) -> GradingMode {
      GradingMode::Ai
    }

    fn grade<'a>(&'a self, _req: &'a GradingRequest) -> futures::future::BoxFuture<'a, Result<GradingOutcome, QuizError>> {
      Box::pin(async { Err(QuizError::Provider("503".into())) })
    }
  }

  #[tokio::test]
  async fn failed_grading_keeps_previous_results_and_adds_an_error() {
    let set = fixtures::paragraph_matching();
    let graded = submit(&set, &form(&[("ans-0", "B"), ("ans-1", "C"), ("ans-2", "A")]), &LocalGrader, &CardState::default()).await;

    let retry = submit(&set, &form(&[("ans-0", "B"), ("ans-1", "D"), ("ans-2", "A")]), &Failing, &graded).await;
    assert_eq!(retry.feedback, graded.feedback);
    assert_eq!(retry.answers, vec!["B", "D", "A"]);
    assert!(matches!(retry.notice, Some(Notice::Error(ref m)) if m == crate::error::UPSTREAM_FAILURE_MESSAGE));

    let html = render_card(&set, &retry, &ctx(&[]));
    assert!(html.contains("The AI provider failed"));
    // Earlier verdicts still describe the answers they judged.
    assert!(html.contains("Q2:</strong> Your answer (C) was incorrect."));
  }
}
