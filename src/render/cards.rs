//! Markup for the body of each card, one function per question type.
//!
//! Controls are named `ans-{i}` in submission order (spoken answer: `transcript`)
//! and are pre-filled from the card state so a re-render keeps the user's picks.

use std::fmt::Write as _;

use crate::domain::{
  ChoiceQuestion, DialogueComprehensionSet, Essay, FillInTheBlankSet, MultipleChoiceSet, ParagraphMatchingSet,
  SpeakerMatchingSet, SpokenAnswerSet, BLANK_MARKER,
};
use crate::playback::PlaybackPlan;
use crate::render::RenderContext;
use crate::session::CardState;
use crate::util::escape_html as esc;

pub fn paragraph_matching(set: &ParagraphMatchingSet, state: &CardState) -> String {
  let mut out = essay(&set.essay);
  out.push_str("<div class=\"questions\">");
  for (i, q) in set.questions.iter().enumerate() {
    let _ = write!(
      out,
      "<div class=\"question\"><p><strong>{}.</strong> Which paragraph contains info about: <em>\"{}\"</em>?</p>",
      i + 1,
      esc(q)
    );
    out.push_str(&select(i, "Select...", set.essay.keys(), answer(state, i)));
    out.push_str("</div>");
  }
  out.push_str("</div>");
  out
}

pub fn multiple_choice(set: &MultipleChoiceSet, state: &CardState) -> String {
  let mut out = essay(&set.essay);
  out.push_str("<div class=\"questions\">");
  for (i, q) in set.questions.iter().enumerate() {
    out.push_str(&choice_question(i, i + 1, q, state));
  }
  out.push_str("</div>");
  out
}

/// Blanks are answered per paragraph; the option list is shown in `ctx.blank_order`.
pub fn fill_in_the_blank(set: &FillInTheBlankSet, state: &CardState, ctx: &RenderContext) -> String {
  let mut out = String::from("<div class=\"essay\">");
  for (letter, text) in &set.essay {
    let marked = esc(text).replace(BLANK_MARKER, &format!("<span class=\"blank\">[{}]</span>", esc(letter)));
    let _ = write!(out, "<p><strong>Paragraph {}:</strong> {}</p>", esc(letter), marked);
  }
  out.push_str("</div><div class=\"questions\">");

  let displayed: Vec<&String> = ctx
    .blank_order
    .iter()
    .filter_map(|&i| set.options.get(i))
    .collect();
  for (i, letter) in set.essay.keys().enumerate() {
    let _ = write!(out, "<div class=\"question\"><p><strong>Fill blank in Paragraph {}:</strong></p>", esc(letter));
    out.push_str(&select(i, "Select sentence...", displayed.iter().copied(), answer(state, i)));
    out.push_str("</div>");
  }
  out.push_str("</div>");
  out
}

pub fn spoken_answer(set: &SpokenAnswerSet, state: &CardState) -> String {
  format!(
    "<div class=\"prompt\"><p>{}</p></div>\
     <label for=\"transcript\">Your answer (speak or type):</label>\
     <textarea id=\"transcript\" name=\"transcript\" rows=\"6\" data-speech-input=\"true\">{}</textarea>",
    esc(&set.question),
    esc(answer(state, 0))
  )
}

/// Question sections are rendered visible and tagged `data-reveal`; the
/// browser player hides untouched ones and reveals them as playback reaches them.
pub fn dialogue(set: &DialogueComprehensionSet, state: &CardState) -> String {
  let mut out = format!("<p class=\"topic\">{}</p>", esc(&set.topic));
  out.push_str(&play_button(&PlaybackPlan::for_dialogue(set), "Play dialogue"));

  let offset = set.questions_part1.len();
  for (section, title, questions, base) in [
    ("part1", "Part 1 Questions:", &set.questions_part1, 0),
    ("part2", "Part 2 Questions:", &set.questions_part2, offset),
  ] {
    let _ = write!(out, "<div class=\"questions\" data-reveal=\"{section}\"><h4>{title}</h4>");
    for (i, q) in questions.iter().enumerate() {
      out.push_str(&choice_question(base + i, base + i + 1, q, state));
    }
    out.push_str("</div>");
  }
  out
}

pub fn speaker_matching(set: &SpeakerMatchingSet, state: &CardState) -> String {
  let mut out = format!("<p class=\"topic\">{}</p>", esc(&set.topic));
  out.push_str(&play_button(&PlaybackPlan::for_monologues(set), "Play monologues"));
  out.push_str("<div class=\"monologues\">");
  for name in &set.speakers {
    if let Some(text) = set.monologues.get(name) {
      let _ = write!(out, "<div class=\"monologue\"><strong>{}:</strong> {}</div>", esc(name), esc(text));
    }
  }
  out.push_str("</div><div class=\"questions\" data-reveal=\"questions\"><h4>Who said the following?</h4>");
  for (i, q) in set.questions.iter().enumerate() {
    let _ = write!(
      out,
      "<div class=\"question\"><p><strong>{}.</strong> <em>\"{}\"</em></p>",
      i + 1,
      esc(&q.key_sentence)
    );
    out.push_str(&radios(i, set.speakers.iter(), answer(state, i)));
    out.push_str("</div>");
  }
  out.push_str("</div>");
  out
}

// -------- shared pieces --------

fn answer(state: &CardState, i: usize) -> &str {
  state.answers.get(i).map(String::as_str).unwrap_or("")
}

fn essay(essay: &Essay) -> String {
  let mut out = String::from("<div class=\"essay\">");
  for (letter, text) in essay {
    let _ = write!(out, "<p><strong>Paragraph {}:</strong> {}</p>", esc(letter), esc(text));
  }
  out.push_str("</div>");
  out
}

fn choice_question(index: usize, number: usize, q: &ChoiceQuestion, state: &CardState) -> String {
  format!(
    "<div class=\"question\"><p><strong>{}.</strong> {}</p>{}</div>",
    number,
    esc(&q.q),
    radios(index, q.options.iter(), answer(state, index))
  )
}

fn select<'a>(index: usize, placeholder: &str, options: impl Iterator<Item = &'a String>, chosen: &str) -> String {
  let mut out = format!("<select name=\"ans-{index}\"><option value=\"\">{}</option>", esc(placeholder));
  for opt in options {
    let sel = if opt == chosen { " selected" } else { "" };
    let _ = write!(out, "<option value=\"{0}\"{1}>{0}</option>", esc(opt), sel);
  }
  out.push_str("</select>");
  out
}

fn radios<'a>(index: usize, options: impl Iterator<Item = &'a String>, chosen: &str) -> String {
  options
    .map(|opt| {
      let checked = if opt == chosen { " checked" } else { "" };
      format!("<label><input type=\"radio\" name=\"ans-{index}\" value=\"{0}\"{1}> {0}</label>", esc(opt), checked)
    })
    .collect::<Vec<_>>()
    .join("<br>")
}

fn play_button(plan: &PlaybackPlan, label: &str) -> String {
  let plan = serde_json::to_string(plan).unwrap_or_else(|_| "[]".into());
  format!(
    "<button type=\"button\" class=\"play\" data-playback=\"{}\">{}</button><p class=\"status\"></p>",
    esc(&plan),
    esc(label)
  )
}
