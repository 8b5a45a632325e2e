//! Domain models: question types, the six question-set shapes, the batch,
//! and the schema checks applied to everything the model generates.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::QuizError;

/// Paragraph keys every generated essay must use, in display order.
pub const ESSAY_LETTERS: [&str; 5] = ["A", "B", "C", "D", "E"];
/// Placeholder the fill-in-the-blank essay uses for the removed sentence.
pub const BLANK_MARKER: &str = "[_BLANK_]";

pub const MATCHING_QUESTIONS: usize = 3;
pub const CHOICE_QUESTIONS: usize = 3;
pub const CHOICE_OPTIONS: usize = 3;
pub const DIALOGUE_SPEAKERS: usize = 2;
pub const DIALOGUE_QUESTIONS_PER_PART: usize = 3;
pub const PANEL_SPEAKERS: usize = 4;
pub const PANEL_QUESTIONS: usize = 4;

/// Discriminator of a question set; the wire form is the kebab-case tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
  ParagraphMatching,
  MultipleChoice,
  FillInTheBlank,
  SpokenAnswer,
  DialogueComprehension,
  SpeakerMatching,
}

impl QuestionType {
  pub const ALL: [QuestionType; 6] = [
    QuestionType::ParagraphMatching,
    QuestionType::MultipleChoice,
    QuestionType::FillInTheBlank,
    QuestionType::SpokenAnswer,
    QuestionType::DialogueComprehension,
    QuestionType::SpeakerMatching,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      QuestionType::ParagraphMatching => "paragraph-matching",
      QuestionType::MultipleChoice => "multiple-choice",
      QuestionType::FillInTheBlank => "fill-in-the-blank",
      QuestionType::SpokenAnswer => "spoken-answer",
      QuestionType::DialogueComprehension => "dialogue-comprehension",
      QuestionType::SpeakerMatching => "speaker-matching",
    }
  }

  pub fn title(&self) -> &'static str {
    match self {
      QuestionType::ParagraphMatching => "Paragraph Matching",
      QuestionType::MultipleChoice => "Multiple Choice",
      QuestionType::FillInTheBlank => "Fill in the Blank",
      QuestionType::SpokenAnswer => "Spoken Answer",
      QuestionType::DialogueComprehension => "Dialogue Comprehension",
      QuestionType::SpeakerMatching => "Speaker Matching",
    }
  }
}

impl fmt::Display for QuestionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for QuestionType {
  type Err = QuizError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    QuestionType::ALL
      .into_iter()
      .find(|k| k.as_str() == s)
      .ok_or_else(|| QuizError::UnsupportedType(s.to_string()))
  }
}

/// Paragraph letter -> paragraph text. Ordered so A..E render in sequence.
pub type Essay = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphMatchingSet {
  pub essay: Essay,
  pub questions: Vec<String>,
  pub correct_answers: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceQuestion {
  pub q: String,
  pub options: Vec<String>,
  pub correct_answer: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultipleChoiceSet {
  pub essay: Essay,
  pub questions: Vec<ChoiceQuestion>,
}

/// `options[i]` is the sentence removed from the i-th paragraph (A..E order).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FillInTheBlankSet {
  pub essay: Essay,
  pub options: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpokenAnswerSet {
  pub question: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DialogueLine {
  pub speaker: String,
  pub line: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueComprehensionSet {
  pub topic: String,
  pub speakers: Vec<String>,
  pub dialogue_part1: Vec<DialogueLine>,
  pub questions_part1: Vec<ChoiceQuestion>,
  pub dialogue_part2: Vec<DialogueLine>,
  pub questions_part2: Vec<ChoiceQuestion>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerQuestion {
  pub key_sentence: String,
  pub correct_speaker: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeakerMatchingSet {
  pub topic: String,
  pub speakers: Vec<String>,
  pub monologues: BTreeMap<String, String>,
  pub questions: Vec<SpeakerQuestion>,
}

/// One generated exercise plus its answer key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionSet {
  ParagraphMatching(ParagraphMatchingSet),
  MultipleChoice(MultipleChoiceSet),
  FillInTheBlank(FillInTheBlankSet),
  SpokenAnswer(SpokenAnswerSet),
  DialogueComprehension(DialogueComprehensionSet),
  SpeakerMatching(SpeakerMatchingSet),
}

/// The six sets produced by one generate-all call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
  pub paragraph_matching: QuestionSet,
  pub multiple_choice: QuestionSet,
  pub fill_in_the_blank: QuestionSet,
  pub spoken_answer: QuestionSet,
  pub dialogue_comprehension: QuestionSet,
  pub speaker_matching: QuestionSet,
}

impl Batch {
  pub fn get(&self, kind: QuestionType) -> &QuestionSet {
    match kind {
      QuestionType::ParagraphMatching => &self.paragraph_matching,
      QuestionType::MultipleChoice => &self.multiple_choice,
      QuestionType::FillInTheBlank => &self.fill_in_the_blank,
      QuestionType::SpokenAnswer => &self.spoken_answer,
      QuestionType::DialogueComprehension => &self.dialogue_comprehension,
      QuestionType::SpeakerMatching => &self.speaker_matching,
    }
  }
}

impl QuestionSet {
  pub fn kind(&self) -> QuestionType {
    match self {
      QuestionSet::ParagraphMatching(_) => QuestionType::ParagraphMatching,
      QuestionSet::MultipleChoice(_) => QuestionType::MultipleChoice,
      QuestionSet::FillInTheBlank(_) => QuestionType::FillInTheBlank,
      QuestionSet::SpokenAnswer(_) => QuestionType::SpokenAnswer,
      QuestionSet::DialogueComprehension(_) => QuestionType::DialogueComprehension,
      QuestionSet::SpeakerMatching(_) => QuestionType::SpeakerMatching,
    }
  }

  /// Decode the untagged payload of `kind` (a `type` field, if any, is ignored here).
  pub fn from_value(kind: QuestionType, value: serde_json::Value) -> Result<Self, serde_json::Error> {
    Ok(match kind {
      QuestionType::ParagraphMatching => QuestionSet::ParagraphMatching(serde_json::from_value(value)?),
      QuestionType::MultipleChoice => QuestionSet::MultipleChoice(serde_json::from_value(value)?),
      QuestionType::FillInTheBlank => QuestionSet::FillInTheBlank(serde_json::from_value(value)?),
      QuestionType::SpokenAnswer => QuestionSet::SpokenAnswer(serde_json::from_value(value)?),
      QuestionType::DialogueComprehension => QuestionSet::DialogueComprehension(serde_json::from_value(value)?),
      QuestionType::SpeakerMatching => QuestionSet::SpeakerMatching(serde_json::from_value(value)?),
    })
  }

  /// Number of answers the user has to give, in submission order.
  pub fn answer_count(&self) -> usize {
    match self {
      QuestionSet::ParagraphMatching(s) => s.questions.len(),
      QuestionSet::MultipleChoice(s) => s.questions.len(),
      QuestionSet::FillInTheBlank(s) => s.essay.len(),
      QuestionSet::SpokenAnswer(_) => 1,
      QuestionSet::DialogueComprehension(s) => s.questions_part1.len() + s.questions_part2.len(),
      QuestionSet::SpeakerMatching(s) => s.questions.len(),
    }
  }

  /// Positional answer key. `None` for spoken answers, which have no fixed answer.
  pub fn answer_key(&self) -> Option<Vec<String>> {
    match self {
      QuestionSet::ParagraphMatching(s) => Some(s.correct_answers.clone()),
      QuestionSet::MultipleChoice(s) => Some(s.questions.iter().map(|q| q.correct_answer.clone()).collect()),
      QuestionSet::FillInTheBlank(s) => Some(s.options.clone()),
      QuestionSet::SpokenAnswer(_) => None,
      QuestionSet::DialogueComprehension(s) => Some(
        s.questions_part1
          .iter()
          .chain(s.questions_part2.iter())
          .map(|q| q.correct_answer.clone())
          .collect(),
      ),
      QuestionSet::SpeakerMatching(s) => Some(s.questions.iter().map(|q| q.correct_speaker.clone()).collect()),
    }
  }

  /// Reading material and the questions as the user saw them, for AI grading.
  pub fn grading_material(&self) -> (serde_json::Value, serde_json::Value) {
    use serde_json::json;
    match self {
      QuestionSet::ParagraphMatching(s) => (json!(s.essay), json!(s.questions)),
      QuestionSet::MultipleChoice(s) => (
        json!(s.essay),
        json!(s.questions.iter().map(|q| json!({ "q": q.q, "options": q.options })).collect::<Vec<_>>()),
      ),
      QuestionSet::FillInTheBlank(s) => (json!(s.essay), json!(s.options)),
      QuestionSet::SpokenAnswer(s) => (json!(s.question), json!([s.question])),
      QuestionSet::DialogueComprehension(s) => (
        json!({ "topic": s.topic, "dialoguePart1": s.dialogue_part1, "dialoguePart2": s.dialogue_part2 }),
        json!(s
          .questions_part1
          .iter()
          .chain(s.questions_part2.iter())
          .map(|q| json!({ "q": q.q, "options": q.options }))
          .collect::<Vec<_>>()),
      ),
      QuestionSet::SpeakerMatching(s) => (
        json!({ "topic": s.topic, "speakers": s.speakers, "monologues": s.monologues }),
        json!(s.questions.iter().map(|q| &q.key_sentence).collect::<Vec<_>>()),
      ),
    }
  }

  /// Check the shape invariants the generation prompt asked for.
  /// Any violation means the provider output is unusable.
  pub fn validate(&self) -> Result<(), QuizError> {
    match self {
      QuestionSet::ParagraphMatching(s) => {
        check_essay(&s.essay)?;
        check_len("questions", s.questions.len(), MATCHING_QUESTIONS)?;
        check_len("correctAnswers", s.correct_answers.len(), MATCHING_QUESTIONS)?;
        check_non_blank("questions", &s.questions)?;
        for letter in &s.correct_answers {
          if !s.essay.contains_key(letter) {
            return Err(malformed(format!("correct answer '{letter}' is not a paragraph of the essay")));
          }
        }
      }
      QuestionSet::MultipleChoice(s) => {
        check_essay(&s.essay)?;
        check_len("questions", s.questions.len(), CHOICE_QUESTIONS)?;
        for q in &s.questions {
          check_len("options", q.options.len(), CHOICE_OPTIONS)?;
          check_choice(q)?;
        }
      }
      QuestionSet::FillInTheBlank(s) => {
        check_essay(&s.essay)?;
        check_len("options", s.options.len(), s.essay.len())?;
        check_non_blank("options", &s.options)?;
        for (letter, text) in &s.essay {
          let blanks = text.matches(BLANK_MARKER).count();
          if blanks != 1 {
            return Err(malformed(format!("paragraph {letter} has {blanks} blanks, expected exactly 1")));
          }
        }
      }
      QuestionSet::SpokenAnswer(s) => {
        if s.question.trim().is_empty() {
          return Err(malformed("spoken-answer question is empty"));
        }
      }
      QuestionSet::DialogueComprehension(s) => {
        check_len("speakers", s.speakers.len(), DIALOGUE_SPEAKERS)?;
        for (name, part) in [("dialoguePart1", &s.dialogue_part1), ("dialoguePart2", &s.dialogue_part2)] {
          if part.is_empty() {
            return Err(malformed(format!("{name} is empty")));
          }
          if let Some(line) = part.iter().find(|l| !s.speakers.contains(&l.speaker)) {
            return Err(malformed(format!("{name} uses unknown speaker '{}'", line.speaker)));
          }
        }
        check_len("questionsPart1", s.questions_part1.len(), DIALOGUE_QUESTIONS_PER_PART)?;
        check_len("questionsPart2", s.questions_part2.len(), DIALOGUE_QUESTIONS_PER_PART)?;
        for q in s.questions_part1.iter().chain(s.questions_part2.iter()) {
          if q.options.len() < 2 {
            return Err(malformed(format!("question '{}' has fewer than 2 options", q.q)));
          }
          check_choice(q)?;
        }
      }
      QuestionSet::SpeakerMatching(s) => {
        check_len("speakers", s.speakers.len(), PANEL_SPEAKERS)?;
        check_len("questions", s.questions.len(), PANEL_QUESTIONS)?;
        let same_keys = s.monologues.len() == s.speakers.len()
          && s.speakers.iter().all(|name| s.monologues.contains_key(name));
        if !same_keys {
          return Err(malformed("monologue keys do not match the speaker list"));
        }
        if let Some(q) = s.questions.iter().find(|q| !s.speakers.contains(&q.correct_speaker)) {
          return Err(malformed(format!("correct speaker '{}' is not in the speaker list", q.correct_speaker)));
        }
      }
    }
    Ok(())
  }
}

fn malformed(msg: impl Into<String>) -> QuizError {
  QuizError::MalformedResponse(msg.into())
}

fn check_len(field: &str, got: usize, want: usize) -> Result<(), QuizError> {
  if got == want {
    Ok(())
  } else {
    Err(malformed(format!("{field}: expected {want} items, got {got}")))
  }
}

fn check_non_blank(field: &str, items: &[String]) -> Result<(), QuizError> {
  if items.iter().any(|s| s.trim().is_empty()) {
    return Err(malformed(format!("{field} contains an empty entry")));
  }
  Ok(())
}

fn check_essay(essay: &Essay) -> Result<(), QuizError> {
  let keys_ok = essay.len() == ESSAY_LETTERS.len() && ESSAY_LETTERS.iter().all(|k| essay.contains_key(*k));
  if !keys_ok {
    let got: Vec<&str> = essay.keys().map(String::as_str).collect();
    return Err(malformed(format!("essay paragraphs must be A..E, got {got:?}")));
  }
  if let Some((k, _)) = essay.iter().find(|(_, v)| v.trim().is_empty()) {
    return Err(malformed(format!("paragraph {k} is empty")));
  }
  Ok(())
}

fn check_choice(q: &ChoiceQuestion) -> Result<(), QuizError> {
  if !q.options.contains(&q.correct_answer) {
    return Err(malformed(format!("correct answer '{}' is not among the options of '{}'", q.correct_answer, q.q)));
  }
  Ok(())
}
