//! Prompt catalog: one generation template per question type plus the grading templates.
//!
//! Generation templates are the only description of the JSON shape the model
//! must return; `domain::QuestionSet::validate` enforces the same key names and
//! counts. Change both together.
//!
//! Grading placeholders: `{question_type}`, `{instructions}`, `{expected_field}`,
//! `{context}`, `{questions}`, `{user_answers}`; spoken rubric: `{question}`, `{answer}`.

use serde::Deserialize;

use crate::domain::QuestionType;
use crate::util::fill_template;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub paragraph_matching: String,
  pub multiple_choice: String,
  pub fill_in_the_blank: String,
  pub spoken_answer: String,
  pub dialogue_comprehension: String,
  pub speaker_matching: String,
  pub grade_items_template: String,
  pub grade_spoken_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      paragraph_matching: r#"Generate a question set of type 'paragraph-matching'.
1. Write a 5-paragraph essay on an interesting academic topic (e.g., ancient history, biology, astronomy). Label the paragraphs A, B, C, D and E.
2. Write exactly 3 distinct "information sentences", each describing information found in exactly one of the paragraphs.
3. For each information sentence give the letter of the paragraph that contains it.
4. Reply with a single JSON object and nothing else, with this exact structure:
{
  "type": "paragraph-matching",
  "essay": { "A": "Paragraph content...", "B": "...", "C": "...", "D": "...", "E": "..." },
  "questions": ["Information sentence 1", "Information sentence 2", "Information sentence 3"],
  "correctAnswers": ["Letter for sentence 1", "Letter for sentence 2", "Letter for sentence 3"]
}"#.into(),

      multiple_choice: r#"Generate a question set of type 'multiple-choice'.
1. Write a 5-paragraph essay on a topic related to technology or social science. Label the paragraphs A, B, C, D and E.
2. Write exactly 3 comprehension questions about the essay. Each question has exactly 3 options.
3. "correctAnswer" must repeat the text of the correct option exactly.
4. Reply with a single JSON object and nothing else, with this exact structure:
{
  "type": "multiple-choice",
  "essay": { "A": "...", "B": "...", "C": "...", "D": "...", "E": "..." },
  "questions": [
    { "q": "Question 1 text?", "options": ["Option A", "Option B", "Correct Option C"], "correctAnswer": "Correct Option C" },
    { "q": "Question 2 text?", "options": ["Option X", "Correct Option Y", "Option Z"], "correctAnswer": "Correct Option Y" },
    { "q": "Question 3 text?", "options": ["Correct Option 1", "Option 2", "Option 3"], "correctAnswer": "Correct Option 1" }
  ]
}"#.into(),

      fill_in_the_blank: r#"Generate a question set of type 'fill-in-the-blank'.
1. Write a 5-paragraph essay on a specific historical event. Label the paragraphs A, B, C, D and E.
2. In each paragraph, remove exactly one key sentence and replace it with "[_BLANK_]". Every paragraph contains the marker exactly once.
3. List the 5 removed sentences in paragraph order: the first belongs to A, the last to E.
4. Reply with a single JSON object and nothing else, with this exact structure:
{
  "type": "fill-in-the-blank",
  "essay": { "A": "Text with a [_BLANK_]...", "B": "...", "C": "...", "D": "...", "E": "..." },
  "options": ["Sentence for A", "Sentence for B", "Sentence for C", "Sentence for D", "Sentence for E"]
}"#.into(),

      spoken_answer: r#"Generate a question of type 'spoken-answer'.
1. Write one open-ended question that asks the user to explain a simple, common-knowledge concept. It should invite about 45 seconds of speech.
2. Reply with a single JSON object and nothing else, with this exact structure:
{
  "type": "spoken-answer",
  "question": "The generated question text."
}"#.into(),

      dialogue_comprehension: r#"Generate a two-part question set of type 'dialogue-comprehension' that will be read aloud.
1. Pick a topic for a dialogue between exactly two people, Sarah and David.
2. Write "dialoguePart1" (4-6 lines) and "dialoguePart2" (4-6 lines) that continues the story. Every line's "speaker" is "Sarah" or "David".
3. For each part write exactly 3 multiple-choice questions with 3 options each; "correctAnswer" repeats the correct option exactly.
4. Reply with a single JSON object and nothing else, with this exact structure:
{
  "type": "dialogue-comprehension",
  "topic": "The topic of the dialogue",
  "speakers": ["Sarah", "David"],
  "dialoguePart1": [{ "speaker": "Sarah", "line": "..." }],
  "questionsPart1": [{ "q": "?", "options": ["...", "...", "..."], "correctAnswer": "..." }],
  "dialoguePart2": [{ "speaker": "David", "line": "..." }],
  "questionsPart2": [{ "q": "?", "options": ["...", "...", "..."], "correctAnswer": "..." }]
}"#.into(),

      speaker_matching: r#"Generate a question set of type 'speaker-matching'.
1. Four people (Alex, Brenda, Carlos, Dana) discuss a common workplace issue (e.g., hybrid work, team meetings). Give each a clear role written in parentheses after the name, e.g. "Alex (Manager)".
2. Write a short monologue (2-3 sentences) for each of the four speakers. The "monologues" keys are exactly the 4 "speakers" entries.
3. Write exactly 4 "key sentences", each summarizing a point made by one speaker. "correctSpeaker" repeats a "speakers" entry exactly.
4. Reply with a single JSON object and nothing else, with this exact structure:
{
  "type": "speaker-matching",
  "topic": "The discussion topic.",
  "speakers": ["Alex (Role)", "Brenda (Role)", "Carlos (Role)", "Dana (Role)"],
  "monologues": { "Alex (Role)": "Monologue...", "Brenda (Role)": "...", "Carlos (Role)": "...", "Dana (Role)": "..." },
  "questions": [
    { "keySentence": "A point made by one speaker.", "correctSpeaker": "Alex (Role)" }
  ]
}"#.into(),

      grade_items_template: r#"You are grading a language-assessment exercise.
Question type: {question_type}
{instructions}

Material:
{context}

Questions, in order:
{questions}

User answers, in the same order:
{user_answers}

Judge every user answer. Reply with a single JSON object and nothing else:
{
  "results": [
    { "isCorrect": "correct" or "incorrect", "{expected_field}": "the expected answer" }
  ]
}
Return exactly one entry per user answer, in the same order."#.into(),

      grade_spoken_template: r#"You are evaluating a spoken answer (transcribed) with a rubric.
Question: {question}
Transcribed answer: {answer}

Score relevance, clarity and completeness from 1 (poor) to 5 (excellent), each with a one-sentence comment, and add short overall feedback.
Reply with a single JSON object and nothing else:
{
  "evaluation": {
    "relevance": { "score": 1, "comment": "..." },
    "clarity": { "score": 1, "comment": "..." },
    "completeness": { "score": 1, "comment": "..." },
    "overallFeedback": "..."
  }
}"#.into(),
    }
  }
}

impl Prompts {
  pub fn generation_prompt(&self, kind: QuestionType) -> &str {
    match kind {
      QuestionType::ParagraphMatching => &self.paragraph_matching,
      QuestionType::MultipleChoice => &self.multiple_choice,
      QuestionType::FillInTheBlank => &self.fill_in_the_blank,
      QuestionType::SpokenAnswer => &self.spoken_answer,
      QuestionType::DialogueComprehension => &self.dialogue_comprehension,
      QuestionType::SpeakerMatching => &self.speaker_matching,
    }
  }

  pub fn grading_prompt(
    &self,
    kind: QuestionType,
    expected_field: &str,
    context: &str,
    questions: &str,
    user_answers: &str,
  ) -> String {
    fill_template(
      &self.grade_items_template,
      &[
        ("question_type", kind.as_str()),
        ("instructions", grading_instructions(kind)),
        ("expected_field", expected_field),
        ("context", context),
        ("questions", questions),
        ("user_answers", user_answers),
      ],
    )
  }

  pub fn spoken_prompt(&self, question: &str, answer: &str) -> String {
    fill_template(&self.grade_spoken_template, &[("question", question), ("answer", answer)])
  }
}

/// What "correct" means for each item-based type.
fn grading_instructions(kind: QuestionType) -> &'static str {
  match kind {
    QuestionType::ParagraphMatching =>
      "Each question is an information sentence; the user answered with the letter of the paragraph they think contains it. Name the right paragraph letter.",
    QuestionType::MultipleChoice =>
      "Each question has options; the user picked one. Name the option the essay supports.",
    QuestionType::FillInTheBlank =>
      "The material has one [_BLANK_] per paragraph, in order A to E; the questions list the candidate sentences. The user picked one sentence per blank. Name the sentence that fits each blank best.",
    QuestionType::DialogueComprehension =>
      "The questions are about the dialogue (part 1 questions first, then part 2); the user picked one option each. Name the option the dialogue supports.",
    QuestionType::SpeakerMatching =>
      "Each question is a key sentence; the user named the speaker they think made that point. Name the speaker whose monologue contains the point.",
    QuestionType::SpokenAnswer =>
      "Judge whether the spoken answer addresses the question.",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{ESSAY_LETTERS, BLANK_MARKER};

  #[test]
  fn every_generation_prompt_names_its_type_tag() {
    let p = Prompts::default();
    for kind in QuestionType::ALL {
      let tpl = p.generation_prompt(kind);
      assert!(tpl.contains(&format!("\"type\": \"{}\"", kind.as_str())), "{kind}");
      assert!(tpl.contains(&format!("'{}'", kind.as_str())), "{kind}");
    }
  }

  #[test]
  fn essay_prompts_spell_out_the_paragraph_letters() {
    let p = Prompts::default();
    for kind in [QuestionType::ParagraphMatching, QuestionType::MultipleChoice, QuestionType::FillInTheBlank] {
      for letter in ESSAY_LETTERS {
        assert!(p.generation_prompt(kind).contains(&format!("\"{letter}\"")));
      }
    }
    assert!(p.fill_in_the_blank.contains(BLANK_MARKER));
  }

  #[test]
  fn grading_prompt_fills_every_placeholder() {
    let p = Prompts::default();
    let out = p.grading_prompt(QuestionType::FillInTheBlank, "bestFitSentence", "{\"A\":\"x\"}", "[\"s\"]", "[\"s\"]");
    assert!(out.contains("Question type: fill-in-the-blank"));
    assert!(out.contains("\"bestFitSentence\""));
    assert!(!out.contains("{expected_field}"));
    assert!(!out.contains("{user_answers}"));
  }

  #[test]
  fn placeholders_inside_submitted_material_stay_literal() {
    let p = Prompts::default();
    let out = p.grading_prompt(
      QuestionType::MultipleChoice,
      "correctAnswer",
      "{\"A\":\"mentions {user_answers} and {expected_field}\"}",
      "[]",
      "[\"SECRET\"]",
    );
    assert!(out.contains("mentions {user_answers} and {expected_field}"));
    assert_eq!(out.matches("SECRET").count(), 1);

    let spoken = p.spoken_prompt("What is {answer}?", "Light scatters.");
    assert!(spoken.contains("What is {answer}?"));
    assert_eq!(spoken.matches("Light scatters.").count(), 1);
  }

  #[test]
  fn grading_prompts_do_not_collide_with_generation_markers() {
    let p = Prompts::default();
    let out = p.grading_prompt(QuestionType::SpeakerMatching, "correctAnswer", "{}", "[]", "[]");
    for kind in QuestionType::ALL {
      assert!(!out.contains(&format!("'{}'", kind.as_str())));
    }
  }
}
