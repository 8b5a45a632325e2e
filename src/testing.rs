//! Test support: canned question sets and a scripted completion provider.

use std::{
  collections::VecDeque,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
  },
};

use futures::future::BoxFuture;

use crate::error::QuizError;
use crate::provider::CompletionProvider;

pub mod fixtures {
  use crate::domain::{Batch, QuestionSet, QuestionType};

  pub const PARAGRAPH_MATCHING: &str = r#"{
    "type": "paragraph-matching",
    "essay": {
      "A": "The Silk Road was a network of trade routes.",
      "B": "Merchants carried silk westward from China.",
      "C": "Ideas and religions also travelled along the routes.",
      "D": "Caravanserais offered shelter to travellers.",
      "E": "Sea routes eventually replaced the overland paths."
    },
    "questions": ["info about silk", "info about shelter", "info about networks"],
    "correctAnswers": ["B", "D", "A"]
  }"#;

  pub const MULTIPLE_CHOICE: &str = r#"{
    "type": "multiple-choice",
    "essay": {
      "A": "Smartphones changed how people communicate.",
      "B": "Messaging apps replaced many phone calls.",
      "C": "Social media created new public spaces.",
      "D": "Researchers study effects on attention.",
      "E": "Schools debate phone bans."
    },
    "questions": [
      { "q": "What replaced many phone calls?", "options": ["Letters", "Messaging apps", "Radio"], "correctAnswer": "Messaging apps" },
      { "q": "What do researchers study?", "options": ["Attention", "Weather", "Sleep"], "correctAnswer": "Attention" },
      { "q": "What do schools debate?", "options": ["Uniforms", "Lunch", "Phone bans"], "correctAnswer": "Phone bans" }
    ]
  }"#;

  pub const FILL_IN_THE_BLANK: &str = r#"{
    "type": "fill-in-the-blank",
    "essay": {
      "A": "In 1969 the race to the Moon peaked. [_BLANK_]",
      "B": "[_BLANK_] The crew trained for years.",
      "C": "The landing was tense. [_BLANK_] Fuel was low.",
      "D": "Millions watched on television. [_BLANK_]",
      "E": "[_BLANK_] The mission changed science."
    },
    "options": [
      "Apollo 11 launched in July.",
      "Three astronauts were selected.",
      "Armstrong took manual control.",
      "The broadcast reached every continent.",
      "Samples returned to Earth."
    ]
  }"#;

  pub const SPOKEN_ANSWER: &str = r#"{
    "type": "spoken-answer",
    "question": "Explain why the sky looks blue during the day."
  }"#;

  pub const DIALOGUE: &str = r#"{
    "type": "dialogue-comprehension",
    "topic": "Planning a study session",
    "speakers": ["Sarah", "David"],
    "dialoguePart1": [
      { "speaker": "Sarah", "line": "Shall we study at the library?" },
      { "speaker": "David", "line": "Sure, it is quiet there." }
    ],
    "questionsPart1": [
      { "q": "Where will they study?", "options": ["At the library", "At home", "In a cafe"], "correctAnswer": "At the library" },
      { "q": "Why does David agree?", "options": ["It is quiet", "It is close", "It is cheap"], "correctAnswer": "It is quiet" },
      { "q": "Who suggests the place?", "options": ["Sarah", "David", "A teacher"], "correctAnswer": "Sarah" }
    ],
    "dialoguePart2": [
      { "speaker": "David", "line": "Can we meet on Saturday?" },
      { "speaker": "Sarah", "line": "Yes, let us bring our notes." }
    ],
    "questionsPart2": [
      { "q": "When will they meet?", "options": ["On Friday", "On Saturday", "On Sunday"], "correctAnswer": "On Saturday" },
      { "q": "What will they bring?", "options": ["Snacks", "Notes", "Laptops"], "correctAnswer": "Notes" },
      { "q": "Who proposes the day?", "options": ["Sarah", "David", "Nobody"], "correctAnswer": "David" }
    ]
  }"#;

  pub const SPEAKER_MATCHING: &str = r#"{
    "type": "speaker-matching",
    "topic": "Hybrid work",
    "speakers": ["Alex (Manager)", "Brenda (Designer)", "Carlos (Analyst)", "Dana (Engineer)"],
    "monologues": {
      "Alex (Manager)": "I want the team in the office twice a week.",
      "Brenda (Designer)": "Workshops go better face to face.",
      "Carlos (Analyst)": "I focus best at home.",
      "Dana (Engineer)": "Our tools already work remotely."
    },
    "questions": [
      { "keySentence": "Set office days help coordination.", "correctSpeaker": "Alex (Manager)" },
      { "keySentence": "Creative sessions need a room.", "correctSpeaker": "Brenda (Designer)" },
      { "keySentence": "Home is quieter for deep work.", "correctSpeaker": "Carlos (Analyst)" },
      { "keySentence": "The software is not the problem.", "correctSpeaker": "Dana (Engineer)" }
    ]
  }"#;

  pub fn raw(kind: QuestionType) -> &'static str {
    match kind {
      QuestionType::ParagraphMatching => PARAGRAPH_MATCHING,
      QuestionType::MultipleChoice => MULTIPLE_CHOICE,
      QuestionType::FillInTheBlank => FILL_IN_THE_BLANK,
      QuestionType::SpokenAnswer => SPOKEN_ANSWER,
      QuestionType::DialogueComprehension => DIALOGUE,
      QuestionType::SpeakerMatching => SPEAKER_MATCHING,
    }
  }

  pub fn set(kind: QuestionType) -> QuestionSet {
    serde_json::from_str(raw(kind)).expect("fixture parses")
  }

  pub fn paragraph_matching() -> QuestionSet { set(QuestionType::ParagraphMatching) }
  pub fn multiple_choice() -> QuestionSet { set(QuestionType::MultipleChoice) }
  pub fn fill_in_the_blank() -> QuestionSet { set(QuestionType::FillInTheBlank) }
  pub fn spoken_answer() -> QuestionSet { set(QuestionType::SpokenAnswer) }
  pub fn dialogue() -> QuestionSet { set(QuestionType::DialogueComprehension) }
  pub fn speaker_matching() -> QuestionSet { set(QuestionType::SpeakerMatching) }

  pub fn batch() -> Batch {
    Batch {
      paragraph_matching: paragraph_matching(),
      multiple_choice: multiple_choice(),
      fill_in_the_blank: fill_in_the_blank(),
      spoken_answer: spoken_answer(),
      dialogue_comprehension: dialogue(),
      speaker_matching: speaker_matching(),
    }
  }
}

/// One scripted reaction of the fake provider.
pub enum Reply {
  Text(String),
  Fail(String),
}

/// Provider that answers by matching a marker phrase in the prompt.
///
/// Rules are checked in order; each rule holds a queue of replies and the last
/// reply repeats once the queue is down to one entry.
pub struct ScriptedProvider {
  rules: Mutex<Vec<(String, VecDeque<Reply>)>>,
  calls: AtomicUsize,
}

impl ScriptedProvider {
  pub fn new() -> Self {
    Self { rules: Mutex::new(Vec::new()), calls: AtomicUsize::new(0) }
  }

  pub fn on(self, marker: &str, replies: Vec<Reply>) -> Self {
    self.rules.lock().expect("rules lock").push((marker.to_string(), replies.into()));
    self
  }

  pub fn text(self, marker: &str, text: &str) -> Self {
    self.on(marker, vec![Reply::Text(text.to_string())])
  }

  /// Answers every generation prompt with the matching fixture, fenced like a real model would.
  pub fn with_fixtures(mut self) -> Self {
    for kind in crate::domain::QuestionType::ALL {
      let fenced = format!("```json\n{}\n```", fixtures::raw(kind));
      self = self.text(&format!("'{}'", kind.as_str()), &fenced);
    }
    self
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

impl CompletionProvider for ScriptedProvider {
  fn name(&self) -> &str {
    "scripted"
  }

  fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, QuizError>> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let reply = {
      let mut rules = self.rules.lock().expect("rules lock");
      rules.iter_mut().find(|(marker, _)| prompt.contains(marker.as_str())).map(|(_, queue)| {
        if queue.len() > 1 {
          queue.pop_front().expect("non-empty queue")
        } else {
          match queue.front() {
            Some(Reply::Text(t)) => Reply::Text(t.clone()),
            Some(Reply::Fail(e)) => Reply::Fail(e.clone()),
            None => Reply::Fail("empty script".into()),
          }
        }
      })
    };
    Box::pin(async move {
      // Let sibling futures interleave like real network calls would.
      tokio::task::yield_now().await;
      match reply {
        Some(Reply::Text(t)) => Ok(t),
        Some(Reply::Fail(e)) => Err(QuizError::Provider(e)),
        None => Err(QuizError::Provider(format!("no scripted reply for prompt: {}", crate::util::trunc_for_log(prompt, 60)))),
      }
    })
  }
}
