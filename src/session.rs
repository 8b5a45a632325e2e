//! Server-held state of rendered batches.
//!
//! A `BatchContext` is everything the quiz page needs between requests: the
//! six sets, the shuffled display order of the blank options and, per card,
//! the last submitted answers and feedback. Contexts live in a bounded
//! in-memory `BatchStore`; the oldest is dropped when it is full.

use std::collections::{HashMap, VecDeque};

use rand::{seq::SliceRandom, Rng};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Batch, QuestionSet, QuestionType};
use crate::grading::{SpokenEvaluation, Verdict};

/// Last grading result shown on a card.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Feedback {
  #[default]
  None,
  /// Per-item verdicts together with the answers they judged.
  Verdicts { answers: Vec<String>, verdicts: Vec<Verdict> },
  Evaluation(SpokenEvaluation),
}

/// One-off message shown above the card's feedback; it never replaces it.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
  /// Raised before anything is sent (e.g. unanswered questions).
  Alert(String),
  /// Grading failed upstream.
  Error(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CardState {
  /// Current picks, as last submitted.
  pub answers: Vec<String>,
  pub feedback: Feedback,
  pub notice: Option<Notice>,
}

#[derive(Clone, Debug)]
pub struct BatchContext {
  pub id: String,
  pub batch: Batch,
  /// Display order of the fill-in-the-blank options (indices into `options`).
  pub blank_order: Vec<usize>,
  cards: HashMap<QuestionType, CardState>,
}

impl BatchContext {
  pub fn new(batch: Batch) -> Self {
    Self::with_rng(batch, &mut rand::thread_rng())
  }

  pub fn with_rng<R: Rng + ?Sized>(batch: Batch, rng: &mut R) -> Self {
    let option_count = match &batch.fill_in_the_blank {
      QuestionSet::FillInTheBlank(s) => s.options.len(),
      _ => 0,
    };
    let mut blank_order: Vec<usize> = (0..option_count).collect();
    blank_order.shuffle(rng);
    Self { id: Uuid::new_v4().to_string(), batch, blank_order, cards: HashMap::new() }
  }

  pub fn card(&self, kind: QuestionType) -> CardState {
    self.cards.get(&kind).cloned().unwrap_or_default()
  }

  pub fn set_card(&mut self, kind: QuestionType, state: CardState) {
    self.cards.insert(kind, state);
  }
}

pub struct BatchStore {
  capacity: usize,
  order: VecDeque<String>,
  by_id: HashMap<String, BatchContext>,
}

impl BatchStore {
  pub fn new(capacity: usize) -> Self {
    Self { capacity: capacity.max(1), order: VecDeque::new(), by_id: HashMap::new() }
  }

  /// Store `ctx`, evicting the oldest contexts beyond capacity. Returns its id.
  pub fn insert(&mut self, ctx: BatchContext) -> String {
    let id = ctx.id.clone();
    self.order.push_back(id.clone());
    self.by_id.insert(id.clone(), ctx);
    while self.order.len() > self.capacity {
      if let Some(old) = self.order.pop_front() {
        self.by_id.remove(&old);
        debug!(target: "session", evicted = %old, "Dropped oldest batch");
      }
    }
    debug!(target: "session", %id, live = self.len(), "Batch stored");
    id
  }

  pub fn get(&self, id: &str) -> Option<&BatchContext> {
    self.by_id.get(id)
  }

  pub fn get_mut(&mut self, id: &str) -> Option<&mut BatchContext> {
    self.by_id.get_mut(id)
  }

  pub fn len(&self) -> usize {
    self.by_id.len()
  }
}
