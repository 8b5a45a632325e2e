//! Playback plans for the dialogue and speaker-matching cards.
//!
//! A plan is the ordered list of steps the browser player (`public/quiz.js`)
//! consumes one at a time: each utterance must finish before the next one
//! starts, and a question section is revealed only once every line before it
//! has been spoken. The player drops the rest of its queue on navigation away.

use serde::Serialize;
use tracing::debug;

use crate::domain::{DialogueComprehensionSet, DialogueLine, SpeakerMatchingSet};

/// Voice binding: the first-listed speaker gets one voice, everyone else the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceRole {
  Primary,
  Secondary,
}

impl VoiceRole {
  pub fn for_speaker(speaker: &str, speakers: &[String]) -> Self {
    match speakers.first() {
      Some(first) if first == speaker => VoiceRole::Primary,
      _ => VoiceRole::Secondary,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum PlaybackStep {
  Speak { text: String, voice: VoiceRole },
  Reveal { section: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PlaybackPlan {
  pub steps: Vec<PlaybackStep>,
}

impl PlaybackPlan {
  /// Part 1 lines, reveal part 1 questions, part 2 lines, reveal part 2 questions.
  pub fn for_dialogue(set: &DialogueComprehensionSet) -> Self {
    let speak = |line: &DialogueLine| PlaybackStep::Speak {
      text: format!("{}: {}", line.speaker, line.line),
      voice: VoiceRole::for_speaker(&line.speaker, &set.speakers),
    };
    let mut steps: Vec<PlaybackStep> = set.dialogue_part1.iter().map(speak).collect();
    steps.push(PlaybackStep::Reveal { section: "part1".into() });
    steps.extend(set.dialogue_part2.iter().map(speak));
    steps.push(PlaybackStep::Reveal { section: "part2".into() });
    debug!(target: "playback", steps = steps.len(), topic = %set.topic, "Dialogue plan built");
    Self { steps }
  }

  /// Every monologue in speaker order, then the questions.
  pub fn for_monologues(set: &SpeakerMatchingSet) -> Self {
    let mut steps: Vec<PlaybackStep> = set
      .speakers
      .iter()
      .filter_map(|name| {
        set.monologues.get(name).map(|text| PlaybackStep::Speak {
          text: format!("{name}: {text}"),
          voice: VoiceRole::for_speaker(name, &set.speakers),
        })
      })
      .collect();
    steps.push(PlaybackStep::Reveal { section: "questions".into() });
    debug!(target: "playback", steps = steps.len(), topic = %set.topic, "Monologue plan built");
    Self { steps }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::QuestionSet;
  use crate::testing::fixtures;

  fn dialogue() -> DialogueComprehensionSet {
    match fixtures::dialogue() {
      QuestionSet::DialogueComprehension(s) => s,
      _ => unreachable!(),
    }
  }

  #[test]
  fn dialogue_plan_reveals_each_part_after_its_lines() {
    let steps = PlaybackPlan::for_dialogue(&dialogue()).steps;
    assert_eq!(steps.len(), 6);
    assert_eq!(
      steps[0],
      PlaybackStep::Speak { text: "Sarah: Shall we study at the library?".into(), voice: VoiceRole::Primary }
    );
    assert_eq!(steps[1], PlaybackStep::Speak { text: "David: Sure, it is quiet there.".into(), voice: VoiceRole::Secondary });
    assert_eq!(steps[2], PlaybackStep::Reveal { section: "part1".into() });
    assert_eq!(steps[5], PlaybackStep::Reveal { section: "part2".into() });
  }

  #[test]
  fn monologues_follow_speaker_order_with_first_speaker_on_primary() {
    let set = match fixtures::speaker_matching() {
      QuestionSet::SpeakerMatching(s) => s,
      _ => unreachable!(),
    };
    let plan = PlaybackPlan::for_monologues(&set);
    assert_eq!(plan.steps.len(), 5);
    assert_eq!(plan.steps[4], PlaybackStep::Reveal { section: "questions".into() });
    let voices: Vec<VoiceRole> = plan
      .steps
      .iter()
      .filter_map(|s| match s {
        PlaybackStep::Speak { voice, .. } => Some(*voice),
        _ => None,
      })
      .collect();
    assert_eq!(voices, vec![VoiceRole::Primary, VoiceRole::Secondary, VoiceRole::Secondary, VoiceRole::Secondary]);
  }

  #[test]
  fn plan_serializes_as_a_plain_step_list() {
    let plan = PlaybackPlan { steps: vec![PlaybackStep::Speak { text: "Hi".into(), voice: VoiceRole::Secondary }] };
    assert_eq!(
      serde_json::to_value(&plan).unwrap(),
      serde_json::json!([{ "action": "speak", "text": "Hi", "voice": "secondary" }])
    );
  }
}
