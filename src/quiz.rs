//! Quiz session state machine.
//!
//! A quiz item is asked as a multiple-choice primary question. A wrong primary answer
//! unlocks a True/False redemption question worth half a point. After either, the learner
//! sees feedback and continues to the next item until the set is exhausted.
//!
//! `step` is the pure transition function; `Session` wraps it with the idle/active lifecycle.

use std::fmt;

use serde::Serialize;

use crate::domain::{QuestionSet, Score, SECONDARY_OPTIONS};
use crate::error::InputRejected;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  Primary,
  Secondary,
  Advance,
  Finished,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Stage::Primary => "primary",
      Stage::Secondary => "secondary",
      Stage::Advance => "advance",
      Stage::Finished => "finished",
    })
  }
}

/// One learner event. Exactly one is processed per transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizEvent {
  SelectPrimary(String),
  SelectSecondary(String),
  Advance,
}

impl QuizEvent {
  fn name(&self) -> &'static str {
    match self {
      QuizEvent::SelectPrimary(_) => "select_primary",
      QuizEvent::SelectSecondary(_) => "select_secondary",
      QuizEvent::Advance => "advance",
    }
  }
}

/// Progress through one quiz attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizState {
  pub index: usize,
  pub stage: Stage,
  pub score: Score,
  /// `None` until the current item's primary question is graded.
  pub last_primary_correct: Option<bool>,
  pub last_secondary_correct: Option<bool>,
  pub pending_explanation: String,
  pub pending_secondary_explanation: String,
}

impl QuizState {
  pub fn initial() -> Self {
    Self {
      index: 0,
      stage: Stage::Primary,
      score: Score::ZERO,
      last_primary_correct: None,
      last_secondary_correct: None,
      pending_explanation: String::new(),
      pending_secondary_explanation: String::new(),
    }
  }
}

/// Apply `event` to `state`. A rejected event produces no transition.
pub fn step(questions: &QuestionSet, state: &QuizState, event: &QuizEvent) -> Result<QuizState, InputRejected> {
  let q = &questions[state.index];
  let mut next = state.clone();

  match (state.stage, event) {
    (Stage::Primary, QuizEvent::SelectPrimary(choice)) => {
      if !q.options.contains(choice) {
        return Err(InputRejected::UnknownOption(choice.clone()));
      }
      let correct = *choice == q.answer;
      if correct {
        next.score = state.score.add_full();
        next.stage = Stage::Advance;
      } else {
        next.stage = Stage::Secondary;
      }
      next.last_primary_correct = Some(correct);
      next.pending_explanation = q.explanation.clone();
    }

    (Stage::Secondary, QuizEvent::SelectSecondary(choice)) => {
      if !SECONDARY_OPTIONS.contains(&choice.as_str()) {
        return Err(InputRejected::UnknownOption(choice.clone()));
      }
      let correct = *choice == q.secondary_answer;
      if correct {
        next.score = state.score.add_half();
      }
      next.last_secondary_correct = Some(correct);
      next.pending_secondary_explanation = q.secondary_explanation.clone();
      next.stage = Stage::Advance;
    }

    (Stage::Advance, QuizEvent::Advance) => {
      if state.index + 1 >= questions.len() {
        next.stage = Stage::Finished;
      } else {
        next.index += 1;
        next.stage = Stage::Primary;
        next.last_primary_correct = None;
        next.last_secondary_correct = None;
      }
    }

    (stage, ev) => return Err(InputRejected::WrongStage { event: ev.name(), stage }),
  }

  Ok(next)
}

/// Session lifecycle: nothing is exposed as playable until a question set is installed.
#[derive(Clone, Debug, Default)]
pub enum Session {
  #[default]
  Idle,
  Active { questions: QuestionSet, state: QuizState },
}

impl Session {
  /// True when a new attempt may begin (never started, or the previous attempt finished).
  pub fn can_start(&self) -> bool {
    match self {
      Session::Idle => true,
      Session::Active { state, .. } => state.stage == Stage::Finished,
    }
  }

  /// Install a freshly generated question set, discarding any finished attempt.
  pub fn begin(&mut self, questions: QuestionSet) -> Result<(), InputRejected> {
    if !self.can_start() {
      return Err(InputRejected::InProgress);
    }
    *self = Session::Active { questions, state: QuizState::initial() };
    Ok(())
  }

  pub fn apply(&mut self, event: &QuizEvent) -> Result<&QuizState, InputRejected> {
    match self {
      Session::Idle => Err(InputRejected::NotStarted),
      Session::Active { questions, state } => {
        *state = step(questions, state, event)?;
        Ok(state)
      }
    }
  }
}
