//! Domain models: generated questions, the accepted question set, and the score.

use std::{fmt, ops::Deref, sync::Arc};

use serde::{Deserialize, Serialize};

/// Options offered for every secondary (redemption) question.
pub const SECONDARY_OPTIONS: [&str; 2] = ["True", "False"];

/// Number of options every primary question must carry.
pub const PRIMARY_OPTION_COUNT: usize = 4;

/// Upper bound on questions taken from one model response.
pub const MAX_QUESTIONS: usize = 10;

/// One generated question block, as the model is instructed to emit it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
  pub question: String,
  pub options: Vec<String>,
  pub answer: String,
  pub explanation: String,
  pub secondary_question: String,
  pub secondary_options: Vec<String>,
  pub secondary_answer: String,
  pub secondary_explanation: String,
}

impl Question {
  /// Check the invariants the quiz relies on. Matching is exact (case and whitespace sensitive).
  pub fn validate(&self) -> Result<(), String> {
    if self.question.trim().is_empty() {
      return Err("empty question".into());
    }
    if self.options.len() != PRIMARY_OPTION_COUNT {
      return Err(format!("expected {} options, got {}", PRIMARY_OPTION_COUNT, self.options.len()));
    }
    for (i, opt) in self.options.iter().enumerate() {
      if self.options[..i].contains(opt) {
        return Err(format!("duplicate option '{}'", opt));
      }
    }
    if !self.options.contains(&self.answer) {
      return Err(format!("answer '{}' is not one of the options", self.answer));
    }
    if self.explanation.trim().is_empty() {
      return Err("empty explanation".into());
    }
    if self.secondary_question.trim().is_empty() {
      return Err("empty secondary_question".into());
    }
    if self.secondary_options.iter().map(String::as_str).ne(SECONDARY_OPTIONS) {
      return Err(format!("secondary_options must be {:?}", SECONDARY_OPTIONS));
    }
    if !self.secondary_options.contains(&self.secondary_answer) {
      return Err(format!("secondary_answer '{}' is not True/False", self.secondary_answer));
    }
    if self.secondary_explanation.trim().is_empty() {
      return Err("empty secondary_explanation".into());
    }
    Ok(())
  }
}

/// An accepted, immutable batch of questions in presentation order.
///
/// Only constructible from a batch where every question validates, so holding one
/// is proof the whole batch passed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionSet(Arc<[Question]>);

impl QuestionSet {
  pub fn new(questions: Vec<Question>) -> Result<Self, String> {
    if questions.is_empty() {
      return Err("no questions".into());
    }
    if questions.len() > MAX_QUESTIONS {
      return Err(format!("more than {} questions", MAX_QUESTIONS));
    }
    for (i, q) in questions.iter().enumerate() {
      q.validate().map_err(|e| format!("question {}: {}", i + 1, e))?;
    }
    Ok(Self(questions.into()))
  }
}

impl Deref for QuestionSet {
  type Target = [Question];
  fn deref(&self) -> &[Question] { &self.0 }
}

/// Quiz score counted in half points, so every value is an exact multiple of 0.5.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u32);

impl Score {
  pub const ZERO: Score = Score(0);

  #[cfg(test)]
  pub fn from_halves(halves: u32) -> Self { Score(halves) }

  /// Score for `points` whole points (full marks on `points` questions).
  pub fn from_points(points: u32) -> Self { Score(points * 2) }

  pub fn halves(self) -> u32 { self.0 }

  pub fn add_full(self) -> Self { Score(self.0 + 2) }

  pub fn add_half(self) -> Self { Score(self.0 + 1) }

  pub fn as_f32(self) -> f32 { self.0 as f32 / 2.0 }
}

impl fmt::Display for Score {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}", self.0 / 2, if self.0 % 2 == 1 { 5 } else { 0 })
  }
}

impl Serialize for Score {
  fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f32(self.as_f32())
  }
}

/// Transcript and title for one video.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoDetails {
  pub transcript: String,
  pub title: String,
}

#[cfg(test)]
pub(crate) mod fixtures {
  use super::*;

  /// A valid question whose correct answer is "A{n}" and secondary answer is "True".
  pub fn question(n: usize) -> Question {
    Question {
      question: format!("Question {n}?"),
      options: (0..4).map(|i| format!("{}{n}", ['A', 'B', 'C', 'D'][i])).collect(),
      answer: format!("A{n}"),
      explanation: format!("A{n} is right."),
      secondary_question: format!("True or False: follow-up {n}."),
      secondary_options: vec!["True".into(), "False".into()],
      secondary_answer: "True".into(),
      secondary_explanation: format!("Follow-up {n} is true."),
    }
  }

  pub fn question_set(len: usize) -> QuestionSet {
    QuestionSet::new((0..len).map(question).collect()).expect("valid fixture")
  }
}

#[cfg(test)]
mod tests {
  use super::fixtures::*;
  use super::*;

  #[test]
  fn fixture_question_is_valid() {
    assert!(question(0).validate().is_ok());
  }

  #[test]
  fn answer_must_match_an_option_exactly() {
    let mut q = question(1);
    q.answer = "a1".into();
    assert!(q.validate().unwrap_err().contains("not one of the options"));
    q.answer = "A1 ".into();
    assert!(q.validate().is_err());
  }

  #[test]
  fn secondary_answer_must_be_true_or_false() {
    let mut q = question(1);
    q.secondary_answer = "true".into();
    assert!(q.validate().is_err());
  }

  #[test]
  fn secondary_options_are_fixed() {
    let mut q = question(1);
    q.secondary_options = vec!["False".into(), "True".into()];
    assert!(q.validate().is_err());
  }

  #[test]
  fn options_must_be_four_and_distinct() {
    let mut q = question(1);
    q.options.pop();
    assert!(q.validate().is_err());

    let mut q = question(1);
    q.options[3] = q.options[2].clone();
    assert!(q.validate().unwrap_err().contains("duplicate"));
  }

  #[test]
  fn explanations_must_be_non_empty() {
    let mut q = question(1);
    q.explanation = "  ".into();
    assert!(q.validate().is_err());
    let mut q = question(1);
    q.secondary_explanation = String::new();
    assert!(q.validate().is_err());
  }

  #[test]
  fn one_bad_question_rejects_the_batch() {
    let mut qs: Vec<Question> = (0..10).map(question).collect();
    qs[7].answer = "nope".into();
    let err = QuestionSet::new(qs).unwrap_err();
    assert!(err.starts_with("question 8:"), "{err}");
  }

  #[test]
  fn empty_and_oversized_batches_are_rejected() {
    assert!(QuestionSet::new(vec![]).is_err());
    assert!(QuestionSet::new((0..11).map(question).collect()).is_err());
  }

  #[test]
  fn score_formats_in_half_points() {
    assert_eq!(Score::ZERO.to_string(), "0.0");
    assert_eq!(Score::from_halves(13).to_string(), "6.5");
    assert_eq!(Score::from_points(10).to_string(), "10.0");
    assert_eq!(Score::ZERO.add_full().add_half().as_f32(), 1.5);
  }
}
