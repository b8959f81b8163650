//! Reward policy: final score to screen-time minutes.

use serde::{Deserialize, Serialize};

use crate::domain::Score;

/// Question count the thresholds are written against.
pub const NOMINAL_QUESTION_COUNT: u32 = 10;

/// Fixed policy constants, overridable from the `[reward]` TOML section.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RewardPolicy {
  /// Units granted for full marks.
  pub perfect_units: u32,
  /// Units granted at or above `pass_score`.
  pub pass_units: u32,
  /// Pass threshold out of `NOMINAL_QUESTION_COUNT`.
  pub pass_score: f32,
}

impl Default for RewardPolicy {
  fn default() -> Self {
    Self { perfect_units: 30, pass_units: 20, pass_score: 8.0 }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum RewardTier {
  Perfect { units: u32 },
  Pass { units: u32 },
  None,
}

impl RewardTier {
  pub fn units(self) -> u32 {
    match self {
      RewardTier::Perfect { units } | RewardTier::Pass { units } => units,
      RewardTier::None => 0,
    }
  }
}

impl RewardPolicy {
  /// Reject a pass mark that is not a number within `0..=NOMINAL_QUESTION_COUNT`.
  pub fn validate(&self) -> Result<(), String> {
    if !self.pass_score.is_finite() || self.pass_score < 0.0 || self.pass_score > NOMINAL_QUESTION_COUNT as f32 {
      return Err(format!("reward.pass_score must be between 0 and {}, got {}", NOMINAL_QUESTION_COUNT, self.pass_score));
    }
    Ok(())
  }

  /// Resolve the tier for `score` over a set of `question_count` questions.
  ///
  /// Thresholds scale with the set length; for a ten-question set they are
  /// exactly `score == 10` and `score >= pass_score`.
  pub fn resolve(&self, score: Score, question_count: usize) -> RewardTier {
    let count = question_count as u32;
    if count > 0 && score >= Score::from_points(count) {
      return RewardTier::Perfect { units: self.perfect_units };
    }
    // Scores move in half points, so the smallest passing score is the next half point up.
    let pass_halves = (self.pass_score * 2.0).ceil() as u32;
    if count > 0 && score.halves() * NOMINAL_QUESTION_COUNT >= pass_halves * count {
      return RewardTier::Pass { units: self.pass_units };
    }
    RewardTier::None
  }
}
