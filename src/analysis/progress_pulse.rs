//! Progress pulse composite score

use serde::{Deserialize, Serialize};

use super::HrZone;

pub const DEFAULT_TARGET_WORKOUTS_PER_WEEK: u32 = 3;

const BASE_SCORE: f64 = 50.0;
const PERSONAL_BEST_BONUS: f64 = 15.0;
const POINTS_PER_WORKOUT: f64 = 5.0;
const HIGH_INTENSITY_BONUS: f64 = 10.0;
const MODERATE_INTENSITY_BONUS: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseInputs {
  /// Minutes
  pub current_duration: f64,
  /// Shortest known duration in minutes. Defaults to the current duration.
  pub personal_best: Option<f64>,
  /// Sessions of this workout already logged this week
  pub workouts_this_week: u32,
  pub target_workouts_per_week: u32,
  pub dominant_zone: Option<HrZone>,
}

impl PulseInputs {
  pub fn new(current_duration: f64) -> Self {
    Self {
      current_duration,
      personal_best: None,
      workouts_this_week: 0,
      target_workouts_per_week: DEFAULT_TARGET_WORKOUTS_PER_WEEK,
      dominant_zone: None,
    }
  }
}

/// Base 50, +15 for matching or beating the personal best (lower is better),
/// +5 per workout this week up to the target, +10 for a Z4/Z5 dominant zone
/// or +5 for Z3. Clamped to 0-100.
pub fn progress_pulse_score(inputs: &PulseInputs) -> f64 {
  let mut score = BASE_SCORE;

  let personal_best = inputs.personal_best.unwrap_or(inputs.current_duration);
  if inputs.current_duration <= personal_best {
    score += PERSONAL_BEST_BONUS;
  }

  let counted = inputs.workouts_this_week.min(inputs.target_workouts_per_week);
  score += POINTS_PER_WORKOUT * counted as f64;

  score += match inputs.dominant_zone {
    Some(HrZone::Z4) | Some(HrZone::Z5) => HIGH_INTENSITY_BONUS,
    Some(HrZone::Z3) => MODERATE_INTENSITY_BONUS,
    Some(HrZone::Z1) | Some(HrZone::Z2) | None => 0.0,
  };

  score.clamp(0.0, 100.0)
}
