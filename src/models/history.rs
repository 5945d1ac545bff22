use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::HrZone;

/// Exercise completion marker, measured from session start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitTime {
  pub exercise_id: i64,
  pub elapsed_seconds: f64,
}

/// One completed session of a workout.
///
/// The derived metrics are all absent when the biometric source was not
/// authorized; otherwise each one is present or absent on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
  pub id: Uuid,
  pub workout_id: i64,
  pub date: DateTime<Utc>,
  pub notes: Option<String>,
  pub exercises_completed: Vec<i64>,
  pub split_times: Vec<SplitTime>,
  pub duration_minutes: f64,
  pub intensity_score: Option<f64>,
  pub progress_pulse_score: Option<f64>,
  pub dominant_zone: Option<HrZone>,
}

impl HistoryRecord {
  pub fn has_metrics(&self) -> bool {
    self.intensity_score.is_some()
      || self.progress_pulse_score.is_some()
      || self.dominant_zone.is_some()
  }
}
