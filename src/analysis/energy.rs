//! MET-based active energy estimate

use chrono::{DateTime, Duration, Utc};

use crate::models::{ActivityCategory, BiometricSample};

/// kcal = MET x 3.5 x weight_kg / 200 x minutes, spanning the whole session.
///
/// Returns `None` when the category or a positive weight is unknown, or when
/// the session has no positive duration. None of these are errors.
pub fn estimate_active_energy(
  category: Option<ActivityCategory>,
  weight_kg: Option<f64>,
  start: DateTime<Utc>,
  duration_seconds: f64,
) -> Option<BiometricSample> {
  let category = category?;
  let weight = weight_kg.filter(|w| *w > 0.0)?;
  if duration_seconds <= 0.0 {
    return None;
  }

  let minutes = duration_seconds / 60.0;
  let kilocalories = category.met_value() * 3.5 * weight / 200.0 * minutes;
  if kilocalories <= 0.0 {
    return None;
  }

  Some(BiometricSample::ActiveEnergy {
    kilocalories,
    start,
    end: start + Duration::milliseconds((duration_seconds * 1000.0) as i64),
  })
}
