//! Heart-rate-reserve intensity

/// Session load as a percentage of heart-rate reserve (Karvonen):
/// `(avg - resting) / (max - resting) * 100`, clamped to 0-100.
///
/// There is no score without a resting baseline, without a session average,
/// or when max HR does not exceed resting HR.
pub fn intensity_score(resting_hr: Option<f64>, session_avg_hr: Option<f64>, max_hr: f64) -> Option<f64> {
  let resting = resting_hr.filter(|r| r.is_finite() && *r > 0.0)?;
  let average = session_avg_hr.filter(|a| a.is_finite())?;

  let reserve = max_hr - resting;
  if reserve <= 0.0 {
    return None;
  }

  Some(((average - resting) / reserve * 100.0).clamp(0.0, 100.0))
}
