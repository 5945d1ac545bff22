use serde::{Deserialize, Serialize};

/// Adult age assumed when neither max HR nor age is on record
pub const DEFAULT_ADULT_AGE: u32 = 30;

/// Biometric facts about the user. Read-only for the metrics engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserBiometricProfile {
  pub weight_kg: Option<f64>,
  pub height_m: Option<f64>,
  pub age: Option<u32>,
  pub resting_heart_rate: Option<f64>,
  /// User-entered; estimated from age when absent
  pub max_heart_rate: Option<f64>,
}

/// Max heart rate with a fixed fallback order:
/// user-entered value, then `220 - age`, then `220 - DEFAULT_ADULT_AGE`.
pub fn resolve_max_heart_rate(profile: &UserBiometricProfile) -> f64 {
  if let Some(max) = profile.max_heart_rate.filter(|m| *m > 0.0) {
    return max;
  }

  let age = profile
    .age
    .filter(|a| (1..120).contains(a))
    .unwrap_or(DEFAULT_ADULT_AGE);
  220.0 - age as f64
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_user_max_hr_wins() {
    let profile = UserBiometricProfile {
      max_heart_rate: Some(201.0),
      age: Some(40),
      ..Default::default()
    };
    assert_eq!(resolve_max_heart_rate(&profile), 201.0);
  }

  #[test]
  fn test_age_estimate_when_max_hr_missing() {
    let profile = UserBiometricProfile {
      max_heart_rate: Some(0.0),
      age: Some(40),
      ..Default::default()
    };
    assert_eq!(resolve_max_heart_rate(&profile), 180.0);
  }

  #[test]
  fn test_default_adult_when_nothing_known() {
    assert_eq!(resolve_max_heart_rate(&UserBiometricProfile::default()), 190.0);

    // Nonsense ages fall through to the default as well
    let profile = UserBiometricProfile {
      age: Some(0),
      ..Default::default()
    };
    assert_eq!(resolve_max_heart_rate(&profile), 190.0);
  }
}
