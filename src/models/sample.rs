use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A biometric reading, either fetched from the biometric source or
/// synthesized locally for a single persistence attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BiometricSample {
  HeartRate {
    bpm: f64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  },
  ActiveEnergy {
    kilocalories: f64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  },
}

impl BiometricSample {
  pub fn start(&self) -> DateTime<Utc> {
    match self {
      Self::HeartRate { start, .. } | Self::ActiveEnergy { start, .. } => *start,
    }
  }

  pub fn end(&self) -> DateTime<Utc> {
    match self {
      Self::HeartRate { end, .. } | Self::ActiveEnergy { end, .. } => *end,
    }
  }

  pub fn heart_rate(&self) -> Option<f64> {
    match self {
      Self::HeartRate { bpm, .. } => Some(*bpm),
      Self::ActiveEnergy { .. } => None,
    }
  }
}

/// Arithmetic mean of the heart-rate readings, `None` without any
pub fn average_heart_rate(samples: &[BiometricSample]) -> Option<f64> {
  let readings: Vec<f64> = samples.iter().filter_map(|s| s.heart_rate()).collect();
  if readings.is_empty() {
    None
  } else {
    Some(readings.iter().sum::<f64>() / readings.len() as f64)
  }
}
