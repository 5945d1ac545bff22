//! Deterministic scoring for completed workout sessions
//!
//! Every function here is pure: the orchestrator gathers biometric context,
//! these turn it into the three derived metrics stored on a history record.

pub mod energy;
pub mod intensity;
pub mod progress_pulse;
pub mod zones;

use serde::{Deserialize, Serialize};

pub use energy::estimate_active_energy;
pub use intensity::intensity_score;
pub use progress_pulse::{progress_pulse_score, PulseInputs, DEFAULT_TARGET_WORKOUTS_PER_WEEK};
pub use zones::{time_in_zones, TimeInZones};

/// ---------------------------------------------------------------------------
/// HR Zones
/// ---------------------------------------------------------------------------

/// Lower bounds of Z2..Z5 as fractions of max HR. A reading exactly on a
/// bound belongs to the upper zone.
pub const ZONE_BOUNDARIES: [f64; 4] = [0.60, 0.70, 0.80, 0.90];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HrZone {
  Z1, // Very light: < 60% max
  Z2, // Light: 60-70% max
  Z3, // Moderate: 70-80% max
  Z4, // Hard: 80-90% max
  Z5, // Maximum: >= 90% max
}

impl HrZone {
  pub const ALL: [HrZone; 5] = [HrZone::Z1, HrZone::Z2, HrZone::Z3, HrZone::Z4, HrZone::Z5];

  pub fn from_hr(hr: f64, max_hr: f64) -> Self {
    let fraction = hr / max_hr;
    match fraction {
      f if f < ZONE_BOUNDARIES[0] => HrZone::Z1,
      f if f < ZONE_BOUNDARIES[1] => HrZone::Z2,
      f if f < ZONE_BOUNDARIES[2] => HrZone::Z3,
      f if f < ZONE_BOUNDARIES[3] => HrZone::Z4,
      _ => HrZone::Z5,
    }
  }

  /// Zone number 1-5
  pub fn number(&self) -> u8 {
    *self as u8 + 1
  }

  pub fn from_number(n: i64) -> Option<Self> {
    match n {
      1 => Some(HrZone::Z1),
      2 => Some(HrZone::Z2),
      3 => Some(HrZone::Z3),
      4 => Some(HrZone::Z4),
      5 => Some(HrZone::Z5),
      _ => None,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      HrZone::Z1 => "Very Light",
      HrZone::Z2 => "Light",
      HrZone::Z3 => "Moderate",
      HrZone::Z4 => "Hard",
      HrZone::Z5 => "Maximum",
    }
  }
}

impl std::fmt::Display for HrZone {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Zone {} ({})", self.number(), self.label())
  }
}
