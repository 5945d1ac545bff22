//! Time-in-zone binning of heart-rate samples

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::HrZone;
use crate::models::BiometricSample;

/// Seconds and sample counts per zone for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeInZones {
  seconds: [f64; 5],
  samples: [usize; 5],
}

impl TimeInZones {
  pub fn seconds_in(&self, zone: HrZone) -> f64 {
    self.seconds[zone as usize]
  }

  pub fn samples_in(&self, zone: HrZone) -> usize {
    self.samples[zone as usize]
  }

  pub fn total_seconds(&self) -> f64 {
    self.seconds.iter().sum()
  }

  pub fn is_empty(&self) -> bool {
    self.samples.iter().all(|n| *n == 0)
  }

  /// Zone holding the most time. Only zones that received a sample are
  /// candidates, and a tie goes to the lower (less intense) zone.
  pub fn dominant_zone(&self) -> Option<HrZone> {
    let mut best: Option<(HrZone, f64)> = None;
    for zone in HrZone::ALL {
      if self.samples_in(zone) == 0 {
        continue;
      }
      let secs = self.seconds_in(zone);
      match best {
        Some((_, best_secs)) if secs <= best_secs => {}
        _ => best = Some((zone, secs)),
      }
    }
    best.map(|(zone, _)| zone)
  }
}

/// Bin heart-rate samples by zone relative to `max_hr`.
///
/// Samples are ordered by start time and each one covers the span up to the
/// next sample's start. The last sample covers up to the later of its own end
/// and `session_end`. Energy samples and non-positive readings are ignored.
pub fn time_in_zones(
  samples: &[BiometricSample],
  max_hr: f64,
  session_end: Option<DateTime<Utc>>,
) -> TimeInZones {
  let mut result = TimeInZones::default();
  if max_hr <= 0.0 {
    return result;
  }

  let mut readings: Vec<(DateTime<Utc>, DateTime<Utc>, f64)> = samples
    .iter()
    .filter_map(|s| match s {
      BiometricSample::HeartRate { bpm, start, end } if bpm.is_finite() && *bpm > 0.0 => {
        Some((*start, *end, *bpm))
      }
      _ => None,
    })
    .collect();
  readings.sort_by_key(|(start, _, _)| *start);

  for (i, (start, end, bpm)) in readings.iter().enumerate() {
    let until = match readings.get(i + 1) {
      Some((next_start, _, _)) => *next_start,
      None => match session_end {
        Some(session_end) if session_end > *end => session_end,
        _ => *end,
      },
    };
    let span = (until - *start).num_milliseconds().max(0) as f64 / 1000.0;

    let zone = HrZone::from_hr(*bpm, max_hr);
    result.seconds[zone as usize] += span;
    result.samples[zone as usize] += 1;
  }

  result
}
