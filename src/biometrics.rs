//! Biometric source seam
//!
//! The platform health store sits behind this trait. The engine only reads
//! its authorization flag, pulls samples and latest values, and mirrors a
//! finished session into it on a best-effort basis.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{BiometricSample, HistoryRecord, Workout};

/// ---------------------------------------------------------------------------
/// Query Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
  HeartRate,
  ActiveEnergy,
}

/// Quantities with a single "latest" reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityKind {
  /// bpm
  RestingHeartRate,
  /// kg
  BodyMass,
  /// m
  Height,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInterval {
  pub start: DateTime<Utc>,
  pub end: DateTime<Utc>,
}

impl DateInterval {
  pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
    Self { start, end }
  }

  pub fn contains(&self, instant: DateTime<Utc>) -> bool {
    instant >= self.start && instant <= self.end
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum BiometricError {
  #[error("Biometric source not authorized")]
  NotAuthorized,

  #[error("Invalid workout duration")]
  InvalidDuration,

  #[error("Failed to write workout: {0}")]
  WriteFailed(String),

  #[error("Purchase required to save workouts to the biometric source")]
  PurchaseRequired,

  #[error("Biometric query failed: {0}")]
  QueryFailed(String),
}

/// ---------------------------------------------------------------------------
/// Gateway
/// ---------------------------------------------------------------------------

#[async_trait]
pub trait BiometricGateway: Send + Sync {
  /// Current authorization state. Read-only for the engine.
  fn is_authorized(&self) -> bool;

  async fn fetch_samples(
    &self,
    kind: SampleKind,
    interval: DateInterval,
  ) -> Result<Vec<BiometricSample>, BiometricError>;

  async fn fetch_latest(&self, kind: QuantityKind) -> Result<Option<f64>, BiometricError>;

  /// Age in years derived from the stored date of birth
  async fn fetch_age(&self) -> Result<Option<u32>, BiometricError>;

  /// Mirror a completed session together with its samples
  async fn save_session(
    &self,
    workout: &Workout,
    history: &HistoryRecord,
    samples: &[BiometricSample],
  ) -> Result<(), BiometricError>;
}

/// Gateway for platforms without a biometric source. Never authorized, so the
/// engine skips every biometric stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableGateway;

#[async_trait]
impl BiometricGateway for UnavailableGateway {
  fn is_authorized(&self) -> bool {
    false
  }

  async fn fetch_samples(
    &self,
    _kind: SampleKind,
    _interval: DateInterval,
  ) -> Result<Vec<BiometricSample>, BiometricError> {
    Err(BiometricError::NotAuthorized)
  }

  async fn fetch_latest(&self, _kind: QuantityKind) -> Result<Option<f64>, BiometricError> {
    Err(BiometricError::NotAuthorized)
  }

  async fn fetch_age(&self) -> Result<Option<u32>, BiometricError> {
    Err(BiometricError::NotAuthorized)
  }

  async fn save_session(
    &self,
    _workout: &Workout,
    _history: &HistoryRecord,
    _samples: &[BiometricSample],
  ) -> Result<(), BiometricError> {
    Err(BiometricError::NotAuthorized)
  }
}
