//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - In-memory store setup
//! - Mock data factories
//! - Fake biometric gateway and a store that refuses to save

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::biometrics::{BiometricError, BiometricGateway, DateInterval, QuantityKind, SampleKind};
use crate::db::SqliteStore;
use crate::models::{
  ActivityCategory, BiometricSample, Exercise, HistoryRecord, NewWorkout, UserBiometricProfile,
  Workout,
};
use crate::session::SessionFacts;
use crate::store::{HistoryQuery, LocalStore, StoreError};

/// ---------------------------------------------------------------------------
/// Store Test Utilities
/// ---------------------------------------------------------------------------

/// Create a store over an in-memory SQLite database with all migrations run
pub async fn setup_test_store() -> SqliteStore {
  SqliteStore::connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory store")
}

/// Insert a strength workout with the given exercises, in order
pub async fn seed_test_workout(store: &SqliteStore, exercise_names: &[&str]) -> Workout {
  store
    .insert_workout(&NewWorkout {
      title: format!("Test Workout {}", Uuid::new_v4().simple()),
      exercise_names: exercise_names.iter().map(|n| n.to_string()).collect(),
      category: Some(ActivityCategory::Strength),
    })
    .await
    .expect("Failed to seed workout")
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Wednesday 2026-10-14 08:00 UTC
pub fn session_start() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap()
}

/// Instantaneous heart-rate reading `offset_secs` after `start`
pub fn hr_sample(start: DateTime<Utc>, offset_secs: i64, bpm: f64) -> BiometricSample {
  let at = start + Duration::seconds(offset_secs);
  BiometricSample::HeartRate {
    bpm,
    start: at,
    end: at,
  }
}

/// Unsaved workout with sequential exercise ids and positions
pub fn mock_workout(exercise_names: &[&str]) -> Workout {
  Workout {
    id: 1,
    title: "Mock Workout".to_string(),
    exercises: exercise_names
      .iter()
      .enumerate()
      .map(|(i, name)| Exercise {
        id: i as i64 + 1,
        name: name.to_string(),
        position: i as i64,
      })
      .collect(),
    category: Some(ActivityCategory::Strength),
    last_session_duration: 0.0,
    date_created: session_start() - Duration::days(30),
    date_completed: None,
    personal_best: None,
    summary: None,
    history: Vec::new(),
  }
}

/// History record without metrics, dated at `session_start()`
pub fn mock_history(workout_id: i64, duration_minutes: f64) -> HistoryRecord {
  HistoryRecord {
    id: Uuid::new_v4(),
    workout_id,
    date: session_start(),
    notes: None,
    exercises_completed: Vec::new(),
    split_times: Vec::new(),
    duration_minutes,
    intensity_score: None,
    progress_pulse_score: None,
    dominant_zone: None,
  }
}

/// Facts of a session that completed every exercise
pub fn mock_facts(workout: &Workout, duration_seconds: f64) -> SessionFacts {
  SessionFacts {
    session_id: Uuid::new_v4(),
    workout_id: workout.id,
    started_at: session_start(),
    duration_seconds,
    exercises_completed: workout.sorted_exercises().iter().map(|e| e.id).collect(),
    split_times: Vec::new(),
  }
}

/// ---------------------------------------------------------------------------
/// Fakes
/// ---------------------------------------------------------------------------

/// Scriptable biometric source that records saved sessions
#[derive(Debug, Default)]
pub struct FakeGateway {
  pub authorized: bool,
  pub heart_rate: Vec<BiometricSample>,
  pub resting_heart_rate: Option<f64>,
  pub body_mass: Option<f64>,
  pub age: Option<u32>,
  /// Returned by `fetch_samples`
  pub sample_error: Option<BiometricError>,
  pub save_error: Option<BiometricError>,
  pub saved: Mutex<Vec<(HistoryRecord, Vec<BiometricSample>)>>,
}

impl FakeGateway {
  pub fn authorized() -> Self {
    Self {
      authorized: true,
      ..Default::default()
    }
  }

  pub fn saved_sessions(&self) -> Vec<(HistoryRecord, Vec<BiometricSample>)> {
    self.saved.lock().unwrap().clone()
  }
}

#[async_trait]
impl BiometricGateway for FakeGateway {
  fn is_authorized(&self) -> bool {
    self.authorized
  }

  async fn fetch_samples(
    &self,
    kind: SampleKind,
    interval: DateInterval,
  ) -> Result<Vec<BiometricSample>, BiometricError> {
    if let Some(err) = &self.sample_error {
      return Err(err.clone());
    }
    match kind {
      SampleKind::HeartRate => Ok(
        self
          .heart_rate
          .iter()
          .filter(|s| interval.contains(s.start()))
          .cloned()
          .collect(),
      ),
      SampleKind::ActiveEnergy => Ok(Vec::new()),
    }
  }

  async fn fetch_latest(&self, kind: QuantityKind) -> Result<Option<f64>, BiometricError> {
    Ok(match kind {
      QuantityKind::RestingHeartRate => self.resting_heart_rate,
      QuantityKind::BodyMass => self.body_mass,
      QuantityKind::Height => None,
    })
  }

  async fn fetch_age(&self) -> Result<Option<u32>, BiometricError> {
    Ok(self.age)
  }

  async fn save_session(
    &self,
    _workout: &Workout,
    history: &HistoryRecord,
    samples: &[BiometricSample],
  ) -> Result<(), BiometricError> {
    if let Some(err) = &self.save_error {
      return Err(err.clone());
    }
    self
      .saved
      .lock()
      .unwrap()
      .push((history.clone(), samples.to_vec()));
    Ok(())
  }
}

/// Store whose `save_workout` always fails; everything else is delegated
pub struct FailingStore {
  inner: SqliteStore,
}

impl FailingStore {
  pub fn new(inner: SqliteStore) -> Self {
    Self { inner }
  }
}

#[async_trait]
impl LocalStore for FailingStore {
  async fn insert_workout(&self, workout: &NewWorkout) -> Result<Workout, StoreError> {
    self.inner.insert_workout(workout).await
  }

  async fn fetch_workout(&self, id: i64) -> Result<Option<Workout>, StoreError> {
    self.inner.fetch_workout(id).await
  }

  async fn fetch_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryRecord>, StoreError> {
    self.inner.fetch_history(query).await
  }

  async fn fetch_profile(&self) -> Result<UserBiometricProfile, StoreError> {
    self.inner.fetch_profile().await
  }

  async fn save_profile(&self, profile: &UserBiometricProfile) -> Result<(), StoreError> {
    self.inner.save_profile(profile).await
  }

  async fn save_workout(&self, _workout: &Workout) -> Result<(), StoreError> {
    Err(StoreError::Database(sqlx::Error::PoolClosed))
  }

  async fn update_history_notes(&self, id: Uuid, notes: Option<&str>) -> Result<(), StoreError> {
    self.inner.update_history_notes(id, notes).await
  }
}
