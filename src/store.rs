//! Local system of record
//!
//! Workouts, their history and the user profile live here. The engine only
//! ever inserts, queries by predicate and saves; see `db::SqliteStore` for the
//! SQLite implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{HistoryRecord, NewWorkout, UserBiometricProfile, Workout};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Corrupt record: {0}")]
  Corrupt(String),
}

/// Predicate for history lookups. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryQuery {
  pub workout_id: Option<i64>,
  /// Inclusive
  pub since: Option<DateTime<Utc>>,
  /// Inclusive
  pub until: Option<DateTime<Utc>>,
}

impl HistoryQuery {
  pub fn for_workout(workout_id: i64) -> Self {
    Self {
      workout_id: Some(workout_id),
      ..Default::default()
    }
  }

  pub fn between(mut self, since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
    self.since = Some(since);
    self.until = Some(until);
    self
  }
}

#[async_trait]
pub trait LocalStore: Send + Sync {
  async fn insert_workout(&self, workout: &NewWorkout) -> Result<Workout, StoreError>;

  /// Workout with exercises and full history
  async fn fetch_workout(&self, id: i64) -> Result<Option<Workout>, StoreError>;

  /// Matching records, oldest first
  async fn fetch_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryRecord>, StoreError>;

  async fn fetch_profile(&self) -> Result<UserBiometricProfile, StoreError>;

  async fn save_profile(&self, profile: &UserBiometricProfile) -> Result<(), StoreError>;

  /// Persist workout fields and any history records not stored yet.
  /// Records already on disk are left untouched, so saving twice is harmless.
  async fn save_workout(&self, workout: &Workout) -> Result<(), StoreError>;

  /// The only edit allowed on a history record after creation
  async fn update_history_notes(&self, id: Uuid, notes: Option<&str>) -> Result<(), StoreError>;
}
