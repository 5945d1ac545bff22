//! Session finalisation
//!
//! Turns frozen `SessionFacts` into a persisted history record. Biometric
//! stages only run when the source is authorized, and every one of them
//! degrades to an absent value on failure. Only the local save can fail the
//! pipeline.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{
  estimate_active_energy, intensity_score, progress_pulse_score, time_in_zones, PulseInputs,
  DEFAULT_TARGET_WORKOUTS_PER_WEEK,
};
use crate::biometrics::{BiometricError, BiometricGateway, QuantityKind, SampleKind};
use crate::events::{EventBus, WorkoutEvent};
use crate::models::sample::average_heart_rate;
use crate::models::{resolve_max_heart_rate, BiometricSample, HistoryRecord, UserBiometricProfile, Workout};
use crate::session::{SessionFacts, SessionRecorder};
use crate::store::{HistoryQuery, LocalStore, StoreError};

/// ---------------------------------------------------------------------------
/// Outcomes
/// ---------------------------------------------------------------------------

/// Non-blocking notice shown after the record was saved locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "reason")]
pub enum SyncNotice {
  PurchaseRequired,
  SyncFailed(String),
}

impl SyncNotice {
  pub fn title(&self) -> &'static str {
    match self {
      Self::PurchaseRequired => "Purchase Required",
      Self::SyncFailed(_) => "Biometric Sync Failed",
    }
  }

  pub fn message(&self) -> String {
    match self {
      Self::PurchaseRequired => {
        "Saving workouts to your health data requires a purchase. Your workout was saved on this device."
          .to_string()
      }
      Self::SyncFailed(reason) => format!(
        "Your workout was saved on this device, but it could not be synced to your health data: {}",
        reason
      ),
    }
  }
}

impl From<BiometricError> for SyncNotice {
  fn from(err: BiometricError) -> Self {
    match err {
      BiometricError::PurchaseRequired => Self::PurchaseRequired,
      other => Self::SyncFailed(other.to_string()),
    }
  }
}

/// Blocking failure: the session could not be recorded
#[derive(Debug, thiserror::Error)]
pub enum FinalizeError {
  #[error("Failed to save workout: {0}")]
  LocalSave(#[from] StoreError),

  #[error("Workout {0} not found")]
  WorkoutNotFound(i64),
}

impl FinalizeError {
  pub const TITLE: &'static str = "Workout Save Failed";

  pub fn title(&self) -> &'static str {
    Self::TITLE
  }

  pub fn message(&self) -> String {
    self.to_string()
  }
}

#[derive(Debug, Clone)]
pub struct FinalizeOutcome {
  /// Workout as persisted, history included
  pub workout: Workout,
  pub history: HistoryRecord,
  pub notice: Option<SyncNotice>,
  /// False when the session had already been recorded
  pub newly_recorded: bool,
}

/// Monday 00:00 UTC of the ISO week containing `instant`
pub fn week_start(instant: DateTime<Utc>) -> DateTime<Utc> {
  let date = instant.date_naive();
  let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
  monday
    .and_hms_opt(0, 0, 0)
    .map(|midnight| midnight.and_utc())
    .unwrap_or(instant)
}

/// ---------------------------------------------------------------------------
/// Orchestrator
/// ---------------------------------------------------------------------------

struct SessionMetrics {
  intensity_score: Option<f64>,
  progress_pulse_score: Option<f64>,
  dominant_zone: Option<crate::analysis::HrZone>,
  samples: Vec<BiometricSample>,
}

#[derive(Clone)]
pub struct MetricsOrchestrator {
  gateway: Arc<dyn BiometricGateway>,
  store: Arc<dyn LocalStore>,
  events: EventBus,
  target_workouts_per_week: u32,
}

impl MetricsOrchestrator {
  pub fn new(gateway: Arc<dyn BiometricGateway>, store: Arc<dyn LocalStore>, events: EventBus) -> Self {
    Self {
      gateway,
      store,
      events,
      target_workouts_per_week: DEFAULT_TARGET_WORKOUTS_PER_WEEK,
    }
  }

  pub fn with_target_workouts_per_week(mut self, target: u32) -> Self {
    self.target_workouts_per_week = target.max(1);
    self
  }

  pub fn events(&self) -> &EventBus {
    &self.events
  }

  /// Record the recorder's finished session and move it to `Persisted`.
  /// On failure the recorder stays in `Finalizing`.
  pub async fn finish_session(
    &self,
    recorder: &mut SessionRecorder,
    facts: &SessionFacts,
  ) -> Result<FinalizeOutcome, FinalizeError> {
    let outcome = self.finalize(facts).await?;
    recorder.mark_persisted();
    Ok(outcome)
  }

  /// Record a finished session. Runs to completion once started.
  pub async fn finalize(&self, facts: &SessionFacts) -> Result<FinalizeOutcome, FinalizeError> {
    let mut workout = self
      .store
      .fetch_workout(facts.workout_id)
      .await?
      .ok_or(FinalizeError::WorkoutNotFound(facts.workout_id))?;

    if let Some(existing) = workout.history_record(facts.session_id).cloned() {
      tracing::warn!(
        workout_id = workout.id,
        history_id = %facts.session_id,
        "Session already recorded, skipping"
      );
      return Ok(FinalizeOutcome {
        workout,
        history: existing,
        notice: None,
        newly_recorded: false,
      });
    }

    let mut history = HistoryRecord {
      id: facts.session_id,
      workout_id: workout.id,
      date: facts.started_at,
      notes: None,
      exercises_completed: facts.exercises_completed.clone(),
      split_times: facts.split_times.clone(),
      duration_minutes: facts.duration_minutes(),
      intensity_score: None,
      progress_pulse_score: None,
      dominant_zone: None,
    };

    let mut notice = None;

    if self.gateway.is_authorized() {
      let metrics = self.compute_metrics(&workout, facts).await;
      history.intensity_score = metrics.intensity_score;
      history.progress_pulse_score = metrics.progress_pulse_score;
      history.dominant_zone = metrics.dominant_zone;

      if let Err(e) = self
        .gateway
        .save_session(&workout, &history, &metrics.samples)
        .await
      {
        tracing::warn!(workout_id = workout.id, error = %e, "Biometric sync failed");
        notice = Some(SyncNotice::from(e));
      }
    } else {
      tracing::debug!(workout_id = workout.id, "Biometric source not authorized, metrics skipped");
    }

    workout.history.push(history.clone());
    workout.update_personal_best();
    workout.update_summary();
    workout.last_session_duration = history.duration_minutes;
    workout.date_completed = Some(facts.ended_at());

    self.store.save_workout(&workout).await.map_err(|e| {
      tracing::error!(workout_id = workout.id, error = %e, "Failed to save workout");
      FinalizeError::LocalSave(e)
    })?;

    tracing::info!(
      workout_id = workout.id,
      history_id = %history.id,
      duration_minutes = history.duration_minutes,
      has_metrics = history.has_metrics(),
      "Workout session recorded"
    );

    self.events.emit_lossy(WorkoutEvent::WorkoutCompleted {
      workout_id: workout.id,
      history_id: history.id,
      timestamp: Utc::now(),
    });

    Ok(FinalizeOutcome {
      workout,
      history,
      notice,
      newly_recorded: true,
    })
  }

  async fn compute_metrics(&self, workout: &Workout, facts: &SessionFacts) -> SessionMetrics {
    let profile = self.load_profile().await;
    let interval = facts.interval();

    let heart_rate = match self.gateway.fetch_samples(SampleKind::HeartRate, interval).await {
      Ok(samples) => samples,
      Err(e) => {
        tracing::warn!(error = %e, "Failed to fetch heart rate samples");
        Vec::new()
      }
    };

    let weight_kg = match profile.weight_kg {
      Some(weight) => Some(weight),
      None => self.latest(QuantityKind::BodyMass).await,
    };
    let energy = estimate_active_energy(
      workout.category,
      weight_kg,
      facts.started_at,
      facts.duration_seconds,
    );
    if energy.is_none() {
      tracing::debug!(
        category = ?workout.category,
        weight_kg,
        "Active energy estimate skipped"
      );
    }

    let resting = match self.latest(QuantityKind::RestingHeartRate).await {
      Some(resting) => Some(resting),
      None => profile.resting_heart_rate,
    };
    let max_hr = resolve_max_heart_rate(&profile);

    let zones = time_in_zones(&heart_rate, max_hr, Some(interval.end));
    let dominant_zone = zones.dominant_zone();
    let intensity = intensity_score(resting, average_heart_rate(&heart_rate), max_hr);
    if intensity.is_none() {
      tracing::debug!(resting, samples = heart_rate.len(), "Intensity score unavailable");
    }

    let pulse = progress_pulse_score(&PulseInputs {
      current_duration: facts.duration_minutes(),
      personal_best: workout.personal_best,
      workouts_this_week: self.workouts_this_week(workout.id, facts.started_at).await,
      target_workouts_per_week: self.target_workouts_per_week,
      dominant_zone,
    });

    tracing::debug!(
      max_hr,
      samples = heart_rate.len(),
      zone = ?dominant_zone,
      intensity,
      pulse,
      "Session metrics computed"
    );

    let mut samples = heart_rate;
    samples.extend(energy);

    SessionMetrics {
      intensity_score: intensity,
      progress_pulse_score: Some(pulse),
      dominant_zone,
      samples,
    }
  }

  /// Stored profile with the age filled in from the biometric source
  async fn load_profile(&self) -> UserBiometricProfile {
    let mut profile = match self.store.fetch_profile().await {
      Ok(profile) => profile,
      Err(e) => {
        tracing::warn!(error = %e, "Failed to load user profile, using defaults");
        UserBiometricProfile::default()
      }
    };

    if profile.max_heart_rate.is_none() && profile.age.is_none() {
      match self.gateway.fetch_age().await {
        Ok(age) => profile.age = age,
        Err(e) => tracing::warn!(error = %e, "Failed to fetch age"),
      }
    }

    profile
  }

  async fn latest(&self, kind: QuantityKind) -> Option<f64> {
    match self.gateway.fetch_latest(kind).await {
      Ok(value) => value.filter(|v| *v > 0.0),
      Err(e) => {
        tracing::warn!(kind = ?kind, error = %e, "Failed to fetch latest quantity");
        None
      }
    }
  }

  /// Sessions of this workout already logged in the ISO week of `started_at`
  async fn workouts_this_week(&self, workout_id: i64, started_at: DateTime<Utc>) -> u32 {
    let query = HistoryQuery::for_workout(workout_id).between(week_start(started_at), started_at);
    match self.store.fetch_history(&query).await {
      Ok(records) => records.len() as u32,
      Err(e) => {
        tracing::warn!(workout_id, error = %e, "Failed to count workouts this week");
        0
      }
    }
  }
}
