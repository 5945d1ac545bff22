//! Live workout session: stopwatch, exercise cursor and split capture
//!
//! The recorder is driven by the UI layer. It owns the only writer of
//! elapsed time (a 10 ms tick task) and hands a frozen `SessionFacts`
//! snapshot to the orchestrator when the user finishes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::biometrics::DateInterval;
use crate::models::{Exercise, SplitTime, Workout};

pub const TICK_INTERVAL: Duration = Duration::from_millis(10);
const TICKS_PER_SECOND: f64 = 100.0;

/// ---------------------------------------------------------------------------
/// Timer
/// ---------------------------------------------------------------------------

const FROZEN: u64 = 1 << 63;

/// Tick count with a frozen flag in the top bit, so freezing and reading the
/// final count is one atomic step that no late tick can slip past.
#[derive(Debug, Default)]
struct TickCounter(AtomicU64);

impl TickCounter {
  fn tick(&self) -> bool {
    self
      .0
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
        if t & FROZEN != 0 {
          None
        } else {
          Some(t + 1)
        }
      })
      .is_ok()
  }

  fn freeze(&self) -> u64 {
    self.0.fetch_or(FROZEN, Ordering::SeqCst) & !FROZEN
  }

  fn ticks(&self) -> u64 {
    self.0.load(Ordering::SeqCst) & !FROZEN
  }
}

/// Stopwatch ticking every 10 ms on the tokio runtime
#[derive(Debug)]
pub struct SessionTimer {
  counter: Arc<TickCounter>,
  cancel: CancellationToken,
}

impl SessionTimer {
  /// Spawn the tick task on the current tokio runtime
  pub fn start() -> Result<Self, SessionError> {
    let handle = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
    let timer = Self::idle();
    let counter = Arc::clone(&timer.counter);
    let cancel = timer.cancel.clone();

    handle.spawn(async move {
      let mut interval = tokio::time::interval(TICK_INTERVAL);
      interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
      // First tick completes immediately
      interval.tick().await;

      loop {
        tokio::select! {
          _ = cancel.cancelled() => break,
          _ = interval.tick() => {
            if !counter.tick() {
              break;
            }
          }
        }
      }
    });

    Ok(timer)
  }

  fn idle() -> Self {
    Self {
      counter: Arc::new(TickCounter::default()),
      cancel: CancellationToken::new(),
    }
  }

  pub fn elapsed_seconds(&self) -> f64 {
    self.counter.ticks() as f64 / TICKS_PER_SECOND
  }

  /// Freeze the elapsed time and cancel the tick task
  pub fn stop(self) -> f64 {
    let ticks = self.counter.freeze();
    self.cancel.cancel();
    ticks as f64 / TICKS_PER_SECOND
  }

  pub fn cancellation_token(&self) -> CancellationToken {
    self.cancel.clone()
  }

  #[cfg(test)]
  pub(crate) fn manual() -> Self {
    Self::idle()
  }

  #[cfg(test)]
  pub(crate) fn advance(&self, seconds: f64) {
    for _ in 0..(seconds * TICKS_PER_SECOND).round() as u64 {
      self.counter.tick();
    }
  }
}

impl Drop for SessionTimer {
  fn drop(&mut self) {
    self.cancel.cancel();
  }
}

/// `HH:MM:SS.cc`
pub fn format_elapsed(seconds: f64) -> String {
  let centis = (seconds.max(0.0) * 100.0).floor() as u64;
  let whole = centis / 100;
  format!(
    "{:02}:{:02}:{:02}.{:02}",
    whole / 3600,
    (whole % 3600) / 60,
    whole % 60,
    centis % 100
  )
}

/// ---------------------------------------------------------------------------
/// Session State Machine
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
  Idle,
  Recording,
  /// Timer frozen, facts handed to the orchestrator
  Finalizing,
  Persisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryAction {
  /// Workout without exercises
  Finish,
  /// On the last exercise
  Complete,
  Next,
}

impl PrimaryAction {
  pub fn label(&self) -> &'static str {
    match self {
      Self::Finish => "Finish Workout",
      Self::Complete => "Complete Workout",
      Self::Next => "Next Exercise",
    }
  }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
  #[error("Session is not recording (currently {0:?})")]
  NotRecording(SessionPhase),

  #[error("Session already started")]
  AlreadyStarted,

  #[error("No tokio runtime available to drive the session timer")]
  NoRuntime,
}

/// Frozen, read-only facts of a finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFacts {
  pub session_id: Uuid,
  pub workout_id: i64,
  pub started_at: DateTime<Utc>,
  pub duration_seconds: f64,
  pub exercises_completed: Vec<i64>,
  pub split_times: Vec<SplitTime>,
}

impl SessionFacts {
  pub fn duration_minutes(&self) -> f64 {
    self.duration_seconds / 60.0
  }

  pub fn ended_at(&self) -> DateTime<Utc> {
    self.started_at + chrono::Duration::milliseconds((self.duration_seconds * 1000.0) as i64)
  }

  pub fn interval(&self) -> DateInterval {
    DateInterval::new(self.started_at, self.ended_at())
  }
}

#[derive(Debug)]
pub struct SessionRecorder {
  session_id: Uuid,
  workout_id: i64,
  exercises: Vec<Exercise>,
  phase: SessionPhase,
  started_at: Option<DateTime<Utc>>,
  timer: Option<SessionTimer>,
  cursor: usize,
  completed: Vec<i64>,
  splits: Vec<SplitTime>,
}

impl SessionRecorder {
  pub fn new(workout: &Workout) -> Self {
    Self {
      session_id: Uuid::new_v4(),
      workout_id: workout.id,
      exercises: workout.sorted_exercises().into_iter().cloned().collect(),
      phase: SessionPhase::Idle,
      started_at: None,
      timer: None,
      cursor: 0,
      completed: Vec::new(),
      splits: Vec::new(),
    }
  }

  /// Reset and begin timing
  pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
    if self.phase != SessionPhase::Idle {
      return Err(SessionError::AlreadyStarted);
    }
    self.start_with_timer(now, SessionTimer::start()?)
  }

  pub(crate) fn start_with_timer(
    &mut self,
    now: DateTime<Utc>,
    timer: SessionTimer,
  ) -> Result<(), SessionError> {
    if self.phase != SessionPhase::Idle {
      return Err(SessionError::AlreadyStarted);
    }

    self.session_id = Uuid::new_v4();
    self.started_at = Some(now);
    self.timer = Some(timer);
    self.cursor = 0;
    self.completed.clear();
    self.splits.clear();
    self.phase = SessionPhase::Recording;

    if self.exercises.is_empty() {
      tracing::debug!(workout_id = self.workout_id, "Session started as general activity");
    } else {
      tracing::debug!(
        workout_id = self.workout_id,
        exercises = self.exercises.len(),
        "Session started"
      );
    }
    Ok(())
  }

  pub fn phase(&self) -> SessionPhase {
    self.phase
  }

  pub fn elapsed_seconds(&self) -> f64 {
    self.timer.as_ref().map(|t| t.elapsed_seconds()).unwrap_or(0.0)
  }

  pub fn formatted_elapsed(&self) -> String {
    format_elapsed(self.elapsed_seconds())
  }

  pub fn current_exercise(&self) -> Option<&Exercise> {
    self.exercises.get(self.cursor)
  }

  fn on_last_exercise(&self) -> bool {
    self.cursor + 1 >= self.exercises.len()
  }

  pub fn primary_action(&self) -> PrimaryAction {
    if self.exercises.is_empty() {
      PrimaryAction::Finish
    } else if self.on_last_exercise() {
      PrimaryAction::Complete
    } else {
      PrimaryAction::Next
    }
  }

  /// Ending early is offered while exercises remain
  pub fn can_end_early(&self) -> bool {
    !self.exercises.is_empty() && !self.on_last_exercise()
  }

  /// Advance to the next exercise, or finish on the last one.
  /// Returns the session facts once the session is finished.
  pub fn press_primary(&mut self) -> Result<Option<SessionFacts>, SessionError> {
    self.ensure_recording()?;

    match self.primary_action() {
      PrimaryAction::Finish => Ok(Some(self.finish())),
      PrimaryAction::Complete => {
        self.record_split();
        self.mark_current_completed();
        Ok(Some(self.finish()))
      }
      PrimaryAction::Next => {
        self.record_split();
        self.mark_current_completed();
        self.cursor += 1;
        tracing::debug!(cursor = self.cursor, "Advanced to next exercise");
        Ok(None)
      }
    }
  }

  /// Finish immediately, closing the current exercise
  pub fn end_now(&mut self) -> Result<SessionFacts, SessionError> {
    self.ensure_recording()?;
    self.record_split();
    Ok(self.finish())
  }

  /// The hosting view went away: stop timing, discard the session
  pub fn abandon(&mut self) {
    if let Some(timer) = self.timer.take() {
      timer.stop();
    }
    if self.phase == SessionPhase::Recording {
      tracing::debug!(workout_id = self.workout_id, "Session abandoned, timer cancelled");
      self.phase = SessionPhase::Idle;
    }
  }

  /// History record is on disk, see `MetricsOrchestrator::finish_session`
  pub(crate) fn mark_persisted(&mut self) {
    if self.phase == SessionPhase::Finalizing {
      self.phase = SessionPhase::Persisted;
    }
  }

  fn ensure_recording(&self) -> Result<(), SessionError> {
    if self.phase == SessionPhase::Recording {
      Ok(())
    } else {
      Err(SessionError::NotRecording(self.phase))
    }
  }

  fn record_split(&mut self) {
    let Some(exercise) = self.exercises.get(self.cursor) else {
      return;
    };
    let elapsed_seconds = self.elapsed_seconds();
    tracing::debug!(exercise = %exercise.name, elapsed_seconds, "Recorded split");
    self.splits.push(SplitTime {
      exercise_id: exercise.id,
      elapsed_seconds,
    });
  }

  fn mark_current_completed(&mut self) {
    if let Some(exercise) = self.exercises.get(self.cursor) {
      if !self.completed.contains(&exercise.id) {
        self.completed.push(exercise.id);
      }
    }
  }

  /// Freeze the timer before anything reads the duration
  fn finish(&mut self) -> SessionFacts {
    let duration_seconds = self.timer.take().map(SessionTimer::stop).unwrap_or(0.0);

    let (exercises_completed, split_times) = if self.exercises.is_empty() {
      (Vec::new(), Vec::new())
    } else {
      self.mark_current_completed();
      (self.completed.clone(), self.splits.clone())
    };

    self.phase = SessionPhase::Finalizing;

    tracing::info!(
      workout_id = self.workout_id,
      duration_seconds,
      exercises = exercises_completed.len(),
      "Session finished"
    );

    SessionFacts {
      session_id: self.session_id,
      workout_id: self.workout_id,
      started_at: self.started_at.unwrap_or_else(Utc::now),
      duration_seconds,
      exercises_completed,
      split_times,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{mock_workout, session_start};

  fn recording(names: &[&str]) -> (SessionRecorder, Workout) {
    let workout = mock_workout(names);
    let mut recorder = SessionRecorder::new(&workout);
    recorder
      .start_with_timer(session_start(), SessionTimer::manual())
      .unwrap();
    (recorder, workout)
  }

  fn advance(recorder: &SessionRecorder, seconds: f64) {
    recorder.timer.as_ref().unwrap().advance(seconds);
  }

  #[test]
  fn test_walks_through_exercises_with_splits() {
    let (mut recorder, workout) = recording(&["Squat", "Press"]);
    assert_eq!(recorder.primary_action(), PrimaryAction::Next);
    assert!(recorder.can_end_early());

    advance(&recorder, 300.0);
    assert_eq!(recorder.press_primary().unwrap(), None);
    assert_eq!(recorder.current_exercise().unwrap().name, "Press");
    assert_eq!(recorder.primary_action(), PrimaryAction::Complete);
    assert_eq!(recorder.primary_action().label(), "Complete Workout");
    assert!(!recorder.can_end_early());

    advance(&recorder, 600.0);
    let facts = recorder.press_primary().unwrap().expect("finished");

    assert_eq!(recorder.phase(), SessionPhase::Finalizing);
    assert_eq!(facts.duration_seconds, 900.0);
    assert_eq!(facts.duration_minutes(), 15.0);
    let ids: Vec<i64> = workout.exercises.iter().map(|e| e.id).collect();
    assert_eq!(facts.exercises_completed, ids);
    assert_eq!(
      facts.split_times,
      vec![
        SplitTime { exercise_id: ids[0], elapsed_seconds: 300.0 },
        SplitTime { exercise_id: ids[1], elapsed_seconds: 900.0 },
      ]
    );
    assert_eq!(facts.ended_at(), session_start() + chrono::Duration::seconds(900));
  }

  #[test]
  fn test_empty_workout_finishes_without_exercises() {
    let (mut recorder, _) = recording(&[]);
    assert_eq!(recorder.primary_action(), PrimaryAction::Finish);
    assert!(!recorder.can_end_early());
    assert!(recorder.current_exercise().is_none());

    advance(&recorder, 42.5);
    let facts = recorder.press_primary().unwrap().expect("finished");
    assert_eq!(facts.duration_seconds, 42.5);
    assert!(facts.exercises_completed.is_empty());
    assert!(facts.split_times.is_empty());
  }

  #[test]
  fn test_end_now_closes_current_exercise() {
    let (mut recorder, workout) = recording(&["Row", "Bike", "Ski"]);
    advance(&recorder, 60.0);
    recorder.press_primary().unwrap();
    advance(&recorder, 30.0);

    let facts = recorder.end_now().unwrap();
    assert_eq!(facts.exercises_completed, vec![workout.exercises[0].id, workout.exercises[1].id]);
    assert_eq!(facts.split_times.len(), 2);
    assert_eq!(facts.split_times[1].elapsed_seconds, 90.0);
  }

  #[test]
  fn test_actions_rejected_after_finish() {
    let (mut recorder, _) = recording(&[]);
    recorder.press_primary().unwrap();

    assert_eq!(
      recorder.press_primary(),
      Err(SessionError::NotRecording(SessionPhase::Finalizing))
    );
    assert!(recorder.end_now().is_err());

    recorder.mark_persisted();
    assert_eq!(recorder.phase(), SessionPhase::Persisted);
  }

  #[test]
  fn test_abandon_discards_session() {
    let (mut recorder, _) = recording(&["Squat"]);
    advance(&recorder, 10.0);

    recorder.abandon();
    assert_eq!(recorder.phase(), SessionPhase::Idle);
    assert_eq!(recorder.elapsed_seconds(), 0.0);
    assert!(recorder.press_primary().is_err());
  }

  #[test]
  fn test_start_without_runtime_fails_cleanly() {
    let workout = mock_workout(&["Squat"]);
    let mut recorder = SessionRecorder::new(&workout);

    assert_eq!(recorder.start(session_start()), Err(SessionError::NoRuntime));
    assert_eq!(recorder.phase(), SessionPhase::Idle);
    assert!(recorder.press_primary().is_err());
  }

  #[test]
  fn test_frozen_counter_ignores_late_ticks() {
    let counter = TickCounter::default();
    assert!(counter.tick());
    assert!(counter.tick());
    assert_eq!(counter.freeze(), 2);
    assert!(!counter.tick());
    assert_eq!(counter.ticks(), 2);
  }

  #[test]
  fn test_format_elapsed() {
    assert_eq!(format_elapsed(0.0), "00:00:00.00");
    assert_eq!(format_elapsed(3725.25), "01:02:05.25");
  }

  #[tokio::test(start_paused = true)]
  async fn test_timer_ticks_and_freezes() {
    let workout = mock_workout(&["Plank"]);
    let mut recorder = SessionRecorder::new(&workout);
    recorder.start(session_start()).unwrap();
    assert!(recorder.start(session_start()).is_err());

    tokio::time::sleep(Duration::from_secs(1)).await;
    let running = recorder.elapsed_seconds();
    assert!((0.98..=1.01).contains(&running), "elapsed {}", running);

    let facts = recorder.press_primary().unwrap().expect("finished");
    assert!(facts.duration_seconds >= running);
    assert!(facts.duration_seconds <= 1.01);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(recorder.phase(), SessionPhase::Finalizing);
    assert_eq!(recorder.elapsed_seconds(), 0.0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_stop_cancels_tick_task() {
    let timer = SessionTimer::start().unwrap();
    let token = timer.cancellation_token();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let frozen = timer.stop();
    assert!(token.is_cancelled());
    assert!(frozen > 0.0);
  }
}
