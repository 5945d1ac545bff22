use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::HistoryRecord;

/// ---------------------------------------------------------------------------
/// Activity Category
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
  Cardio,
  CrossTrain,
  Cycling,
  Grappling,
  Hiit,
  Pilates,
  Power,
  Recovery,
  Swimming,
  Strength,
  Run,
  Yoga,
  Walk,
  Stretch,
  Test,
}

impl ActivityCategory {
  /// Metabolic equivalent used for active-energy estimates
  pub fn met_value(&self) -> f64 {
    match self {
      Self::Cardio => 7.5,
      Self::CrossTrain => 8.0,
      Self::Cycling => 7.5,
      Self::Grappling => 10.0,
      Self::Hiit => 8.0,
      Self::Pilates => 3.0,
      Self::Power => 6.0,
      Self::Recovery => 2.0,
      Self::Swimming => 7.0,
      Self::Strength => 5.0,
      Self::Run => 9.8,
      Self::Yoga => 2.5,
      Self::Walk => 3.5,
      Self::Stretch => 2.0,
      Self::Test => 5.0,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Cardio => "cardio",
      Self::CrossTrain => "cross_train",
      Self::Cycling => "cycling",
      Self::Grappling => "grappling",
      Self::Hiit => "hiit",
      Self::Pilates => "pilates",
      Self::Power => "power",
      Self::Recovery => "recovery",
      Self::Swimming => "swimming",
      Self::Strength => "strength",
      Self::Run => "run",
      Self::Yoga => "yoga",
      Self::Walk => "walk",
      Self::Stretch => "stretch",
      Self::Test => "test",
    }
  }
}

impl std::fmt::Display for ActivityCategory {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for ActivityCategory {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "cardio" => Ok(Self::Cardio),
      "cross_train" => Ok(Self::CrossTrain),
      "cycling" => Ok(Self::Cycling),
      "grappling" => Ok(Self::Grappling),
      "hiit" => Ok(Self::Hiit),
      "pilates" => Ok(Self::Pilates),
      "power" => Ok(Self::Power),
      "recovery" => Ok(Self::Recovery),
      "swimming" => Ok(Self::Swimming),
      "strength" => Ok(Self::Strength),
      "run" => Ok(Self::Run),
      "yoga" => Ok(Self::Yoga),
      "walk" => Ok(Self::Walk),
      "stretch" => Ok(Self::Stretch),
      "test" => Ok(Self::Test),
      _ => Err(format!("Unknown activity category: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Workout
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
  pub id: i64,
  pub name: String,
  pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
  pub id: i64,
  pub title: String,
  pub exercises: Vec<Exercise>,
  pub category: Option<ActivityCategory>,
  /// Minutes
  pub last_session_duration: f64,
  pub date_created: DateTime<Utc>,
  pub date_completed: Option<DateTime<Utc>>,
  /// Shortest valid session in minutes
  pub personal_best: Option<f64>,
  pub summary: Option<String>,
  pub history: Vec<HistoryRecord>,
}

/// For inserting new workouts (without ids)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorkout {
  pub title: String,
  pub exercise_names: Vec<String>,
  pub category: Option<ActivityCategory>,
}

impl Workout {
  /// Exercises in session order
  pub fn sorted_exercises(&self) -> Vec<&Exercise> {
    let mut exercises: Vec<&Exercise> = self.exercises.iter().collect();
    exercises.sort_by_key(|e| e.position);
    exercises
  }

  pub fn history_record(&self, id: uuid::Uuid) -> Option<&HistoryRecord> {
    self.history.iter().find(|h| h.id == id)
  }

  /// Recompute the personal best as the shortest positive duration on record.
  /// Zero and negative durations are invalid data and never count.
  pub fn update_personal_best(&mut self) {
    self.personal_best = personal_best(self.history.iter().map(|h| h.duration_minutes));
  }

  /// Regenerate the textual summary from the full history
  pub fn update_summary(&mut self) {
    if self.history.is_empty() {
      self.summary = None;
      return;
    }

    let count = self.history.len();
    let average_minutes =
      self.history.iter().map(|h| h.duration_minutes).sum::<f64>() / count as f64;
    let names = self
      .sorted_exercises()
      .iter()
      .map(|e| e.name.as_str())
      .collect::<Vec<_>>()
      .join(", ");

    self.summary = Some(format!(
      "Completed {} session(s) with an average duration of {}. Exercises: {}.",
      count,
      format_duration(average_minutes * 60.0),
      names
    ));
  }
}

/// Minimum positive duration, `None` when nothing valid is on record
pub fn personal_best<I>(durations: I) -> Option<f64>
where
  I: IntoIterator<Item = f64>,
{
  durations
    .into_iter()
    .filter(|d| *d > 0.0)
    .fold(None, |best: Option<f64>, d| match best {
      Some(b) if b <= d => Some(b),
      _ => Some(d),
    })
}

/// `MM:SS` below one hour, `H:MM:SS` otherwise
pub fn format_duration(seconds: f64) -> String {
  let total = seconds.max(0.0).round() as i64;
  let hours = total / 3600;
  let minutes = (total % 3600) / 60;
  let secs = total % 60;
  if hours > 0 {
    format!("{}:{:02}:{:02}", hours, minutes, secs)
  } else {
    format!("{:02}:{:02}", minutes, secs)
  }
}
