use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions};
use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::analysis::HrZone;
use crate::models::{
  ActivityCategory, Exercise, HistoryRecord, NewWorkout, SplitTime, UserBiometricProfile, Workout,
};
use crate::store::{HistoryQuery, LocalStore, StoreError};

pub type DbPool = SqlitePool;

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(database_url: &str) -> Result<DbPool, StoreError> {
  tracing::info!(database_url, "Initializing database");

  // Every connection to an in-memory database is its own database
  let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

  let pool = SqlitePoolOptions::new()
    .max_connections(max_connections)
    .connect(database_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!("Database initialized successfully");

  Ok(pool)
}

/// ---------------------------------------------------------------------------
/// Row Types
/// ---------------------------------------------------------------------------

#[derive(Debug, sqlx::FromRow)]
struct WorkoutRow {
  id: i64,
  title: String,
  category: Option<String>,
  last_session_duration: f64,
  date_created: DateTime<Utc>,
  date_completed: Option<DateTime<Utc>>,
  personal_best: Option<f64>,
  summary: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
  id: String,
  workout_id: i64,
  date: DateTime<Utc>,
  notes: Option<String>,
  duration_minutes: f64,
  intensity_score: Option<f64>,
  progress_pulse_score: Option<f64>,
  dominant_zone: Option<i64>,
}

/// ---------------------------------------------------------------------------
/// SQLite Store
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SqliteStore {
  pool: DbPool,
}

impl SqliteStore {
  pub fn new(pool: DbPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
    Ok(Self::new(initialize_db(database_url).await?))
  }

  async fn load_history(&self, row: HistoryRow) -> Result<HistoryRecord, StoreError> {
    let exercises_completed: Vec<i64> = sqlx::query_scalar(
      "SELECT exercise_id FROM history_exercises WHERE history_id = ?1 ORDER BY position",
    )
    .bind(&row.id)
    .fetch_all(&self.pool)
    .await?;

    let split_times = sqlx::query_as::<_, (i64, f64)>(
      "SELECT exercise_id, elapsed_seconds FROM split_times WHERE history_id = ?1 ORDER BY position",
    )
    .bind(&row.id)
    .fetch_all(&self.pool)
    .await?
    .into_iter()
    .map(|(exercise_id, elapsed_seconds)| SplitTime {
      exercise_id,
      elapsed_seconds,
    })
    .collect();

    let id = Uuid::parse_str(&row.id)
      .map_err(|e| StoreError::Corrupt(format!("history id {}: {}", row.id, e)))?;
    let dominant_zone = match row.dominant_zone {
      Some(n) => Some(
        HrZone::from_number(n)
          .ok_or_else(|| StoreError::Corrupt(format!("history {}: dominant zone {}", row.id, n)))?,
      ),
      None => None,
    };

    Ok(HistoryRecord {
      id,
      workout_id: row.workout_id,
      date: row.date,
      notes: row.notes,
      exercises_completed,
      split_times,
      duration_minutes: row.duration_minutes,
      intensity_score: row.intensity_score,
      progress_pulse_score: row.progress_pulse_score,
      dominant_zone,
    })
  }
}

#[async_trait]
impl LocalStore for SqliteStore {
  async fn insert_workout(&self, workout: &NewWorkout) -> Result<Workout, StoreError> {
    let mut tx = self.pool.begin().await?;

    let id = sqlx::query("INSERT INTO workouts (title, category, date_created) VALUES (?1, ?2, ?3)")
      .bind(&workout.title)
      .bind(workout.category.map(|c| c.as_str()))
      .bind(Utc::now())
      .execute(&mut *tx)
      .await?
      .last_insert_rowid();

    for (position, name) in workout.exercise_names.iter().enumerate() {
      sqlx::query("INSERT INTO exercises (workout_id, name, position) VALUES (?1, ?2, ?3)")
        .bind(id)
        .bind(name)
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::debug!(workout_id = id, title = %workout.title, "Inserted workout");

    self
      .fetch_workout(id)
      .await?
      .ok_or_else(|| StoreError::NotFound(format!("workout {}", id)))
  }

  async fn fetch_workout(&self, id: i64) -> Result<Option<Workout>, StoreError> {
    let row = sqlx::query_as::<_, WorkoutRow>(
      r#"
      SELECT id, title, category, last_session_duration, date_created,
             date_completed, personal_best, summary
      FROM workouts
      WHERE id = ?1
      "#,
    )
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;

    let Some(row) = row else {
      return Ok(None);
    };

    let exercises = sqlx::query_as::<_, (i64, String, i64)>(
      "SELECT id, name, position FROM exercises WHERE workout_id = ?1 ORDER BY position",
    )
    .bind(id)
    .fetch_all(&self.pool)
    .await?
    .into_iter()
    .map(|(id, name, position)| Exercise { id, name, position })
    .collect();

    let category = match row.category {
      Some(c) => Some(c.parse::<ActivityCategory>().map_err(StoreError::Corrupt)?),
      None => None,
    };

    let history = self.fetch_history(&HistoryQuery::for_workout(id)).await?;

    Ok(Some(Workout {
      id: row.id,
      title: row.title,
      exercises,
      category,
      last_session_duration: row.last_session_duration,
      date_created: row.date_created,
      date_completed: row.date_completed,
      personal_best: row.personal_best,
      summary: row.summary,
      history,
    }))
  }

  async fn fetch_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryRecord>, StoreError> {
    let mut builder = QueryBuilder::<Sqlite>::new(
      r#"
      SELECT id, workout_id, date, notes, duration_minutes,
             intensity_score, progress_pulse_score, dominant_zone
      FROM history
      WHERE 1 = 1
      "#,
    );
    if let Some(workout_id) = query.workout_id {
      builder.push(" AND workout_id = ").push_bind(workout_id);
    }
    if let Some(since) = query.since {
      builder.push(" AND date >= ").push_bind(since);
    }
    if let Some(until) = query.until {
      builder.push(" AND date <= ").push_bind(until);
    }
    builder.push(" ORDER BY date ASC, rowid ASC");

    let rows = builder.build_query_as::<HistoryRow>().fetch_all(&self.pool).await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
      records.push(self.load_history(row).await?);
    }
    Ok(records)
  }

  async fn fetch_profile(&self) -> Result<UserBiometricProfile, StoreError> {
    let row: Option<(Option<f64>, Option<f64>, Option<i64>, Option<f64>, Option<f64>)> = sqlx::query_as(
      r#"
      SELECT weight_kg, height_m, age, resting_heart_rate, max_heart_rate
      FROM user_profile
      WHERE id = 1
      "#,
    )
    .fetch_optional(&self.pool)
    .await?;

    match row {
      Some((weight_kg, height_m, age, resting_heart_rate, max_heart_rate)) => Ok(UserBiometricProfile {
        weight_kg,
        height_m,
        age: age.and_then(|a| u32::try_from(a).ok()),
        resting_heart_rate,
        max_heart_rate,
      }),
      None => Ok(UserBiometricProfile::default()),
    }
  }

  async fn save_profile(&self, profile: &UserBiometricProfile) -> Result<(), StoreError> {
    sqlx::query(
      r#"
      INSERT INTO user_profile (id, weight_kg, height_m, age, resting_heart_rate, max_heart_rate)
      VALUES (1, ?1, ?2, ?3, ?4, ?5)
      ON CONFLICT(id) DO UPDATE SET
        weight_kg = excluded.weight_kg,
        height_m = excluded.height_m,
        age = excluded.age,
        resting_heart_rate = excluded.resting_heart_rate,
        max_heart_rate = excluded.max_heart_rate,
        updated_at = CURRENT_TIMESTAMP
      "#,
    )
    .bind(profile.weight_kg)
    .bind(profile.height_m)
    .bind(profile.age.map(i64::from))
    .bind(profile.resting_heart_rate)
    .bind(profile.max_heart_rate)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn save_workout(&self, workout: &Workout) -> Result<(), StoreError> {
    let mut tx = self.pool.begin().await?;

    let updated = sqlx::query(
      r#"
      UPDATE workouts SET
        title = ?1,
        category = ?2,
        last_session_duration = ?3,
        date_completed = ?4,
        personal_best = ?5,
        summary = ?6
      WHERE id = ?7
      "#,
    )
    .bind(&workout.title)
    .bind(workout.category.map(|c| c.as_str()))
    .bind(workout.last_session_duration)
    .bind(workout.date_completed)
    .bind(workout.personal_best)
    .bind(&workout.summary)
    .bind(workout.id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
      return Err(StoreError::NotFound(format!("workout {}", workout.id)));
    }

    for history in &workout.history {
      let history_id = history.id.to_string();

      let inserted = sqlx::query(
        r#"
        INSERT INTO history (
          id, workout_id, date, notes, duration_minutes,
          intensity_score, progress_pulse_score, dominant_zone
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(id) DO NOTHING
        "#,
      )
      .bind(&history_id)
      .bind(workout.id)
      .bind(history.date)
      .bind(&history.notes)
      .bind(history.duration_minutes)
      .bind(history.intensity_score)
      .bind(history.progress_pulse_score)
      .bind(history.dominant_zone.map(|z| z.number() as i64))
      .execute(&mut *tx)
      .await?
      .rows_affected();

      if inserted == 0 {
        continue;
      }

      for (position, exercise_id) in history.exercises_completed.iter().enumerate() {
        sqlx::query(
          "INSERT INTO history_exercises (history_id, exercise_id, position) VALUES (?1, ?2, ?3)",
        )
        .bind(&history_id)
        .bind(exercise_id)
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
      }

      for (position, split) in history.split_times.iter().enumerate() {
        sqlx::query(
          r#"
          INSERT INTO split_times (history_id, exercise_id, elapsed_seconds, position)
          VALUES (?1, ?2, ?3, ?4)
          "#,
        )
        .bind(&history_id)
        .bind(split.exercise_id)
        .bind(split.elapsed_seconds)
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
      }

      tracing::debug!(history_id = %history.id, workout_id = workout.id, "Stored history record");
    }

    tx.commit().await?;
    Ok(())
  }

  async fn update_history_notes(&self, id: Uuid, notes: Option<&str>) -> Result<(), StoreError> {
    let updated = sqlx::query("UPDATE history SET notes = ?1 WHERE id = ?2")
      .bind(notes)
      .bind(id.to_string())
      .execute(&self.pool)
      .await?
      .rows_affected();

    if updated == 0 {
      return Err(StoreError::NotFound(format!("history {}", id)));
    }
    Ok(())
  }
}
