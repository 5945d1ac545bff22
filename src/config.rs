//! Environment configuration and logging setup

use std::env;

use tracing_subscriber::EnvFilter;

use crate::analysis::DEFAULT_TARGET_WORKOUTS_PER_WEEK;

pub const DATABASE_URL_VAR: &str = "WORKOUT_PULSE_DATABASE_URL";
pub const TARGET_WORKOUTS_VAR: &str = "WORKOUT_PULSE_TARGET_WORKOUTS_PER_WEEK";
pub const LOG_VAR: &str = "WORKOUT_PULSE_LOG";

const DEFAULT_DATABASE_URL: &str = "sqlite://workout-pulse.db?mode=rwc";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Invalid value for {name}: {reason}")]
  Invalid { name: &'static str, reason: String },

  #[error("Failed to install logger: {0}")]
  Logging(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
  pub database_url: String,
  pub target_workouts_per_week: u32,
  /// `EnvFilter` directive
  pub log_filter: String,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_url: DEFAULT_DATABASE_URL.to_string(),
      target_workouts_per_week: DEFAULT_TARGET_WORKOUTS_PER_WEEK,
      log_filter: DEFAULT_LOG_FILTER.to_string(),
    }
  }
}

impl AppConfig {
  /// Load `.env` if present, then read the environment
  pub fn load() -> Result<Self, ConfigError> {
    dotenvy::dotenv().ok();
    Self::from_env()
  }

  pub fn from_env() -> Result<Self, ConfigError> {
    let defaults = Self::default();

    let database_url = non_empty_var(DATABASE_URL_VAR).unwrap_or(defaults.database_url);

    let target_workouts_per_week = match non_empty_var(TARGET_WORKOUTS_VAR) {
      Some(raw) => parse_target(&raw)?,
      None => defaults.target_workouts_per_week,
    };

    let log_filter = non_empty_var(LOG_VAR).unwrap_or(defaults.log_filter);
    EnvFilter::try_new(&log_filter).map_err(|e| ConfigError::Invalid {
      name: LOG_VAR,
      reason: e.to_string(),
    })?;

    Ok(Self {
      database_url,
      target_workouts_per_week,
      log_filter,
    })
  }
}

fn non_empty_var(name: &str) -> Option<String> {
  env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_target(raw: &str) -> Result<u32, ConfigError> {
  let invalid = |reason: String| ConfigError::Invalid {
    name: TARGET_WORKOUTS_VAR,
    reason,
  };
  let target: u32 = raw.parse().map_err(|e| invalid(format!("{:?}: {}", raw, e)))?;
  if target == 0 {
    return Err(invalid("must be at least 1".into()));
  }
  Ok(target)
}

/// Install the global fmt subscriber. Fails if one is already installed.
pub fn init_logging(config: &AppConfig) -> Result<(), ConfigError> {
  let filter = EnvFilter::try_new(&config.log_filter).map_err(|e| ConfigError::Invalid {
    name: LOG_VAR,
    reason: e.to_string(),
  })?;

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(true)
    .try_init()
    .map_err(|e| ConfigError::Logging(e.to_string()))
}
