pub mod analysis;
pub mod biometrics;
pub mod config;
pub mod db;
pub mod events;
pub mod models;
pub mod orchestrator;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

pub use analysis::HrZone;
pub use biometrics::{BiometricError, BiometricGateway, UnavailableGateway};
pub use config::{init_logging, AppConfig, ConfigError};
pub use db::SqliteStore;
pub use events::{EventBus, WorkoutEvent};
pub use orchestrator::{FinalizeError, FinalizeOutcome, MetricsOrchestrator, SyncNotice};
pub use session::{SessionFacts, SessionPhase, SessionRecorder};
pub use store::{LocalStore, StoreError};

/// Shared application state: the local store and the finalisation pipeline
/// wired to it
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<SqliteStore>,
  pub orchestrator: MetricsOrchestrator,
}

impl AppState {
  /// Open the database and wire the orchestrator to `gateway`
  pub async fn initialize(
    config: &AppConfig,
    gateway: Arc<dyn BiometricGateway>,
  ) -> Result<Self, StoreError> {
    let store = Arc::new(SqliteStore::connect(&config.database_url).await?);
    let orchestrator = MetricsOrchestrator::new(gateway, store.clone(), EventBus::default())
      .with_target_workouts_per_week(config.target_workouts_per_week);

    tracing::info!(
      target_workouts_per_week = config.target_workouts_per_week,
      "Workout engine ready"
    );

    Ok(Self {
      store,
      orchestrator,
    })
  }
}
