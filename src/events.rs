//! Domain events for outside subscribers (activity dashboards and the like)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkoutEvent {
  /// A session finished and its history record is on disk
  WorkoutCompleted {
    workout_id: i64,
    history_id: Uuid,
    timestamp: DateTime<Utc>,
  },
}

/// Broadcast channel of workout events. Emitting never blocks and never
/// fails; with no subscribers the event is simply dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
  tx: broadcast::Sender<WorkoutEvent>,
}

impl EventBus {
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity.max(1));
    Self { tx }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<WorkoutEvent> {
    self.tx.subscribe()
  }

  pub fn emit_lossy(&self, event: WorkoutEvent) {
    if self.tx.send(event).is_err() {
      tracing::trace!("No subscribers for workout event");
    }
  }

  pub fn subscriber_count(&self) -> usize {
    self.tx.receiver_count()
  }
}

impl Default for EventBus {
  fn default() -> Self {
    Self::new(64)
  }
}
