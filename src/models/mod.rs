pub mod history;
pub mod profile;
pub mod sample;
pub mod workout;

pub use history::{HistoryRecord, SplitTime};
pub use profile::{resolve_max_heart_rate, UserBiometricProfile};
pub use sample::BiometricSample;
pub use workout::{ActivityCategory, Exercise, NewWorkout, Workout};
