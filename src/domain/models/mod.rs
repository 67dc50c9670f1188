//! Domain models for the workout session engine.

pub mod completion;
pub mod config;
pub mod exercise;
pub mod plan;
pub mod session;

pub use completion::{
    CompletionMethod, CompletionStatus, ExerciseCompletionRecord, NewExerciseCompletion,
};
pub use config::{Config, DatabaseConfig, LoggingConfig, RetryConfig, SessionConfig};
pub use exercise::{ExerciseLogEntry, Phase, PersistedExercise, SetCompletion, SetRecord};
pub use plan::{PlannedExercise, WorkoutPlan};
pub use session::{LifecycleState, SessionUpdate, WorkoutSession};
