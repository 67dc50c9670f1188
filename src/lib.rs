//! Workout Runner - guided workout session engine
//!
//! Drives a user through a phased exercise list, records per-set
//! performance and keeps two completion sources in agreement: the local
//! timestamp set on user action and the durable record written through a
//! repository. Sessions survive restarts and network loss without losing
//! or duplicating completion state.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors and port traits
//! - **Service Layer** (`services`): Navigation, set tracking, reconciliation,
//!   validation, progress and the session lifecycle manager
//! - **Adapters** (`adapters`): In-memory and SQLite repositories
//! - **Infrastructure Layer** (`infrastructure`): Config, logging, retry
//! - **CLI Layer** (`cli`): Command-line driver
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use workout_runner::adapters::InMemorySessionRepository;
//! use workout_runner::domain::models::{ExerciseLogEntry, SessionConfig};
//! use workout_runner::infrastructure::retry::RetryPolicy;
//! use workout_runner::services::SessionLifecycleManager;
//!
//! # async fn example() -> workout_runner::DomainResult<()> {
//! let manager = SessionLifecycleManager::new(
//!     Arc::new(InMemorySessionRepository::new()),
//!     RetryPolicy::default(),
//!     SessionConfig::default(),
//! );
//! manager
//!     .start_or_resume("push-day", "alice", vec![ExerciseLogEntry::new("bench", "Bench Press", 3, 8)])
//!     .await?;
//! println!("{:?}", manager.get_unified_progress().await);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    CompletionMethod, CompletionStatus, Config, ExerciseLogEntry, Phase, SetCompletion, SetRecord,
    WorkoutPlan, WorkoutSession,
};
pub use domain::ports::{SessionObserver, WorkoutSessionRepository};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{CompletionOutcome, SessionLifecycleManager, ValidationResult, WorkoutProgress};
