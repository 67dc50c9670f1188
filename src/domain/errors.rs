//! Domain errors for the workout session engine.

use thiserror::Error;
use uuid::Uuid;

/// Format a list of validation errors as a single `; `-joined line.
fn format_error_list(errors: &[String]) -> String {
    errors.join("; ")
}

/// Domain-level errors that can occur while running a workout session.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Persistence call failed or timed out. Retried with backoff.
    #[error("Network error: {0}")]
    Network(String),

    /// Workout completion refused by the validation gate.
    #[error("Workout validation failed: {}", format_error_list(.0))]
    ValidationFailed(Vec<String>),

    /// Local and remote completion state disagree and could not be repaired.
    #[error("Completion state for exercise {index} is inconsistent: {reason}")]
    Consistency { index: usize, reason: String },

    #[error("No active workout session")]
    NoActiveSession,

    #[error("Session start already in progress")]
    StartInProgress,

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Exercise not found: {0}")]
    ExerciseNotFound(String),

    #[error("Exercise index {index} out of range ({len} exercises)")]
    ExerciseOutOfRange { index: usize, len: usize },

    #[error("Set index {set_index} out of range for exercise {exercise_index} ({len} sets)")]
    SetOutOfRange {
        exercise_index: usize,
        set_index: usize,
        len: usize,
    },

    #[error("Exercise {0} must keep at least one set")]
    LastSetRemoval(usize),

    /// Sets are only removed from the end of the list.
    #[error("Set {set_index} of exercise {exercise_index} is not its last set ({len} sets)")]
    SetNotLast {
        exercise_index: usize,
        set_index: usize,
        len: usize,
    },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    /// Whether the error is worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::DatabaseError(_))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
