//! Workout session repository port.
//!
//! The persistence collaborator the session engine talks to. Every call is
//! asynchronous and may fail transiently; callers retry with backoff.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    ExerciseCompletionRecord, NewExerciseCompletion, SessionUpdate, WorkoutSession,
};

/// Repository interface for workout sessions and their completion records.
#[async_trait]
pub trait WorkoutSessionRepository: Send + Sync {
    /// Create and persist a new session.
    async fn create_session(&self, workout_id: &str, user_id: &str) -> DomainResult<WorkoutSession>;

    /// Most recently active non-terminal session for the pair, if any.
    async fn find_resumable_session(
        &self,
        user_id: &str,
        workout_id: &str,
    ) -> DomainResult<Option<WorkoutSession>>;

    /// All completion records of a session, ordered by exercise index.
    async fn get_exercise_completions(
        &self,
        session_id: Uuid,
    ) -> DomainResult<Vec<ExerciseCompletionRecord>>;

    /// Create or replace the record for `(session_id, exercise_index)`.
    ///
    /// Must be idempotent on that key: repeated calls never create duplicates.
    async fn upsert_exercise_completion(
        &self,
        session_id: Uuid,
        exercise_index: usize,
        completion: &NewExerciseCompletion,
    ) -> DomainResult<ExerciseCompletionRecord>;

    /// Apply a partial update and return the stored session.
    async fn update_session(
        &self,
        session_id: Uuid,
        update: &SessionUpdate,
    ) -> DomainResult<WorkoutSession>;
}
