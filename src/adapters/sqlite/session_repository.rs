//! SQLite implementation of the WorkoutSessionRepository.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_datetime, parse_json_or_default, parse_optional_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ExerciseCompletionRecord, NewExerciseCompletion, SessionUpdate, WorkoutSession,
};
use crate::domain::ports::WorkoutSessionRepository;

/// Fixed-width timestamps so `ORDER BY` on the text column is chronological.
fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub struct SqliteWorkoutSessionRepository {
    pool: SqlitePool,
}

impl SqliteWorkoutSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get_session(&self, id: Uuid) -> DomainResult<Option<WorkoutSession>> {
        let row: Option<SessionRow> = sqlx::query_as("SELECT * FROM workout_sessions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_completion(
        &self,
        session_id: Uuid,
        exercise_index: usize,
    ) -> DomainResult<Option<ExerciseCompletionRecord>> {
        let row: Option<CompletionRow> = sqlx::query_as(
            "SELECT * FROM exercise_completions WHERE session_id = ? AND exercise_index = ?",
        )
        .bind(session_id.to_string())
        .bind(exercise_index as i64)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}

#[async_trait]
impl WorkoutSessionRepository for SqliteWorkoutSessionRepository {
    async fn create_session(&self, workout_id: &str, user_id: &str) -> DomainResult<WorkoutSession> {
        let session = WorkoutSession::new(workout_id, user_id);

        sqlx::query(
            r#"INSERT INTO workout_sessions (id, workout_id, user_id, started_at, last_active_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(&session.workout_id)
        .bind(&session.user_id)
        .bind(timestamp(session.started_at))
        .bind(timestamp(session.last_active_at))
        .execute(&self.pool)
        .await?;

        Ok(session)
    }

    async fn find_resumable_session(
        &self,
        user_id: &str,
        workout_id: &str,
    ) -> DomainResult<Option<WorkoutSession>> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"SELECT * FROM workout_sessions
               WHERE user_id = ? AND workout_id = ? AND completed_at IS NULL
               ORDER BY last_active_at DESC
               LIMIT 1"#,
        )
        .bind(user_id)
        .bind(workout_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_exercise_completions(
        &self,
        session_id: Uuid,
    ) -> DomainResult<Vec<ExerciseCompletionRecord>> {
        let rows: Vec<CompletionRow> = sqlx::query_as(
            "SELECT * FROM exercise_completions WHERE session_id = ? ORDER BY exercise_index",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn upsert_exercise_completion(
        &self,
        session_id: Uuid,
        exercise_index: usize,
        completion: &NewExerciseCompletion,
    ) -> DomainResult<ExerciseCompletionRecord> {
        if self.get_session(session_id).await?.is_none() {
            return Err(DomainError::SessionNotFound(session_id));
        }

        let completed_sets = serde_json::to_string(&completion.completed_sets)?;
        let completed_at = completion.completed_at.unwrap_or_else(Utc::now);

        sqlx::query(
            r#"INSERT INTO exercise_completions
                   (id, session_id, exercise_index, completed_sets, completion_notes, skipped, auto_completed, completed_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (session_id, exercise_index) DO UPDATE SET
                   completed_sets = excluded.completed_sets,
                   completion_notes = excluded.completion_notes,
                   skipped = excluded.skipped,
                   auto_completed = excluded.auto_completed,
                   completed_at = excluded.completed_at"#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(session_id.to_string())
        .bind(exercise_index as i64)
        .bind(completed_sets)
        .bind(&completion.notes)
        .bind(completion.skipped)
        .bind(completion.auto_completed)
        .bind(timestamp(completed_at))
        .execute(&self.pool)
        .await?;

        self.get_completion(session_id, exercise_index)
            .await?
            .ok_or_else(|| DomainError::DatabaseError("upserted completion not readable".to_string()))
    }

    async fn update_session(
        &self,
        session_id: Uuid,
        update: &SessionUpdate,
    ) -> DomainResult<WorkoutSession> {
        let mut session = self
            .get_session(session_id)
            .await?
            .ok_or(DomainError::SessionNotFound(session_id))?;
        session.apply(update);

        let exercises = session
            .exercises
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"UPDATE workout_sessions
               SET last_active_at = ?, completed_at = ?, duration = ?, notes = ?, exercises = ?
               WHERE id = ?"#,
        )
        .bind(timestamp(session.last_active_at))
        .bind(session.completed_at.map(timestamp))
        .bind(session.duration)
        .bind(&session.notes)
        .bind(exercises)
        .bind(session_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(session)
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    workout_id: String,
    user_id: String,
    started_at: String,
    last_active_at: String,
    completed_at: Option<String>,
    duration: Option<i64>,
    notes: Option<String>,
    exercises: Option<String>,
}

impl TryFrom<SessionRow> for WorkoutSession {
    type Error = DomainError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let exercises = row
            .exercises
            .map(|json| serde_json::from_str(&json))
            .transpose()?;

        Ok(WorkoutSession {
            id: parse_uuid(&row.id)?,
            workout_id: row.workout_id,
            user_id: row.user_id,
            started_at: parse_datetime(&row.started_at)?,
            last_active_at: parse_datetime(&row.last_active_at)?,
            completed_at: parse_optional_datetime(row.completed_at)?,
            duration: row.duration,
            notes: row.notes,
            exercises,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CompletionRow {
    id: String,
    session_id: String,
    exercise_index: i64,
    completed_sets: Option<String>,
    completion_notes: Option<String>,
    skipped: bool,
    auto_completed: bool,
    completed_at: String,
}

impl TryFrom<CompletionRow> for ExerciseCompletionRecord {
    type Error = DomainError;

    fn try_from(row: CompletionRow) -> Result<Self, Self::Error> {
        let exercise_index = usize::try_from(row.exercise_index).map_err(|_| {
            DomainError::SerializationError(format!("Invalid exercise index: {}", row.exercise_index))
        })?;

        Ok(ExerciseCompletionRecord {
            id: parse_uuid(&row.id)?,
            session_id: parse_uuid(&row.session_id)?,
            exercise_index,
            completed_sets: parse_json_or_default(row.completed_sets)?,
            completion_notes: row.completion_notes,
            skipped: row.skipped,
            auto_completed: row.auto_completed,
            completed_at: parse_datetime(&row.completed_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::{ExerciseLogEntry, PersistedExercise, SetRecord};

    async fn setup_test_repo() -> SqliteWorkoutSessionRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteWorkoutSessionRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_find_resumable() {
        let repo = setup_test_repo().await;
        let session = repo.create_session("push-day", "alice").await.unwrap();

        let found = repo.find_resumable_session("alice", "push-day").await.unwrap();
        assert_eq!(found.map(|s| s.id), Some(session.id));

        assert!(repo.find_resumable_session("bob", "push-day").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_completed_session_is_not_resumable() {
        let repo = setup_test_repo().await;
        let session = repo.create_session("push-day", "alice").await.unwrap();

        let updated = repo
            .update_session(
                session.id,
                &SessionUpdate {
                    completed_at: Some(Utc::now()),
                    duration: Some(600),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.is_terminal());
        assert!(repo.find_resumable_session("alice", "push-day").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_per_index() {
        let repo = setup_test_repo().await;
        let session = repo.create_session("legs", "alice").await.unwrap();

        let first = repo
            .upsert_exercise_completion(session.id, 1, &NewExerciseCompletion::default())
            .await
            .unwrap();
        let second = repo
            .upsert_exercise_completion(
                session.id,
                1,
                &NewExerciseCompletion {
                    completed_sets: vec![SetRecord::planned(5, Some(100.0), None)],
                    notes: Some("heavy".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let all = repo.get_exercise_completions(session.id).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].completion_notes.as_deref(), Some("heavy"));
        assert_eq!(all[0].completed_sets[0].planned_weight, Some(100.0));
    }

    #[tokio::test]
    async fn test_upsert_unknown_session() {
        let repo = setup_test_repo().await;
        let missing = Uuid::new_v4();
        let err = repo
            .upsert_exercise_completion(missing, 0, &NewExerciseCompletion::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::SessionNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_update_session_persists_exercise_snapshot() {
        let repo = setup_test_repo().await;
        let session = repo.create_session("legs", "alice").await.unwrap();

        let entry = ExerciseLogEntry::new("squat", "Squat", 3, 5);
        repo.update_session(session.id, &SessionUpdate::exercises(vec![PersistedExercise::from(&entry)]))
            .await
            .unwrap();

        let reloaded = repo
            .find_resumable_session("alice", "legs")
            .await
            .unwrap()
            .unwrap();
        let exercises = reloaded.exercises.unwrap();
        assert_eq!(exercises[0].exercise_id, "squat");
        assert_eq!(exercises[0].sets.len(), 3);
    }
}
