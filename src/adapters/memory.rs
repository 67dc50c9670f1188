//! In-process WorkoutSessionRepository.
//!
//! Keeps sessions and completion records in memory with the same upsert
//! semantics as the SQLite adapter. Failures can be injected per call kind
//! and every call is counted, which makes it the adapter the session
//! engine is tested against.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ExerciseCompletionRecord, NewExerciseCompletion, SessionUpdate, WorkoutSession,
};
use crate::domain::ports::WorkoutSessionRepository;

#[derive(Debug, Default)]
struct Store {
    sessions: HashMap<Uuid, WorkoutSession>,
    completions: HashMap<(Uuid, usize), ExerciseCompletionRecord>,
}

/// Call counts per repository operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create: usize,
    pub lookup: usize,
    pub fetch: usize,
    pub upsert: usize,
    pub update: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.create + self.lookup + self.fetch + self.upsert + self.update
    }
}

#[derive(Debug, Default)]
struct Counters {
    create: AtomicUsize,
    lookup: AtomicUsize,
    fetch: AtomicUsize,
    upsert: AtomicUsize,
    update: AtomicUsize,
}

#[derive(Debug, Default)]
struct Faults {
    offline: AtomicBool,
    latency_ms: AtomicU64,
    lookups: AtomicUsize,
    fetches: AtomicUsize,
    upserts: AtomicUsize,
    updates: AtomicUsize,
}

/// Consume one queued failure, if any.
fn take(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    store: Mutex<Store>,
    calls: Counters,
    faults: Faults,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with a network error while offline.
    pub fn set_offline(&self, offline: bool) {
        self.faults.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.faults.latency_ms.store(ms, Ordering::SeqCst);
    }

    pub fn fail_next_lookups(&self, n: usize) {
        self.faults.lookups.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_fetches(&self, n: usize) {
        self.faults.fetches.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_upserts(&self, n: usize) {
        self.faults.upserts.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_updates(&self, n: usize) {
        self.faults.updates.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            create: self.calls.create.load(Ordering::SeqCst),
            lookup: self.calls.lookup.load(Ordering::SeqCst),
            fetch: self.calls.fetch.load(Ordering::SeqCst),
            upsert: self.calls.upsert.load(Ordering::SeqCst),
            update: self.calls.update.load(Ordering::SeqCst),
        }
    }

    /// Seed a session directly.
    pub async fn insert_session(&self, session: WorkoutSession) {
        self.store.lock().await.sessions.insert(session.id, session);
    }

    /// Seed a completion record directly.
    pub async fn insert_completion(&self, record: ExerciseCompletionRecord) {
        self.store
            .lock()
            .await
            .completions
            .insert((record.session_id, record.exercise_index), record);
    }

    pub async fn stored_session(&self, id: Uuid) -> Option<WorkoutSession> {
        self.store.lock().await.sessions.get(&id).cloned()
    }

    pub async fn completion_count(&self, session_id: Uuid) -> usize {
        self.store
            .lock()
            .await
            .completions
            .keys()
            .filter(|(id, _)| *id == session_id)
            .count()
    }

    async fn enter(&self, counter: &AtomicUsize, queued: Option<&AtomicUsize>, op: &str) -> DomainResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);

        let latency = self.faults.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.faults.offline.load(Ordering::SeqCst) || queued.is_some_and(take) {
            return Err(DomainError::Network(format!("{op}: connection unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkoutSessionRepository for InMemorySessionRepository {
    async fn create_session(&self, workout_id: &str, user_id: &str) -> DomainResult<WorkoutSession> {
        self.enter(&self.calls.create, None, "create_session").await?;

        let session = WorkoutSession::new(workout_id, user_id);
        self.store
            .lock()
            .await
            .sessions
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_resumable_session(
        &self,
        user_id: &str,
        workout_id: &str,
    ) -> DomainResult<Option<WorkoutSession>> {
        self.enter(&self.calls.lookup, Some(&self.faults.lookups), "find_resumable_session")
            .await?;

        let store = self.store.lock().await;
        Ok(store
            .sessions
            .values()
            .filter(|s| s.user_id == user_id && s.workout_id == workout_id && s.is_resumable())
            .max_by_key(|s| s.last_active_at)
            .cloned())
    }

    async fn get_exercise_completions(
        &self,
        session_id: Uuid,
    ) -> DomainResult<Vec<ExerciseCompletionRecord>> {
        self.enter(&self.calls.fetch, Some(&self.faults.fetches), "get_exercise_completions")
            .await?;

        let store = self.store.lock().await;
        let mut records: Vec<_> = store
            .completions
            .values()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.exercise_index);
        Ok(records)
    }

    async fn upsert_exercise_completion(
        &self,
        session_id: Uuid,
        exercise_index: usize,
        completion: &NewExerciseCompletion,
    ) -> DomainResult<ExerciseCompletionRecord> {
        self.enter(&self.calls.upsert, Some(&self.faults.upserts), "upsert_exercise_completion")
            .await?;

        let mut store = self.store.lock().await;
        if !store.sessions.contains_key(&session_id) {
            return Err(DomainError::SessionNotFound(session_id));
        }

        let record = store
            .completions
            .entry((session_id, exercise_index))
            .and_modify(|existing| existing.apply(completion))
            .or_insert_with(|| ExerciseCompletionRecord::from_new(session_id, exercise_index, completion));
        Ok(record.clone())
    }

    async fn update_session(
        &self,
        session_id: Uuid,
        update: &SessionUpdate,
    ) -> DomainResult<WorkoutSession> {
        self.enter(&self.calls.update, Some(&self.faults.updates), "update_session")
            .await?;

        let mut store = self.store.lock().await;
        let session = store
            .sessions
            .get_mut(&session_id)
            .ok_or(DomainError::SessionNotFound(session_id))?;
        session.apply(update);
        Ok(session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_keeps_one_record_per_index() {
        let repo = InMemorySessionRepository::new();
        let session = repo.create_session("w", "u").await.unwrap();

        let first = repo
            .upsert_exercise_completion(session.id, 0, &NewExerciseCompletion::default())
            .await
            .unwrap();
        let second = repo
            .upsert_exercise_completion(
                session.id,
                0,
                &NewExerciseCompletion {
                    skipped: true,
                    completed_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.skipped);
        assert_eq!(repo.completion_count(session.id).await, 1);
        assert_eq!(repo.calls().upsert, 2);
    }

    #[tokio::test]
    async fn test_queued_failures_are_consumed() {
        let repo = InMemorySessionRepository::new();
        let session = repo.create_session("w", "u").await.unwrap();
        repo.fail_next_upserts(1);

        let err = repo
            .upsert_exercise_completion(session.id, 0, &NewExerciseCompletion::default())
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert!(repo
            .upsert_exercise_completion(session.id, 0, &NewExerciseCompletion::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_offline_fails_everything() {
        let repo = InMemorySessionRepository::new();
        repo.set_offline(true);
        assert!(repo.create_session("w", "u").await.is_err());
        assert!(repo.find_resumable_session("u", "w").await.is_err());

        repo.set_offline(false);
        assert!(repo.find_resumable_session("u", "w").await.unwrap().is_none());
        assert_eq!(repo.calls().total(), 3);
    }

    #[tokio::test]
    async fn test_terminal_sessions_are_not_resumable() {
        let repo = InMemorySessionRepository::new();
        let session = repo.create_session("w", "u").await.unwrap();
        repo.update_session(
            session.id,
            &SessionUpdate {
                completed_at: Some(Utc::now()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(repo.find_resumable_session("u", "w").await.unwrap().is_none());
    }
}
