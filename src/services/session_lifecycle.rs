//! Session lifecycle orchestration.
//!
//! `SessionLifecycleManager` is the single owner of an active workout. It
//! holds the exercise log, navigation pointer and remote completion cache
//! behind one lock, and is the only path through which they change.
//!
//! Persistence calls are never made while that lock is held, so callers
//! can keep navigating while a save is in flight. Writes to the same
//! exercise index are serialised through `IndexLocks`. Replacing the
//! exercise list excludes every per-index writer for its duration.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CompletionStatus, ExerciseCompletionRecord, ExerciseLogEntry, LifecycleState,
    NewExerciseCompletion, PersistedExercise, SessionConfig, SessionUpdate, SetCompletion,
    SetRecord, WorkoutSession,
};
use crate::domain::ports::{NullSessionObserver, SessionObserver, WorkoutSessionRepository};
use crate::infrastructure::retry::RetryPolicy;
use crate::services::navigation::{order_by_phase, ExerciseNavigationState, PhasePosition};
use crate::services::progress::{ProgressAggregator, WorkoutProgress};
use crate::services::reconciler::{
    apply_backfill, push_completion, CompletionReconciler, ConsistencyReport, IndexLocks,
    RemoteCompletions, SyncAction, SyncReport,
};
use crate::services::set_tracker::SetCompletionTracker;
use crate::services::validation::{ValidationEngine, ValidationResult};

/// Input for completing (or skipping) an exercise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExerciseCompletionRequest {
    /// Final set data. Empty keeps the sets already tracked.
    pub completed_sets: Vec<SetRecord>,
    pub skipped: bool,
    pub auto_completed: bool,
    pub notes: Option<String>,
}

impl ExerciseCompletionRequest {
    pub fn skip() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Result of `complete_workout`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompletionOutcome {
    /// The session was written as terminal.
    Completed {
        session: WorkoutSession,
        /// Completed through the fallback path with unsaved completions.
        forced: bool,
    },
    /// Validation refused the transition. Nothing was written.
    Blocked(ValidationResult),
}

impl CompletionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Collapse a blocked outcome into `DomainError::ValidationFailed`.
    pub fn into_result(self) -> DomainResult<WorkoutSession> {
        match self {
            Self::Completed { session, .. } => Ok(session),
            Self::Blocked(result) => Err(DomainError::ValidationFailed(result.validation_errors)),
        }
    }
}

#[derive(Debug, Default)]
struct WorkoutState {
    session: Option<WorkoutSession>,
    logs: Vec<ExerciseLogEntry>,
    navigation: ExerciseNavigationState,
    remote: RemoteCompletions,
    lifecycle: LifecycleState,
}

impl WorkoutState {
    fn reconciler(&self) -> CompletionReconciler<'_> {
        CompletionReconciler::new(&self.logs, &self.remote)
    }

    fn snapshot(&self) -> Vec<PersistedExercise> {
        self.logs.iter().map(PersistedExercise::from).collect()
    }

    fn active_session_id(&self) -> DomainResult<Uuid> {
        match (&self.session, self.lifecycle) {
            (Some(session), LifecycleState::Active) => Ok(session.id),
            _ => Err(DomainError::NoActiveSession),
        }
    }

    /// Session id while active or completing.
    fn open_session_id(&self) -> DomainResult<Uuid> {
        match (&self.session, self.lifecycle) {
            (Some(session), LifecycleState::Active | LifecycleState::Completing) => Ok(session.id),
            _ => Err(DomainError::NoActiveSession),
        }
    }

    fn exercise_mut(&mut self, index: usize) -> DomainResult<&mut ExerciseLogEntry> {
        let len = self.logs.len();
        self.logs
            .get_mut(index)
            .ok_or(DomainError::ExerciseOutOfRange { index, len })
    }
}

/// Owner of one active workout session.
pub struct SessionLifecycleManager {
    repo: Arc<dyn WorkoutSessionRepository>,
    observer: Arc<dyn SessionObserver>,
    retry: RetryPolicy,
    config: SessionConfig,
    state: RwLock<WorkoutState>,
    /// Shared by per-index writers, exclusive for `replace_exercises`.
    list_lock: RwLock<()>,
    index_locks: IndexLocks,
}

impl SessionLifecycleManager {
    pub fn new(
        repo: Arc<dyn WorkoutSessionRepository>,
        retry: RetryPolicy,
        config: SessionConfig,
    ) -> Self {
        Self {
            repo,
            observer: Arc::new(NullSessionObserver),
            retry,
            config,
            state: RwLock::new(WorkoutState::default()),
            list_lock: RwLock::new(()),
            index_locks: IndexLocks::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    fn grace_period(&self) -> Duration {
        Duration::from_secs(self.config.resume_grace_period_secs)
    }

    /// Move the state machine, notifying the observer.
    fn transition(&self, state: &mut WorkoutState, to: LifecycleState) -> DomainResult<()> {
        let from = state.lifecycle;
        if !from.can_transition_to(to) {
            return Err(DomainError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        state.lifecycle = to;
        info!(%from, %to, "session lifecycle transition");
        self.observer.on_lifecycle_changed(from, to);
        Ok(())
    }

    /// Enter `Starting`, or short-circuit when a start already happened.
    async fn begin_start(&self) -> DomainResult<Option<WorkoutSession>> {
        let mut state = self.state.write().await;
        match state.lifecycle {
            LifecycleState::Active => Ok(state.session.clone()),
            LifecycleState::Starting => Err(DomainError::StartInProgress),
            _ => {
                self.transition(&mut state, LifecycleState::Starting)?;
                Ok(None)
            }
        }
    }

    async fn abort_start(&self) {
        let mut state = self.state.write().await;
        if state.lifecycle == LifecycleState::Starting {
            let _ = self.transition(&mut state, LifecycleState::Idle);
        }
    }

    /// Run a best-effort read, retrying until the grace window closes.
    async fn within_grace<T, F, Fut>(&self, what: &'static str, operation: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DomainResult<T>>,
    {
        match timeout(self.grace_period(), self.retry.execute(operation)).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(err)) => {
                warn!(error = %err, "{what} failed, continuing without it");
                None
            }
            Err(_) => {
                warn!(
                    grace_secs = self.config.resume_grace_period_secs,
                    "{what} timed out, continuing without it"
                );
                None
            }
        }
    }

    /// Reattach to the resumable session for `(user_id, workout_id)`, or
    /// create a new one.
    ///
    /// A second call while a session is active returns that session. A call
    /// racing an in-flight start is rejected with `StartInProgress`.
    #[instrument(skip(self, initial_logs), fields(exercises = initial_logs.len()), err)]
    pub async fn start_or_resume(
        &self,
        workout_id: &str,
        user_id: &str,
        initial_logs: Vec<ExerciseLogEntry>,
    ) -> DomainResult<WorkoutSession> {
        if let Some(existing) = self.begin_start().await? {
            debug!(session_id = %existing.id, "session already active");
            return Ok(existing);
        }

        let repo = &self.repo;
        let found = self
            .within_grace("resumable session lookup", || async move {
                repo.find_resumable_session(user_id, workout_id).await
            })
            .await
            .flatten();

        let result = match found {
            Some(session) => {
                let session_id = session.id;
                let completions = self
                    .within_grace("completion history fetch", || async move {
                        repo.get_exercise_completions(session_id).await
                    })
                    .await
                    .unwrap_or_default();
                info!(%session_id, completions = completions.len(), "resuming session");
                Ok(self.install(session, completions, initial_logs).await)
            }
            None => match self
                .retry
                .execute(|| async move { repo.create_session(workout_id, user_id).await })
                .await
            {
                Ok(session) => {
                    info!(session_id = %session.id, "created new session");
                    Ok(self.install(session, Vec::new(), initial_logs).await)
                }
                Err(err) => Err(err),
            },
        };

        if result.is_err() {
            self.abort_start().await;
        }
        result
    }

    /// Resume a known session with its completion records.
    ///
    /// Remote completions are backfilled onto the local log and the pointer
    /// lands one past the highest completed index.
    #[instrument(skip(self, completions, initial_logs), fields(session_id = %session.id), err)]
    pub async fn resume_session(
        &self,
        session: WorkoutSession,
        completions: Vec<ExerciseCompletionRecord>,
        initial_logs: Vec<ExerciseLogEntry>,
    ) -> DomainResult<WorkoutSession> {
        if let Some(existing) = self.begin_start().await? {
            return Ok(existing);
        }
        Ok(self.install(session, completions, initial_logs).await)
    }

    async fn install(
        &self,
        session: WorkoutSession,
        completions: Vec<ExerciseCompletionRecord>,
        initial_logs: Vec<ExerciseLogEntry>,
    ) -> WorkoutSession {
        let mut logs = order_by_phase(initial_logs);
        if let Some(saved) = &session.exercises {
            restore_snapshot(&mut logs, saved);
        }

        let mut remote = RemoteCompletions::new();
        for record in completions {
            let index = record.exercise_index;
            let Some(entry) = logs.get_mut(index) else {
                warn!(index, "ignoring completion for unknown exercise index");
                continue;
            };
            apply_backfill(entry, &record);
            remote.insert(index, record);
        }

        let mut navigation = ExerciseNavigationState::new(&logs);
        navigation.reset_to(remote.keys().max().map_or(0, |max| max + 1));
        let index = navigation.current();

        let mut state = self.state.write().await;
        state.logs = logs;
        state.remote = remote;
        state.navigation = navigation;
        state.session = Some(session.clone());
        // Starting -> Active always holds here.
        let _ = self.transition(&mut state, LifecycleState::Active);
        drop(state);

        self.observer.on_exercise_changed(index);
        session
    }

    async fn navigate(
        &self,
        step: impl FnOnce(&mut ExerciseNavigationState) -> bool,
    ) -> DomainResult<usize> {
        let mut state = self.state.write().await;
        state.active_session_id()?;
        let moved = step(&mut state.navigation);
        let index = state.navigation.current();
        drop(state);

        if moved {
            self.observer.on_exercise_changed(index);
        }
        Ok(index)
    }

    /// Advance one exercise; returns the (possibly unchanged) index.
    pub async fn next(&self) -> DomainResult<usize> {
        self.navigate(ExerciseNavigationState::next).await
    }

    pub async fn previous(&self) -> DomainResult<usize> {
        self.navigate(ExerciseNavigationState::previous).await
    }

    /// Jump to `index`. Out-of-range targets leave the pointer where it is.
    pub async fn go_to(&self, index: usize) -> DomainResult<usize> {
        self.navigate(|nav| nav.go_to(index)).await
    }

    /// Persist the full exercise log.
    async fn auto_save(&self, session_id: Uuid, snapshot: Vec<PersistedExercise>) -> DomainResult<()> {
        let update = SessionUpdate::exercises(snapshot);
        let update = &update;
        let repo = &self.repo;
        let saved = self
            .retry
            .execute(|| async move { repo.update_session(session_id, update).await })
            .await
            .inspect_err(|err| {
                warn!(%session_id, error = %err, "auto-save failed");
                self.observer.on_auto_save_failed(err);
            })?;

        let mut state = self.state.write().await;
        if let Some(session) = state.session.as_mut().filter(|s| s.id == saved.id) {
            *session = saved;
        }
        Ok(())
    }

    /// Mutate one exercise's sets under its index lock, then auto-save.
    async fn mutate_sets<T>(
        &self,
        exercise_index: usize,
        mutate: impl FnOnce(&mut SetCompletionTracker<'_>) -> DomainResult<T>,
    ) -> DomainResult<T> {
        let _list = self.list_lock.read().await;
        let _guard = self.index_locks.acquire(exercise_index).await;

        let (session_id, value, snapshot) = {
            let mut state = self.state.write().await;
            let session_id = state.active_session_id()?;
            let entry = state.exercise_mut(exercise_index)?;
            let value = mutate(&mut SetCompletionTracker::new(exercise_index, entry))?;
            (session_id, value, state.snapshot())
        };

        self.auto_save(session_id, snapshot).await?;
        Ok(value)
    }

    /// Record one set. The local change stays even if the auto-save fails;
    /// the save error is returned.
    #[instrument(skip(self, data), err)]
    pub async fn complete_set(
        &self,
        exercise_index: usize,
        set_index: usize,
        data: &SetCompletion,
    ) -> DomainResult<SetRecord> {
        self.mutate_sets(exercise_index, |tracker| {
            tracker.complete_set(set_index, data).cloned()
        })
        .await
    }

    /// Append a set; returns the new set count.
    #[instrument(skip(self), err)]
    pub async fn add_set(&self, exercise_index: usize) -> DomainResult<usize> {
        self.mutate_sets(exercise_index, |tracker| Ok(tracker.add_set()))
            .await
    }

    #[instrument(skip(self), err)]
    pub async fn remove_set(&self, exercise_index: usize, set_index: usize) -> DomainResult<SetRecord> {
        self.mutate_sets(exercise_index, |tracker| tracker.remove_set(set_index))
            .await
    }

    /// Mark an exercise complete (or skipped), push the record and
    /// auto-save the log.
    ///
    /// The local timestamp is set first. A failed push does not fail the
    /// call: the returned status reports `needs_sync` and the observer is
    /// told through `on_sync_failed`.
    #[instrument(skip(self, request), err)]
    pub async fn complete_exercise(
        &self,
        exercise_id: &str,
        request: ExerciseCompletionRequest,
    ) -> DomainResult<CompletionStatus> {
        let _list = self.list_lock.read().await;
        let index = {
            let state = self.state.read().await;
            state.active_session_id()?;
            state
                .logs
                .iter()
                .position(|e| e.exercise_id == exercise_id)
                .ok_or_else(|| DomainError::ExerciseNotFound(exercise_id.to_string()))?
        };

        let _guard = self.index_locks.acquire(index).await;

        let (session_id, completion, advanced_to) = {
            let mut state = self.state.write().await;
            let session_id = state.active_session_id()?;
            let entry = state
                .logs
                .get_mut(index)
                .filter(|e| e.exercise_id == exercise_id)
                .ok_or_else(|| DomainError::ExerciseNotFound(exercise_id.to_string()))?;

            if !request.completed_sets.is_empty() {
                entry.sets = request.completed_sets;
            }
            let completed_at = *entry.completed_at.get_or_insert_with(Utc::now);
            entry.skipped = request.skipped;
            entry.auto_completed = request.auto_completed;
            if request.notes.is_some() {
                entry.notes = request.notes;
            }

            let completion = NewExerciseCompletion {
                completed_sets: entry.sets.clone(),
                notes: entry.notes.clone(),
                skipped: entry.skipped,
                auto_completed: entry.auto_completed,
                completed_at: Some(completed_at),
            };

            let advanced_to = (state.navigation.current() == index && state.navigation.next())
                .then(|| state.navigation.current());
            (session_id, completion, advanced_to)
        };

        if let Some(next) = advanced_to {
            self.observer.on_exercise_changed(next);
        }

        match push_completion(&self.repo, &self.retry, session_id, index, &completion).await {
            Ok(record) => self.accept_record(index, exercise_id, record).await,
            Err(err) => {
                warn!(index, error = %err, "completion saved locally only");
                self.observer.on_sync_failed(index, &err);
            }
        }

        // The snapshot carries the local timestamp across restarts even when
        // the record push failed. A failed save reaches the observer through
        // `on_auto_save_failed` and leaves the completion in place.
        let snapshot = self.state.read().await.snapshot();
        if self.auto_save(session_id, snapshot).await.is_err() {
            debug!(index, "completion kept without a saved snapshot");
        }

        let status = self.status_or_range_error(index).await?;
        self.observer.on_exercise_completed(index, &status);
        Ok(status)
    }

    /// Cache an acknowledged record, provided `exercise_id` still sits at
    /// `index`.
    async fn accept_record(&self, index: usize, exercise_id: &str, record: ExerciseCompletionRecord) {
        let mut state = self.state.write().await;
        if state.logs.get(index).is_some_and(|e| e.exercise_id == exercise_id) {
            state.remote.insert(index, record);
        } else {
            warn!(index, exercise_id, "exercise moved before its record was acknowledged");
        }
    }

    async fn status_or_range_error(&self, index: usize) -> DomainResult<CompletionStatus> {
        let state = self.state.read().await;
        state
            .reconciler()
            .status(index)
            .ok_or(DomainError::ExerciseOutOfRange {
                index,
                len: state.logs.len(),
            })
    }

    /// Repair divergence for one exercise. Idempotent.
    pub async fn sync_completion_state(&self, index: usize) -> DomainResult<CompletionStatus> {
        self.state.read().await.active_session_id()?;
        self.sync_index(index).await
    }

    #[instrument(skip(self), err)]
    async fn sync_index(&self, index: usize) -> DomainResult<CompletionStatus> {
        let _list = self.list_lock.read().await;
        let _guard = self.index_locks.acquire(index).await;

        let (session_id, exercise_id, action) = {
            let state = self.state.read().await;
            let session_id = state.open_session_id()?;
            let out_of_range = || DomainError::ExerciseOutOfRange {
                index,
                len: state.logs.len(),
            };
            let exercise_id = state
                .logs
                .get(index)
                .map(|e| e.exercise_id.clone())
                .ok_or_else(out_of_range)?;
            let action = state.reconciler().plan_sync(index).ok_or_else(out_of_range)?;
            (session_id, exercise_id, action)
        };

        match action {
            SyncAction::InSync => debug!(index, "completion already in sync"),
            SyncAction::PushLocal(completion) => {
                match push_completion(&self.repo, &self.retry, session_id, index, &completion).await {
                    Ok(record) => {
                        self.accept_record(index, &exercise_id, record).await;
                        info!(index, "pushed local completion");
                    }
                    Err(err) => {
                        warn!(index, error = %err, "completion sync failed");
                        self.observer.on_sync_failed(index, &err);
                        return Err(DomainError::Consistency {
                            index,
                            reason: err.to_string(),
                        });
                    }
                }
            }
            SyncAction::BackfillLocal { .. } => {
                let mut state = self.state.write().await;
                let WorkoutState { logs, remote, .. } = &mut *state;
                if let (Some(entry), Some(record)) = (logs.get_mut(index), remote.get(&index)) {
                    apply_backfill(entry, record);
                    info!(index, "backfilled remote completion");
                }
            }
        }

        self.status_or_range_error(index).await
    }

    /// Sync every exercise that needs it.
    pub async fn sync_all(&self) -> DomainResult<SyncReport> {
        self.state.read().await.active_session_id()?;
        Ok(self.sync_pending().await)
    }

    async fn sync_pending(&self) -> SyncReport {
        let pending = self.state.read().await.reconciler().consistency_report().sync_needed;
        let mut report = SyncReport::default();
        for index in pending {
            match self.sync_index(index).await {
                Ok(_) => report.synced.push(index),
                Err(_) => report.failed.push(index),
            }
        }
        debug!(synced = report.synced.len(), failed = report.failed.len(), "sync pass finished");
        report
    }

    /// Swap in an edited exercise list, re-segmenting and clamping the
    /// pointer.
    ///
    /// Waits for every in-flight set mutation, completion push and sync to
    /// finish first. A cached completion record is kept only when the same
    /// exercise still sits at its index.
    #[instrument(skip(self, logs), fields(exercises = logs.len()), err)]
    pub async fn replace_exercises(&self, logs: Vec<ExerciseLogEntry>) -> DomainResult<usize> {
        let _list = self.list_lock.write().await;

        let (session_id, before, after, snapshot) = {
            let mut state = self.state.write().await;
            let session_id = state.active_session_id()?;
            let before = state.navigation.current();

            let previous = std::mem::replace(&mut state.logs, order_by_phase(logs));
            let WorkoutState {
                logs,
                navigation,
                remote,
                ..
            } = &mut *state;
            let cached = remote.len();
            remote.retain(|&index, _| match (previous.get(index), logs.get(index)) {
                (Some(old), Some(new)) => old.exercise_id == new.exercise_id,
                _ => false,
            });
            if remote.len() < cached {
                debug!(dropped = cached - remote.len(), "dropped records for moved exercises");
            }
            navigation.rebuild(logs);

            (session_id, before, state.navigation.current(), state.snapshot())
        };

        if before != after {
            self.observer.on_exercise_changed(after);
        }
        self.auto_save(session_id, snapshot).await?;
        Ok(after)
    }

    /// Leave the workout early. The session stays resumable and nothing is
    /// written.
    pub async fn exit(&self) -> DomainResult<()> {
        let mut state = self.state.write().await;
        state.active_session_id()?;
        self.transition(&mut state, LifecycleState::Exited)
    }

    /// Validate and, if allowed, write the session as terminal.
    ///
    /// Missing completions block immediately with no persistence call.
    /// Unsaved completions trigger up to `completion_retry_budget` sync
    /// rounds; if they remain, the session is force-completed when
    /// configured to, otherwise blocked.
    #[instrument(skip(self), err)]
    pub async fn complete_workout(&self) -> DomainResult<CompletionOutcome> {
        {
            let mut state = self.state.write().await;
            state.active_session_id()?;
            self.transition(&mut state, LifecycleState::Completing)?;
        }

        let mut rounds = 0;
        loop {
            let validation = self.validate_workout_completion().await;
            if validation.is_valid {
                return self.finalize(false).await;
            }

            if !validation.only_unsynced() {
                info!(errors = ?validation.validation_errors, "workout completion blocked");
                return self.block(validation).await;
            }

            if rounds >= self.config.completion_retry_budget {
                if !self.config.force_complete_on_exhaustion {
                    return self.block(validation).await;
                }
                error!(
                    unresolved = ?validation.validation_errors,
                    "completing workout with unsaved exercise completions"
                );
                self.observer.on_forced_completion(&validation.validation_errors);
                return self.finalize(true).await;
            }

            rounds += 1;
            let report = self.sync_pending().await;
            debug!(round = rounds, failed = ?report.failed, "sync before completion");
        }
    }

    async fn block(&self, validation: ValidationResult) -> DomainResult<CompletionOutcome> {
        let mut state = self.state.write().await;
        self.transition(&mut state, LifecycleState::Active)?;
        Ok(CompletionOutcome::Blocked(validation))
    }

    async fn finalize(&self, forced: bool) -> DomainResult<CompletionOutcome> {
        let (session_id, started_at, snapshot) = {
            let state = self.state.read().await;
            let session = state.session.as_ref().ok_or(DomainError::NoActiveSession)?;
            (session.id, session.started_at, state.snapshot())
        };

        let completed_at = Utc::now();
        let update = SessionUpdate {
            exercises: Some(snapshot),
            completed_at: Some(completed_at),
            duration: Some((completed_at - started_at).num_seconds().max(0)),
            notes: None,
        };
        let update = &update;
        let repo = &self.repo;
        let saved = self
            .retry
            .execute(|| async move { repo.update_session(session_id, update).await })
            .await;

        let mut state = self.state.write().await;
        match saved {
            Ok(session) => {
                state.session = Some(session.clone());
                self.transition(&mut state, LifecycleState::Completed)?;
                drop(state);
                info!(%session_id, duration = ?session.duration, forced, "workout completed");
                self.observer.on_workout_completed(&session);
                Ok(CompletionOutcome::Completed { session, forced })
            }
            Err(err) => {
                self.transition(&mut state, LifecycleState::Active)?;
                Err(err)
            }
        }
    }

    pub async fn current_exercise(&self) -> Option<ExerciseLogEntry> {
        let state = self.state.read().await;
        state.logs.get(state.navigation.current()).cloned()
    }

    pub async fn current_exercise_index(&self) -> usize {
        self.state.read().await.navigation.current()
    }

    pub async fn current_phase(&self) -> Option<PhasePosition> {
        self.state.read().await.navigation.phase_position()
    }

    pub async fn exercise_logs(&self) -> Vec<ExerciseLogEntry> {
        self.state.read().await.logs.clone()
    }

    pub async fn is_exercise_completed(&self, index: usize) -> bool {
        self.state.read().await.reconciler().is_completed(index)
    }

    pub async fn get_completion_status(&self, index: usize) -> Option<CompletionStatus> {
        self.state.read().await.reconciler().status(index)
    }

    pub async fn get_unified_progress(&self) -> WorkoutProgress {
        ProgressAggregator::unified_progress(&self.state.read().await.reconciler())
    }

    pub async fn validate_workout_completion(&self) -> ValidationResult {
        ValidationEngine::validate_workout_completion(&self.state.read().await.reconciler())
    }

    pub async fn validate_completion_consistency(&self) -> ConsistencyReport {
        self.state.read().await.reconciler().consistency_report()
    }

    pub async fn session(&self) -> Option<WorkoutSession> {
        self.state.read().await.session.clone()
    }

    pub async fn lifecycle_state(&self) -> LifecycleState {
        self.state.read().await.lifecycle
    }
}

/// Restore set data from an auto-saved log when it still matches the plan
/// exercise for exercise.
fn restore_snapshot(logs: &mut [ExerciseLogEntry], saved: &[PersistedExercise]) {
    let matches = logs.len() == saved.len()
        && logs
            .iter()
            .zip(saved)
            .all(|(entry, saved)| entry.exercise_id == saved.exercise_id);
    if !matches {
        debug!("saved exercise log does not match plan, ignoring it");
        return;
    }

    for (entry, saved) in logs.iter_mut().zip(saved) {
        if !saved.sets.is_empty() {
            entry.sets = saved.sets.clone();
        }
        entry.completed_at = saved.completed_at;
        entry.skipped = saved.skipped;
        entry.auto_completed = saved.auto_completed;
        entry.notes = saved.notes.clone();
    }
}
