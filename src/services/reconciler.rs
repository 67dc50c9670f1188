//! Completion reconciliation between local timestamps and durable records.
//!
//! The reconciler reads the two sources, classifies each exercise with
//! `CompletionMethod::merge`, and plans one-directional repairs:
//! local-only state is pushed to the store, remote-only state is
//! backfilled onto the in-memory log. Executing a push is asynchronous and
//! serialised per exercise index through `IndexLocks`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CompletionMethod, CompletionStatus, ExerciseCompletionRecord, ExerciseLogEntry,
    NewExerciseCompletion, SetRecord,
};
use crate::domain::ports::WorkoutSessionRepository;
use crate::infrastructure::retry::RetryPolicy;

/// Remote completion records keyed by exercise index.
pub type RemoteCompletions = HashMap<usize, ExerciseCompletionRecord>;

/// Repair needed to bring one exercise back into agreement.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    /// Already `both` or `none`.
    InSync,
    /// Local-only: submit this completion to the store.
    PushLocal(NewExerciseCompletion),
    /// Remote-only: copy the record onto the local entry.
    BackfillLocal {
        completed_at: DateTime<Utc>,
        skipped: bool,
        completed_sets: Vec<SetRecord>,
    },
}

/// One exercise whose sources disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inconsistency {
    pub index: usize,
    pub exercise_name: String,
    pub has_local: bool,
    pub has_remote: bool,
    pub completion_method: CompletionMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyStats {
    pub total: usize,
    pub local_only: usize,
    pub remote_only: usize,
    pub both: usize,
    pub none: usize,
    pub needs_sync_count: usize,
}

/// Result of a full consistency sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    pub inconsistencies: Vec<Inconsistency>,
    pub sync_needed: Vec<usize>,
    pub stats: ConsistencyStats,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.sync_needed.is_empty()
    }
}

/// Outcome of a `sync_all` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub synced: Vec<usize>,
    pub failed: Vec<usize>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Read-only view over both completion sources.
pub struct CompletionReconciler<'a> {
    logs: &'a [ExerciseLogEntry],
    remote: &'a RemoteCompletions,
}

impl<'a> CompletionReconciler<'a> {
    pub fn new(logs: &'a [ExerciseLogEntry], remote: &'a RemoteCompletions) -> Self {
        Self { logs, remote }
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    pub fn logs(&self) -> &'a [ExerciseLogEntry] {
        self.logs
    }

    /// Status for one exercise; `None` when the index is out of range.
    pub fn status(&self, index: usize) -> Option<CompletionStatus> {
        let entry = self.logs.get(index)?;
        Some(CompletionStatus::derive(
            entry.completed_at,
            self.remote.get(&index),
        ))
    }

    /// Local timestamp present. This is what navigation, progress and
    /// validation all treat as "done".
    pub fn is_completed(&self, index: usize) -> bool {
        self.logs
            .get(index)
            .is_some_and(ExerciseLogEntry::is_completed_locally)
    }

    pub fn method(&self, index: usize) -> CompletionMethod {
        self.status(index)
            .map_or(CompletionMethod::None, |s| s.completion_method)
    }

    /// Plan the repair for one exercise. `None` when out of range.
    pub fn plan_sync(&self, index: usize) -> Option<SyncAction> {
        let entry = self.logs.get(index)?;
        let remote = self.remote.get(&index);

        let action = match (entry.completed_at, remote) {
            (Some(completed_at), None) => SyncAction::PushLocal(NewExerciseCompletion {
                completed_sets: entry.sets.clone(),
                notes: entry.notes.clone(),
                skipped: entry.skipped,
                auto_completed: entry.auto_completed,
                completed_at: Some(completed_at),
            }),
            (None, Some(record)) => SyncAction::BackfillLocal {
                completed_at: record.completed_at,
                skipped: record.skipped,
                completed_sets: record.completed_sets.clone(),
            },
            _ => SyncAction::InSync,
        };
        Some(action)
    }

    /// Full sweep of both sources. Pure read.
    pub fn consistency_report(&self) -> ConsistencyReport {
        let mut report = ConsistencyReport::default();
        report.stats.total = self.logs.len();

        for (index, entry) in self.logs.iter().enumerate() {
            let has_local = entry.completed_at.is_some();
            let has_remote = self.remote.contains_key(&index);
            let method = CompletionMethod::merge(has_local, has_remote);

            match method {
                CompletionMethod::Local => report.stats.local_only += 1,
                CompletionMethod::Remote => report.stats.remote_only += 1,
                CompletionMethod::Both => report.stats.both += 1,
                CompletionMethod::None => report.stats.none += 1,
            }

            if method.needs_sync() {
                report.stats.needs_sync_count += 1;
                report.sync_needed.push(index);
                report.inconsistencies.push(Inconsistency {
                    index,
                    exercise_name: entry.name.clone(),
                    has_local,
                    has_remote,
                    completion_method: method,
                });
            }
        }

        report
    }
}

/// Copy a remote record onto a local entry.
///
/// A non-empty set snapshot replaces the local sets.
pub fn apply_backfill(entry: &mut ExerciseLogEntry, record: &ExerciseCompletionRecord) {
    entry.completed_at = Some(record.completed_at);
    entry.skipped = record.skipped;
    entry.auto_completed = record.auto_completed;
    if !record.completed_sets.is_empty() {
        entry.sets = record.completed_sets.clone();
    }
    if entry.notes.is_none() {
        entry.notes = record.completion_notes.clone();
    }
}

/// Submit a completion upsert with retry. The record only counts as synced
/// once this returns `Ok`.
#[instrument(skip(repo, retry, completion), err)]
pub async fn push_completion(
    repo: &Arc<dyn WorkoutSessionRepository>,
    retry: &RetryPolicy,
    session_id: Uuid,
    exercise_index: usize,
    completion: &NewExerciseCompletion,
) -> DomainResult<ExerciseCompletionRecord> {
    let record = retry
        .execute(|| async move {
            repo.upsert_exercise_completion(session_id, exercise_index, completion)
                .await
        })
        .await?;
    debug!(exercise_index, record_id = %record.id, "completion acknowledged");
    Ok(record)
}

/// One async mutex per exercise index.
///
/// Holders of an index's guard are the only writers for that index, which
/// keeps at most one sync or save in flight per exercise.
#[derive(Debug, Default)]
pub struct IndexLocks {
    locks: Mutex<HashMap<usize, Arc<AsyncMutex<()>>>>,
}

impl IndexLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `index`.
    pub async fn acquire(&self, index: usize) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            Arc::clone(locks.entry(index).or_default())
        };
        lock.lock_owned().await
    }

    /// Whether some task currently holds the guard for `index`.
    pub fn is_locked(&self, index: usize) -> bool {
        let locks = self
            .locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        locks.get(&index).is_some_and(|lock| lock.try_lock().is_err())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logs(n: usize) -> Vec<ExerciseLogEntry> {
        (0..n)
            .map(|i| ExerciseLogEntry::new(format!("ex{i}"), format!("Exercise {i}"), 2, 10))
            .collect()
    }

    fn remote_record(index: usize) -> ExerciseCompletionRecord {
        ExerciseCompletionRecord::from_new(
            Uuid::new_v4(),
            index,
            &NewExerciseCompletion {
                completed_sets: vec![SetRecord::planned(12, None, None)],
                skipped: false,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_status_covers_all_methods() {
        let mut logs = logs(4);
        logs[0].completed_at = Some(Utc::now());
        logs[1].completed_at = Some(Utc::now());
        let mut remote = RemoteCompletions::new();
        remote.insert(1, remote_record(1));
        remote.insert(2, remote_record(2));

        let reconciler = CompletionReconciler::new(&logs, &remote);
        assert_eq!(reconciler.method(0), CompletionMethod::Local);
        assert_eq!(reconciler.method(1), CompletionMethod::Both);
        assert_eq!(reconciler.method(2), CompletionMethod::Remote);
        assert_eq!(reconciler.method(3), CompletionMethod::None);
        assert!(reconciler.status(4).is_none());

        assert!(reconciler.is_completed(0));
        assert!(!reconciler.is_completed(2));
    }

    #[test]
    fn test_plan_sync_directions() {
        let mut logs = logs(3);
        let stamp = Utc::now();
        logs[0].completed_at = Some(stamp);
        logs[0].skipped = true;
        logs[0].auto_completed = true;
        let mut remote = RemoteCompletions::new();
        remote.insert(1, remote_record(1));

        let reconciler = CompletionReconciler::new(&logs, &remote);

        match reconciler.plan_sync(0).unwrap() {
            SyncAction::PushLocal(new) => {
                assert!(new.skipped);
                assert!(new.auto_completed);
                assert_eq!(new.completed_at, Some(stamp));
                assert_eq!(new.completed_sets.len(), 2);
            }
            other => panic!("expected push, got {other:?}"),
        }

        match reconciler.plan_sync(1).unwrap() {
            SyncAction::BackfillLocal { completed_sets, .. } => {
                assert_eq!(completed_sets[0].planned_reps, 12);
            }
            other => panic!("expected backfill, got {other:?}"),
        }

        assert_eq!(reconciler.plan_sync(2), Some(SyncAction::InSync));
        assert_eq!(reconciler.plan_sync(9), None);
    }

    #[test]
    fn test_consistency_report_stats() {
        let mut logs = logs(5);
        logs[0].completed_at = Some(Utc::now());
        logs[1].completed_at = Some(Utc::now());
        let mut remote = RemoteCompletions::new();
        remote.insert(1, remote_record(1));
        remote.insert(3, remote_record(3));

        let reconciler = CompletionReconciler::new(&logs, &remote);
        let report = reconciler.consistency_report();

        assert_eq!(report.sync_needed, vec![0, 3]);
        assert_eq!(report.inconsistencies.len(), 2);
        assert_eq!(report.inconsistencies[0].exercise_name, "Exercise 0");
        assert!(report.inconsistencies[1].has_remote);
        assert_eq!(
            report.stats,
            ConsistencyStats {
                total: 5,
                local_only: 1,
                remote_only: 1,
                both: 1,
                none: 2,
                needs_sync_count: 2,
            }
        );
        assert!(!report.is_consistent());

        // Pure read: a second sweep is identical.
        assert_eq!(reconciler.consistency_report(), report);
    }

    #[test]
    fn test_apply_backfill() {
        let mut entry = ExerciseLogEntry::new("row", "Row", 3, 10);
        let record = remote_record(0);
        apply_backfill(&mut entry, &record);

        assert_eq!(entry.completed_at, Some(record.completed_at));
        assert_eq!(entry.sets.len(), 1);
        assert!(!entry.skipped);
    }

    #[tokio::test]
    async fn test_index_locks_serialize_same_index() {
        let locks = IndexLocks::new();

        let guard = locks.acquire(1).await;
        assert!(locks.is_locked(1));
        assert!(!locks.is_locked(2));

        // A different index is independent.
        let other = locks.acquire(2).await;
        drop(other);

        drop(guard);
        assert!(!locks.is_locked(1));
        let _again = locks.acquire(1).await;
    }
}
