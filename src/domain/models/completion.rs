//! Completion records and the dual-source completion state.
//!
//! Completion is asserted by two independent sources: the local timestamp
//! on an `ExerciseLogEntry` and a durable `ExerciseCompletionRecord` held by
//! the persistence layer. `CompletionMethod` is the tagged merge of the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::exercise::SetRecord;

/// Durable record asserting an exercise was finished or skipped.
///
/// At most one exists per `(session_id, exercise_index)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseCompletionRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub exercise_index: usize,
    pub completed_sets: Vec<SetRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_notes: Option<String>,
    pub skipped: bool,
    pub auto_completed: bool,
    pub completed_at: DateTime<Utc>,
}

/// Payload for an idempotent completion upsert.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewExerciseCompletion {
    pub completed_sets: Vec<SetRecord>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub auto_completed: bool,
    /// Local completion time to carry over; the store stamps `now` if absent.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExerciseCompletionRecord {
    /// Build a record from an upsert payload.
    pub fn from_new(session_id: Uuid, exercise_index: usize, new: &NewExerciseCompletion) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            exercise_index,
            completed_sets: new.completed_sets.clone(),
            completion_notes: new.notes.clone(),
            skipped: new.skipped,
            auto_completed: new.auto_completed,
            completed_at: new.completed_at.unwrap_or_else(Utc::now),
        }
    }

    /// Apply an upsert payload onto an existing record, keeping its id.
    pub fn apply(&mut self, new: &NewExerciseCompletion) {
        self.completed_sets = new.completed_sets.clone();
        self.completion_notes = new.notes.clone();
        self.skipped = new.skipped;
        self.auto_completed = new.auto_completed;
        self.completed_at = new.completed_at.unwrap_or_else(Utc::now);
    }
}

/// Which source(s) currently assert an exercise is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionMethod {
    #[default]
    None,
    Local,
    Remote,
    Both,
}

impl CompletionMethod {
    /// Merge presence of the two sources into a single tag.
    pub const fn merge(has_local: bool, has_remote: bool) -> Self {
        match (has_local, has_remote) {
            (true, true) => Self::Both,
            (true, false) => Self::Local,
            (false, true) => Self::Remote,
            (false, false) => Self::None,
        }
    }

    /// The sources disagree.
    pub const fn needs_sync(&self) -> bool {
        matches!(self, Self::Local | Self::Remote)
    }

    pub const fn has_local(&self) -> bool {
        matches!(self, Self::Local | Self::Both)
    }

    pub const fn has_remote(&self) -> bool {
        matches!(self, Self::Remote | Self::Both)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Both => "both",
        }
    }
}

impl std::fmt::Display for CompletionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived completion status for one exercise. Never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStatus {
    pub is_completed: bool,
    pub completion_method: CompletionMethod,
    pub completed_at: Option<DateTime<Utc>>,
    pub needs_sync: bool,
}

impl CompletionStatus {
    /// Derive the status from the local timestamp and the remote record.
    ///
    /// `is_completed` follows the local timestamp only. `completed_at`
    /// prefers the local timestamp and falls back to the remote one.
    pub fn derive(
        local_completed_at: Option<DateTime<Utc>>,
        remote: Option<&ExerciseCompletionRecord>,
    ) -> Self {
        let method = CompletionMethod::merge(local_completed_at.is_some(), remote.is_some());
        Self {
            is_completed: local_completed_at.is_some(),
            completion_method: method,
            completed_at: local_completed_at.or_else(|| remote.map(|r| r.completed_at)),
            needs_sync: method.needs_sync(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize) -> ExerciseCompletionRecord {
        ExerciseCompletionRecord::from_new(Uuid::new_v4(), index, &NewExerciseCompletion::default())
    }

    #[test]
    fn test_merge_is_exhaustive() {
        assert_eq!(CompletionMethod::merge(true, true), CompletionMethod::Both);
        assert_eq!(CompletionMethod::merge(true, false), CompletionMethod::Local);
        assert_eq!(CompletionMethod::merge(false, true), CompletionMethod::Remote);
        assert_eq!(CompletionMethod::merge(false, false), CompletionMethod::None);
    }

    #[test]
    fn test_needs_sync_only_when_sources_disagree() {
        for (local, remote) in [(true, true), (true, false), (false, true), (false, false)] {
            let method = CompletionMethod::merge(local, remote);
            assert_eq!(method.needs_sync(), local != remote, "{method}");
            assert_eq!(method.has_local(), local);
            assert_eq!(method.has_remote(), remote);
        }
    }

    #[test]
    fn test_derive_local_only() {
        let now = Utc::now();
        let status = CompletionStatus::derive(Some(now), None);
        assert!(status.is_completed);
        assert_eq!(status.completion_method, CompletionMethod::Local);
        assert!(status.needs_sync);
        assert_eq!(status.completed_at, Some(now));
    }

    #[test]
    fn test_derive_remote_only_is_not_completed() {
        let remote = record(2);
        let status = CompletionStatus::derive(None, Some(&remote));
        assert!(!status.is_completed);
        assert_eq!(status.completion_method, CompletionMethod::Remote);
        assert!(status.needs_sync);
        assert_eq!(status.completed_at, Some(remote.completed_at));
    }

    #[test]
    fn test_apply_keeps_record_id() {
        let mut existing = record(0);
        let id = existing.id;
        existing.apply(&NewExerciseCompletion {
            skipped: true,
            notes: Some("knee".to_string()),
            ..Default::default()
        });
        assert_eq!(existing.id, id);
        assert!(existing.skipped);
        assert_eq!(existing.completion_notes.as_deref(), Some("knee"));
    }
}
