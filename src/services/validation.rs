//! Pre-completion validation gate.
//!
//! Runs over the reconciler's view and never mutates anything. A workout
//! may only be completed when every exercise is done or skipped, every
//! local completion has been acknowledged by the store, and at least one
//! exercise was actually performed.

use serde::Serialize;

use crate::domain::models::CompletionMethod;
use crate::services::reconciler::CompletionReconciler;

/// Error reported when nothing in the workout was completed.
pub const NOTHING_COMPLETED: &str = "No exercises have been completed";

/// Structured outcome of a validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub validation_errors: Vec<String>,
    /// Indices with neither a timestamp nor a skip.
    pub incomplete: Vec<usize>,
    /// Indices completed locally but not yet saved.
    pub unsynced: Vec<usize>,
    /// Exercises completed without being skipped.
    pub completed_count: usize,
}

impl ValidationResult {
    /// Only unsaved completions stand between this workout and completion.
    ///
    /// These can be repaired by a sync; nothing else can.
    pub fn only_unsynced(&self) -> bool {
        !self.is_valid && self.incomplete.is_empty() && self.completed_count > 0
    }
}

/// Validates a workout before its terminal transition.
pub struct ValidationEngine;

impl ValidationEngine {
    pub fn validate_workout_completion(reconciler: &CompletionReconciler<'_>) -> ValidationResult {
        let mut result = ValidationResult::default();

        for (i, entry) in reconciler.logs().iter().enumerate() {
            if !entry.is_settled() {
                result.incomplete.push(i);
                result
                    .validation_errors
                    .push(format!("Exercise {} ({}) is not completed", i + 1, entry.name));
            }

            if reconciler.method(i) == CompletionMethod::Local {
                result.unsynced.push(i);
                result
                    .validation_errors
                    .push(format!("Exercise {} completion not saved", i + 1));
            }

            if entry.completed_at.is_some() && !entry.skipped {
                result.completed_count += 1;
            }
        }

        if result.completed_count == 0 {
            result.validation_errors.push(NOTHING_COMPLETED.to_string());
        }

        result.is_valid =
            result.incomplete.is_empty() && result.unsynced.is_empty() && result.completed_count > 0;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ExerciseCompletionRecord, ExerciseLogEntry, NewExerciseCompletion};
    use crate::services::reconciler::RemoteCompletions;
    use chrono::Utc;
    use uuid::Uuid;

    fn logs() -> Vec<ExerciseLogEntry> {
        vec![
            ExerciseLogEntry::new("squat", "Squat", 3, 5),
            ExerciseLogEntry::new("bench", "Bench", 3, 5),
            ExerciseLogEntry::new("row", "Row", 3, 5),
        ]
    }

    fn synced(logs: &mut [ExerciseLogEntry], remote: &mut RemoteCompletions, i: usize) {
        logs[i].completed_at = Some(Utc::now());
        remote.insert(
            i,
            ExerciseCompletionRecord::from_new(Uuid::new_v4(), i, &NewExerciseCompletion::default()),
        );
    }

    #[test]
    fn test_all_synced_is_valid() {
        let mut logs = logs();
        let mut remote = RemoteCompletions::new();
        for i in 0..3 {
            synced(&mut logs, &mut remote, i);
        }
        let result =
            ValidationEngine::validate_workout_completion(&CompletionReconciler::new(&logs, &remote));
        assert!(result.is_valid);
        assert!(result.validation_errors.is_empty());
        assert_eq!(result.completed_count, 3);
    }

    #[test]
    fn test_incomplete_exercise_is_named() {
        let mut logs = logs();
        let mut remote = RemoteCompletions::new();
        synced(&mut logs, &mut remote, 0);
        synced(&mut logs, &mut remote, 1);

        let result =
            ValidationEngine::validate_workout_completion(&CompletionReconciler::new(&logs, &remote));
        assert!(!result.is_valid);
        assert_eq!(result.incomplete, vec![2]);
        assert!(result
            .validation_errors
            .contains(&"Exercise 3 (Row) is not completed".to_string()));
        assert!(!result.only_unsynced());
    }

    #[test]
    fn test_local_only_is_not_saved() {
        let mut logs = logs();
        let mut remote = RemoteCompletions::new();
        synced(&mut logs, &mut remote, 0);
        synced(&mut logs, &mut remote, 1);
        logs[2].completed_at = Some(Utc::now());

        let result =
            ValidationEngine::validate_workout_completion(&CompletionReconciler::new(&logs, &remote));
        assert!(!result.is_valid);
        assert_eq!(result.unsynced, vec![2]);
        assert_eq!(
            result.validation_errors,
            vec!["Exercise 3 completion not saved".to_string()]
        );
        assert!(result.only_unsynced());
    }

    #[test]
    fn test_skipped_counts_as_settled_but_not_completed() {
        let mut logs = logs();
        let mut remote = RemoteCompletions::new();
        for i in 0..3 {
            synced(&mut logs, &mut remote, i);
            logs[i].skipped = true;
        }

        let result =
            ValidationEngine::validate_workout_completion(&CompletionReconciler::new(&logs, &remote));
        assert!(!result.is_valid);
        assert!(result.incomplete.is_empty());
        assert_eq!(result.validation_errors, vec![NOTHING_COMPLETED.to_string()]);
    }

    #[test]
    fn test_empty_workout_is_invalid() {
        let logs: Vec<ExerciseLogEntry> = Vec::new();
        let remote = RemoteCompletions::new();
        let result =
            ValidationEngine::validate_workout_completion(&CompletionReconciler::new(&logs, &remote));
        assert!(!result.is_valid);
        assert_eq!(result.completed_count, 0);
    }
}
