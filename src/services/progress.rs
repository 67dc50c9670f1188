//! Unified workout progress.

use serde::Serialize;

use crate::services::reconciler::CompletionReconciler;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkoutProgress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
}

/// Derives progress from the reconciler's `is_completed`, the same signal
/// validation uses, so the two never disagree about what is done.
pub struct ProgressAggregator;

impl ProgressAggregator {
    pub fn unified_progress(reconciler: &CompletionReconciler<'_>) -> WorkoutProgress {
        let total = reconciler.len();
        let completed = (0..total).filter(|&i| reconciler.is_completed(i)).count();
        WorkoutProgress {
            completed,
            total,
            percentage: percentage(completed, total),
        }
    }
}

/// `round(100 * completed / total)`, 0 for an empty workout.
pub fn percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * completed as f64 / total as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ExerciseLogEntry;
    use crate::services::reconciler::RemoteCompletions;
    use chrono::Utc;

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn test_progress_ignores_remote_only() {
        let mut logs: Vec<_> = (0..4)
            .map(|i| ExerciseLogEntry::new(format!("e{i}"), "E", 1, 1))
            .collect();
        logs[0].completed_at = Some(Utc::now());
        let remote = RemoteCompletions::new();

        let progress = ProgressAggregator::unified_progress(&CompletionReconciler::new(&logs, &remote));
        assert_eq!(
            progress,
            WorkoutProgress {
                completed: 1,
                total: 4,
                percentage: 25
            }
        );
    }
}
