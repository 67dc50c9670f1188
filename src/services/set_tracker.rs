//! Per-set planned vs. actual tracking for one exercise.

use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ExerciseLogEntry, SetCompletion, SetRecord};

/// Mutable view over the sets of a single exercise log entry.
///
/// All set mutation goes through here so the minimum-of-one-set invariant
/// holds.
pub struct SetCompletionTracker<'a> {
    exercise_index: usize,
    entry: &'a mut ExerciseLogEntry,
}

impl<'a> SetCompletionTracker<'a> {
    pub fn new(exercise_index: usize, entry: &'a mut ExerciseLogEntry) -> Self {
        Self {
            exercise_index,
            entry,
        }
    }

    pub fn sets(&self) -> &[SetRecord] {
        &self.entry.sets
    }

    /// Record a completed set.
    ///
    /// Provided `reps`/`weight`/`duration` overwrite the planned values.
    /// Actual values fall back to those when not given separately.
    pub fn complete_set(&mut self, set_index: usize, data: &SetCompletion) -> DomainResult<&SetRecord> {
        let len = self.entry.sets.len();
        let set = self
            .entry
            .sets
            .get_mut(set_index)
            .ok_or(DomainError::SetOutOfRange {
                exercise_index: self.exercise_index,
                set_index,
                len,
            })?;

        if let Some(reps) = data.reps {
            set.planned_reps = reps;
        }
        if let Some(weight) = data.weight {
            set.planned_weight = Some(weight);
        }
        if let Some(duration) = data.duration {
            set.planned_duration = Some(duration);
        }

        set.actual_reps = data.actual_reps.or(data.reps);
        set.actual_weight = data.actual_weight.or(data.weight);
        set.actual_duration = data.actual_duration.or(data.duration);

        debug!(
            exercise_index = self.exercise_index,
            set_index,
            actual_reps = ?set.actual_reps,
            actual_weight = ?set.actual_weight,
            "set completed"
        );
        Ok(set)
    }

    /// Append a set carrying the last set's planned values.
    pub fn add_set(&mut self) -> usize {
        let next = self
            .entry
            .sets
            .last()
            .map_or_else(SetRecord::default, SetRecord::clone_planned);
        self.entry.sets.push(next);
        self.entry.sets.len()
    }

    /// Remove a set from the end of the list, refusing to leave the
    /// exercise with none.
    ///
    /// Only the last set can go, so earlier set numbers never shift.
    pub fn remove_set(&mut self, set_index: usize) -> DomainResult<SetRecord> {
        let len = self.entry.sets.len();
        if set_index >= len {
            return Err(DomainError::SetOutOfRange {
                exercise_index: self.exercise_index,
                set_index,
                len,
            });
        }
        if len <= 1 {
            return Err(DomainError::LastSetRemoval(self.exercise_index));
        }
        if set_index + 1 != len {
            return Err(DomainError::SetNotLast {
                exercise_index: self.exercise_index,
                set_index,
                len,
            });
        }
        self.entry
            .sets
            .pop()
            .ok_or(DomainError::LastSetRemoval(self.exercise_index))
    }
}
