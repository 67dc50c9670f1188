//! Workout plan definition loaded by drivers.
//!
//! Plans are authored elsewhere; this is just the shape a driver reads to
//! seed a session's exercise log.

use serde::{Deserialize, Serialize};

use super::exercise::{ExerciseLogEntry, Phase, SetRecord};

/// A planned workout: an id plus its exercises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub workout_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub exercises: Vec<PlannedExercise>,
}

/// One exercise in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedExercise {
    pub exercise_id: String,
    pub name: String,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default = "default_sets")]
    pub sets: usize,
    #[serde(default)]
    pub reps: u32,
    #[serde(default)]
    pub weight: Option<f64>,
    /// Seconds per set for time-based work.
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub rest_time: u32,
}

const fn default_sets() -> usize {
    1
}

impl From<&PlannedExercise> for ExerciseLogEntry {
    fn from(planned: &PlannedExercise) -> Self {
        let set = SetRecord::planned(planned.reps, planned.weight, planned.duration);
        let mut entry = ExerciseLogEntry::new(
            planned.exercise_id.clone(),
            planned.name.clone(),
            planned.sets,
            planned.reps,
        )
        .with_sets(vec![set; planned.sets.max(1)])
        .with_phase(planned.phase)
        .with_rest_time(planned.rest_time);

        if planned.phase.is_time_based() {
            if let Some(per_set) = planned.duration {
                entry.duration = Some(per_set.saturating_mul(planned.sets.max(1) as u32));
            }
        }
        entry
    }
}

impl WorkoutPlan {
    /// Initial exercise log for a new session.
    pub fn exercise_logs(&self) -> Vec<ExerciseLogEntry> {
        self.exercises.iter().map(ExerciseLogEntry::from).collect()
    }
}
