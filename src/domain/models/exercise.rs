//! Exercise log domain model.
//!
//! An `ExerciseLogEntry` is the session-local working copy of one planned
//! exercise: its sets (planned vs. actual), its phase, and its local
//! completion timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Workout phase an exercise belongs to.
///
/// Declaration order is the order phases are walked during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Warmup,
    #[default]
    Main,
    Cardio,
    Cooldown,
}

impl Phase {
    /// All phases in walk order.
    pub const ALL: [Phase; 4] = [Self::Warmup, Self::Main, Self::Cardio, Self::Cooldown];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warmup => "warmup",
            Self::Main => "main",
            Self::Cardio => "cardio",
            Self::Cooldown => "cooldown",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "warmup" | "warm-up" | "warm_up" => Some(Self::Warmup),
            "main" => Some(Self::Main),
            "cardio" => Some(Self::Cardio),
            "cooldown" | "cool-down" | "cool_down" => Some(Self::Cooldown),
            _ => None,
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Warmup => "Warm-up",
            Self::Main => "Main",
            Self::Cardio => "Cardio",
            Self::Cooldown => "Cool-down",
        }
    }

    /// Bucket position in walk order.
    pub fn ordinal(&self) -> usize {
        match self {
            Self::Warmup => 0,
            Self::Main => 1,
            Self::Cardio => 2,
            Self::Cooldown => 3,
        }
    }

    /// Time-based phases record duration rather than reps.
    pub fn is_time_based(&self) -> bool {
        !matches!(self, Self::Main)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One set: planned values plus what was actually performed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetRecord {
    pub planned_reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_weight: Option<f64>,
    /// Planned duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_duration: Option<u32>,
}

impl SetRecord {
    pub fn planned(reps: u32, weight: Option<f64>, duration: Option<u32>) -> Self {
        Self {
            planned_reps: reps,
            planned_weight: weight,
            planned_duration: duration,
            ..Default::default()
        }
    }

    /// A set counts as performed once any actual value is recorded.
    pub fn is_performed(&self) -> bool {
        self.actual_reps.is_some() || self.actual_weight.is_some() || self.actual_duration.is_some()
    }

    /// A fresh set carrying only this set's planned values.
    pub fn clone_planned(&self) -> Self {
        Self::planned(self.planned_reps, self.planned_weight, self.planned_duration)
    }
}

/// Data submitted when a set is completed.
///
/// `reps`/`weight`/`duration` override the planned values; the `actual_*`
/// fields default to those values when not given separately.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetCompletion {
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub actual_reps: Option<u32>,
    #[serde(default)]
    pub actual_weight: Option<f64>,
    #[serde(default)]
    pub actual_duration: Option<u32>,
}

impl SetCompletion {
    pub fn reps(reps: u32) -> Self {
        Self {
            reps: Some(reps),
            ..Default::default()
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_duration(mut self, duration: u32) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_actual_reps(mut self, reps: u32) -> Self {
        self.actual_reps = Some(reps);
        self
    }
}

/// Session-local working copy of one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLogEntry {
    pub exercise_id: String,
    pub name: String,
    pub sets: Vec<SetRecord>,
    /// Rest between sets in seconds.
    #[serde(default)]
    pub rest_time: u32,
    #[serde(default)]
    pub phase: Phase,
    /// Total duration in seconds for time-based phases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub skipped: bool,
    /// Completed by the runner (e.g. a timer running out) rather than the user.
    #[serde(default)]
    pub auto_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ExerciseLogEntry {
    /// Create a main-phase exercise with `set_count` identical planned sets.
    ///
    /// At least one set is always created.
    pub fn new(
        exercise_id: impl Into<String>,
        name: impl Into<String>,
        set_count: usize,
        planned_reps: u32,
    ) -> Self {
        let set = SetRecord::planned(planned_reps, None, None);
        Self {
            exercise_id: exercise_id.into(),
            name: name.into(),
            sets: vec![set; set_count.max(1)],
            rest_time: 0,
            phase: Phase::Main,
            duration: None,
            completed_at: None,
            skipped: false,
            auto_completed: false,
            notes: None,
        }
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_rest_time(mut self, rest_time: u32) -> Self {
        self.rest_time = rest_time;
        self
    }

    pub fn with_duration(mut self, duration: u32) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_sets(mut self, sets: Vec<SetRecord>) -> Self {
        if !sets.is_empty() {
            self.sets = sets;
        }
        self
    }

    pub fn is_warmup(&self) -> bool {
        self.phase == Phase::Warmup
    }

    pub fn is_cardio(&self) -> bool {
        self.phase == Phase::Cardio
    }

    pub fn is_cooldown(&self) -> bool {
        self.phase == Phase::Cooldown
    }

    /// Local timestamp present: the authoritative "is done" signal.
    pub fn is_completed_locally(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Done or explicitly skipped.
    pub fn is_settled(&self) -> bool {
        self.completed_at.is_some() || self.skipped
    }

    pub fn performed_set_count(&self) -> usize {
        self.sets.iter().filter(|s| s.is_performed()).count()
    }
}

/// Persistence-safe projection of an exercise log entry.
///
/// Written on auto-save and on workout completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedExercise {
    pub exercise_id: String,
    pub name: String,
    pub phase: Phase,
    pub sets: Vec<SetRecord>,
    pub rest_time: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    pub completed_sets: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub auto_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&ExerciseLogEntry> for PersistedExercise {
    fn from(entry: &ExerciseLogEntry) -> Self {
        Self {
            exercise_id: entry.exercise_id.clone(),
            name: entry.name.clone(),
            phase: entry.phase,
            sets: entry.sets.clone(),
            rest_time: entry.rest_time,
            duration: entry.duration,
            completed_sets: entry.performed_set_count(),
            completed_at: entry.completed_at,
            skipped: entry.skipped,
            auto_completed: entry.auto_completed,
            notes: entry.notes.clone(),
        }
    }
}
