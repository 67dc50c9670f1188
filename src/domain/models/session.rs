//! Workout session domain model.
//!
//! A session is one pass through a workout's exercise list. It is terminal
//! once `completed_at` is set; until then it is resumable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::exercise::PersistedExercise;

/// Persisted workout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub workout_id: String,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Elapsed seconds from `started_at` to completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Last auto-saved exercise log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercises: Option<Vec<PersistedExercise>>,
}

impl WorkoutSession {
    pub fn new(workout_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            workout_id: workout_id.into(),
            user_id: user_id.into(),
            started_at: now,
            last_active_at: now,
            completed_at: None,
            duration: None,
            notes: None,
            exercises: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Non-terminal sessions can be reattached to.
    pub fn is_resumable(&self) -> bool {
        !self.is_terminal()
    }

    /// Apply a partial update, bumping `last_active_at`.
    pub fn apply(&mut self, update: &SessionUpdate) {
        if let Some(ref exercises) = update.exercises {
            self.exercises = Some(exercises.clone());
        }
        if let Some(completed_at) = update.completed_at {
            self.completed_at = Some(completed_at);
        }
        if let Some(duration) = update.duration {
            self.duration = Some(duration);
        }
        if let Some(ref notes) = update.notes {
            self.notes = Some(notes.clone());
        }
        self.last_active_at = Utc::now();
    }
}

/// Partial update for a session. Absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercises: Option<Vec<PersistedExercise>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SessionUpdate {
    pub fn exercises(exercises: Vec<PersistedExercise>) -> Self {
        Self {
            exercises: Some(exercises),
            ..Default::default()
        }
    }
}

/// Lifecycle of the in-process session owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Idle,
    Starting,
    Active,
    Completing,
    Completed,
    Exited,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Active => "active",
            Self::Completing => "completing",
            Self::Completed => "completed",
            Self::Exited => "exited",
        }
    }

    /// Allowed transitions of the session state machine.
    pub fn can_transition_to(&self, next: LifecycleState) -> bool {
        use LifecycleState::{Active, Completed, Completing, Exited, Idle, Starting};
        matches!(
            (self, next),
            (Idle | Exited, Starting)
                | (Starting, Active | Idle)
                | (Active, Completing | Exited)
                | (Completing, Completed | Active)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_resumable() {
        let session = WorkoutSession::new("push-day", "alice");
        assert!(session.is_resumable());
        assert!(session.exercises.is_none());
        assert_eq!(session.started_at, session.last_active_at);
    }

    #[test]
    fn test_apply_completion_makes_terminal() {
        let mut session = WorkoutSession::new("push-day", "alice");
        session.apply(&SessionUpdate {
            completed_at: Some(Utc::now()),
            duration: Some(1800),
            ..Default::default()
        });
        assert!(session.is_terminal());
        assert_eq!(session.duration, Some(1800));
        assert!(session.notes.is_none());
    }

    #[test]
    fn test_lifecycle_transitions() {
        use LifecycleState::*;
        assert!(Idle.can_transition_to(Starting));
        assert!(Starting.can_transition_to(Active));
        assert!(Active.can_transition_to(Completing));
        assert!(Completing.can_transition_to(Completed));
        assert!(Completing.can_transition_to(Active));
        assert!(Active.can_transition_to(Exited));
        assert!(Exited.can_transition_to(Starting));

        assert!(!Idle.can_transition_to(Active));
        assert!(!Active.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Starting));
        assert!(!Exited.can_transition_to(Completing));
    }
}
