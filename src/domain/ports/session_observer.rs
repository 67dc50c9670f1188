//! Session observer port.
//!
//! Drivers (UI, CLI) subscribe to session changes through an injected
//! observer instead of a shared broadcast channel.

use crate::domain::errors::DomainError;
use crate::domain::models::{CompletionStatus, LifecycleState, WorkoutSession};

/// Receives notifications from a session owner. All methods default to no-ops.
pub trait SessionObserver: Send + Sync {
    fn on_lifecycle_changed(&self, _from: LifecycleState, _to: LifecycleState) {}

    fn on_exercise_changed(&self, _index: usize) {}

    fn on_exercise_completed(&self, _index: usize, _status: &CompletionStatus) {}

    fn on_sync_failed(&self, _index: usize, _error: &DomainError) {}

    /// Persisting the exercise log snapshot failed. Local state is kept.
    fn on_auto_save_failed(&self, _error: &DomainError) {}

    /// The workout was completed through the forced fallback path.
    fn on_forced_completion(&self, _unresolved: &[String]) {}

    fn on_workout_completed(&self, _session: &WorkoutSession) {}
}

/// An observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSessionObserver;

impl SessionObserver for NullSessionObserver {}
