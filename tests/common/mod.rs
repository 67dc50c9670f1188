//! Common test utilities for integration tests
//!
//! Shared fixtures for driving a `SessionLifecycleManager` against the
//! in-memory repository.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use workout_runner::adapters::InMemorySessionRepository;
use workout_runner::domain::errors::DomainError;
use workout_runner::domain::models::{
    CompletionStatus, ExerciseLogEntry, LifecycleState, Phase, SessionConfig, WorkoutSession,
};
use workout_runner::domain::ports::SessionObserver;
use workout_runner::infrastructure::retry::RetryPolicy;
use workout_runner::services::SessionLifecycleManager;

pub const WORKOUT: &str = "full-body-a";
pub const USER: &str = "user-1";

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Five exercises across all four phases, already in phase order.
///
/// `jog` and `stretch` have a single set.
pub fn five_exercise_plan() -> Vec<ExerciseLogEntry> {
    vec![
        ExerciseLogEntry::new("jog", "Easy Jog", 1, 0)
            .with_phase(Phase::Warmup)
            .with_duration(300),
        ExerciseLogEntry::new("squat", "Back Squat", 3, 5),
        ExerciseLogEntry::new("bench", "Bench Press", 3, 8),
        ExerciseLogEntry::new("row", "Rowing Machine", 2, 0)
            .with_phase(Phase::Cardio)
            .with_duration(600),
        ExerciseLogEntry::new("stretch", "Hamstring Stretch", 1, 0).with_phase(Phase::Cooldown),
    ]
}

pub const EXERCISE_IDS: [&str; 5] = ["jog", "squat", "bench", "row", "stretch"];

/// Two retries with 1-5 ms backoff.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(2, 1, 5)
}

pub fn manager_with(
    repo: &Arc<InMemorySessionRepository>,
    config: SessionConfig,
) -> SessionLifecycleManager {
    SessionLifecycleManager::new(repo.clone(), fast_retry(), config)
}

pub fn manager(repo: &Arc<InMemorySessionRepository>) -> SessionLifecycleManager {
    manager_with(repo, SessionConfig::default())
}

/// Start a fresh session on a new in-memory repository.
pub async fn started() -> (
    Arc<InMemorySessionRepository>,
    SessionLifecycleManager,
    WorkoutSession,
) {
    let repo = Arc::new(InMemorySessionRepository::new());
    let manager = manager(&repo);
    let session = manager
        .start_or_resume(WORKOUT, USER, five_exercise_plan())
        .await
        .expect("start should succeed");
    (repo, manager, session)
}

/// Observer that records every notification as a short string.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_lifecycle_changed(&self, from: LifecycleState, to: LifecycleState) {
        self.push(format!("lifecycle:{from}->{to}"));
    }

    fn on_exercise_changed(&self, index: usize) {
        self.push(format!("exercise:{index}"));
    }

    fn on_exercise_completed(&self, index: usize, status: &CompletionStatus) {
        self.push(format!("completed:{index}:{}", status.completion_method));
    }

    fn on_sync_failed(&self, index: usize, _error: &DomainError) {
        self.push(format!("sync_failed:{index}"));
    }

    fn on_auto_save_failed(&self, _error: &DomainError) {
        self.push("auto_save_failed".to_string());
    }

    fn on_forced_completion(&self, unresolved: &[String]) {
        self.push(format!("forced:{}", unresolved.len()));
    }

    fn on_workout_completed(&self, _session: &WorkoutSession) {
        self.push("workout_completed".to_string());
    }
}
