//! Session commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::adapters::sqlite::{initialize_database, PoolConfig, SqliteWorkoutSessionRepository};
use crate::cli::display::{action_failure, action_success, list_table, render_list};
use crate::cli::output::{output, truncate, CommandOutput};
use crate::cli::{Cli, Commands};
use crate::domain::models::{Config, SetCompletion, WorkoutPlan};
use crate::domain::ports::WorkoutSessionRepository;
use crate::infrastructure::retry::RetryPolicy;
use crate::services::{
    CompletionOutcome, ExerciseCompletionRequest, SessionLifecycleManager, SyncReport,
    WorkoutProgress,
};

#[derive(Debug, Serialize)]
pub struct ExerciseRow {
    pub number: usize,
    pub exercise_id: String,
    pub name: String,
    pub phase: String,
    pub sets_done: usize,
    pub sets_total: usize,
    pub completion: String,
    pub skipped: bool,
    pub needs_sync: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusOutput {
    pub message: Option<String>,
    pub session_id: String,
    pub workout_id: String,
    pub lifecycle: String,
    pub current_exercise: usize,
    pub current_phase: Option<String>,
    pub progress: WorkoutProgress,
    pub exercises: Vec<ExerciseRow>,
}

impl SessionStatusOutput {
    async fn collect(manager: &SessionLifecycleManager, message: Option<String>) -> Result<Self> {
        let session = manager.session().await.context("No session is open")?;
        let current = manager.current_exercise_index().await;

        let mut exercises = Vec::new();
        for (index, entry) in manager.exercise_logs().await.iter().enumerate() {
            let status = manager.get_completion_status(index).await.unwrap_or_default();
            exercises.push(ExerciseRow {
                number: index + 1,
                exercise_id: entry.exercise_id.clone(),
                name: entry.name.clone(),
                phase: entry.phase.label().to_string(),
                sets_done: entry.performed_set_count(),
                sets_total: entry.sets.len(),
                completion: status.completion_method.to_string(),
                skipped: entry.skipped,
                needs_sync: status.needs_sync,
            });
        }

        Ok(Self {
            message,
            session_id: session.id.to_string(),
            workout_id: session.workout_id,
            lifecycle: manager.lifecycle_state().await.to_string(),
            current_exercise: current + 1,
            current_phase: manager.current_phase().await.map(|p| p.to_string()),
            progress: manager.get_unified_progress().await,
            exercises,
        })
    }
}

impl CommandOutput for SessionStatusOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["", "#", "Exercise", "Phase", "Sets", "Status"]);
        for row in &self.exercises {
            let marker = if row.number == self.current_exercise { ">" } else { "" };
            let mut status = if row.skipped {
                "skipped".to_string()
            } else {
                row.completion.clone()
            };
            if row.needs_sync {
                status.push_str(" (unsaved)");
            }
            table.add_row(vec![
                marker.to_string(),
                row.number.to_string(),
                truncate(&row.name, 32),
                row.phase.clone(),
                format!("{}/{}", row.sets_done, row.sets_total),
                status,
            ]);
        }

        let mut lines = Vec::new();
        if let Some(message) = &self.message {
            lines.push(action_success(message));
        }
        lines.push(format!(
            "Session {} ({}) - {}/{} exercises, {}%",
            &self.session_id[..8],
            self.lifecycle,
            self.progress.completed,
            self.progress.total,
            self.progress.percentage
        ));
        if let Some(phase) = &self.current_phase {
            lines.push(format!("Current: {phase}"));
        }
        lines.push(render_list("exercise", &table, self.exercises.len()));
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct SyncOutput {
    pub synced: Vec<usize>,
    pub failed: Vec<usize>,
}

impl From<SyncReport> for SyncOutput {
    fn from(report: SyncReport) -> Self {
        let numbers = |indices: Vec<usize>| -> Vec<usize> { indices.into_iter().map(|i| i + 1).collect() };
        Self {
            synced: numbers(report.synced),
            failed: numbers(report.failed),
        }
    }
}

impl CommandOutput for SyncOutput {
    fn to_human(&self) -> String {
        let list = |numbers: &[usize]| {
            numbers
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        match (self.synced.is_empty(), self.failed.is_empty()) {
            (true, true) => action_success("Everything already in sync"),
            (_, true) => action_success(&format!("Synced exercises {}", list(&self.synced))),
            _ => action_failure(&format!(
                "Could not sync exercises {}",
                list(&self.failed)
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FinishOutput {
    pub completed: bool,
    pub forced: bool,
    pub duration_secs: Option<i64>,
    pub validation_errors: Vec<String>,
}

impl From<CompletionOutcome> for FinishOutput {
    fn from(outcome: CompletionOutcome) -> Self {
        match outcome {
            CompletionOutcome::Completed { session, forced } => Self {
                completed: true,
                forced,
                duration_secs: session.duration,
                validation_errors: Vec::new(),
            },
            CompletionOutcome::Blocked(result) => Self {
                completed: false,
                forced: false,
                duration_secs: None,
                validation_errors: result.validation_errors,
            },
        }
    }
}

impl CommandOutput for FinishOutput {
    fn to_human(&self) -> String {
        if !self.completed {
            let mut lines = vec![action_failure("Workout cannot be completed yet:")];
            lines.extend(self.validation_errors.iter().map(|e| format!("  - {e}")));
            return lines.join("\n");
        }

        let minutes = self.duration_secs.unwrap_or_default() / 60;
        let mut message = format!("Workout completed in {minutes} min");
        if self.forced {
            message.push_str(" (some completions were not saved)");
        }
        action_success(&message)
    }
}

async fn load_plan(path: &Path) -> Result<WorkoutPlan> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read plan {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("Invalid plan {}", path.display()))
}

/// Exercise and set numbers are 1-based on the command line.
fn to_index(number: usize, what: &str) -> Result<usize> {
    number
        .checked_sub(1)
        .with_context(|| format!("{what} numbers start at 1"))
}

async fn open_manager(config: &Config) -> Result<SessionLifecycleManager> {
    let pool = initialize_database(&config.database.url(), Some(PoolConfig::from(&config.database)))
        .await
        .context("Failed to open session database")?;
    let repo: Arc<dyn WorkoutSessionRepository> = Arc::new(SqliteWorkoutSessionRepository::new(pool));

    Ok(SessionLifecycleManager::new(
        repo,
        RetryPolicy::from(&config.retry),
        config.session.clone(),
    ))
}

async fn report(manager: &SessionLifecycleManager, message: Option<String>, json: bool) -> Result<()> {
    let status = SessionStatusOutput::collect(manager, message).await?;
    output(&status, json);
    Ok(())
}

pub async fn execute(cli: Cli, config: &Config) -> Result<()> {
    let plan = load_plan(&cli.plan).await?;
    let manager = open_manager(config).await?;
    manager
        .start_or_resume(&plan.workout_id, &cli.user, plan.exercise_logs())
        .await
        .context("Failed to start workout session")?;

    let json = cli.json;
    match cli.command {
        Commands::Start | Commands::Status => report(&manager, None, json).await,
        Commands::Next => {
            manager.next().await?;
            report(&manager, None, json).await
        }
        Commands::Previous => {
            manager.previous().await?;
            report(&manager, None, json).await
        }
        Commands::GoTo { exercise } => {
            manager.go_to(to_index(exercise, "Exercise")?).await?;
            report(&manager, None, json).await
        }
        Commands::Set {
            exercise,
            set,
            reps,
            weight,
            duration,
        } => {
            let data = SetCompletion {
                reps,
                weight,
                duration,
                ..Default::default()
            };
            manager
                .complete_set(to_index(exercise, "Exercise")?, to_index(set, "Set")?, &data)
                .await?;
            report(&manager, Some(format!("Recorded set {set} of exercise {exercise}")), json).await
        }
        Commands::AddSet { exercise } => {
            let count = manager.add_set(to_index(exercise, "Exercise")?).await?;
            report(&manager, Some(format!("Exercise {exercise} now has {count} sets")), json).await
        }
        Commands::RemoveSet { exercise, set } => {
            manager
                .remove_set(to_index(exercise, "Exercise")?, to_index(set, "Set")?)
                .await?;
            report(&manager, Some(format!("Removed set {set} from exercise {exercise}")), json).await
        }
        Commands::Complete {
            exercise_id,
            skip,
            notes,
        } => {
            let request = ExerciseCompletionRequest {
                skipped: skip,
                notes,
                ..Default::default()
            };
            let status = manager.complete_exercise(&exercise_id, request).await?;
            let message = if status.needs_sync {
                format!("Completed {exercise_id} locally; run `sync` to save it")
            } else {
                format!("Completed {exercise_id}")
            };
            report(&manager, Some(message), json).await
        }
        Commands::Sync => {
            let sync = manager.sync_all().await?;
            output(&SyncOutput::from(sync), json);
            Ok(())
        }
        Commands::Finish => {
            let outcome = manager.complete_workout().await?;
            output(&FinishOutput::from(outcome), json);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ValidationResult;

    #[test]
    fn test_to_index_is_one_based() {
        assert_eq!(to_index(1, "Exercise").unwrap(), 0);
        assert!(to_index(0, "Set").is_err());
    }

    #[test]
    fn test_sync_output_uses_exercise_numbers() {
        let out = SyncOutput::from(SyncReport {
            synced: vec![0, 2],
            failed: vec![],
        });
        assert_eq!(out.synced, vec![1, 3]);
        assert!(out.to_human().contains("1, 3"));
    }

    #[test]
    fn test_blocked_finish_lists_errors() {
        let out = FinishOutput::from(CompletionOutcome::Blocked(ValidationResult {
            validation_errors: vec!["Exercise 2 (Row) is not completed".to_string()],
            ..Default::default()
        }));
        assert!(!out.completed);
        assert!(out.to_human().contains("Exercise 2 (Row) is not completed"));
        assert_eq!(out.to_json()["completed"], serde_json::json!(false));
    }
}
