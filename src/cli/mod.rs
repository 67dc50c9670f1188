//! Command-line driver for the session engine.
//!
//! Every invocation reattaches to (or starts) the user's session for the
//! given plan, runs one command against it and exits.

pub mod commands;
pub mod display;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "workout-runner", version, about = "Guided workout session runner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Config file (defaults to .workout-runner/config.yaml + local.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Workout plan YAML file
    #[arg(short, long)]
    pub plan: PathBuf,

    /// User the session belongs to
    #[arg(short, long)]
    pub user: String,
}

/// Exercise and set numbers on the command line are 1-based.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Start a new session or resume the open one
    Start,
    /// Show session progress and exercise states
    Status,
    /// Move to the next exercise
    Next,
    /// Move to the previous exercise
    Previous,
    /// Jump to an exercise
    GoTo {
        /// Exercise number
        exercise: usize,
    },
    /// Record a completed set
    Set {
        /// Exercise number
        exercise: usize,
        /// Set number
        set: usize,
        /// Reps performed
        #[arg(short, long)]
        reps: Option<u32>,
        /// Weight used
        #[arg(short, long)]
        weight: Option<f64>,
        /// Duration in seconds
        #[arg(short, long)]
        duration: Option<u32>,
    },
    /// Add a set to an exercise
    AddSet {
        /// Exercise number
        exercise: usize,
    },
    /// Remove the last set from an exercise
    RemoveSet {
        /// Exercise number
        exercise: usize,
        /// Set number (must be the last set)
        set: usize,
    },
    /// Mark an exercise complete
    Complete {
        /// Exercise id from the plan
        exercise_id: String,
        /// Record the exercise as skipped
        #[arg(long)]
        skip: bool,
        /// Completion notes
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Push unsaved completions and backfill remote ones
    Sync,
    /// Validate and complete the workout
    Finish,
}

/// Print an error in the selected output mode and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({ "error": format!("{err:#}") });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{}", display::action_failure(&format!("{err:#}")));
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_command() {
        let cli = Cli::try_parse_from([
            "workout-runner", "--plan", "push.yaml", "--user", "alice", "set", "2", "1", "--reps", "8",
            "--weight", "60",
        ])
        .unwrap();
        assert_eq!(cli.user, "alice");
        assert_eq!(
            cli.command,
            Commands::Set {
                exercise: 2,
                set: 1,
                reps: Some(8),
                weight: Some(60.0),
                duration: None
            }
        );
    }

    #[test]
    fn test_global_json_flag_after_subcommand() {
        let cli = Cli::try_parse_from([
            "workout-runner", "-p", "push.yaml", "-u", "alice", "complete", "squat", "--skip", "--json",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Complete { skip: true, .. }));
    }

    #[test]
    fn test_plan_is_required() {
        assert!(Cli::try_parse_from(["workout-runner", "--user", "alice", "status"]).is_err());
    }
}
