//! Shared display primitives for CLI output.

pub mod table;

pub use table::{list_table, render_list};

/// Render a success action result.
pub fn action_success(message: &str) -> String {
    format!("{} {}", console::style("\u{2713}").green().bold(), message)
}

/// Render a failure action result.
pub fn action_failure(message: &str) -> String {
    format!("{} {}", console::style("\u{2717}").red().bold(), message)
}
