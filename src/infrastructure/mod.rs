//! Infrastructure layer module
//!
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)
//! - Retry with exponential backoff for persistence calls

pub mod config;
pub mod logging;
pub mod retry;
