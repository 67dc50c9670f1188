//! Domain layer for the workout session engine
//!
//! This module contains core models, port traits and errors.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
