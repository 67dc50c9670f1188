//! Persistence adapters for the session repository port.

pub mod memory;
pub mod sqlite;

pub use memory::InMemorySessionRepository;
pub use sqlite::SqliteWorkoutSessionRepository;
