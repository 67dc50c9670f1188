//! Port trait definitions (Hexagonal Architecture)
//!
//! - `WorkoutSessionRepository`: persistence of sessions and completion records
//! - `SessionObserver`: change notifications pushed to the driver layer

pub mod session_observer;
pub mod session_repository;

pub use session_observer::{NullSessionObserver, SessionObserver};
pub use session_repository::WorkoutSessionRepository;
