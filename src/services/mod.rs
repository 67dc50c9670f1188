//! Session engine services.

pub mod navigation;
pub mod progress;
pub mod reconciler;
pub mod session_lifecycle;
pub mod set_tracker;
pub mod validation;

pub use navigation::{order_by_phase, ExerciseNavigationState, PhasePosition, PhaseSegments};
pub use progress::{ProgressAggregator, WorkoutProgress};
pub use reconciler::{
    CompletionReconciler, ConsistencyReport, ConsistencyStats, Inconsistency, IndexLocks,
    RemoteCompletions, SyncAction, SyncReport,
};
pub use session_lifecycle::{CompletionOutcome, ExerciseCompletionRequest, SessionLifecycleManager};
pub use set_tracker::SetCompletionTracker;
pub use validation::{ValidationEngine, ValidationResult};
