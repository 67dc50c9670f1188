//! Exercise navigation with bounds safety and phase segmentation.
//!
//! Exercises are walked in phase order (warm-up, main, cardio, cool-down).
//! The flat pointer is mapped to a position within its phase through
//! precomputed bucket boundaries, so lookups never rescan the list.

use serde::Serialize;
use tracing::debug;

use crate::domain::models::{ExerciseLogEntry, Phase};

/// Stable partition of exercises into phase order.
///
/// Relative order within each phase is preserved.
pub fn order_by_phase(logs: Vec<ExerciseLogEntry>) -> Vec<ExerciseLogEntry> {
    let mut buckets: [Vec<ExerciseLogEntry>; 4] = Default::default();
    for entry in logs {
        buckets[entry.phase.ordinal()].push(entry);
    }
    buckets.into_iter().flatten().collect()
}

/// Where a flat index falls within the phase segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhasePosition {
    pub phase: Phase,
    /// Zero-based position inside the phase.
    pub position: usize,
    pub phase_size: usize,
}

impl std::fmt::Display for PhasePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{}", self.phase, self.position + 1, self.phase_size)
    }
}

/// Bucket sizes and prefix-sum starts for a phase-ordered exercise list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseSegments {
    sizes: [usize; 4],
    starts: [usize; 4],
}

impl PhaseSegments {
    /// Build boundaries for a list already in phase order.
    pub fn from_ordered(logs: &[ExerciseLogEntry]) -> Self {
        let mut sizes = [0usize; 4];
        for entry in logs {
            sizes[entry.phase.ordinal()] += 1;
        }
        let mut starts = [0usize; 4];
        for i in 1..4 {
            starts[i] = starts[i - 1] + sizes[i - 1];
        }
        Self { sizes, starts }
    }

    pub fn size(&self, phase: Phase) -> usize {
        self.sizes[phase.ordinal()]
    }

    pub fn start(&self, phase: Phase) -> usize {
        self.starts[phase.ordinal()]
    }

    pub fn total(&self) -> usize {
        self.starts[3] + self.sizes[3]
    }

    /// Phase, position within phase and phase size for a flat index.
    pub fn locate(&self, index: usize) -> Option<PhasePosition> {
        Phase::ALL.into_iter().find_map(|phase| {
            let start = self.start(phase);
            let size = self.size(phase);
            (index >= start && index < start + size).then_some(PhasePosition {
                phase,
                position: index - start,
                phase_size: size,
            })
        })
    }
}

/// Current exercise pointer plus the segmentation it moves over.
///
/// Invariant: `current < len` whenever `len > 0`, otherwise `current == 0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExerciseNavigationState {
    current: usize,
    len: usize,
    segments: PhaseSegments,
}

impl ExerciseNavigationState {
    /// Navigation over a phase-ordered list, starting at index 0.
    pub fn new(logs: &[ExerciseLogEntry]) -> Self {
        Self {
            current: 0,
            len: logs.len(),
            segments: PhaseSegments::from_ordered(logs),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn segments(&self) -> &PhaseSegments {
        &self.segments
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.len
    }

    pub fn has_previous(&self) -> bool {
        self.current > 0
    }

    /// Move forward one exercise. No-op on the last exercise.
    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.current += 1;
        debug!(index = self.current, "navigated to next exercise");
        true
    }

    /// Move back one exercise. No-op on the first exercise.
    pub fn previous(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.current -= 1;
        debug!(index = self.current, "navigated to previous exercise");
        true
    }

    /// Jump to `index`. No-op when out of bounds.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.len {
            debug!(index, len = self.len, "ignoring out-of-range navigation");
            return false;
        }
        self.current = index;
        true
    }

    /// Set the pointer, clamping into bounds instead of ignoring.
    pub fn reset_to(&mut self, index: usize) {
        self.current = index.min(self.len.saturating_sub(1));
    }

    /// Rebuild after the exercise list changed and clamp the pointer.
    pub fn rebuild(&mut self, logs: &[ExerciseLogEntry]) {
        self.len = logs.len();
        self.segments = PhaseSegments::from_ordered(logs);
        self.clamp();
    }

    fn clamp(&mut self) {
        let last = self.len.saturating_sub(1);
        if self.current > last {
            debug!(from = self.current, to = last, "clamping exercise pointer");
            self.current = last;
        }
    }

    /// Phase position of the current exercise.
    pub fn phase_position(&self) -> Option<PhasePosition> {
        self.segments.locate(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, phase: Phase) -> ExerciseLogEntry {
        ExerciseLogEntry::new(id, id, 1, 10).with_phase(phase)
    }

    fn mixed_logs() -> Vec<ExerciseLogEntry> {
        vec![
            entry("squat", Phase::Main),
            entry("stretch", Phase::Cooldown),
            entry("bike", Phase::Warmup),
            entry("bench", Phase::Main),
            entry("row", Phase::Cardio),
            entry("skip", Phase::Warmup),
        ]
    }

    #[test]
    fn test_order_by_phase_is_stable() {
        let ordered = order_by_phase(mixed_logs());
        let ids: Vec<&str> = ordered.iter().map(|e| e.exercise_id.as_str()).collect();
        assert_eq!(ids, vec!["bike", "skip", "squat", "bench", "row", "stretch"]);
    }

    #[test]
    fn test_segments_locate() {
        let ordered = order_by_phase(mixed_logs());
        let segments = PhaseSegments::from_ordered(&ordered);

        assert_eq!(segments.total(), 6);
        assert_eq!(segments.size(Phase::Warmup), 2);
        assert_eq!(segments.start(Phase::Main), 2);
        assert_eq!(segments.start(Phase::Cooldown), 5);

        let pos = segments.locate(3).unwrap();
        assert_eq!(pos.phase, Phase::Main);
        assert_eq!(pos.position, 1);
        assert_eq!(pos.phase_size, 2);
        assert_eq!(pos.to_string(), "Main 2/2");

        assert_eq!(segments.locate(5).unwrap().phase, Phase::Cooldown);
        assert!(segments.locate(6).is_none());
    }

    #[test]
    fn test_segments_skip_empty_phases() {
        let logs = vec![entry("a", Phase::Main), entry("b", Phase::Cooldown)];
        let segments = PhaseSegments::from_ordered(&logs);
        assert_eq!(segments.locate(0).unwrap().phase, Phase::Main);
        assert_eq!(segments.locate(1).unwrap().phase, Phase::Cooldown);
        assert_eq!(segments.size(Phase::Cardio), 0);
    }

    #[test]
    fn test_navigation_bounds_are_no_ops() {
        let logs = order_by_phase(mixed_logs());
        let mut nav = ExerciseNavigationState::new(&logs);

        assert!(!nav.previous());
        assert_eq!(nav.current(), 0);

        assert!(nav.go_to(5));
        assert!(!nav.next());
        assert_eq!(nav.current(), 5);

        assert!(!nav.go_to(6));
        assert_eq!(nav.current(), 5);

        assert!(nav.previous());
        assert_eq!(nav.current(), 4);
    }

    #[test]
    fn test_rebuild_clamps_pointer() {
        let logs: Vec<_> = (0..5).map(|i| entry(&i.to_string(), Phase::Main)).collect();
        let mut nav = ExerciseNavigationState::new(&logs);
        nav.go_to(4);

        nav.rebuild(&logs[..3]);
        assert_eq!(nav.current(), 2);
        assert_eq!(nav.len(), 3);

        nav.rebuild(&[]);
        assert_eq!(nav.current(), 0);
        assert!(nav.is_empty());
        assert!(nav.phase_position().is_none());
    }

    #[test]
    fn test_reset_to_clamps() {
        let logs: Vec<_> = (0..3).map(|i| entry(&i.to_string(), Phase::Main)).collect();
        let mut nav = ExerciseNavigationState::new(&logs);
        nav.reset_to(3);
        assert_eq!(nav.current(), 2);
        nav.reset_to(1);
        assert_eq!(nav.current(), 1);
    }
}
