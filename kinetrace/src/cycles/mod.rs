//! Cycle subsystem: detect phases, normalize cycles onto a common grid,
//! stack them, and keep the most repeatable ones.
//!
//! Typical flow on one series:
//! 1. [`detect_cycles`] appends enter/exit events around each phase.
//! 2. [`time_normalize`] resamples every cycle between two events onto a
//!    fixed percent-of-cycle grid and concatenates the cycles.
//! 3. [`CycleStack::stack`] reshapes the result to `[cycle, point, ...]`.
//! 4. [`most_repeatable_cycles`] drops outlier repetitions.

/// Hysteresis-based phase detection.
pub mod detect;
/// Time normalization of cycles onto a percent-of-cycle axis.
pub mod normalize;
/// Greedy most-repeatable-cycle selection.
pub mod select;
/// Flat <-> stacked cycle representations.
pub mod stack;

pub use detect::{Phase, detect_cycles};
pub use normalize::time_normalize;
pub use select::{most_repeatable_cycles, pairwise_dissimilarity};
pub use stack::CycleStack;

/// Keys written into `time_info` by [`time_normalize`].
pub mod keys {
    /// Object describing the normalization.
    pub const NORMALIZATION: &str = "Normalization";
    /// Unit of a normalized time axis.
    pub const PERCENT_UNIT: &str = "%";
}
