//! Kinetrace turns raw, event-annotated motion recordings into comparable
//! cycles.
//!
//! Overview
//! - Detects repeated phases (pushes, strides, strokes) on a scalar channel
//!   with dual-threshold hysteresis and marks them with events.
//! - Time-normalizes the repetitions between two events onto a fixed
//!   percent-of-cycle grid.
//! - Stacks the normalized cycles into `[cycle, point, ...]` arrays and back.
//! - Keeps the most mutually similar subset, dropping outlier repetitions.
//!
//! The time-series container itself lives in `kinetrace_core` and is
//! re-exported here, so most programs only depend on this crate.
//!
//! Key behaviors and trade-offs
//! - Every step is synchronous, in-memory, and deterministic.
//! - Rejected phase candidates (duration or height out of bounds) are not
//!   errors; they simply produce no events.
//! - Selection is a greedy heuristic, not an optimal subset search; on ties
//!   the lowest cycle index is removed first.
//! - Enable the `parallel` feature to compute pairwise dissimilarities on the
//!   rayon pool, and `tracing` for spans around each step.
//!
//! Examples
//! ```
//! use kinetrace::{
//!     CycleAnalysis, DetectConfig, NormalizeConfig, SelectConfig, SelectionPolicy, TimeSeries,
//! };
//!
//! // Three square pushes at 1 Hz.
//! let force: Vec<f64> = (0..30).map(|i| if i % 10 >= 2 && i % 10 < 6 { 10.0 } else { 0.0 }).collect();
//! let ts = TimeSeries::with_rate(30, 1.0, 0.0)?.with_scalar("Force", force)?;
//!
//! let report = CycleAnalysis::builder()
//!     .detect(DetectConfig::new("Force", "push", "release", 1.0, 5.0))
//!     .normalize(NormalizeConfig::new("push", "push").with_points(50))
//!     .select(SelectConfig::for_channels(["Force"]).with_policy(SelectionPolicy::RetainCount(2)))
//!     .build()?
//!     .run(&ts)?;
//!
//! assert_eq!(report.phases.len(), 3);
//! assert_eq!(report.stack.shape(), [2, 50, 1]);
//! assert_eq!(report.retained.len(), 2);
//! # Ok::<(), kinetrace::KinetraceError>(())
//! ```
//!
//! See `kinetrace/examples/` for runnable end-to-end demonstrations.
#![warn(missing_docs)]

pub(crate) mod core;
pub mod cycles;

pub use crate::core::{CycleAnalysis, CycleAnalysisBuilder, CycleReport};
pub use cycles::{
    CycleStack, Phase, detect_cycles, most_repeatable_cycles, pairwise_dissimilarity,
    time_normalize,
};

// Re-export core types for convenience
pub use kinetrace_core::{
    AnalysisConfig, Anchor, Bound, ChannelCombine, DetectConfig, Direction, Event, FillPolicy,
    FillReport, GapFillConfig, GapReason, Interpolation, KinetraceError, Metadata,
    NormalizeConfig, SelectConfig, SelectionPolicy, TimeSeries, UnfilledGap, Window,
};

#[cfg(feature = "dataframe")]
pub use kinetrace_core::ToDataFrame;
