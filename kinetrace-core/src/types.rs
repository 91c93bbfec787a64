//! Re-export of foundational types from `kinetrace-types`.
// Consolidated re-exports so downstream crates can depend on `kinetrace-core` only

pub use kinetrace_types::{Event, KinetraceError, Metadata};

pub use kinetrace_types::{
    AnalysisConfig, ChannelCombine, DetectConfig, Direction, FillPolicy, GapFillConfig,
    Interpolation, NormalizeConfig, SelectConfig, SelectionPolicy,
};
