//! Kinetrace-specific data transfer objects and configuration primitives.
#![warn(missing_docs)]

mod config;
mod error;
mod event;

pub use config::{
    AnalysisConfig, ChannelCombine, DetectConfig, Direction, FillPolicy, GapFillConfig,
    Interpolation, NormalizeConfig, SelectConfig, SelectionPolicy,
};
pub use error::KinetraceError;
pub use event::{Event, Metadata};
