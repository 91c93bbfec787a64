//! kinetrace-core
//!
//! The labeled, event-annotated time-series container shared across the
//! kinetrace ecosystem.
//!
//! - `types`: errors, events, and configuration re-exported from `kinetrace-types`.
//! - `timeseries`: the `TimeSeries` model with index resolution, windowing,
//!   gap filling, re-gridding, merging, and filtering.
//! - `persist`: the serialize/deserialize contract for `TimeSeries`.
//!
//! Every operation is synchronous and in-memory. Operations validate their
//! inputs before touching the receiver, so a failed call leaves it unchanged.
//! `TimeSeries` is `Send + Sync` but not internally synchronized; share a
//! [`TimeSeries::copy`] rather than mutating one instance from several threads.
#![warn(missing_docs)]

/// Optional `polars` bridge.
#[cfg(feature = "dataframe")]
pub mod dataframe;
/// Serialization contract for `TimeSeries`.
pub mod persist;
/// Time-series data model and its operations.
pub mod timeseries;
pub mod types;

#[cfg(feature = "dataframe")]
pub use dataframe::ToDataFrame;
pub use timeseries::TimeSeries;
pub use timeseries::fill::{FillReport, GapReason, UnfilledGap};
pub use timeseries::infer::{estimate_sample_period, is_strictly_increasing, is_uniform};
pub use timeseries::interp::Interpolator;
pub use timeseries::resample::linspace;
pub use timeseries::window::{Anchor, Bound, Window};
pub use types::*;
