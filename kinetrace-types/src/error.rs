use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the kinetrace workspace.
///
/// Every variant carries enough context (channel name, index, time, event
/// name and occurrence) to diagnose the failure without re-running the
/// operation. A failed operation leaves its receiver unchanged.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KinetraceError {
    /// A time, event occurrence, channel, or search direction has no match.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing item, e.g. "event 'push' occurrence 2".
        what: String,
    },

    /// A window or interval whose start resolves after its end.
    #[error("invalid range: {what}")]
    InvalidRange {
        /// Description of the offending interval.
        what: String,
    },

    /// Evaluation or indexing outside the bounds of the data.
    #[error("out of bounds: {what}")]
    OutOfBounds {
        /// Description of the offending position.
        what: String,
    },

    /// Cycles do not share the same length or cannot be split evenly.
    #[error("irregular cycles: {what}")]
    IrregularCycle {
        /// Description of the irregularity.
        what: String,
    },

    /// A channel's leading dimension does not match the time axis.
    #[error("shape mismatch on channel '{channel}': expected {expected} samples, got {actual}")]
    ShapeMismatch {
        /// Channel name.
        channel: String,
        /// Expected leading dimension length.
        expected: usize,
        /// Actual leading dimension length.
        actual: usize,
    },

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Issues with serialized or decoded data.
    #[error("data issue: {0}")]
    Data(String),
}

impl KinetraceError {
    /// Helper: build a `NotFound` error for a description of the missing item.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build an `InvalidRange` error.
    pub fn invalid_range(what: impl Into<String>) -> Self {
        Self::InvalidRange { what: what.into() }
    }

    /// Helper: build an `OutOfBounds` error.
    pub fn out_of_bounds(what: impl Into<String>) -> Self {
        Self::OutOfBounds { what: what.into() }
    }

    /// Helper: build an `IrregularCycle` error.
    pub fn irregular_cycle(what: impl Into<String>) -> Self {
        Self::IrregularCycle { what: what.into() }
    }

    /// Helper: build a `ShapeMismatch` error for a channel.
    pub fn shape_mismatch(channel: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            channel: channel.into(),
            expected,
            actual,
        }
    }

    /// Helper: build an `InvalidArg` error.
    pub fn invalid_arg(msg: impl Into<String>) -> Self {
        Self::InvalidArg(msg.into())
    }

    /// Returns true if the error stems from caller-supplied parameters rather
    /// than from the contents of the series.
    #[must_use]
    pub const fn is_argument_error(&self) -> bool {
        matches!(self, Self::InvalidArg(_) | Self::InvalidRange { .. })
    }
}

impl From<serde_json::Error> for KinetraceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Data(e.to_string())
    }
}
