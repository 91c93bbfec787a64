//! Replace non-finite samples by interpolating between finite neighbours.
//!
//! Each flattened column of each channel is treated on its own. Only
//! non-finite entries are ever written, so finite samples come out
//! bit-identical. Gaps that cannot or may not be filled are reported back.

use std::collections::BTreeMap;

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use super::TimeSeries;
use super::interp::Interpolator;
use super::util::{Columns, finite_knots, nonfinite_runs};
use crate::{GapFillConfig, KinetraceError};

/// Why a gap was left as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GapReason {
    /// The run is longer than `max_gap`.
    TooLong,
    /// The run touches the start or end of the series and edge filling is off.
    Edge,
    /// The column has fewer finite samples than the kernel needs.
    TooFewKnots,
}

/// A run of non-finite samples that was not filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnfilledGap {
    /// Channel name.
    pub channel: String,
    /// Flattened column within the channel (0 for scalar channels).
    pub column: usize,
    /// First sample of the run.
    pub start: usize,
    /// Number of samples in the run.
    pub len: usize,
    /// Why it was skipped.
    pub reason: GapReason,
}

/// Outcome of [`TimeSeries::fill_missing_samples`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillReport {
    /// Number of individual values that were filled.
    pub filled: usize,
    /// Gaps left non-finite, in channel then column then time order.
    pub unfilled: Vec<UnfilledGap>,
}

impl FillReport {
    /// True when no gap was left unfilled.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unfilled.is_empty()
    }
}

impl TimeSeries {
    /// Fill runs of non-finite samples in every channel.
    ///
    /// Interior runs no longer than `max_gap` are interpolated from the
    /// column's finite samples. Runs touching either end are held at the
    /// nearest finite value when `fill_edges` is set. Anything else is left
    /// in place and listed in the returned report.
    ///
    /// ```
    /// use kinetrace_core::{GapFillConfig, Interpolation, TimeSeries};
    /// let mut ts = TimeSeries::new(vec![0.0, 1.0, 2.0, 3.0, 4.0])
    ///     .with_scalar("x", vec![0.0, f64::NAN, 2.0, f64::NAN, f64::NAN])
    ///     .unwrap();
    /// let report = ts.fill_missing_samples(&GapFillConfig::default()).unwrap();
    /// assert_eq!(report.filled, 1);
    /// assert_eq!(report.unfilled.len(), 1); // trailing edge
    /// assert_eq!(ts.data("x").unwrap()[[1]], 1.0);
    /// ```
    ///
    /// # Errors
    /// Returns `InvalidArg` if the time axis is not finite and strictly
    /// increasing, or `max_gap` is zero.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "kinetrace_core::fill_missing_samples",
            skip(self, config),
            fields(samples = self.len(), channels = self.channel_count()),
        )
    )]
    pub fn fill_missing_samples(
        &mut self,
        config: &GapFillConfig,
    ) -> Result<FillReport, KinetraceError> {
        if config.max_gap == Some(0) {
            return Err(KinetraceError::invalid_arg("max_gap must be positive"));
        }
        self.check_interpolable()?;

        let mut report = FillReport::default();
        let mut updated: BTreeMap<String, ArrayD<f64>> = BTreeMap::new();
        for (name, arr) in &self.data {
            let mut cols = Columns::from_array(arr);
            let mut touched = false;
            for j in 0..cols.cols {
                let col = cols.column(j);
                let runs = nonfinite_runs(&col);
                if runs.is_empty() {
                    continue;
                }
                let (kx, ky) = finite_knots(&self.time, &col);
                let interp = if kx.len() >= config.method.min_knots() {
                    Some(Interpolator::new(&kx, &ky, config.method)?)
                } else {
                    None
                };
                for (start, end) in runs {
                    let len = end - start;
                    let edge = start == 0 || end == cols.rows;
                    let reason = if config.max_gap.is_some_and(|m| len > m) {
                        Some(GapReason::TooLong)
                    } else if kx.is_empty() {
                        Some(GapReason::TooFewKnots)
                    } else if edge && !config.fill_edges {
                        Some(GapReason::Edge)
                    } else if !edge && interp.is_none() {
                        Some(GapReason::TooFewKnots)
                    } else {
                        None
                    };
                    if let Some(reason) = reason {
                        report.unfilled.push(UnfilledGap {
                            channel: name.clone(),
                            column: j,
                            start,
                            len,
                            reason,
                        });
                        continue;
                    }
                    for i in start..end {
                        let v = match (&interp, edge) {
                            (Some(f), false) => f.eval(self.time[i]),
                            _ if start == 0 => col[end],
                            _ => col[start - 1],
                        };
                        cols.set(i, j, v);
                    }
                    report.filled += len;
                    touched = true;
                }
            }
            if touched {
                updated.insert(name.clone(), cols.into_array()?);
            }
        }

        #[cfg(feature = "tracing")]
        for gap in &report.unfilled {
            tracing::warn!(
                channel = %gap.channel,
                column = gap.column,
                start = gap.start,
                len = gap.len,
                reason = ?gap.reason,
                "gap left unfilled"
            );
        }

        self.data.extend(updated);
        Ok(report)
    }
}
