use std::collections::BTreeMap;

use ndarray::ArrayD;

use super::TimeSeries;
use super::infer::is_strictly_increasing;
use super::interp::Interpolator;
use super::util::{Columns, finite_knots};
use crate::{FillPolicy, Interpolation, KinetraceError};

impl TimeSeries {
    /// Evaluate every channel on `new_time` and replace the time axis.
    ///
    /// Each column of each channel is interpolated independently through its
    /// finite samples. A column with fewer finite samples than the kernel
    /// needs becomes all-NaN. Events and metadata are kept.
    ///
    /// With `fill = None`, any requested time outside `[time[0], time[last]]`
    /// fails; inside the series bounds but outside a column's finite samples
    /// the column stays NaN.
    ///
    /// ```
    /// use kinetrace_core::{Interpolation, TimeSeries};
    /// let mut ts = TimeSeries::new(vec![0.0, 1.0, 2.0])
    ///     .with_scalar("x", vec![0.0, 10.0, 20.0])
    ///     .unwrap();
    /// ts.resample_to(vec![0.5, 1.5], Interpolation::Linear, None).unwrap();
    /// assert_eq!(ts.data("x").unwrap().as_slice().unwrap(), &[5.0, 15.0]);
    /// assert!(ts.resample_to(vec![3.0], Interpolation::Linear, None).is_err());
    /// ```
    ///
    /// # Errors
    /// - `InvalidArg` if `new_time` or the current time axis contain non-finite
    ///   values, or the current time axis is not strictly increasing.
    /// - `OutOfBounds` if `fill` is `None` and a requested time lies outside
    ///   the current time range.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "kinetrace_core::resample_to",
            skip(self, new_time),
            fields(from = self.len(), to = new_time.len()),
        )
    )]
    pub fn resample_to(
        &mut self,
        new_time: Vec<f64>,
        method: Interpolation,
        fill: Option<FillPolicy>,
    ) -> Result<(), KinetraceError> {
        if let Some(t) = new_time.iter().find(|t| !t.is_finite()) {
            return Err(KinetraceError::invalid_arg(format!(
                "target time axis contains non-finite value {t}"
            )));
        }
        self.check_interpolable()?;
        if fill.is_none() && !new_time.is_empty() {
            let (Some(&first), Some(&last)) = (self.time.first(), self.time.last()) else {
                return Err(KinetraceError::out_of_bounds(format!(
                    "cannot evaluate {} target times on an empty series",
                    new_time.len()
                )));
            };
            if let Some(&t) = new_time.iter().find(|&&t| t < first || t > last) {
                return Err(KinetraceError::out_of_bounds(format!(
                    "t={t} outside [{first}, {last}] and no fill policy given"
                )));
            }
        }

        let mut data: BTreeMap<String, ArrayD<f64>> = BTreeMap::new();
        for (name, arr) in &self.data {
            data.insert(
                name.clone(),
                resample_channel(name, &self.time, arr, &new_time, method, fill)?,
            );
        }
        self.time = new_time;
        self.data = data;
        Ok(())
    }

    /// Re-grid onto `n_points` uniformly spaced samples spanning the current
    /// time range (both ends included).
    ///
    /// # Errors
    /// Returns `InvalidArg` for an empty series, `n_points == 0`, or a time
    /// axis that cannot be interpolated.
    pub fn resample_uniform(
        &mut self,
        n_points: usize,
        method: Interpolation,
    ) -> Result<(), KinetraceError> {
        if n_points == 0 {
            return Err(KinetraceError::invalid_arg("n_points must be positive"));
        }
        let (Some(&first), Some(&last)) = (self.time.first(), self.time.last()) else {
            return Err(KinetraceError::invalid_arg("cannot re-grid an empty series"));
        };
        let new_time = linspace(first, last, n_points);
        self.resample_to(new_time, method, None)
    }

    pub(crate) fn check_interpolable(&self) -> Result<(), KinetraceError> {
        if let Some(i) = self.time.iter().position(|t| !t.is_finite()) {
            return Err(KinetraceError::invalid_arg(format!(
                "time[{i}] is not finite ({})",
                self.time[i]
            )));
        }
        if !is_strictly_increasing(&self.time) {
            return Err(KinetraceError::invalid_arg(
                "time axis must be strictly increasing to interpolate",
            ));
        }
        Ok(())
    }
}

/// `n` evenly spaced values from `a` to `b`, both included.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let step = (b - a) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { b } else { a + step * i as f64 })
                .collect()
        }
    }
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn resample_channel(
    name: &str,
    time: &[f64],
    arr: &ArrayD<f64>,
    new_time: &[f64],
    method: Interpolation,
    fill: Option<FillPolicy>,
) -> Result<ArrayD<f64>, KinetraceError> {
    let cols = Columns::from_array(arr);
    let mut out = cols.nan_like(new_time.len());
    for j in 0..cols.cols {
        let col = cols.column(j);
        let (kx, ky) = finite_knots(time, &col);
        if kx.len() < method.min_knots() {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                channel = name,
                column = j,
                finite = kx.len(),
                "too few finite samples to interpolate; column set to NaN"
            );
            continue;
        }
        let interp = Interpolator::new(&kx, &ky, method)?;
        let policy = fill.unwrap_or(FillPolicy::Nan);
        let values: Vec<f64> = new_time
            .iter()
            .map(|&t| interp.eval_with(t, policy))
            .collect();
        out.set_column(j, &values);
    }
    out.into_array()
}
