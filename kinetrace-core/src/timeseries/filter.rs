use std::collections::BTreeMap;

use ndarray::ArrayD;

use super::TimeSeries;
use super::util::Columns;
use crate::{FillPolicy, Interpolation, Interpolator, KinetraceError};

impl TimeSeries {
    /// Copy of the series with every channel passed through a
    /// Savitzky-Golay filter.
    ///
    /// Each sample is replaced by the value (or `deriv`-th derivative) at its
    /// position of the degree-`poly_order` polynomial fitted by least squares
    /// to the `window_length` samples centered on it. The first and last
    /// `window_length / 2` samples use the polynomial fitted to the first and
    /// last full window. Derivatives are scaled by the period between the
    /// first two samples, so the time axis is assumed uniform.
    ///
    /// A sample with any non-finite element is linearly interpolated from
    /// its neighbours before filtering (held constant past the ends) and is
    /// set back to NaN in the output. Time, events and metadata are copied
    /// unchanged.
    ///
    /// ```
    /// use kinetrace_core::TimeSeries;
    /// let ts = TimeSeries::with_rate(7, 10.0, 0.0)
    ///     .unwrap()
    ///     .with_scalar("x", (0..7).map(|i| f64::from(i).powi(2) / 100.0).collect())
    ///     .unwrap();
    /// let v = ts.savgol_filtered(5, 2, 1).unwrap();
    /// for (t, dx) in ts.time().iter().zip(v.data("x").unwrap()) {
    ///     assert!((dx - 2.0 * t).abs() < 1e-9);
    /// }
    /// ```
    ///
    /// # Errors
    /// Returns `InvalidArg` if `window_length` is even, zero, or longer than
    /// the series, if `poly_order >= window_length`, or if a derivative is
    /// requested and the first sample period is not finite and positive.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "kinetrace_core::savgol",
            skip(self),
            fields(samples = self.len()),
        )
    )]
    pub fn savgol_filtered(
        &self,
        window_length: usize,
        poly_order: usize,
        deriv: usize,
    ) -> Result<Self, KinetraceError> {
        if window_length % 2 == 0 {
            return Err(KinetraceError::invalid_arg(format!(
                "window length must be odd, got {window_length}"
            )));
        }
        if window_length > self.len() {
            return Err(KinetraceError::invalid_arg(format!(
                "window length {window_length} exceeds series length {}",
                self.len()
            )));
        }
        if poly_order >= window_length {
            return Err(KinetraceError::invalid_arg(format!(
                "polynomial order {poly_order} must be less than window length {window_length}"
            )));
        }
        let scale = if deriv == 0 {
            1.0
        } else {
            let period = match self.time.as_slice() {
                [t0, t1, ..] => t1 - t0,
                _ => f64::NAN,
            };
            if !(period.is_finite() && period > 0.0) {
                return Err(KinetraceError::invalid_arg(format!(
                    "derivative needs a positive sample period, got {period}"
                )));
            }
            let exp = i32::try_from(deriv).map_err(|_| {
                KinetraceError::invalid_arg(format!("derivative order {deriv} is too large"))
            })?;
            period.powi(exp)
        };

        let kernel = SavgolKernel::new(window_length, poly_order, deriv)?;
        let mut data: BTreeMap<String, ArrayD<f64>> = BTreeMap::new();
        for (name, arr) in &self.data {
            let cols = Columns::from_array(arr);
            let missing: Vec<bool> = (0..cols.rows)
                .map(|i| (0..cols.cols).any(|j| !cols.value(i, j).is_finite()))
                .collect();
            #[cfg(feature = "tracing")]
            if missing.iter().any(|&m| m) {
                tracing::warn!(
                    channel = %name,
                    missing = missing.iter().filter(|&&m| m).count(),
                    "interpolating missing samples before filtering"
                );
            }
            let mut out = cols.nan_like(cols.rows);
            for j in 0..cols.cols {
                let filled = bridge_missing(&cols.column(j), &missing)?;
                let mut filtered = kernel.apply(&filled);
                for (v, &m) in filtered.iter_mut().zip(&missing) {
                    *v = if m { f64::NAN } else { *v / scale };
                }
                out.set_column(j, &filtered);
            }
            data.insert(name.clone(), out.into_array()?);
        }
        let mut out = self.clone();
        out.data = data;
        Ok(out)
    }

    /// In-place [`savgol_filtered`](Self::savgol_filtered).
    ///
    /// # Errors
    /// See [`savgol_filtered`](Self::savgol_filtered).
    pub fn savgol(
        &mut self,
        window_length: usize,
        poly_order: usize,
        deriv: usize,
    ) -> Result<(), KinetraceError> {
        *self = self.savgol_filtered(window_length, poly_order, deriv)?;
        Ok(())
    }

    /// Copy of the series smoothed by a centered moving average of
    /// `window_length` samples: a zeroth-order
    /// [`savgol_filtered`](Self::savgol_filtered).
    ///
    /// The first and last half-windows take the mean of the first and last
    /// full window.
    ///
    /// ```
    /// use kinetrace_core::TimeSeries;
    /// let ts = TimeSeries::new(vec![0.0, 1.0, 2.0, 3.0])
    ///     .with_scalar("x", vec![0.0, 3.0, 0.0, 3.0])
    ///     .unwrap();
    /// let s = ts.smoothed(3).unwrap();
    /// let x = s.data("x").unwrap();
    /// for (got, want) in x.iter().zip([1.0, 1.0, 2.0, 2.0]) {
    ///     assert!((got - want).abs() < 1e-12);
    /// }
    /// ```
    ///
    /// # Errors
    /// Returns `InvalidArg` if `window_length` is even, zero, or longer than
    /// the series.
    pub fn smoothed(&self, window_length: usize) -> Result<Self, KinetraceError> {
        self.savgol_filtered(window_length, 0, 0)
    }

    /// In-place [`smoothed`](Self::smoothed).
    ///
    /// # Errors
    /// See [`smoothed`](Self::smoothed).
    pub fn smooth(&mut self, window_length: usize) -> Result<(), KinetraceError> {
        *self = self.smoothed(window_length)?;
        Ok(())
    }
}

/// Linear interpolation over sample indices for the rows flagged missing.
/// Past the first/last present row the nearest present value is held; a
/// column with no present row is returned unchanged.
#[allow(clippy::cast_precision_loss)]
fn bridge_missing(col: &[f64], missing: &[bool]) -> Result<Vec<f64>, KinetraceError> {
    if !missing.iter().any(|&m| m) {
        return Ok(col.to_vec());
    }
    let (x, y): (Vec<f64>, Vec<f64>) = col
        .iter()
        .zip(missing)
        .enumerate()
        .filter(|(_, (_, m))| !**m)
        .map(|(i, (&v, _))| (i as f64, v))
        .unzip();
    match y.as_slice() {
        [] => Ok(col.to_vec()),
        [only] => Ok(vec![*only; col.len()]),
        _ => {
            let interp = Interpolator::new(&x, &y, Interpolation::Linear)?;
            Ok((0..col.len())
                .map(|i| {
                    if missing[i] {
                        interp.eval_with(i as f64, FillPolicy::Hold)
                    } else {
                        col[i]
                    }
                })
                .collect())
        }
    }
}

/// Least-squares polynomial weights over a window of odd length `2h + 1`.
///
/// `rows[x + h]` holds the weights evaluating the fitted polynomial's
/// `deriv`-th derivative at window offset `x`, for `x` in `-h..=h`.
#[derive(Debug, Clone)]
struct SavgolKernel {
    half: usize,
    rows: Vec<Vec<f64>>,
}

impl SavgolKernel {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_wrap,
        clippy::cast_possible_truncation
    )]
    fn new(window_length: usize, poly_order: usize, deriv: usize) -> Result<Self, KinetraceError> {
        let half = window_length / 2;
        let m = poly_order + 1;
        let offsets: Vec<f64> = (0..window_length)
            .map(|k| k as f64 - half as f64)
            .collect();
        // normal equations (A^T A) G = A^T with A[k][j] = x_k^j
        let mut normal = vec![vec![0.0; m]; m];
        for (r, row) in normal.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = offsets.iter().map(|x| x.powi((r + c) as i32)).sum();
            }
        }
        let mut rhs: Vec<Vec<f64>> = (0..m)
            .map(|j| offsets.iter().map(|x| x.powi(j as i32)).collect())
            .collect();
        solve_in_place(&mut normal, &mut rhs)?;

        let rows = offsets
            .iter()
            .map(|&x| {
                let mut w = vec![0.0; window_length];
                for (j, coeffs) in rhs.iter().enumerate().skip(deriv) {
                    let falling: f64 = ((j - deriv + 1)..=j).map(|f| f as f64).product();
                    let factor = falling * x.powi((j - deriv) as i32);
                    for (wk, g) in w.iter_mut().zip(coeffs) {
                        *wk += factor * g;
                    }
                }
                w
            })
            .collect();
        Ok(Self { half, rows })
    }

    /// Filter a fully finite column at least one window long.
    fn apply(&self, col: &[f64]) -> Vec<f64> {
        let n = col.len();
        let h = self.half;
        let dot = |weights: &[f64], start: usize| -> f64 {
            weights.iter().zip(&col[start..]).map(|(w, v)| w * v).sum()
        };
        (0..n)
            .map(|i| {
                if i < h {
                    dot(&self.rows[i], 0)
                } else if i + h >= n {
                    dot(&self.rows[2 * h + 1 - (n - i)], n - 2 * h - 1)
                } else {
                    dot(&self.rows[h], i - h)
                }
            })
            .collect()
    }
}

/// Gauss-Jordan elimination with partial pivoting; `rhs` is overwritten
/// with `a^-1 * rhs`, one right-hand side per column.
fn solve_in_place(a: &mut [Vec<f64>], rhs: &mut [Vec<f64>]) -> Result<(), KinetraceError> {
    let m = a.len();
    for col in 0..m {
        let pivot = (col..m)
            .max_by(|&p, &q| a[p][col].abs().total_cmp(&a[q][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < f64::EPSILON {
            return Err(KinetraceError::invalid_arg(
                "polynomial fit is singular for this window",
            ));
        }
        a.swap(col, pivot);
        rhs.swap(col, pivot);
        let p = a[col][col];
        for v in &mut a[col] {
            *v /= p;
        }
        for v in &mut rhs[col] {
            *v /= p;
        }
        let (pivot_a, pivot_rhs) = (a[col].clone(), rhs[col].clone());
        for row in (0..m).filter(|&r| r != col) {
            let f = a[row][col];
            for (v, p) in a[row].iter_mut().zip(&pivot_a) {
                *v -= f * p;
            }
            for (v, p) in rhs[row].iter_mut().zip(&pivot_rhs) {
                *v -= f * p;
            }
        }
    }
    Ok(())
}
