//! Shared helpers for treating a channel as a set of per-sample columns.

use ndarray::{ArrayD, IxDyn};

use crate::KinetraceError;

/// A channel flattened to `rows x cols`, row-major, where a row is one
/// sample and a column is one element of the per-sample value.
#[derive(Debug, Clone)]
pub(crate) struct Columns {
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    trailing: Vec<usize>,
    values: Vec<f64>,
}

impl Columns {
    pub(crate) fn from_array(arr: &ArrayD<f64>) -> Self {
        let shape = arr.shape();
        let rows = shape.first().copied().unwrap_or(0);
        let trailing: Vec<usize> = shape.iter().skip(1).copied().collect();
        let cols = trailing.iter().product();
        Self {
            rows,
            cols,
            trailing,
            values: arr.iter().copied().collect(),
        }
    }

    /// Empty (NaN-filled) columns with the same trailing shape and `rows` rows.
    pub(crate) fn nan_like(&self, rows: usize) -> Self {
        Self {
            rows,
            cols: self.cols,
            trailing: self.trailing.clone(),
            values: vec![f64::NAN; rows * self.cols],
        }
    }

    pub(crate) fn column(&self, j: usize) -> Vec<f64> {
        (0..self.rows).map(|i| self.values[i * self.cols + j]).collect()
    }

    pub(crate) fn value(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.cols + j]
    }

    pub(crate) fn set(&mut self, i: usize, j: usize, v: f64) {
        self.values[i * self.cols + j] = v;
    }

    pub(crate) fn set_column(&mut self, j: usize, col: &[f64]) {
        for (i, &v) in col.iter().enumerate().take(self.rows) {
            self.values[i * self.cols + j] = v;
        }
    }

    pub(crate) fn into_array(self) -> Result<ArrayD<f64>, KinetraceError> {
        let mut shape = Vec::with_capacity(self.trailing.len() + 1);
        shape.push(self.rows);
        shape.extend_from_slice(&self.trailing);
        ArrayD::from_shape_vec(IxDyn(&shape), self.values)
            .map_err(|e| KinetraceError::Data(format!("cannot rebuild channel: {e}")))
    }
}

/// Finite knots `(x, y)` of one column, in sample order.
pub(crate) fn finite_knots(time: &[f64], col: &[f64]) -> (Vec<f64>, Vec<f64>) {
    time.iter()
        .zip(col)
        .filter(|(t, v)| t.is_finite() && v.is_finite())
        .map(|(&t, &v)| (t, v))
        .unzip()
}

/// Half-open runs `[start, end)` of non-finite values.
pub(crate) fn nonfinite_runs(col: &[f64]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    for (i, v) in col.iter().enumerate() {
        match (v.is_finite(), start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                runs.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, col.len()));
    }
    runs
}
