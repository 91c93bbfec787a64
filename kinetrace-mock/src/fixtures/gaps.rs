use kinetrace_core::TimeSeries;
use ndarray::Array2;

/// `x = i` at 1 Hz over `n` samples with NaN over each `(start, len)` gap.
#[must_use]
pub fn ramp(n: usize, gaps: &[(usize, usize)]) -> TimeSeries {
    let mut x: Vec<f64> = (0..n).map(|i| i as f64).collect();
    for &(start, len) in gaps {
        for v in x.iter_mut().skip(start).take(len) {
            *v = f64::NAN;
        }
    }
    TimeSeries::with_rate(n, 1.0, 0.0)
        .unwrap()
        .with_scalar("x", x)
        .unwrap()
}

/// A 3-D marker trajectory at `rate` Hz: `[t, sin t, cos t]`, with every
/// coordinate of the samples in `missing` set to NaN (an occluded marker).
#[must_use]
pub fn occluded_marker(n: usize, rate: f64, missing: std::ops::Range<usize>) -> TimeSeries {
    let ts = TimeSeries::with_rate(n, rate, 0.0).unwrap();
    let pos = Array2::from_shape_fn((n, 3), |(i, j)| {
        if missing.contains(&i) {
            return f64::NAN;
        }
        let t = ts.time()[i];
        [t, t.sin(), t.cos()][j]
    });
    ts.with_data("Marker", pos.into_dyn()).unwrap()
}
