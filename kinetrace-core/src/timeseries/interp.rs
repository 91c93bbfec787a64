use crate::{FillPolicy, Interpolation, KinetraceError};

/// One-dimensional interpolant over strictly increasing, finite knots.
///
/// Inside `[x[0], x[n-1]]` the value follows the chosen kernel and equals
/// `y[i]` exactly at `x[i]`. Outside, [`eval`](Self::eval) extends the
/// boundary segment; [`eval_with`](Self::eval_with) applies a [`FillPolicy`].
///
/// ```
/// use kinetrace_core::{Interpolation, Interpolator};
/// let x = [0.0, 1.0, 2.0, 3.0];
/// let y = [0.0, 1.0, 1.0, 4.0];
/// let lin = Interpolator::new(&x, &y, Interpolation::Linear).unwrap();
/// assert_eq!(lin.eval(0.5), 0.5);
/// let cubic = Interpolator::new(&x, &y, Interpolation::MonotonicCubic).unwrap();
/// // flat data stays flat: no overshoot between equal knots
/// assert_eq!(cubic.eval(1.5), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Interpolator<'a> {
    x: &'a [f64],
    y: &'a [f64],
    method: Interpolation,
    slopes: Vec<f64>,
}

impl<'a> Interpolator<'a> {
    /// Build an interpolant.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `x` and `y` differ in length, there are fewer
    /// knots than the kernel needs, or the knots are not finite and strictly
    /// increasing.
    pub fn new(x: &'a [f64], y: &'a [f64], method: Interpolation) -> Result<Self, KinetraceError> {
        if x.len() != y.len() {
            return Err(KinetraceError::invalid_arg(format!(
                "knot length mismatch: {} times vs {} values",
                x.len(),
                y.len()
            )));
        }
        if x.len() < method.min_knots() {
            return Err(KinetraceError::invalid_arg(format!(
                "{method:?} interpolation needs {} knots, got {}",
                method.min_knots(),
                x.len()
            )));
        }
        if let Some(i) = (0..x.len()).find(|&i| !x[i].is_finite() || !y[i].is_finite()) {
            return Err(KinetraceError::invalid_arg(format!(
                "knot {i} is not finite (t={}, v={})",
                x[i], y[i]
            )));
        }
        if let Some(i) = (1..x.len()).find(|&i| x[i] <= x[i - 1]) {
            return Err(KinetraceError::invalid_arg(format!(
                "knot times must be strictly increasing: t[{}]={} >= t[{i}]={}",
                i - 1,
                x[i - 1],
                x[i]
            )));
        }
        let slopes = match method {
            Interpolation::MonotonicCubic => pchip_slopes(x, y),
            _ => Vec::new(),
        };
        Ok(Self {
            x,
            y,
            method,
            slopes,
        })
    }

    /// `(first, last)` knot time.
    #[must_use]
    pub fn bounds(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// True if `xq` lies within the knot range.
    #[must_use]
    pub fn contains(&self, xq: f64) -> bool {
        let (a, b) = self.bounds();
        xq >= a && xq <= b
    }

    /// Evaluate at `xq`, extending the boundary segment outside the knot range.
    #[must_use]
    pub fn eval(&self, xq: f64) -> f64 {
        let n = self.x.len();
        if n == 1 {
            return self.y[0];
        }
        let k = self
            .x
            .partition_point(|&v| v <= xq)
            .saturating_sub(1)
            .min(n - 2);
        let (x0, x1) = (self.x[k], self.x[k + 1]);
        let (y0, y1) = (self.y[k], self.y[k + 1]);
        if xq == x0 {
            return y0;
        }
        if xq == x1 {
            return y1;
        }
        match self.method {
            Interpolation::Nearest => {
                if xq < x0 {
                    y0
                } else if xq > x1 || (x1 - xq) < (xq - x0) {
                    y1
                } else {
                    y0
                }
            }
            Interpolation::Linear => y0 + (xq - x0) * (y1 - y0) / (x1 - x0),
            Interpolation::MonotonicCubic => {
                let h = x1 - x0;
                let t = (xq - x0) / h;
                let t2 = t * t;
                let t3 = t2 * t;
                let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
                let h10 = t3 - 2.0 * t2 + t;
                let h01 = -2.0 * t3 + 3.0 * t2;
                let h11 = t3 - t2;
                h00 * y0 + h10 * h * self.slopes[k] + h01 * y1 + h11 * h * self.slopes[k + 1]
            }
        }
    }

    /// Evaluate at `xq`, applying `fill` outside the knot range.
    #[must_use]
    pub fn eval_with(&self, xq: f64, fill: FillPolicy) -> f64 {
        if self.contains(xq) {
            return self.eval(xq);
        }
        match fill {
            FillPolicy::Nan => f64::NAN,
            FillPolicy::Constant(c) => c,
            FillPolicy::Hold => {
                if xq < self.x[0] {
                    self.y[0]
                } else {
                    self.y[self.y.len() - 1]
                }
            }
            FillPolicy::Extrapolate => self.eval(xq),
        }
    }
}

/// Fritsch-Carlson derivative estimates for PCHIP.
///
/// Interior slopes are the weighted harmonic mean of neighbouring secants,
/// or zero at local extrema; end slopes use the shape-preserving
/// three-point formula.
fn pchip_slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|k| (y[k + 1] - y[k]) / h[k]).collect();
    if n == 2 {
        return vec![delta[0], delta[0]];
    }
    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        let (a, b) = (delta[k - 1], delta[k]);
        if a == 0.0 || b == 0.0 || a.signum() != b.signum() {
            d[k] = 0.0;
        } else {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            d[k] = (w1 + w2) / (w1 / a + w2 / b);
        }
    }
    d[0] = pchip_end_slope(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = pchip_end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

fn pchip_end_slope(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if d.signum() != m0.signum() || m0 == 0.0 {
        0.0
    } else if m0.signum() != m1.signum() && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}
