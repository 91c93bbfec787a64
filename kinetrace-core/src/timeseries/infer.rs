/// Estimate the sampling period from positive adjacent timestamp deltas.
///
/// Deltas are compared with a relative tolerance of `1e-6` so jitter from
/// float accumulation does not split one cadence into many. The most
/// frequent delta wins; without a unique mode, the lower median is returned
/// so the result is always an observed cadence.
///
/// ```
/// use kinetrace_core::estimate_sample_period;
/// // deltas 0.01 x3, 0.02, 0.03 => mode is 0.01
/// let t = [0.0, 0.01, 0.02, 0.03, 0.05, 0.08];
/// assert!((estimate_sample_period(&t).unwrap() - 0.01).abs() < 1e-12);
///
/// // deltas 1, 1, 2, 2 => no unique mode, lower median is 1
/// let t = [0.0, 1.0, 2.0, 4.0, 6.0];
/// assert_eq!(estimate_sample_period(&t), Some(1.0));
/// ```
///
/// Non-finite timestamps and non-positive deltas are ignored. Returns `None`
/// if no positive delta exists.
#[must_use]
pub fn estimate_sample_period(time: &[f64]) -> Option<f64> {
    let mut deltas: Vec<f64> = time
        .windows(2)
        .filter(|w| w[0].is_finite() && w[1].is_finite())
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0)
        .collect();
    if deltas.is_empty() {
        return None;
    }
    deltas.sort_by(f64::total_cmp);

    let same = |a: f64, b: f64| (a - b).abs() <= 1e-6 * a.abs().max(b.abs());

    let mut best_delta = deltas[0];
    let mut best_count = 0usize;
    let mut num_best = 0usize;

    let mut cur_delta = deltas[0];
    let mut cur_count = 1usize;
    for &d in deltas.iter().skip(1) {
        if same(d, cur_delta) {
            cur_count += 1;
            continue;
        }
        if cur_count > best_count {
            best_count = cur_count;
            best_delta = cur_delta;
            num_best = 1;
        } else if cur_count == best_count {
            num_best += 1;
        }
        cur_delta = d;
        cur_count = 1;
    }
    if cur_count > best_count {
        best_delta = cur_delta;
        num_best = 1;
    } else if cur_count == best_count {
        num_best += 1;
    }

    if num_best == 1 {
        return Some(best_delta);
    }
    let mid = deltas.len() / 2;
    if deltas.len() % 2 == 1 {
        Some(deltas[mid])
    } else {
        Some(deltas[mid - 1])
    }
}

/// True if every timestamp is finite and each is strictly greater than the previous.
#[must_use]
pub fn is_strictly_increasing(time: &[f64]) -> bool {
    time.iter().all(|t| t.is_finite()) && time.windows(2).all(|w| w[1] > w[0])
}

/// True if the time axis is strictly increasing with every delta within
/// `rel_tol` (relative) of the estimated sampling period.
///
/// Series with fewer than two samples count as uniform.
#[must_use]
pub fn is_uniform(time: &[f64], rel_tol: f64) -> bool {
    if time.len() < 2 {
        return time.iter().all(|t| t.is_finite());
    }
    if !is_strictly_increasing(time) {
        return false;
    }
    let Some(period) = estimate_sample_period(time) else {
        return false;
    };
    time.windows(2)
        .all(|w| ((w[1] - w[0]) - period).abs() <= rel_tol * period)
}
