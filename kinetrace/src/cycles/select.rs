use kinetrace_core::{ChannelCombine, KinetraceError, SelectConfig, SelectionPolicy};
use ndarray::{Array2, ArrayD, Axis};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::CycleStack;

/// Root-mean-square difference between two cycles over every element both
/// hold as finite values. `NaN` if they share no finite element.
fn rms(a: &ArrayD<f64>, i: usize, j: usize) -> f64 {
    let (sum, count) = a
        .index_axis(Axis(0), i)
        .iter()
        .zip(a.index_axis(Axis(0), j).iter())
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .fold((0.0_f64, 0_usize), |(s, n), (x, y)| (s + (x - y).powi(2), n + 1));
    if count == 0 {
        return f64::NAN;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = sum / count as f64;
    mean.sqrt()
}

#[allow(clippy::cast_precision_loss)]
fn combine(values: impl Iterator<Item = f64>, how: ChannelCombine) -> f64 {
    let (sum, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0_f64, 0_usize), |(s, n), v| (s + v, n + 1));
    match (how, count) {
        (_, 0) => f64::NAN,
        (ChannelCombine::Sum, _) => sum,
        (ChannelCombine::Mean, _) => sum / count as f64,
    }
}

fn compared_channels<'a>(
    stack: &'a CycleStack,
    config: &SelectConfig,
) -> Result<Vec<&'a ArrayD<f64>>, KinetraceError> {
    if config.channels.is_empty() {
        return Ok(stack
            .channel_names()
            .filter_map(|name| stack.channel(name))
            .collect());
    }
    config
        .channels
        .iter()
        .map(|name| {
            stack
                .channel(name)
                .ok_or_else(|| KinetraceError::not_found(format!("channel '{name}' in cycle stack")))
        })
        .collect()
}

/// Symmetric `[cycles, cycles]` dissimilarity matrix with a zero diagonal.
///
/// Each selected channel contributes the RMS difference between the two
/// cycles over the elements both hold as finite values; the channel values
/// are then summed or averaged per [`SelectConfig::combine`], ignoring
/// channels that gave `NaN`. A pair with nothing comparable is `NaN`.
///
/// With the `parallel` feature the rows are computed on the rayon pool.
///
/// # Errors
/// Returns `NotFound` if a configured channel is not in the stack.
pub fn pairwise_dissimilarity(
    stack: &CycleStack,
    config: &SelectConfig,
) -> Result<Array2<f64>, KinetraceError> {
    let channels = compared_channels(stack, config)?;
    let n = stack.n_cycles();
    let row = |i: usize| -> Vec<f64> {
        (0..n)
            .map(|j| {
                if i == j {
                    0.0
                } else if j < i {
                    f64::NAN
                } else {
                    combine(channels.iter().map(|a| rms(a, i, j)), config.combine)
                }
            })
            .collect()
    };

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<f64>> = (0..n).into_par_iter().map(row).collect();
    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<f64>> = (0..n).map(row).collect();

    // Only the upper triangle was computed.
    Ok(Array2::from_shape_fn((n, n), |(i, j)| {
        if i <= j { rows[i][j] } else { rows[j][i] }
    }))
}

/// Indices of the most mutually similar cycles, in ascending order.
///
/// Greedy: while more than the policy's minimum count remain, the cycle
/// whose summed dissimilarity to the other remaining cycles is largest is
/// removed, the lowest index winning ties. `NaN` pairs count as zero.
///
/// - [`SelectionPolicy::RetainCount`] stops at exactly that many cycles
///   (or keeps everything if there are fewer).
/// - [`SelectionPolicy::MinImprovement`] also stops as soon as a removal
///   would lower the mean pairwise dissimilarity of the remaining set by
///   less than `threshold` (relative).
///
/// The result is never in similarity order and is empty only when the
/// stack is empty or the minimum count is zero.
///
/// # Errors
/// - `InvalidArg` if the configuration is invalid.
/// - `NotFound` if a configured channel is not in the stack.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "kinetrace::most_repeatable_cycles",
        skip(stack, config),
        fields(cycles = stack.n_cycles(), policy = ?config.policy),
    )
)]
pub fn most_repeatable_cycles(
    stack: &CycleStack,
    config: &SelectConfig,
) -> Result<Vec<usize>, KinetraceError> {
    config.validate()?;
    let dist = pairwise_dissimilarity(stack, config)?;
    let d = |i: usize, j: usize| {
        let v = dist[[i, j]];
        if v.is_nan() { 0.0 } else { v }
    };
    let total = |keep: &[usize], i: usize| keep.iter().map(|&j| d(i, j)).sum::<f64>();
    #[allow(clippy::cast_precision_loss)]
    let mean_of = |keep: &[usize]| {
        let pairs = keep.len() * keep.len().saturating_sub(1);
        if pairs == 0 {
            0.0
        } else {
            keep.iter().map(|&i| total(keep, i)).sum::<f64>() / pairs as f64
        }
    };

    let mut keep: Vec<usize> = (0..stack.n_cycles()).collect();
    while keep.len() > config.policy.min_count() {
        let mut worst = 0;
        let mut worst_total = f64::NEG_INFINITY;
        for (pos, &i) in keep.iter().enumerate() {
            let t = total(&keep, i);
            if t > worst_total {
                worst = pos;
                worst_total = t;
            }
        }

        if let SelectionPolicy::MinImprovement { threshold, .. } = config.policy {
            let before = mean_of(&keep);
            if before <= 0.0 {
                break;
            }
            let mut candidate = keep.clone();
            candidate.remove(worst);
            let gain = (before - mean_of(&candidate)) / before;
            if gain < threshold {
                #[cfg(feature = "tracing")]
                tracing::debug!(gain, threshold, retained = keep.len(), "selection converged");
                break;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(cycle = keep[worst], total = worst_total, "cycle removed");
        keep.remove(worst);
    }
    Ok(keep)
}
