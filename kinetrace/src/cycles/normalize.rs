use std::collections::BTreeMap;

use kinetrace_core::{
    Anchor, Bound, Event, KinetraceError, NormalizeConfig, TimeSeries, Window,
    is_strictly_increasing,
};
use ndarray::{ArrayD, ArrayViewD, Axis};

use super::keys;

/// `(start, end)` times of every complete cycle: each `start_event`
/// occurrence paired with the first `end_event` strictly after it.
pub(crate) fn cycle_bounds(ts: &TimeSeries, config: &NormalizeConfig) -> Vec<(f64, f64)> {
    let times_of = |name: &str| -> Vec<f64> {
        ts.events()
            .iter()
            .filter(|e| e.name == name)
            .map(|e| e.time)
            .collect()
    };
    let ends = times_of(&config.end_event);
    times_of(&config.start_event)
        .into_iter()
        .filter_map(|s| ends.iter().copied().find(|&e| e > s).map(|e| (s, e)))
        .collect()
}

/// Percent-of-cycle grid: `span0 + k * w / n` for `k < n`.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn percent_grid(config: &NormalizeConfig) -> Vec<f64> {
    let n = config.n_points;
    let w = config.span_width();
    (0..n)
        .map(|k| config.span[0] + w * k as f64 / n as f64)
        .collect()
}

/// Resample every cycle onto a fixed percent-of-cycle grid and concatenate
/// the cycles into one flat series.
///
/// A cycle runs from an occurrence of `start_event` to the first
/// `end_event` after it; start events with no later end event are ignored.
/// Each cycle gets `n_points` samples at `span0 + k * w / n_points`
/// (`w = span1 - span0`, end excluded), so the percent axis restarts every
/// cycle. In the flat series cycle `c` sits at `c * w + percent`, keeping
/// the time axis increasing.
///
/// Boundary events are regenerated at `c * w + span0` (start) and
/// `(c + 1) * w + span0` (end). Any other event inside a cycle is rescaled
/// into it. Channel metadata is copied; `time_info` records the
/// normalization under `"Normalization"` and its `"Unit"` becomes `"%"`.
///
/// ```
/// use kinetrace::cycles::time_normalize;
/// use kinetrace_core::{NormalizeConfig, TimeSeries};
///
/// let mut ts = TimeSeries::with_rate(11, 1.0, 0.0)
///     .unwrap()
///     .with_scalar("x", (0..11).map(f64::from).collect())
///     .unwrap();
/// ts.add_event(0.0, "strike").unwrap();
/// ts.add_event(4.0, "strike").unwrap();
/// ts.add_event(10.0, "strike").unwrap();
/// let config = NormalizeConfig::new("strike", "strike").with_points(4);
/// let flat = time_normalize(&ts, &config).unwrap();
/// assert_eq!(flat.time(), &[0.0, 25.0, 50.0, 75.0, 100.0, 125.0, 150.0, 175.0]);
/// assert_eq!(
///     flat.data("x").unwrap().as_slice().unwrap(),
///     &[0.0, 1.0, 2.0, 3.0, 4.0, 5.5, 7.0, 8.5]
/// );
/// ```
///
/// # Errors
/// - `InvalidArg` if the configuration is invalid or the time axis is not
///   finite and strictly increasing.
/// - `NotFound` if no complete cycle exists.
/// - `OutOfBounds` if a cycle boundary lies outside the sampled time range.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "kinetrace::time_normalize",
        skip(ts, config),
        fields(start = %config.start_event, end = %config.end_event, n_points = config.n_points),
    )
)]
#[allow(clippy::cast_precision_loss)]
pub fn time_normalize(
    ts: &TimeSeries,
    config: &NormalizeConfig,
) -> Result<TimeSeries, KinetraceError> {
    config.validate()?;
    if !is_strictly_increasing(ts.time()) {
        return Err(KinetraceError::invalid_arg(
            "time axis must be finite and strictly increasing to normalize cycles",
        ));
    }
    let bounds = cycle_bounds(ts, config);
    if bounds.is_empty() {
        return Err(KinetraceError::not_found(format!(
            "complete cycle from '{}' to '{}' ({} start events present)",
            config.start_event,
            config.end_event,
            ts.event_count(&config.start_event)
        )));
    }

    let n = config.n_points;
    let w = config.span_width();
    let span0 = config.span[0];
    let pct = percent_grid(config);
    let last = ts.len().saturating_sub(1);

    let mut time = Vec::with_capacity(bounds.len() * n);
    let mut pieces: BTreeMap<String, Vec<ArrayD<f64>>> = BTreeMap::new();
    let mut events = Vec::new();
    for (c, &(s, e)) in bounds.iter().enumerate() {
        let lo = ts.index_before_time(s, true).unwrap_or(0);
        let hi = ts.index_after_time(e, true).unwrap_or(last);
        let mut cycle = ts.window(&Window::between(
            Bound::inclusive(Anchor::Index(lo)),
            Bound::inclusive(Anchor::Index(hi)),
        ))?;
        let targets: Vec<f64> = (0..n)
            .map(|k| s + (e - s) * k as f64 / n as f64)
            .collect();
        cycle.resample_to(targets, config.method, None)?;

        let offset = c as f64 * w;
        time.extend(pct.iter().map(|p| offset + p));
        for (name, arr) in cycle.channels() {
            pieces.entry(name.to_string()).or_default().push(arr.clone());
        }

        events.push(Event::new(offset + span0, config.start_event.clone()));
        events.push(Event::new((c + 1) as f64 * w + span0, config.end_event.clone()));
        for ev in ts.events() {
            if ev.time < s || ev.time > e {
                continue;
            }
            let boundary = (ev.name == config.start_event && ev.time == s)
                || (ev.name == config.end_event && ev.time == e);
            if !boundary {
                let rescaled = span0 + (ev.time - s) / (e - s) * w;
                events.push(Event::new(offset + rescaled, ev.name.clone()));
            }
        }
    }

    let mut data = BTreeMap::new();
    let mut data_info = BTreeMap::new();
    for (name, parts) in pieces {
        let views: Vec<ArrayViewD<'_, f64>> = parts.iter().map(|a| a.view()).collect();
        let arr = ndarray::concatenate(Axis(0), &views).map_err(|e| {
            KinetraceError::irregular_cycle(format!("channel '{name}' cannot be concatenated: {e}"))
        })?;
        if let Some(info) = ts.data_info(&name) {
            data_info.insert(name.clone(), info.clone());
        }
        data.insert(name, arr);
    }

    let mut time_info = ts.time_info().clone();
    time_info.insert("Unit".into(), serde_json::Value::from(keys::PERCENT_UNIT));
    time_info.insert(
        keys::NORMALIZATION.into(),
        serde_json::json!({
            "start_event": config.start_event,
            "end_event": config.end_event,
            "n_points": n,
            "span": config.span,
            "method": serde_json::to_value(config.method)?,
            "cycles": bounds.len(),
        }),
    );

    #[cfg(feature = "tracing")]
    tracing::debug!(cycles = bounds.len(), "cycles normalized");

    TimeSeries::from_parts(time, data, data_info, events, time_info)
}
