use kinetrace_core::{
    DetectConfig, Direction, Event, KinetraceError, TimeSeries, is_strictly_increasing,
};
use serde::{Deserialize, Serialize};

/// One detected phase as a half-open sample range `[start, end)`.
///
/// `start` is the first sample past the enter threshold and `end` the first
/// sample past the exit threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// First sample of the phase.
    pub start: usize,
    /// First sample after the phase.
    pub end: usize,
    /// Extremum inside the phase: the maximum for a rising phase, the
    /// minimum for a falling one.
    pub peak: f64,
}

impl Phase {
    /// `time[end] - time[start]`, or `None` if either index is out of range.
    #[must_use]
    pub fn duration(&self, time: &[f64]) -> Option<f64> {
        Some(time.get(self.end)? - time.get(self.start)?)
    }

    /// Number of samples in the phase.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// True if the phase holds no sample.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Position of the signal relative to the hysteresis band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    /// Under the low threshold; the detector is armed.
    Below,
    /// Between the thresholds, coming from below.
    Rising,
    /// Over the high threshold; a phase is open.
    Above,
    /// Between the thresholds, coming from above; the phase stays open.
    Falling,
}

/// Candidate `[start, end)` ranges of a signal oriented so that the phase
/// of interest is above the band. `None` means not armed yet: a phase can
/// only start after the signal has been seen under `low`.
fn scan(values: &[f64], low: f64, high: f64) -> Vec<(usize, usize)> {
    let mut band: Option<Band> = None;
    let mut start: Option<usize> = None;
    let mut out = Vec::new();
    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            continue;
        }
        band = match band {
            None => (v < low).then_some(Band::Below),
            Some(Band::Below | Band::Rising) => {
                if v > high {
                    start = Some(i);
                    Some(Band::Above)
                } else if v < low {
                    Some(Band::Below)
                } else {
                    Some(Band::Rising)
                }
            }
            Some(Band::Above | Band::Falling) => {
                if v < low {
                    if let Some(s) = start.take() {
                        out.push((s, i));
                    }
                    Some(Band::Below)
                } else if v > high {
                    Some(Band::Above)
                } else {
                    Some(Band::Falling)
                }
            }
        };
    }
    out
}

fn within(v: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.is_none_or(|m| v >= m) && max.is_none_or(|m| v <= m)
}

/// Detect phases on a scalar channel with dual-threshold hysteresis and add
/// an enter/exit event pair for each accepted phase.
///
/// A phase opens when the signal, having been under `low_threshold`, goes
/// over `high_threshold`; it closes at the first sample back under
/// `low_threshold`. With [`Direction::Falling`] the roles are mirrored.
/// Non-finite samples are skipped and never cause a transition. A phase
/// still open at the end of the signal is dropped.
///
/// Candidates outside the duration or peak-height bounds are skipped; that
/// is not an error. Detection is a single O(n) pass and fully deterministic.
///
/// ```
/// use kinetrace::cycles::detect_cycles;
/// use kinetrace_core::{DetectConfig, TimeSeries};
///
/// let mut ts = TimeSeries::with_rate(10, 1.0, 0.0)
///     .unwrap()
///     .with_scalar("Force", vec![0., 0., 5., 5., 5., 0., 0., 5., 5., 0.])
///     .unwrap();
/// let config = DetectConfig::new("Force", "push", "recovery", 1.0, 3.0)
///     .with_duration(Some(2.0), Some(5.0));
/// let phases = detect_cycles(&mut ts, &config).unwrap();
/// let ranges: Vec<_> = phases.iter().map(|p| (p.start, p.end)).collect();
/// assert_eq!(ranges, [(2, 5), (7, 9)]);
/// assert_eq!(ts.event_count("push"), 2);
/// ```
///
/// # Errors
/// - `InvalidArg` if the configuration is invalid, the channel is not
///   scalar, or the time axis is not finite and strictly increasing.
/// - `NotFound` if the channel does not exist.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "kinetrace::detect_cycles",
        skip(ts, config),
        fields(channel = %config.channel, samples = ts.len()),
    )
)]
pub fn detect_cycles(
    ts: &mut TimeSeries,
    config: &DetectConfig,
) -> Result<Vec<Phase>, KinetraceError> {
    config.validate()?;
    let arr = ts.try_data(&config.channel)?;
    if arr.len() != ts.len() {
        return Err(KinetraceError::invalid_arg(format!(
            "channel '{}' must hold one value per sample (shape {:?})",
            config.channel,
            arr.shape()
        )));
    }
    if !is_strictly_increasing(ts.time()) {
        return Err(KinetraceError::invalid_arg(
            "time axis must be finite and strictly increasing to detect cycles",
        ));
    }
    let values: Vec<f64> = arr.iter().copied().collect();
    let time = ts.time();

    let candidates = match config.direction {
        Direction::Rising => scan(&values, config.low_threshold, config.high_threshold),
        Direction::Falling => {
            let mirrored: Vec<f64> = values.iter().map(|v| -v).collect();
            scan(&mirrored, -config.high_threshold, -config.low_threshold)
        }
    };

    let mut phases = Vec::with_capacity(candidates.len());
    let mut events = Vec::with_capacity(candidates.len() * 2);
    for (start, end) in candidates {
        let finite = values[start..end].iter().copied().filter(|v| v.is_finite());
        let peak = match config.direction {
            Direction::Rising => finite.fold(f64::NEG_INFINITY, f64::max),
            Direction::Falling => finite.fold(f64::INFINITY, f64::min),
        };
        let duration = time[end] - time[start];
        if !within(duration, config.min_duration, config.max_duration)
            || !within(peak, config.min_peak_height, config.max_peak_height)
        {
            #[cfg(feature = "tracing")]
            tracing::debug!(start, end, duration, peak, "phase candidate rejected");
            continue;
        }
        events.push(Event::new(time[start], config.enter_event.clone()));
        events.push(Event::new(time[end], config.exit_event.clone()));
        phases.push(Phase { start, end, peak });
    }

    ts.add_events(events)?;
    Ok(phases)
}
