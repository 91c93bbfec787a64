//! Resolve times and events to concrete sample indices.
//!
//! Searches never assume a sorted time axis: every lookup is a linear scan
//! that picks the closest qualifying sample, with ties going to the earlier
//! index. Non-finite timestamps never match.

use super::TimeSeries;
use crate::KinetraceError;

fn check_query(time: f64) -> Result<(), KinetraceError> {
    if time.is_finite() {
        Ok(())
    } else {
        Err(KinetraceError::invalid_arg(format!(
            "query time must be finite, got {time}"
        )))
    }
}

/// Index of the smallest `dist(t)` among samples where `dist` is `Some`.
fn argmin_by<F>(time: &[f64], dist: F) -> Option<usize>
where
    F: Fn(f64) -> Option<f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, &t) in time.iter().enumerate() {
        if !t.is_finite() {
            continue;
        }
        let Some(d) = dist(t) else {
            continue;
        };
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

impl TimeSeries {
    /// Index of the sample nearest to `time`; ties go to the earlier index.
    ///
    /// ```
    /// use kinetrace_core::TimeSeries;
    /// let ts = TimeSeries::new(vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    /// assert_eq!(ts.index_at_time(0.9).unwrap(), 2);
    /// assert_eq!(ts.index_at_time(1.25).unwrap(), 2);
    /// assert_eq!(ts.index_at_time(7.0).unwrap(), 4);
    /// ```
    ///
    /// # Errors
    /// Returns `NotFound` if the series has no finite timestamp and
    /// `InvalidArg` if `time` is not finite.
    pub fn index_at_time(&self, time: f64) -> Result<usize, KinetraceError> {
        check_query(time)?;
        argmin_by(&self.time, |t| Some((t - time).abs()))
            .ok_or_else(|| KinetraceError::not_found(format!("sample near t={time} (empty series)")))
    }

    /// Index of the closest sample strictly before `time` (or at `time` when
    /// `inclusive`).
    ///
    /// ```
    /// use kinetrace_core::TimeSeries;
    /// let ts = TimeSeries::new(vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    /// assert_eq!(ts.index_before_time(1.0, false).unwrap(), 1);
    /// assert_eq!(ts.index_before_time(1.0, true).unwrap(), 2);
    /// assert!(ts.index_before_time(-1.0, false).is_err());
    /// ```
    ///
    /// # Errors
    /// Returns `NotFound` if no sample lies before `time`.
    pub fn index_before_time(&self, time: f64, inclusive: bool) -> Result<usize, KinetraceError> {
        check_query(time)?;
        argmin_by(&self.time, |t| {
            let d = time - t;
            (d > 0.0 || (inclusive && d == 0.0)).then_some(d)
        })
        .ok_or_else(|| {
            KinetraceError::not_found(format!(
                "sample {} t={time}",
                if inclusive { "at or before" } else { "before" }
            ))
        })
    }

    /// Index of the closest sample strictly after `time` (or at `time` when
    /// `inclusive`).
    ///
    /// # Errors
    /// Returns `NotFound` if no sample lies after `time`.
    pub fn index_after_time(&self, time: f64, inclusive: bool) -> Result<usize, KinetraceError> {
        check_query(time)?;
        argmin_by(&self.time, |t| {
            let d = t - time;
            (d > 0.0 || (inclusive && d == 0.0)).then_some(d)
        })
        .ok_or_else(|| {
            KinetraceError::not_found(format!(
                "sample {} t={time}",
                if inclusive { "at or after" } else { "after" }
            ))
        })
    }

    /// Time of the `occurrence`-th event named `name` (0-based, time order).
    ///
    /// ```
    /// use kinetrace_core::TimeSeries;
    /// let mut ts = TimeSeries::default();
    /// ts.add_event(5.5, "event1").unwrap();
    /// ts.add_event(10.8, "event2").unwrap();
    /// ts.add_event(2.3, "event2").unwrap();
    /// assert_eq!(ts.event_time("event2", 0).unwrap(), 2.3);
    /// assert_eq!(ts.event_time("event2", 1).unwrap(), 10.8);
    /// assert!(ts.event_time("event2", 2).is_err());
    /// ```
    ///
    /// # Errors
    /// Returns `NotFound` if there are fewer than `occurrence + 1` such events.
    pub fn event_time(&self, name: &str, occurrence: usize) -> Result<f64, KinetraceError> {
        self.events
            .iter()
            .filter(|e| e.name == name)
            .nth(occurrence)
            .map(|e| e.time)
            .ok_or_else(|| {
                KinetraceError::not_found(format!(
                    "event '{name}' occurrence {occurrence} ({} present)",
                    self.event_count(name)
                ))
            })
    }

    /// Index of the sample nearest to the given event occurrence.
    ///
    /// # Errors
    /// Returns `NotFound` if the event occurrence does not exist or the series is empty.
    pub fn event_index(&self, name: &str, occurrence: usize) -> Result<usize, KinetraceError> {
        let t = self.event_time(name, occurrence)?;
        self.index_at_time(t)
    }
}
