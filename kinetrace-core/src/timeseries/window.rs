//! Slice a sub-series between two anchors.
//!
//! An anchor is a time, a sample index, or an event occurrence. Each end of
//! the window carries its own inclusive/exclusive flag. The time axis is
//! expected to be ascending for windowing to be meaningful.

use ndarray::{Axis, Slice};
use serde::{Deserialize, Serialize};

use super::TimeSeries;
use crate::KinetraceError;

/// A position on the time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Anchor {
    /// An absolute time.
    Time(f64),
    /// A sample index.
    Index(usize),
    /// The `occurrence`-th event named `name` (0-based).
    Event {
        /// Event name.
        name: String,
        /// Occurrence ordinal.
        occurrence: usize,
    },
}

impl Anchor {
    /// Anchor on an event occurrence.
    pub fn event(name: impl Into<String>, occurrence: usize) -> Self {
        Self::Event {
            name: name.into(),
            occurrence,
        }
    }
}

/// One end of a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    /// Where the bound sits.
    pub anchor: Anchor,
    /// Whether a sample exactly at the anchor is kept.
    pub inclusive: bool,
}

impl Bound {
    /// Bound that keeps a sample sitting exactly on the anchor.
    #[must_use]
    pub const fn inclusive(anchor: Anchor) -> Self {
        Self {
            anchor,
            inclusive: true,
        }
    }

    /// Bound that drops a sample sitting exactly on the anchor.
    #[must_use]
    pub const fn exclusive(anchor: Anchor) -> Self {
        Self {
            anchor,
            inclusive: false,
        }
    }
}

/// Window request; a missing end extends to the corresponding end of the series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Window {
    /// Start bound.
    pub start: Option<Bound>,
    /// End bound.
    pub end: Option<Bound>,
    /// Shift the output so that its first sample is at time zero.
    pub rezero: bool,
}

impl Window {
    /// Window between two bounds.
    #[must_use]
    pub const fn between(start: Bound, end: Bound) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            rezero: false,
        }
    }

    /// Window from a bound to the end of the series.
    #[must_use]
    pub const fn after(start: Bound) -> Self {
        Self {
            start: Some(start),
            end: None,
            rezero: false,
        }
    }

    /// Window from the start of the series to a bound.
    #[must_use]
    pub const fn before(end: Bound) -> Self {
        Self {
            start: None,
            end: Some(end),
            rezero: false,
        }
    }

    /// Request re-zeroing of the output time axis.
    #[must_use]
    pub const fn rezeroed(mut self) -> Self {
        self.rezero = true;
        self
    }
}

/// A bound resolved against a concrete series.
struct Resolved {
    /// Half-open index boundary (`lo` for a start, `hi` for an end).
    edge: usize,
    /// Anchor time used to keep or drop events.
    time: f64,
    /// Anchor index, when the anchor was an index.
    index: Option<usize>,
    inclusive: bool,
}

impl TimeSeries {
    fn anchor_time(&self, anchor: &Anchor) -> Result<(f64, Option<usize>), KinetraceError> {
        match anchor {
            Anchor::Time(t) => {
                if t.is_finite() {
                    Ok((*t, None))
                } else {
                    Err(KinetraceError::invalid_arg(format!(
                        "window anchor time must be finite, got {t}"
                    )))
                }
            }
            Anchor::Index(i) => {
                let t = self.time.get(*i).copied().ok_or_else(|| {
                    KinetraceError::out_of_bounds(format!(
                        "window anchor index {i} outside [0, {})",
                        self.len()
                    ))
                })?;
                Ok((t, Some(*i)))
            }
            Anchor::Event { name, occurrence } => Ok((self.event_time(name, *occurrence)?, None)),
        }
    }

    fn resolve_start(&self, bound: Option<&Bound>) -> Result<Resolved, KinetraceError> {
        let Some(bound) = bound else {
            return Ok(Resolved {
                edge: 0,
                time: f64::NEG_INFINITY,
                index: None,
                inclusive: true,
            });
        };
        let (time, index) = self.anchor_time(&bound.anchor)?;
        let edge = match index {
            Some(i) if bound.inclusive => i,
            Some(i) => i + 1,
            None => self
                .index_after_time(time, bound.inclusive)
                .unwrap_or(self.len()),
        };
        Ok(Resolved {
            edge,
            time,
            index,
            inclusive: bound.inclusive,
        })
    }

    fn resolve_end(&self, bound: Option<&Bound>) -> Result<Resolved, KinetraceError> {
        let Some(bound) = bound else {
            return Ok(Resolved {
                edge: self.len(),
                time: f64::INFINITY,
                index: None,
                inclusive: true,
            });
        };
        let (time, index) = self.anchor_time(&bound.anchor)?;
        let edge = match index {
            Some(i) if bound.inclusive => i + 1,
            Some(i) => i,
            None => self
                .index_before_time(time, bound.inclusive)
                .map_or(0, |i| i + 1),
        };
        Ok(Resolved {
            edge,
            time,
            index,
            inclusive: bound.inclusive,
        })
    }

    /// New series restricted to the window.
    ///
    /// Channels are sliced, events inside the anchor interval are kept and the
    /// others dropped, metadata is copied. Windows of length 0 or 1 are valid.
    ///
    /// ```
    /// use kinetrace_core::{Anchor, Bound, TimeSeries, Window};
    /// let mut ts = TimeSeries::new((0..10).map(|i| f64::from(i) * 0.5).collect());
    /// ts.add_event(1.0, "push").unwrap();
    /// ts.add_event(3.0, "push").unwrap();
    /// let w = ts
    ///     .window(&Window::between(
    ///         Bound::inclusive(Anchor::event("push", 0)),
    ///         Bound::exclusive(Anchor::event("push", 1)),
    ///     ))
    ///     .unwrap();
    /// assert_eq!(w.time(), &[1.0, 1.5, 2.0, 2.5]);
    /// assert_eq!(w.events().len(), 1);
    /// ```
    ///
    /// # Errors
    /// - `NotFound` if an event anchor does not exist.
    /// - `OutOfBounds` if an index anchor is past the end of the series.
    /// - `InvalidRange` if the start anchor lies after the end anchor.
    pub fn window(&self, window: &Window) -> Result<Self, KinetraceError> {
        let start = self.resolve_start(window.start.as_ref())?;
        let end = self.resolve_end(window.end.as_ref())?;

        let inverted = match (start.index, end.index) {
            (Some(i), Some(j)) => i > j,
            _ => start.time > end.time,
        };
        if inverted {
            return Err(KinetraceError::invalid_range(format!(
                "window start (t={}, index={:?}) is after window end (t={}, index={:?})",
                start.time, start.index, end.time, end.index
            )));
        }

        let lo = start.edge.min(self.len());
        let hi = end.edge.clamp(lo, self.len());
        let mut out = self.slice_rows(lo, hi);

        out.events.retain(|e| {
            let after_start = if start.inclusive {
                e.time >= start.time
            } else {
                e.time > start.time
            };
            let before_end = if end.inclusive {
                e.time <= end.time
            } else {
                e.time < end.time
            };
            after_start && before_end
        });

        if window.rezero
            && let Some(&t0) = out.time.first()
        {
            out.shift(-t0);
        }
        Ok(out)
    }

    /// Length-1 series at the sample nearest to `time`, with every event kept.
    ///
    /// # Errors
    /// Returns `NotFound` if the series is empty.
    pub fn at_time(&self, time: f64) -> Result<Self, KinetraceError> {
        let i = self.index_at_time(time)?;
        Ok(self.slice_rows(i, i + 1))
    }

    /// Length-1 series at the sample nearest to the given event occurrence.
    ///
    /// # Errors
    /// Returns `NotFound` if the event occurrence does not exist or the series is empty.
    pub fn at_event(&self, name: &str, occurrence: usize) -> Result<Self, KinetraceError> {
        let t = self.event_time(name, occurrence)?;
        self.at_time(t)
    }

    /// Rows `[lo, hi)` of every channel, all metadata and events copied.
    pub(crate) fn slice_rows(&self, lo: usize, hi: usize) -> Self {
        let data = self
            .data
            .iter()
            .map(|(k, v)| {
                (
                    k.clone(),
                    v.slice_axis(Axis(0), Slice::from(lo..hi)).to_owned(),
                )
            })
            .collect();
        Self {
            time: self.time[lo..hi].to_vec(),
            time_info: self.time_info.clone(),
            data,
            data_info: self.data_info.clone(),
            events: self.events.clone(),
        }
    }
}
