//! The `TimeSeries` container and the operations defined on it.
//!
//! Submodules extend `TimeSeries` with one concern each:
//! - `index`: resolve times and events to sample indices
//! - `window`: slice a sub-series between two anchors
//! - `interp`: nearest/linear/monotonic-cubic interpolation kernels
//! - `fill`: gap filling of non-finite samples
//! - `resample`: re-grid onto a new time base
//! - `infer`: sampling-period inference and time-axis checks
//! - `merge`: merge channels and events from another series
//! - `filter`: Savitzky-Golay filtering, differentiation and smoothing

/// Gap filling of non-finite samples.
pub mod fill;
/// Savitzky-Golay filtering and moving-average smoothing.
pub mod filter;
/// Index/time/event resolution.
pub mod index;
/// Sampling-period inference and time-axis checks.
pub mod infer;
/// Interpolation kernels.
pub mod interp;
/// Merging of channels and events from another series.
pub mod merge;
/// Re-gridding onto a new time base.
pub mod resample;
pub(crate) mod util;
/// Windowing between anchors.
pub mod window;

use std::collections::BTreeMap;

use ndarray::{ArrayD, ArrayViewMutD, Axis, IxDyn};
use serde::{Deserialize, Serialize};

use crate::persist::RawTimeSeries;
use crate::{Event, KinetraceError, Metadata};

/// A multi-channel, event-annotated time series.
///
/// - `time`: one timestamp per sample.
/// - channels: named `f64` arrays whose axis 0 has one entry per sample;
///   trailing axes are free (scalar, vector, or matrix per sample).
/// - channel metadata: a free-form map per channel (units, colours, ...).
/// - events: `(time, name)` records kept sorted by time then name.
/// - `time_info`: free-form global metadata, `{"Unit": "s"}` by default.
///
/// Invariant: every channel's leading dimension equals `len()`. The fields
/// are private and every mutator checks it.
///
/// Cloning is a deep copy; nothing is shared between two series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "RawTimeSeries", try_from = "RawTimeSeries")]
pub struct TimeSeries {
    pub(crate) time: Vec<f64>,
    pub(crate) time_info: Metadata,
    pub(crate) data: BTreeMap<String, ArrayD<f64>>,
    pub(crate) data_info: BTreeMap<String, Metadata>,
    pub(crate) events: Vec<Event>,
}

impl Default for TimeSeries {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

pub(crate) fn default_time_info() -> Metadata {
    let mut m = Metadata::new();
    m.insert("Unit".into(), serde_json::Value::from("s"));
    m
}

impl TimeSeries {
    /// Create a series with the given time axis and no channels or events.
    #[must_use]
    pub fn new(time: Vec<f64>) -> Self {
        Self {
            time,
            time_info: default_time_info(),
            data: BTreeMap::new(),
            data_info: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Create a series with a uniform time axis `start + i / rate`.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `rate` is not finite and positive.
    pub fn with_rate(n_samples: usize, rate: f64, start: f64) -> Result<Self, KinetraceError> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(KinetraceError::invalid_arg(format!(
                "sample rate must be positive, got {rate}"
            )));
        }
        #[allow(clippy::cast_precision_loss)]
        let time = (0..n_samples).map(|i| start + i as f64 / rate).collect();
        Ok(Self::new(time))
    }

    /// Assemble a series from its parts, validating every channel and event.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if a channel's leading dimension differs from
    /// `time.len()`, and `InvalidArg` for non-finite event times.
    pub fn from_parts(
        time: Vec<f64>,
        data: BTreeMap<String, ArrayD<f64>>,
        data_info: BTreeMap<String, Metadata>,
        events: Vec<Event>,
        time_info: Metadata,
    ) -> Result<Self, KinetraceError> {
        for (name, arr) in &data {
            check_leading(name, arr, time.len())?;
        }
        let mut ts = Self {
            time,
            time_info,
            data,
            data_info,
            events: Vec::with_capacity(events.len()),
        };
        ts.add_events(events)?;
        Ok(ts)
    }

    /// Deep copy of the series.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// True when the series has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// The time axis.
    #[must_use]
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Replace the time axis.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if any channel does not have `time.len()` samples.
    pub fn set_time(&mut self, time: Vec<f64>) -> Result<(), KinetraceError> {
        for (name, arr) in &self.data {
            check_leading(name, arr, time.len())?;
        }
        self.time = time;
        Ok(())
    }

    /// Global metadata.
    #[must_use]
    pub const fn time_info(&self) -> &Metadata {
        &self.time_info
    }

    /// Mutable global metadata.
    pub fn time_info_mut(&mut self) -> &mut Metadata {
        &mut self.time_info
    }

    // ---- Channels ----

    /// Insert or replace a channel, returning the previous array if any.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if the array is zero-dimensional or its leading
    /// dimension differs from `len()`.
    pub fn add_data(
        &mut self,
        name: impl Into<String>,
        values: ArrayD<f64>,
    ) -> Result<Option<ArrayD<f64>>, KinetraceError> {
        let name = name.into();
        check_leading(&name, &values, self.len())?;
        Ok(self.data.insert(name, values))
    }

    /// Insert or replace a scalar (one value per sample) channel.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if `values.len() != len()`.
    pub fn add_scalar(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Option<ArrayD<f64>>, KinetraceError> {
        let n = values.len();
        let arr = ArrayD::from_shape_vec(IxDyn(&[n]), values)
            .map_err(|e| KinetraceError::Data(e.to_string()))?;
        self.add_data(name, arr)
    }

    /// Builder-style [`add_data`](Self::add_data).
    ///
    /// # Errors
    /// See [`add_data`](Self::add_data).
    pub fn with_data(
        mut self,
        name: impl Into<String>,
        values: ArrayD<f64>,
    ) -> Result<Self, KinetraceError> {
        self.add_data(name, values)?;
        Ok(self)
    }

    /// Builder-style [`add_scalar`](Self::add_scalar).
    ///
    /// # Errors
    /// See [`add_scalar`](Self::add_scalar).
    pub fn with_scalar(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, KinetraceError> {
        self.add_scalar(name, values)?;
        Ok(self)
    }

    /// Borrow a channel.
    #[must_use]
    pub fn data(&self, name: &str) -> Option<&ArrayD<f64>> {
        self.data.get(name)
    }

    /// Borrow a channel or fail with `NotFound`.
    ///
    /// # Errors
    /// Returns `NotFound` if the channel does not exist.
    pub fn try_data(&self, name: &str) -> Result<&ArrayD<f64>, KinetraceError> {
        self.data
            .get(name)
            .ok_or_else(|| KinetraceError::not_found(format!("channel '{name}'")))
    }

    /// Mutable view of a channel. The view cannot change the channel's shape.
    pub fn data_view_mut(&mut self, name: &str) -> Option<ArrayViewMutD<'_, f64>> {
        self.data.get_mut(name).map(|a| a.view_mut())
    }

    /// Channel names in sorted order.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Iterate over `(name, array)` pairs in sorted name order.
    pub fn channels(&self) -> impl Iterator<Item = (&str, &ArrayD<f64>)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.data.len()
    }

    /// True if the channel exists.
    #[must_use]
    pub fn has_data(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    /// Remove a channel and its metadata, returning the array if it existed.
    pub fn remove_data(&mut self, name: &str) -> Option<ArrayD<f64>> {
        self.data_info.remove(name);
        self.data.remove(name)
    }

    /// Rename a channel together with its metadata.
    ///
    /// # Errors
    /// Returns `NotFound` if `old` does not exist and `InvalidArg` if `new`
    /// is already taken by another channel.
    pub fn rename_data(&mut self, old: &str, new: impl Into<String>) -> Result<(), KinetraceError> {
        let new = new.into();
        if !self.data.contains_key(old) {
            return Err(KinetraceError::not_found(format!("channel '{old}'")));
        }
        if old == new {
            return Ok(());
        }
        if self.data.contains_key(&new) {
            return Err(KinetraceError::invalid_arg(format!(
                "cannot rename '{old}': channel '{new}' already exists"
            )));
        }
        if let Some(arr) = self.data.remove(old) {
            self.data.insert(new.clone(), arr);
        }
        if let Some(info) = self.data_info.remove(old) {
            self.data_info.insert(new, info);
        }
        Ok(())
    }

    /// Per-sample missing mask: `true` where any element of the sample is non-finite.
    ///
    /// # Errors
    /// Returns `NotFound` if the channel does not exist.
    pub fn isnan(&self, name: &str) -> Result<Vec<bool>, KinetraceError> {
        let arr = self.try_data(name)?;
        Ok(arr
            .axis_iter(Axis(0))
            .map(|row| row.iter().any(|v| !v.is_finite()))
            .collect())
    }

    /// New series holding only the named channels (with their metadata),
    /// the full time axis, every event, and the global metadata.
    ///
    /// # Errors
    /// Returns `NotFound` if a requested channel does not exist.
    pub fn get_subset<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, KinetraceError> {
        let mut out = Self {
            time: self.time.clone(),
            time_info: self.time_info.clone(),
            data: BTreeMap::new(),
            data_info: BTreeMap::new(),
            events: self.events.clone(),
        };
        for name in names {
            let name = name.as_ref();
            let arr = self.try_data(name)?;
            out.data.insert(name.to_string(), arr.clone());
            if let Some(info) = self.data_info.get(name) {
                out.data_info.insert(name.to_string(), info.clone());
            }
        }
        Ok(out)
    }

    // ---- Channel metadata ----

    /// Metadata of a channel.
    #[must_use]
    pub fn data_info(&self, name: &str) -> Option<&Metadata> {
        self.data_info.get(name)
    }

    /// Set one metadata entry of a channel (the channel need not exist yet).
    pub fn add_data_info(
        &mut self,
        name: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) {
        self.data_info
            .entry(name.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Remove one metadata entry of a channel, returning it if present.
    pub fn remove_data_info(&mut self, name: &str, key: &str) -> Option<serde_json::Value> {
        self.data_info.get_mut(name).and_then(|m| m.remove(key))
    }

    // ---- Events ----

    /// Events sorted by time then name.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Add an event, keeping the sequence sorted. Names are not unique and
    /// an event may share both time and name with an existing one.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `time` is not finite.
    pub fn add_event(&mut self, time: f64, name: impl Into<String>) -> Result<(), KinetraceError> {
        let event = Event::new(time, name);
        if !event.time.is_finite() {
            return Err(KinetraceError::invalid_arg(format!(
                "event '{}' has non-finite time {}",
                event.name, event.time
            )));
        }
        let pos = self
            .events
            .partition_point(|e| e.storage_cmp(&event).is_le());
        self.events.insert(pos, event);
        Ok(())
    }

    /// Add several events.
    ///
    /// # Errors
    /// Returns `InvalidArg` if any event time is not finite; no event is
    /// added in that case.
    pub fn add_events<I>(&mut self, events: I) -> Result<(), KinetraceError>
    where
        I: IntoIterator<Item = Event>,
    {
        let events: Vec<Event> = events.into_iter().collect();
        if let Some(bad) = events.iter().find(|e| !e.time.is_finite()) {
            return Err(KinetraceError::invalid_arg(format!(
                "event '{}' has non-finite time {}",
                bad.name, bad.time
            )));
        }
        self.events.extend(events);
        self.sort_events();
        Ok(())
    }

    pub(crate) fn sort_events(&mut self) {
        self.events.sort_by(Event::storage_cmp);
    }

    /// Number of events with the given name.
    #[must_use]
    pub fn event_count(&self, name: &str) -> usize {
        self.events.iter().filter(|e| e.name == name).count()
    }

    /// Remove the `occurrence`-th event named `name` (0-based, in time order).
    ///
    /// # Errors
    /// Returns `NotFound` if there is no such occurrence.
    pub fn remove_event(&mut self, name: &str, occurrence: usize) -> Result<Event, KinetraceError> {
        let pos = self
            .events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.name == name)
            .nth(occurrence)
            .map(|(i, _)| i)
            .ok_or_else(|| {
                KinetraceError::not_found(format!("event '{name}' occurrence {occurrence}"))
            })?;
        Ok(self.events.remove(pos))
    }

    /// Rename every event named `old`; returns how many were renamed.
    pub fn rename_event(&mut self, old: &str, new: &str) -> usize {
        let mut n = 0;
        for e in self.events.iter_mut().filter(|e| e.name == old) {
            e.name = new.to_string();
            n += 1;
        }
        if n > 0 {
            self.sort_events();
        }
        n
    }

    /// Remove all events.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Drop events that fall outside `[time[0], time[last]]`.
    pub fn trim_events(&mut self) {
        let (Some(&first), Some(&last)) = (self.time.first(), self.time.last()) else {
            self.events.clear();
            return;
        };
        self.events.retain(|e| e.time >= first && e.time <= last);
    }

    /// Add `dt` to every timestamp and event time.
    pub fn shift(&mut self, dt: f64) {
        for t in &mut self.time {
            *t += dt;
        }
        for e in &mut self.events {
            e.time += dt;
        }
    }

    /// Shift the series so that the given event occurs at time zero.
    ///
    /// # Errors
    /// Returns `NotFound` if the event occurrence does not exist.
    pub fn sync_event(&mut self, name: &str, occurrence: usize) -> Result<(), KinetraceError> {
        let t = self.event_time(name, occurrence)?;
        self.shift(-t);
        Ok(())
    }

    /// Check the channel-length invariant for every channel.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` for the first offending channel.
    pub fn validate(&self) -> Result<(), KinetraceError> {
        for (name, arr) in &self.data {
            check_leading(name, arr, self.len())?;
        }
        Ok(())
    }
}

pub(crate) fn check_leading(
    name: &str,
    arr: &ArrayD<f64>,
    expected: usize,
) -> Result<(), KinetraceError> {
    let actual = arr.shape().first().copied();
    match actual {
        Some(n) if n == expected => Ok(()),
        Some(n) => Err(KinetraceError::shape_mismatch(name, expected, n)),
        None => Err(KinetraceError::shape_mismatch(name, expected, 0)),
    }
}
