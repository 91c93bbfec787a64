use std::collections::BTreeMap;

use kinetrace_core::{Event, KinetraceError, Metadata, NormalizeConfig, TimeSeries};
use ndarray::{Array3, ArrayD, ArrayViewD, Axis, Dimension, IxDyn};

use super::normalize::percent_grid;

/// Relative tolerance used to match flat times against the cycle grid.
const GRID_TOL: f64 = 1e-9;

/// Normalized cycles stacked along a leading cycle axis.
///
/// Each channel has shape `[cycles, points, ...]`. Events are kept per
/// cycle on the percent axis; the boundary events named by the
/// configuration are not stored and are regenerated by
/// [`unstack`](Self::unstack).
#[derive(Debug, Clone, PartialEq)]
pub struct CycleStack {
    start_event: String,
    end_event: String,
    span: [f64; 2],
    percent: Vec<f64>,
    n_cycles: usize,
    channels: BTreeMap<String, ArrayD<f64>>,
    data_info: BTreeMap<String, Metadata>,
    time_info: Metadata,
    events: Vec<Vec<Event>>,
}

impl CycleStack {
    /// Reshape a flat normalized series (as produced by
    /// [`time_normalize`](super::time_normalize)) into a stack.
    ///
    /// ```
    /// use kinetrace::cycles::CycleStack;
    /// use kinetrace_core::{NormalizeConfig, TimeSeries};
    ///
    /// let config = NormalizeConfig::new("push", "push").with_points(101);
    /// let time: Vec<f64> = (0..303).map(|i| f64::from(i) * 100.0 / 101.0).collect();
    /// let flat = TimeSeries::new(time)
    ///     .with_scalar("Fx", vec![1.0; 303]).unwrap()
    ///     .with_scalar("Fy", vec![2.0; 303]).unwrap();
    /// let stack = CycleStack::stack(&flat, &config).unwrap();
    /// assert_eq!(stack.shape(), [3, 101, 2]);
    /// ```
    ///
    /// # Errors
    /// - `InvalidArg` if the configuration is invalid.
    /// - `IrregularCycle` if the length is not a multiple of `n_points` or a
    ///   cycle's time axis does not repeat the first cycle's percent axis.
    pub fn stack(flat: &TimeSeries, config: &NormalizeConfig) -> Result<Self, KinetraceError> {
        config.validate()?;
        let n = config.n_points;
        if flat.len() % n != 0 {
            return Err(KinetraceError::irregular_cycle(format!(
                "{} samples cannot be split into cycles of {n} points",
                flat.len()
            )));
        }
        let n_cycles = flat.len() / n;
        let w = config.span_width();
        let time = flat.time();
        let percent = if n_cycles == 0 {
            percent_grid(config)
        } else {
            time[..n].to_vec()
        };
        for c in 1..n_cycles {
            #[allow(clippy::cast_precision_loss)]
            let offset = c as f64 * w;
            for (k, p) in percent.iter().enumerate() {
                let t = time[c * n + k];
                let expected = offset + p;
                if (t - expected).abs() > GRID_TOL * expected.abs().max(w) {
                    return Err(KinetraceError::irregular_cycle(format!(
                        "cycle {c} sample {k} is at t={t}, expected {expected}"
                    )));
                }
            }
        }

        let mut channels = BTreeMap::new();
        let mut data_info = BTreeMap::new();
        for (name, arr) in flat.channels() {
            let mut shape = vec![n_cycles, n];
            shape.extend_from_slice(&arr.shape()[1..]);
            let reshaped = ArrayD::from_shape_vec(IxDyn(&shape), arr.iter().copied().collect())
                .map_err(|e| KinetraceError::Data(format!("channel '{name}': {e}")))?;
            channels.insert(name.to_string(), reshaped);
            if let Some(info) = flat.data_info(name) {
                data_info.insert(name.to_string(), info.clone());
            }
        }

        let mut stack = Self {
            start_event: config.start_event.clone(),
            end_event: config.end_event.clone(),
            span: config.span,
            percent,
            n_cycles,
            channels,
            data_info,
            time_info: flat.time_info().clone(),
            events: vec![Vec::new(); n_cycles],
        };
        if n_cycles > 0 {
            for ev in flat.events() {
                let (c, pct) = stack.locate(ev.time);
                if !stack.is_boundary(c, &ev.name, pct) {
                    stack.events[c].push(Event::new(pct, ev.name.clone()));
                }
            }
        }
        Ok(stack)
    }

    /// Stack single normalized cycles, each with its own percent time axis.
    ///
    /// The first cycle's time axis, channel metadata and global metadata are
    /// kept. Boundary events in the inputs are dropped and regenerated by
    /// [`unstack`](Self::unstack).
    ///
    /// # Errors
    /// - `InvalidArg` if the configuration is invalid.
    /// - `IrregularCycle` if a cycle's length differs from `n_points`, or
    ///   the cycles do not share the same channels and per-sample shapes.
    pub fn from_cycles(
        cycles: &[TimeSeries],
        config: &NormalizeConfig,
    ) -> Result<Self, KinetraceError> {
        config.validate()?;
        let n = config.n_points;
        let Some(first) = cycles.first() else {
            return Ok(Self {
                start_event: config.start_event.clone(),
                end_event: config.end_event.clone(),
                span: config.span,
                percent: percent_grid(config),
                n_cycles: 0,
                channels: BTreeMap::new(),
                data_info: BTreeMap::new(),
                time_info: Metadata::new(),
                events: Vec::new(),
            });
        };
        for (c, cycle) in cycles.iter().enumerate() {
            if cycle.len() != n {
                return Err(KinetraceError::irregular_cycle(format!(
                    "cycle {c} has {} samples, expected {n}",
                    cycle.len()
                )));
            }
            let same_channels = cycle.channel_count() == first.channel_count()
                && first.channels().all(|(name, arr)| {
                    cycle.data(name).is_some_and(|other| other.shape() == arr.shape())
                });
            if !same_channels {
                return Err(KinetraceError::irregular_cycle(format!(
                    "cycle {c} does not have the same channels and shapes as cycle 0"
                )));
            }
        }

        let mut channels = BTreeMap::new();
        let mut data_info = BTreeMap::new();
        for (name, _) in first.channels() {
            let views: Vec<ArrayViewD<'_, f64>> = cycles
                .iter()
                .filter_map(|cycle| cycle.data(name).map(|a| a.view()))
                .collect();
            let stacked = ndarray::stack(Axis(0), &views)
                .map_err(|e| KinetraceError::irregular_cycle(format!("channel '{name}': {e}")))?;
            channels.insert(name.to_string(), stacked);
            if let Some(info) = first.data_info(name) {
                data_info.insert(name.to_string(), info.clone());
            }
        }

        let mut stack = Self {
            start_event: config.start_event.clone(),
            end_event: config.end_event.clone(),
            span: config.span,
            percent: first.time().to_vec(),
            n_cycles: cycles.len(),
            channels,
            data_info,
            time_info: first.time_info().clone(),
            events: vec![Vec::new(); cycles.len()],
        };
        for (c, cycle) in cycles.iter().enumerate() {
            for ev in cycle.events() {
                if !stack.is_boundary_pct(&ev.name, ev.time) {
                    stack.events[c].push(ev.clone());
                }
            }
        }
        Ok(stack)
    }

    /// Rebuild the flat series: cycle `c` at `c * w + percent`, boundary
    /// events regenerated for every cycle.
    ///
    /// # Errors
    /// Returns `Data` if a channel cannot be reshaped (not expected for a
    /// stack built by this type).
    pub fn unstack(&self) -> Result<TimeSeries, KinetraceError> {
        let n = self.n_points();
        let w = self.span_width();
        let mut time = Vec::with_capacity(self.n_cycles * n);
        let mut events = Vec::new();
        for c in 0..self.n_cycles {
            #[allow(clippy::cast_precision_loss)]
            let offset = c as f64 * w;
            time.extend(self.percent.iter().map(|p| offset + p));
            events.extend(self.boundary_events(c));
            events.extend(
                self.events[c]
                    .iter()
                    .map(|e| Event::new(offset + e.time, e.name.clone())),
            );
        }

        let mut data = BTreeMap::new();
        for (name, arr) in &self.channels {
            let mut shape = vec![self.n_cycles * n];
            shape.extend_from_slice(&arr.shape()[2..]);
            let flat = ArrayD::from_shape_vec(IxDyn(&shape), arr.iter().copied().collect())
                .map_err(|e| KinetraceError::Data(format!("channel '{name}': {e}")))?;
            data.insert(name.clone(), flat);
        }
        TimeSeries::from_parts(
            time,
            data,
            self.data_info.clone(),
            events,
            self.time_info.clone(),
        )
    }

    /// One cycle as its own series on the percent axis, boundary events included.
    ///
    /// # Errors
    /// Returns `OutOfBounds` if `index >= n_cycles()`.
    pub fn cycle(&self, index: usize) -> Result<TimeSeries, KinetraceError> {
        self.check_index(index)?;
        let mut data = BTreeMap::new();
        for (name, arr) in &self.channels {
            data.insert(name.clone(), arr.index_axis(Axis(0), index).to_owned());
        }
        let mut events = self.boundary_events(0).to_vec();
        events.extend(self.events[index].iter().cloned());
        TimeSeries::from_parts(
            self.percent.clone(),
            data,
            self.data_info.clone(),
            events,
            self.time_info.clone(),
        )
    }

    /// New stack holding the given cycles, in the given order.
    ///
    /// # Errors
    /// Returns `OutOfBounds` if an index is `>= n_cycles()`.
    pub fn select(&self, indices: &[usize]) -> Result<Self, KinetraceError> {
        for &i in indices {
            self.check_index(i)?;
        }
        Ok(Self {
            start_event: self.start_event.clone(),
            end_event: self.end_event.clone(),
            span: self.span,
            percent: self.percent.clone(),
            n_cycles: indices.len(),
            channels: self
                .channels
                .iter()
                .map(|(k, v)| (k.clone(), v.select(Axis(0), indices)))
                .collect(),
            data_info: self.data_info.clone(),
            time_info: self.time_info.clone(),
            events: indices.iter().map(|&i| self.events[i].clone()).collect(),
        })
    }

    /// Number of cycles.
    #[must_use]
    pub const fn n_cycles(&self) -> usize {
        self.n_cycles
    }

    /// Number of points per cycle.
    #[must_use]
    pub fn n_points(&self) -> usize {
        self.percent.len()
    }

    /// Percent-of-cycle axis shared by every cycle.
    #[must_use]
    pub fn percent(&self) -> &[f64] {
        &self.percent
    }

    /// `[cycles, points, columns]`, where columns counts every element of
    /// every channel.
    #[must_use]
    pub fn shape(&self) -> [usize; 3] {
        [self.n_cycles, self.n_points(), self.column_count()]
    }

    /// A channel as `[cycles, points, ...]`.
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<&ArrayD<f64>> {
        self.channels.get(name)
    }

    /// Channel names in sorted order.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Non-boundary events of one cycle, on the percent axis.
    #[must_use]
    pub fn events(&self, cycle: usize) -> Option<&[Event]> {
        self.events.get(cycle).map(Vec::as_slice)
    }

    /// Names of the tensor columns: scalar channels keep their name, other
    /// channels are expanded as `Name[i]` / `Name[i,j]`.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.column_count());
        for (name, arr) in &self.channels {
            let trailing = &arr.shape()[2..];
            if trailing.is_empty() {
                out.push(name.clone());
                continue;
            }
            for idx in ndarray::indices(IxDyn(trailing)) {
                let parts: Vec<String> = idx.slice().iter().map(ToString::to_string).collect();
                out.push(format!("{name}[{}]", parts.join(",")));
            }
        }
        out
    }

    /// Every channel flattened into one `[cycles, points, columns]` tensor,
    /// columns ordered as [`column_names`](Self::column_names).
    #[must_use]
    pub fn tensor(&self) -> Array3<f64> {
        let [cycles, points, cols] = self.shape();
        let mut out = Array3::from_elem((cycles, points, cols), f64::NAN);
        let mut offset = 0;
        for arr in self.channels.values() {
            let m: usize = arr.shape()[2..].iter().product();
            for (flat, &v) in arr.iter().enumerate() {
                let j = flat % m;
                let k = (flat / m) % points;
                let c = flat / (m * points);
                out[[c, k, offset + j]] = v;
            }
            offset += m;
        }
        out
    }

    fn column_count(&self) -> usize {
        self.channels
            .values()
            .map(|a| a.shape()[2..].iter().product::<usize>())
            .sum()
    }

    fn span_width(&self) -> f64 {
        self.span[1] - self.span[0]
    }

    fn check_index(&self, index: usize) -> Result<(), KinetraceError> {
        if index < self.n_cycles {
            Ok(())
        } else {
            Err(KinetraceError::out_of_bounds(format!(
                "cycle {index} outside [0, {})",
                self.n_cycles
            )))
        }
    }

    fn boundary_events(&self, cycle: usize) -> [Event; 2] {
        let w = self.span_width();
        #[allow(clippy::cast_precision_loss)]
        let (start, end) = (cycle as f64 * w + self.span[0], (cycle + 1) as f64 * w + self.span[0]);
        [
            Event::new(start, self.start_event.clone()),
            Event::new(end, self.end_event.clone()),
        ]
    }

    /// Cycle index and percent position of a flat time. Times outside the
    /// stacked range go to the first or last cycle.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn locate(&self, t: f64) -> (usize, f64) {
        let w = self.span_width();
        let rel = (t - self.span[0]) / w;
        let c = (rel + GRID_TOL).floor().clamp(0.0, (self.n_cycles - 1) as f64) as usize;
        (c, t - c as f64 * w)
    }

    fn near(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= GRID_TOL * self.span_width()
    }

    /// Boundary test for an event already placed in cycle `c`. The end
    /// event of cycle `c - 1` lands at the very start of cycle `c`.
    fn is_boundary(&self, c: usize, name: &str, pct: f64) -> bool {
        self.is_boundary_pct(name, pct)
            || (c > 0 && name == self.end_event && self.near(pct, self.span[0]))
    }

    fn is_boundary_pct(&self, name: &str, pct: f64) -> bool {
        (name == self.start_event && self.near(pct, self.span[0]))
            || (name == self.end_event && self.near(pct, self.span[1]))
    }
}
