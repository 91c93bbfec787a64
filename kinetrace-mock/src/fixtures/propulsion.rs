use std::collections::BTreeMap;
use std::f64::consts::PI;

use kinetrace_core::{Event, Metadata, TimeSeries};
use ndarray::{Array1, Array2, ArrayD};

/// Hand-rim propulsion: one half-sine push per cycle followed by recovery.
///
/// Channels:
/// - `Force`: total push force (N), zero during recovery.
/// - `Velocity`: wheel speed (m/s), a slow sinusoid around 1 m/s.
/// - `Rim`: `[n, 3]` force components, `[0.6, 0.8, 0.1] * Force`.
#[derive(Debug, Clone, PartialEq)]
pub struct Propulsion {
    /// Samples per second.
    pub rate: f64,
    /// Number of cycles.
    pub cycles: usize,
    /// Cycle duration (s).
    pub period: f64,
    /// Push start inside a cycle, as a fraction of the period.
    pub push_offset: f64,
    /// Push duration, as a fraction of the period.
    pub push_fraction: f64,
    /// Peak push force (N).
    pub peak: f64,
    /// Per-cycle multiplier applied to the push force.
    pub outliers: Vec<(usize, f64)>,
}

impl Default for Propulsion {
    fn default() -> Self {
        Self {
            rate: 100.0,
            cycles: 5,
            period: 1.0,
            push_offset: 0.1,
            push_fraction: 0.4,
            peak: 50.0,
            outliers: Vec::new(),
        }
    }
}

impl Propulsion {
    /// Default recording with `cycles` cycles.
    #[must_use]
    pub fn with_cycles(cycles: usize) -> Self {
        Self {
            cycles,
            ..Self::default()
        }
    }

    /// Scale the push of cycle `index` by `scale`.
    #[must_use]
    pub fn with_outlier(mut self, index: usize, scale: f64) -> Self {
        self.outliers.push((index, scale));
        self
    }

    /// Start time of the push in cycle `c`.
    #[must_use]
    pub fn push_start(&self, c: usize) -> f64 {
        (c as f64 + self.push_offset) * self.period
    }

    /// Push duration (s).
    #[must_use]
    pub fn push_duration(&self) -> f64 {
        self.push_fraction * self.period
    }

    fn n_samples(&self) -> usize {
        (self.cycles as f64 * self.period * self.rate).round() as usize
    }

    fn force_at(&self, t: f64) -> f64 {
        let c = (t / self.period).floor().max(0.0) as usize;
        let u = (t - self.push_start(c)) / self.push_duration();
        if !(0.0..=1.0).contains(&u) {
            return 0.0;
        }
        let scale = self
            .outliers
            .iter()
            .filter(|(i, _)| *i == c)
            .map(|(_, s)| *s)
            .product::<f64>();
        self.peak * scale * (PI * u).sin()
    }

    /// The recording without events.
    #[must_use]
    pub fn series(&self) -> TimeSeries {
        let n = self.n_samples();
        let time: Vec<f64> = (0..n).map(|i| i as f64 / self.rate).collect();
        let force: Vec<f64> = time.iter().map(|&t| self.force_at(t)).collect();
        let velocity: Vec<f64> = time
            .iter()
            .map(|&t| 1.0 + 0.2 * (2.0 * PI * t / self.period).sin())
            .collect();
        let rim = Array2::from_shape_fn((n, 3), |(i, j)| force[i] * [0.6, 0.8, 0.1][j]);

        let mut data: BTreeMap<String, ArrayD<f64>> = BTreeMap::new();
        data.insert("Force".into(), Array1::from(force).into_dyn());
        data.insert("Velocity".into(), Array1::from(velocity).into_dyn());
        data.insert("Rim".into(), rim.into_dyn());

        let mut data_info = BTreeMap::new();
        data_info.insert("Force".into(), unit("N"));
        data_info.insert("Velocity".into(), unit("m/s"));
        data_info.insert("Rim".into(), unit("N"));

        TimeSeries::from_parts(time, data, data_info, Vec::new(), unit("s")).unwrap()
    }

    /// The recording with a `push` event at every push start and a
    /// `release` event at every push end.
    #[must_use]
    pub fn series_with_events(&self) -> TimeSeries {
        let mut ts = self.series();
        let events = (0..self.cycles).flat_map(|c| {
            let s = self.push_start(c);
            [
                Event::new(s, "push"),
                Event::new(s + self.push_duration(), "release"),
            ]
        });
        ts.add_events(events).unwrap();
        ts
    }
}

fn unit(u: &str) -> Metadata {
    Metadata::from([("Unit".to_string(), serde_json::Value::from(u))])
}
