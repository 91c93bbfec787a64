//! Configuration types shared by the resampler, the cycle pipeline, and its builder.

use serde::{Deserialize, Serialize};

use crate::KinetraceError;

/// Interpolation family used by gap filling and re-gridding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interpolation {
    /// Value of the nearest known sample; ties go to the earlier sample.
    Nearest,
    /// Piecewise linear between neighbouring known samples.
    #[default]
    Linear,
    /// Piecewise cubic Hermite with Fritsch-Carlson slopes (PCHIP).
    ///
    /// Never overshoots the data between two knots.
    MonotonicCubic,
}

impl Interpolation {
    /// Minimum number of finite knots the kernel needs.
    #[must_use]
    pub const fn min_knots(self) -> usize {
        match self {
            Self::Nearest => 1,
            Self::Linear | Self::MonotonicCubic => 2,
        }
    }
}

/// What to produce when re-gridding asks for a time outside the original bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum FillPolicy {
    /// Fill with NaN.
    #[default]
    Nan,
    /// Fill with a constant value.
    Constant(f64),
    /// Repeat the first/last known value.
    Hold,
    /// Extend the boundary segment of the interpolation kernel.
    Extrapolate,
}

/// Gap-filling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapFillConfig {
    /// Interpolation family used to fill gaps.
    pub method: Interpolation,
    /// Longest run of consecutive missing samples that will be filled.
    /// `None` fills gaps of any length.
    pub max_gap: Option<usize>,
    /// Fill leading/trailing gaps by holding the nearest known value.
    /// When false, edge gaps are reported as unfilled.
    pub fill_edges: bool,
}

impl Default for GapFillConfig {
    fn default() -> Self {
        Self {
            method: Interpolation::Linear,
            max_gap: None,
            fill_edges: false,
        }
    }
}

/// Which side of the hysteresis band defines a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    /// The phase starts when the signal rises above the high threshold and
    /// ends when it drops below the low threshold.
    #[default]
    Rising,
    /// The phase starts when the signal drops below the low threshold and
    /// ends when it rises above the high threshold.
    Falling,
}

/// Cycle detection parameters.
///
/// Duration and peak-height bounds are inclusive; `None` leaves that side open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectConfig {
    /// Scalar channel to scan.
    pub channel: String,
    /// Name of the event emitted when a phase starts.
    pub enter_event: String,
    /// Name of the event emitted when a phase ends.
    pub exit_event: String,
    /// Lower hysteresis threshold.
    pub low_threshold: f64,
    /// Upper hysteresis threshold.
    pub high_threshold: f64,
    /// Which side of the band is the phase of interest.
    pub direction: Direction,
    /// Minimum phase duration (time units).
    pub min_duration: Option<f64>,
    /// Maximum phase duration (time units).
    pub max_duration: Option<f64>,
    /// Minimum phase peak height.
    pub min_peak_height: Option<f64>,
    /// Maximum phase peak height.
    pub max_peak_height: Option<f64>,
}

impl DetectConfig {
    /// Build a configuration with open duration/height bounds.
    pub fn new(
        channel: impl Into<String>,
        enter_event: impl Into<String>,
        exit_event: impl Into<String>,
        low_threshold: f64,
        high_threshold: f64,
    ) -> Self {
        Self {
            channel: channel.into(),
            enter_event: enter_event.into(),
            exit_event: exit_event.into(),
            low_threshold,
            high_threshold,
            direction: Direction::Rising,
            min_duration: None,
            max_duration: None,
            min_peak_height: None,
            max_peak_height: None,
        }
    }

    /// Set the inclusive duration bounds.
    #[must_use]
    pub const fn with_duration(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_duration = min;
        self.max_duration = max;
        self
    }

    /// Set the inclusive peak-height bounds.
    #[must_use]
    pub const fn with_peak_height(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_peak_height = min;
        self.max_peak_height = max;
        self
    }

    /// Set the detection direction.
    #[must_use]
    pub const fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Validate thresholds and bounds.
    ///
    /// # Errors
    /// Returns `InvalidArg` for non-finite or inverted thresholds, inverted
    /// bounds, negative durations, or empty event names.
    pub fn validate(&self) -> Result<(), KinetraceError> {
        if !self.low_threshold.is_finite() || !self.high_threshold.is_finite() {
            return Err(KinetraceError::invalid_arg(format!(
                "thresholds must be finite (low={}, high={})",
                self.low_threshold, self.high_threshold
            )));
        }
        if self.low_threshold > self.high_threshold {
            return Err(KinetraceError::invalid_arg(format!(
                "low threshold {} is above high threshold {}",
                self.low_threshold, self.high_threshold
            )));
        }
        if self.enter_event.is_empty() || self.exit_event.is_empty() {
            return Err(KinetraceError::invalid_arg("event names must not be empty"));
        }
        if let Some(min) = self.min_duration
            && min < 0.0
        {
            return Err(KinetraceError::invalid_arg(format!(
                "min_duration {min} is negative"
            )));
        }
        check_bounds("duration", self.min_duration, self.max_duration)?;
        check_bounds("peak height", self.min_peak_height, self.max_peak_height)
    }
}

fn check_bounds(what: &str, min: Option<f64>, max: Option<f64>) -> Result<(), KinetraceError> {
    for v in [min, max].into_iter().flatten() {
        if v.is_nan() {
            return Err(KinetraceError::invalid_arg(format!("{what} bound is NaN")));
        }
    }
    if let (Some(lo), Some(hi)) = (min, max)
        && lo > hi
    {
        return Err(KinetraceError::invalid_arg(format!(
            "{what} bounds are inverted: [{lo}, {hi}]"
        )));
    }
    Ok(())
}

/// Time-normalization parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Event that opens each cycle.
    pub start_event: String,
    /// Event that closes each cycle (first occurrence after the start).
    pub end_event: String,
    /// Number of samples per normalized cycle.
    pub n_points: usize,
    /// Percent-of-cycle axis as `[start, end)`.
    pub span: [f64; 2],
    /// Interpolation family used to resample each cycle.
    pub method: Interpolation,
}

impl NormalizeConfig {
    /// Build a configuration with 100 points over `[0, 100)` and linear interpolation.
    pub fn new(start_event: impl Into<String>, end_event: impl Into<String>) -> Self {
        Self {
            start_event: start_event.into(),
            end_event: end_event.into(),
            n_points: 100,
            span: [0.0, 100.0],
            method: Interpolation::Linear,
        }
    }

    /// Set the number of points per cycle.
    #[must_use]
    pub const fn with_points(mut self, n_points: usize) -> Self {
        self.n_points = n_points;
        self
    }

    /// Set the percent-of-cycle span.
    #[must_use]
    pub const fn with_span(mut self, start: f64, end: f64) -> Self {
        self.span = [start, end];
        self
    }

    /// Set the interpolation family.
    #[must_use]
    pub const fn with_method(mut self, method: Interpolation) -> Self {
        self.method = method;
        self
    }

    /// Width of the span, i.e. the flat-axis length of one cycle.
    #[must_use]
    pub fn span_width(&self) -> f64 {
        self.span[1] - self.span[0]
    }

    /// Validate point count and span.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `n_points` is zero, the span is not finite and
    /// increasing, or an event name is empty.
    pub fn validate(&self) -> Result<(), KinetraceError> {
        if self.n_points == 0 {
            return Err(KinetraceError::invalid_arg("n_points must be positive"));
        }
        let [a, b] = self.span;
        if !a.is_finite() || !b.is_finite() || b <= a {
            return Err(KinetraceError::invalid_arg(format!(
                "span must be finite and increasing, got [{a}, {b}]"
            )));
        }
        if self.start_event.is_empty() || self.end_event.is_empty() {
            return Err(KinetraceError::invalid_arg("event names must not be empty"));
        }
        Ok(())
    }
}

/// How per-channel dissimilarities are combined into one number per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelCombine {
    /// Sum over channels.
    Sum,
    /// Average over channels.
    #[default]
    Mean,
}

/// Stopping rule for greedy outlier removal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SelectionPolicy {
    /// Remove cycles until this many remain.
    RetainCount(usize),
    /// Remove cycles while the mean pairwise dissimilarity of the remaining
    /// set drops by at least `threshold` (relative, e.g. 0.05 = 5%), never
    /// going below `min_count` cycles.
    MinImprovement {
        /// Lower bound on the retained count.
        min_count: usize,
        /// Minimum relative improvement required to remove one more cycle.
        threshold: f64,
    },
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::MinImprovement {
            min_count: 2,
            threshold: 0.05,
        }
    }
}

impl SelectionPolicy {
    /// Lower bound on the number of cycles retained.
    #[must_use]
    pub const fn min_count(&self) -> usize {
        match *self {
            Self::RetainCount(n) => n,
            Self::MinImprovement { min_count, .. } => min_count,
        }
    }
}

/// Most-repeatable-cycle selection parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectConfig {
    /// Channels compared between cycles; empty means every channel.
    pub channels: Vec<String>,
    /// How channel dissimilarities are combined.
    pub combine: ChannelCombine,
    /// Stopping rule.
    pub policy: SelectionPolicy,
}

impl SelectConfig {
    /// Compare the given channels with the default combination and policy.
    pub fn for_channels<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            channels: channels.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set the stopping rule.
    #[must_use]
    pub const fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the channel combination.
    #[must_use]
    pub const fn with_combine(mut self, combine: ChannelCombine) -> Self {
        self.combine = combine;
        self
    }

    /// Validate the stopping rule.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the improvement threshold is negative or NaN.
    pub fn validate(&self) -> Result<(), KinetraceError> {
        if let SelectionPolicy::MinImprovement { threshold, .. } = self.policy
            && (threshold.is_nan() || threshold < 0.0)
        {
            return Err(KinetraceError::invalid_arg(format!(
                "improvement threshold must be non-negative, got {threshold}"
            )));
        }
        Ok(())
    }
}

/// Full configuration for the detect → normalize → select pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Cycle detection; skipped when `None` (events already present).
    pub detect: Option<DetectConfig>,
    /// Time normalization.
    pub normalize: NormalizeConfig,
    /// Outlier rejection; skipped when `None`.
    pub select: Option<SelectConfig>,
}

impl AnalysisConfig {
    /// Parse a configuration from a JSON document.
    ///
    /// # Errors
    /// Returns `Data` if the document does not parse and `InvalidArg` if a
    /// section fails validation.
    pub fn from_json_str(s: &str) -> Result<Self, KinetraceError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate every section.
    ///
    /// # Errors
    /// Returns the first validation error found.
    pub fn validate(&self) -> Result<(), KinetraceError> {
        if let Some(d) = &self.detect {
            d.validate()?;
        }
        self.normalize.validate()?;
        if let Some(s) = &self.select {
            s.validate()?;
        }
        Ok(())
    }
}
