use kinetrace_core::{
    AnalysisConfig, DetectConfig, KinetraceError, NormalizeConfig, SelectConfig, TimeSeries,
};

use crate::cycles::{CycleStack, Phase, detect_cycles, most_repeatable_cycles, time_normalize};

/// Detect → normalize → stack → select pipeline over one series.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleAnalysis {
    pub(crate) cfg: AnalysisConfig,
}

/// Builder for constructing a [`CycleAnalysis`] with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct CycleAnalysisBuilder {
    detect: Option<DetectConfig>,
    normalize: Option<NormalizeConfig>,
    select: Option<SelectConfig>,
}

impl CycleAnalysisBuilder {
    /// Create an empty builder. Only the normalization step is mandatory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Detect phases before normalizing.
    ///
    /// Behavior and trade-offs:
    /// - Without this step the input must already carry the boundary events
    ///   named by the normalization.
    /// - Detection appends events to the analysed copy only; the caller's
    ///   series is never modified.
    #[must_use]
    pub fn detect(mut self, cfg: DetectConfig) -> Self {
        self.detect = Some(cfg);
        self
    }

    /// Set the cycle boundaries and the percent grid.
    #[must_use]
    pub fn normalize(mut self, cfg: NormalizeConfig) -> Self {
        self.normalize = Some(cfg);
        self
    }

    /// Reject outlier cycles after stacking.
    ///
    /// Behavior and trade-offs:
    /// - Selection is quadratic in the number of cycles.
    /// - Without this step every normalized cycle is retained.
    #[must_use]
    pub fn select(mut self, cfg: SelectConfig) -> Self {
        self.select = Some(cfg);
        self
    }

    /// Build the pipeline.
    ///
    /// # Errors
    /// Returns `InvalidArg` if no normalization was set or a step's
    /// configuration fails validation.
    pub fn build(self) -> Result<CycleAnalysis, KinetraceError> {
        let Some(normalize) = self.normalize else {
            return Err(KinetraceError::invalid_arg(
                "no normalization configured; set one via normalize(...)",
            ));
        };
        CycleAnalysis::from_config(AnalysisConfig {
            detect: self.detect,
            normalize,
            select: self.select,
        })
    }
}

/// Everything produced by one [`CycleAnalysis::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Detected phases; empty when detection was not configured.
    pub phases: Vec<Phase>,
    /// Flat normalized series, events included.
    pub normalized: TimeSeries,
    /// Every normalized cycle.
    pub stack: CycleStack,
    /// Indices into `stack` of the retained cycles, ascending.
    pub retained: Vec<usize>,
}

impl CycleReport {
    /// Stack restricted to the retained cycles.
    ///
    /// # Errors
    /// Returns `OutOfBounds` if `retained` was edited to hold an index past
    /// the stack.
    pub fn retained_stack(&self) -> Result<CycleStack, KinetraceError> {
        self.stack.select(&self.retained)
    }

    /// Number of cycles dropped by the selection step.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.stack.n_cycles().saturating_sub(self.retained.len())
    }
}

impl CycleAnalysis {
    /// Create a new [`CycleAnalysisBuilder`].
    ///
    /// ```
    /// use kinetrace::{CycleAnalysis, DetectConfig, NormalizeConfig};
    ///
    /// let analysis = CycleAnalysis::builder()
    ///     .detect(DetectConfig::new("Force", "push", "release", 5.0, 20.0))
    ///     .normalize(NormalizeConfig::new("push", "push").with_points(101))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(analysis.config().normalize.n_points, 101);
    /// ```
    #[must_use]
    pub fn builder() -> CycleAnalysisBuilder {
        CycleAnalysisBuilder::new()
    }

    /// Build the pipeline from a complete configuration, for example one
    /// parsed with [`AnalysisConfig::from_json_str`].
    ///
    /// # Errors
    /// Returns `InvalidArg` if a section fails validation.
    pub fn from_config(cfg: AnalysisConfig) -> Result<Self, KinetraceError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// The configuration this pipeline runs with.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.cfg
    }

    /// Run every configured step on a copy of `ts`.
    ///
    /// # Errors
    /// Propagates the first failing step: detection (`NotFound`,
    /// `InvalidArg`), normalization (`NotFound` when no complete cycle
    /// exists), stacking (`IrregularCycle`) or selection (`NotFound`).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "kinetrace::run",
            skip(self, ts),
            fields(samples = ts.len(), channels = ts.channel_count()),
        )
    )]
    pub fn run(&self, ts: &TimeSeries) -> Result<CycleReport, KinetraceError> {
        let mut working = ts.copy();
        let phases = match &self.cfg.detect {
            Some(detect) => detect_cycles(&mut working, detect)?,
            None => Vec::new(),
        };
        let normalized = time_normalize(&working, &self.cfg.normalize)?;
        let stack = CycleStack::stack(&normalized, &self.cfg.normalize)?;
        let retained = match &self.cfg.select {
            Some(select) => most_repeatable_cycles(&stack, select)?,
            None => (0..stack.n_cycles()).collect(),
        };

        #[cfg(feature = "tracing")]
        tracing::info!(
            phases = phases.len(),
            cycles = stack.n_cycles(),
            retained = retained.len(),
            "cycle analysis complete"
        );

        Ok(CycleReport {
            phases,
            normalized,
            stack,
            retained,
        })
    }
}
