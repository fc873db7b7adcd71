//! Builder utilities for configuring trailnet pipelines.
//!
//! Exposes the execution strategy selection surface and the validation run
//! before a [`Pipeline`] is constructed.

use std::num::NonZeroUsize;

use crate::{
    Result, error::TrailnetError, exec::Backend, pipeline::Pipeline,
    proximity::DEFAULT_NEIGHBOURS,
};

/// Default number of invalid cells an edge may cross before it is pruned.
pub const DEFAULT_MAX_WATER_CROSSINGS: usize = 2;

/// Default proximity levels analysed for each experiment.
pub const DEFAULT_PROXIMITY_LEVELS: [usize; 3] = [1, 2, 3];

/// Indicates how a [`Pipeline`] fans out refinement sources and
/// vulnerability trials.
///
/// `Auto` resolves deterministically: it uses the Rayon backend when the
/// `parallel` feature is compiled in and runs sequentially otherwise.
///
/// # Examples
/// ```
/// use trailnet_core::ExecutionStrategy;
///
/// let strategy: ExecutionStrategy = "sequential".parse().expect("known strategy");
/// assert_eq!(strategy, ExecutionStrategy::Sequential);
/// assert!("gpu".parse::<ExecutionStrategy>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Allow the library to select an appropriate backend automatically.
    #[default]
    Auto,
    /// Run every stage on the calling thread.
    Sequential,
    /// Spread independent work across the Rayon thread pool.
    Parallel,
}

impl ExecutionStrategy {
    pub(crate) fn resolve(self) -> Result<Backend> {
        match self {
            Self::Auto => Ok(Backend::default()),
            Self::Sequential => Ok(Backend::Sequential),
            #[cfg(feature = "parallel")]
            Self::Parallel => Ok(Backend::Parallel),
            #[cfg(not(feature = "parallel"))]
            Self::Parallel => Err(TrailnetError::BackendUnavailable {
                requested: Self::Parallel,
            }),
        }
    }
}

impl std::str::FromStr for ExecutionStrategy {
    type Err = String;

    fn from_str(value: &str) -> core::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "sequential" => Ok(Self::Sequential),
            "parallel" => Ok(Self::Parallel),
            other => Err(format!(
                "unknown execution strategy `{other}` (expected auto, sequential or parallel)"
            )),
        }
    }
}

/// Configures and constructs [`Pipeline`] instances.
///
/// # Examples
/// ```
/// use trailnet_core::{ExecutionStrategy, PipelineBuilder};
///
/// let pipeline = PipelineBuilder::new()
///     .with_neighbours(6)
///     .with_proximity_levels([3, 1, 3])
///     .with_execution_strategy(ExecutionStrategy::Sequential)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(pipeline.neighbours().get(), 6);
/// assert_eq!(pipeline.proximity_levels(), &[1, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    neighbours: usize,
    max_water_crossings: usize,
    proximity_levels: Vec<usize>,
    execution_strategy: ExecutionStrategy,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            neighbours: DEFAULT_NEIGHBOURS,
            max_water_crossings: DEFAULT_MAX_WATER_CROSSINGS,
            proximity_levels: DEFAULT_PROXIMITY_LEVELS.to_vec(),
            execution_strategy: ExecutionStrategy::Auto,
        }
    }
}

impl PipelineBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use trailnet_core::{ExecutionStrategy, PipelineBuilder};
    ///
    /// let builder = PipelineBuilder::new();
    /// assert_eq!(builder.neighbours(), 10);
    /// assert_eq!(builder.max_water_crossings(), 2);
    /// assert_eq!(builder.proximity_levels(), &[1, 2, 3]);
    /// assert_eq!(builder.execution_strategy(), ExecutionStrategy::Auto);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the neighbourhood size used for the proximity mesh.
    #[must_use]
    pub fn with_neighbours(mut self, neighbours: usize) -> Self {
        self.neighbours = neighbours;
        self
    }

    /// Returns the configured neighbourhood size.
    #[must_use]
    #[rustfmt::skip]
    pub fn neighbours(&self) -> usize { self.neighbours }

    /// Overrides the number of invalid cells an edge may cross.
    #[must_use]
    pub fn with_max_water_crossings(mut self, crossings: usize) -> Self {
        self.max_water_crossings = crossings;
        self
    }

    /// Returns the configured crossing threshold.
    #[must_use]
    #[rustfmt::skip]
    pub fn max_water_crossings(&self) -> usize { self.max_water_crossings }

    /// Replaces the proximity levels to analyse.
    #[must_use]
    pub fn with_proximity_levels<I>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        self.proximity_levels = levels.into_iter().collect();
        self
    }

    /// Returns the proximity levels as supplied.
    #[must_use]
    #[rustfmt::skip]
    pub fn proximity_levels(&self) -> &[usize] { &self.proximity_levels }

    /// Sets the execution strategy used by parallelisable stages.
    #[must_use]
    pub fn with_execution_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.execution_strategy = strategy;
        self
    }

    /// Returns the currently configured execution strategy.
    #[must_use]
    #[rustfmt::skip]
    pub fn execution_strategy(&self) -> ExecutionStrategy { self.execution_strategy }

    /// Validates the configuration and constructs a [`Pipeline`].
    ///
    /// Proximity levels are sorted and deduplicated.
    ///
    /// # Errors
    /// Returns [`TrailnetError::InvalidNeighbourCount`] for a zero
    /// neighbourhood, [`TrailnetError::EmptyProximityLevels`] or
    /// [`TrailnetError::InvalidProximityLevel`] for unusable levels, and
    /// [`TrailnetError::BackendUnavailable`] when the strategy cannot be
    /// satisfied by this build.
    pub fn build(self) -> Result<Pipeline> {
        let neighbours = NonZeroUsize::new(self.neighbours).ok_or(
            TrailnetError::InvalidNeighbourCount {
                got: self.neighbours,
            },
        )?;

        let mut levels = self.proximity_levels;
        if levels.is_empty() {
            return Err(TrailnetError::EmptyProximityLevels);
        }
        if let Some(&got) = levels.iter().find(|&&level| level == 0) {
            return Err(TrailnetError::InvalidProximityLevel { got });
        }
        levels.sort_unstable();
        levels.dedup();

        let backend = self.execution_strategy.resolve()?;
        Ok(Pipeline::new(
            neighbours,
            self.max_water_crossings,
            levels,
            self.execution_strategy,
            backend,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::zero_neighbours(
        PipelineBuilder::new().with_neighbours(0),
        TrailnetError::InvalidNeighbourCount { got: 0 },
    )]
    #[case::no_levels(
        PipelineBuilder::new().with_proximity_levels(Vec::new()),
        TrailnetError::EmptyProximityLevels,
    )]
    #[case::zero_level(
        PipelineBuilder::new().with_proximity_levels([2, 0]),
        TrailnetError::InvalidProximityLevel { got: 0 },
    )]
    fn build_rejects_invalid_configuration(
        #[case] builder: PipelineBuilder,
        #[case] expected: TrailnetError,
    ) {
        let err = builder.build().expect_err("configuration must be rejected");
        assert_eq!(err, expected);
    }

    #[test]
    fn sequential_strategy_always_resolves() {
        assert_eq!(ExecutionStrategy::Sequential.resolve(), Ok(Backend::Sequential));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn auto_prefers_rayon_when_compiled_in() {
        assert_eq!(ExecutionStrategy::Auto.resolve(), Ok(Backend::Parallel));
    }

    #[cfg(not(feature = "parallel"))]
    #[test]
    fn parallel_is_unavailable_without_rayon() {
        let err = PipelineBuilder::new()
            .with_execution_strategy(ExecutionStrategy::Parallel)
            .build()
            .expect_err("parallel backend must be unavailable");
        assert_eq!(
            err,
            TrailnetError::BackendUnavailable {
                requested: ExecutionStrategy::Parallel
            }
        );
    }

    #[rstest]
    #[case("auto", ExecutionStrategy::Auto)]
    #[case("Sequential", ExecutionStrategy::Sequential)]
    #[case("PARALLEL", ExecutionStrategy::Parallel)]
    fn strategies_parse_case_insensitively(#[case] raw: &str, #[case] expected: ExecutionStrategy) {
        assert_eq!(raw.parse::<ExecutionStrategy>(), Ok(expected));
    }
}
