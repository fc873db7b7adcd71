//! Benchmark parameter types.

use std::fmt;

use trailnet_core::ExecutionStrategy;

/// Parameters for a mesh construction benchmark run.
#[derive(Clone, Debug)]
pub struct MeshBenchParams {
    /// Number of candidate points.
    pub point_count: usize,
    /// Neighbourhood size, counting the point itself.
    pub neighbours: usize,
}

impl fmt::Display for MeshBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},k={}", self.point_count, self.neighbours)
    }
}

/// Parameters for an end-to-end pipeline benchmark run.
#[derive(Clone, Debug)]
pub struct PipelineBenchParams {
    /// Number of candidate points.
    pub point_count: usize,
    /// Backend selection.
    pub strategy: ExecutionStrategy,
}

impl fmt::Display for PipelineBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},{:?}", self.point_count, self.strategy)
    }
}
