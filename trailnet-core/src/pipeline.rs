//! End-to-end orchestration of the mesh, refinement, and analysis stages.

use std::num::NonZeroUsize;

use tracing::{info, instrument};

use crate::{
    Result,
    analysis::NetworkReport,
    builder::ExecutionStrategy,
    cancel::CancellationToken,
    exec::Backend,
    experiment::ExperimentResult,
    graph::{Graph, NodeId},
    proximity::ProximityGraphBuilder,
    pruning::MapAwareEdgePruner,
    refine::{ProximitySubgraph, Refinement, StationNetworkRefiner},
    simplify::TopologySimplifier,
};

/// Skeleton and scores computed for one proximity level.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelReport {
    level: usize,
    skeleton: Graph,
    report: NetworkReport,
}

impl LevelReport {
    /// Returns the proximity level.
    #[must_use]
    #[rustfmt::skip]
    pub fn level(&self) -> usize { self.level }

    /// Returns the simplified backbone the scores were computed on.
    #[must_use]
    #[rustfmt::skip]
    pub fn skeleton(&self) -> &Graph { &self.skeleton }

    /// Returns the network scores.
    #[must_use]
    #[rustfmt::skip]
    pub fn report(&self) -> &NetworkReport { &self.report }
}

/// Configured network-construction pipeline, created by
/// [`crate::PipelineBuilder`].
///
/// # Examples
/// ```
/// use trailnet_core::{
///     CancellationToken, ExperimentMetadata, ExperimentResult, PipelineBuilder, Point,
///     TerrainGrid,
/// };
///
/// let nuclei: Vec<Point> = (1..4).map(|x| Point::new(f64::from(x), 0.0)).collect();
/// let experiment = ExperimentResult::try_new(
///     &nuclei,
///     &[Point::new(0.0, 1.0), Point::new(4.0, 0.0)],
///     TerrainGrid::passable(8, 8),
///     ExperimentMetadata::default(),
/// )?;
/// let pipeline = PipelineBuilder::new()
///     .with_neighbours(3)
///     .with_proximity_levels([1])
///     .build()?;
/// let reports = pipeline.run(&experiment, &CancellationToken::new())?;
/// assert_eq!(reports.len(), 1);
/// assert!(reports[0].report().connected);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    neighbours: NonZeroUsize,
    max_water_crossings: usize,
    proximity_levels: Vec<usize>,
    execution_strategy: ExecutionStrategy,
    backend: Backend,
}

impl Pipeline {
    pub(crate) fn new(
        neighbours: NonZeroUsize,
        max_water_crossings: usize,
        proximity_levels: Vec<usize>,
        execution_strategy: ExecutionStrategy,
        backend: Backend,
    ) -> Self {
        Self {
            neighbours,
            max_water_crossings,
            proximity_levels,
            execution_strategy,
            backend,
        }
    }

    /// Returns the neighbourhood size, query point included.
    #[must_use]
    #[rustfmt::skip]
    pub fn neighbours(&self) -> NonZeroUsize { self.neighbours }

    /// Returns the crossing threshold used for pruning.
    #[must_use]
    #[rustfmt::skip]
    pub fn max_water_crossings(&self) -> usize { self.max_water_crossings }

    /// Returns the proximity levels in ascending order.
    #[must_use]
    #[rustfmt::skip]
    pub fn proximity_levels(&self) -> &[usize] { &self.proximity_levels }

    /// Returns the execution strategy requested at build time.
    #[must_use]
    #[rustfmt::skip]
    pub fn execution_strategy(&self) -> ExecutionStrategy { self.execution_strategy }

    /// Builds the k-nearest-neighbour mesh and prunes it against the terrain.
    ///
    /// # Errors
    /// Returns [`crate::TrailnetError::Graph`] if a mesh or pruned edge
    /// cannot be inserted.
    #[instrument(
        name = "core.build_mesh",
        err,
        skip(self, experiment),
        fields(points = experiment.point_count(), neighbours = self.neighbours.get()),
    )]
    pub fn build_mesh(&self, experiment: &ExperimentResult) -> Result<Graph> {
        let mesh = ProximityGraphBuilder::new(self.neighbours.get())
            .build_with(self.backend, experiment.points())?;
        MapAwareEdgePruner::new(self.max_water_crossings).prune_with(
            self.backend,
            &mesh,
            experiment.points(),
            experiment.terrain(),
        )
    }

    /// Computes station distances and one backbone per configured level.
    ///
    /// # Errors
    /// Returns [`crate::TrailnetError::Cancelled`] when `cancel` fires.
    pub fn refine(
        &self,
        mesh: &Graph,
        stations: &[NodeId],
        cancel: &CancellationToken,
    ) -> Result<Refinement> {
        StationNetworkRefiner::new(self.proximity_levels.iter().copied())
            .refine_with(self.backend, mesh, stations, cancel)
    }

    /// Simplifies one backbone and scores the resulting skeleton.
    ///
    /// # Errors
    /// Returns [`crate::TrailnetError::Cancelled`] when `cancel` fires during
    /// the vulnerability trials.
    #[instrument(
        name = "core.analyse",
        err,
        skip(self, subgraph, stations, cancel),
        fields(level = subgraph.level()),
    )]
    pub fn analyse(
        &self,
        subgraph: &ProximitySubgraph,
        stations: &[NodeId],
        cancel: &CancellationToken,
    ) -> Result<LevelReport> {
        let skeleton = TopologySimplifier::new().simplify(subgraph.graph(), stations);
        let report = NetworkReport::measure_with(self.backend, &skeleton, stations, cancel)?;
        Ok(LevelReport {
            level: subgraph.level(),
            skeleton,
            report,
        })
    }

    /// Runs every stage for `experiment` without caching, one report per level.
    ///
    /// # Errors
    /// Propagates failures from [`Self::build_mesh`], [`Self::refine`] and
    /// [`Self::analyse`].
    #[instrument(
        name = "core.run",
        err,
        skip(self, experiment, cancel),
        fields(
            points = experiment.point_count(),
            stations = experiment.station_indices().len(),
            strategy = ?self.execution_strategy,
        ),
    )]
    pub fn run(
        &self,
        experiment: &ExperimentResult,
        cancel: &CancellationToken,
    ) -> Result<Vec<LevelReport>> {
        cancel.check()?;
        let stations = experiment.stations();
        let mesh = self.build_mesh(experiment)?;
        let refinement = self.refine(&mesh, &stations, cancel)?;
        let reports = refinement
            .subgraphs()
            .iter()
            .map(|subgraph| self.analyse(subgraph, &stations, cancel))
            .collect::<Result<Vec<_>>>()?;
        info!(levels = reports.len(), "experiment analysed");
        Ok(reports)
    }
}
