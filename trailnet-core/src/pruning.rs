//! Terrain-aware removal of mesh edges that cross too much water.

use tracing::{debug, instrument};

use crate::{
    Result,
    builder::DEFAULT_MAX_WATER_CROSSINGS,
    exec::Backend,
    geometry::{Point, TerrainGrid},
    graph::{Edge, Graph},
};

/// Drops edges whose rasterised segment crosses more than
/// `max_water_crossings` impassable cells.
///
/// Every node of the input graph is kept, including nodes left isolated, and
/// surviving edges keep their original weights.
///
/// # Examples
/// ```
/// use trailnet_core::{Graph, MapAwareEdgePruner, Point, TerrainGrid};
///
/// let points = [Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(0.0, 4.0)];
/// let mut terrain = TerrainGrid::passable(5, 5);
/// terrain.block(2, 0);
/// let mut mesh = Graph::with_nodes(3);
/// mesh.add_edge(0, 1, 4.0)?;
/// mesh.add_edge(0, 2, 4.0)?;
///
/// let pruned = MapAwareEdgePruner::new(0).prune(&mesh, &points, &terrain)?;
/// assert!(!pruned.contains_edge(0, 1));
/// assert!(pruned.contains_edge(0, 2));
/// assert_eq!(pruned.node_count(), 3);
/// # Ok::<(), trailnet_core::TrailnetError>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapAwareEdgePruner {
    max_water_crossings: usize,
}

impl Default for MapAwareEdgePruner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WATER_CROSSINGS)
    }
}

impl MapAwareEdgePruner {
    /// Creates a pruner tolerating up to `max_water_crossings` invalid cells.
    #[must_use]
    pub const fn new(max_water_crossings: usize) -> Self {
        Self {
            max_water_crossings,
        }
    }

    /// Returns the crossing threshold.
    #[must_use]
    #[rustfmt::skip]
    pub const fn max_water_crossings(&self) -> usize { self.max_water_crossings }

    /// Returns a copy of `mesh` without the edges that cross too much water.
    ///
    /// Node `i` of `mesh` is located at `points[i]`; edges touching a node
    /// with no coordinate are dropped.
    ///
    /// # Errors
    /// Returns [`crate::TrailnetError::Graph`] if a surviving edge cannot be
    /// inserted.
    pub fn prune(&self, mesh: &Graph, points: &[Point], terrain: &TerrainGrid) -> Result<Graph> {
        self.prune_with(Backend::default(), mesh, points, terrain)
    }

    #[instrument(
        name = "core.prune",
        err,
        skip(self, mesh, points, terrain),
        fields(edges = mesh.edge_count(), threshold = self.max_water_crossings),
    )]
    pub(crate) fn prune_with(
        &self,
        backend: Backend,
        mesh: &Graph,
        points: &[Point],
        terrain: &TerrainGrid,
    ) -> Result<Graph> {
        let edges: Vec<Edge> = mesh.edges().collect();
        let keep = backend.map(&edges, |edge| {
            match (points.get(edge.source()), points.get(edge.target())) {
                (Some(&start), Some(&end)) => {
                    terrain.count_crossings(start, end) <= self.max_water_crossings
                }
                _ => false,
            }
        });

        let mut pruned = Graph::new();
        for node in mesh.nodes() {
            pruned.add_node(node);
        }
        for (edge, keep) in edges.iter().zip(keep) {
            if keep {
                pruned.add_edge(edge.source(), edge.target(), edge.weight())?;
            }
        }
        debug!(
            kept = pruned.edge_count(),
            removed = mesh.edge_count() - pruned.edge_count(),
            "pruned mesh against terrain"
        );
        Ok(pruned)
    }
}
