//! k-nearest-neighbour mesh construction over an R*-tree.

use rstar::{RTree, primitives::GeomWithData};
use tracing::{debug, instrument};

use crate::{
    Result,
    exec::Backend,
    geometry::Point,
    graph::{Graph, NodeId},
};

/// Default neighbourhood size, counting the query point itself.
pub const DEFAULT_NEIGHBOURS: usize = 10;

type IndexedPoint = GeomWithData<[f64; 2], NodeId>;

/// Connects every point to its nearest neighbours by Euclidean distance.
///
/// The neighbourhood size counts the query point, which is then dropped, so
/// each point selects up to `neighbours - 1` others. Equal distances are
/// resolved by ascending point index. Selections need not be mutual; each
/// selected pair yields one undirected edge.
///
/// # Examples
/// ```
/// use trailnet_core::{Point, ProximityGraphBuilder};
///
/// let points: Vec<Point> = (0..5).map(|x| Point::new(f64::from(x), 0.0)).collect();
/// let graph = ProximityGraphBuilder::new(2).build(&points)?;
/// let edges: Vec<_> = graph.edges().map(|edge| (edge.source(), edge.target())).collect();
/// assert_eq!(edges, vec![(0, 1), (1, 2), (2, 3), (3, 4)]);
/// # Ok::<(), trailnet_core::TrailnetError>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProximityGraphBuilder {
    neighbours: usize,
}

impl Default for ProximityGraphBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_NEIGHBOURS)
    }
}

impl ProximityGraphBuilder {
    /// Creates a builder with the given neighbourhood size.
    #[must_use]
    pub const fn new(neighbours: usize) -> Self {
        Self { neighbours }
    }

    /// Returns the neighbourhood size, query point included.
    #[must_use]
    #[rustfmt::skip]
    pub const fn neighbours(&self) -> usize { self.neighbours }

    /// Builds the mesh over `points`; node `i` is `points[i]`.
    ///
    /// # Errors
    /// Returns [`crate::TrailnetError::Graph`] if a coordinate produces a
    /// non-finite distance.
    pub fn build(&self, points: &[Point]) -> Result<Graph> {
        self.build_with(Backend::default(), points)
    }

    #[instrument(
        name = "core.proximity",
        err,
        skip(self, points),
        fields(points = points.len(), neighbours = self.neighbours),
    )]
    pub(crate) fn build_with(&self, backend: Backend, points: &[Point]) -> Result<Graph> {
        let mut graph = Graph::with_nodes(points.len());
        let wanted = self.neighbours.saturating_sub(1);
        if wanted == 0 || points.len() < 2 {
            return Ok(graph);
        }

        let indexed: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .map(|(id, point)| IndexedPoint::new(point.to_array(), id))
            .collect();
        let tree = RTree::bulk_load(indexed.clone());

        let selections = backend.map(&indexed, |entry| {
            nearest_others(&tree, entry.data, *entry.geom(), wanted)
        });

        for (node, selected) in selections.into_iter().enumerate() {
            for other in selected {
                if let (Some(from), Some(to)) = (points.get(node), points.get(other)) {
                    graph.add_edge(node, other, from.distance(*to))?;
                }
            }
        }
        debug!(edges = graph.edge_count(), "proximity mesh assembled");
        Ok(graph)
    }
}

fn nearest_others(
    tree: &RTree<IndexedPoint>,
    node: NodeId,
    query: [f64; 2],
    wanted: usize,
) -> Vec<NodeId> {
    let mut selected: Vec<(f64, NodeId)> = Vec::with_capacity(wanted);
    for (entry, distance_2) in tree.nearest_neighbor_iter_with_distance_2(&query) {
        if entry.data == node {
            continue;
        }
        // Keep collecting through ties at the boundary so the index tie-break
        // sees every equally distant candidate.
        let boundary_passed = selected.len() >= wanted
            && selected
                .last()
                .is_some_and(|&(furthest, _)| distance_2 > furthest);
        if boundary_passed {
            break;
        }
        selected.push((distance_2, entry.data));
    }
    selected.sort_by(|left, right| left.0.total_cmp(&right.0).then(left.1.cmp(&right.1)));
    selected.truncate(wanted);
    selected.into_iter().map(|(_, id)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero(0)]
    #[case::self_only(1)]
    fn degenerate_neighbourhoods_yield_no_edges(#[case] neighbours: usize) {
        let points = [Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        let graph = ProximityGraphBuilder::new(neighbours)
            .build(&points)
            .expect("build must succeed");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn empty_input_yields_empty_graph() {
        let graph = ProximityGraphBuilder::default()
            .build(&[])
            .expect("build must succeed");
        assert!(graph.is_empty());
    }

    #[test]
    fn ties_prefer_lower_indices() {
        // Node 0 sits equidistant from 1, 2, 3 and 4.
        let points = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, -1.0),
            Point::new(-1.0, 0.0),
        ];
        let tree = RTree::bulk_load(
            points
                .iter()
                .enumerate()
                .map(|(id, point)| IndexedPoint::new(point.to_array(), id))
                .collect(),
        );
        assert_eq!(nearest_others(&tree, 0, points[0].to_array(), 2), vec![1, 2]);
    }

    #[test]
    fn duplicate_coordinates_become_zero_weight_edges() {
        let points = [Point::new(2.0, 2.0), Point::new(2.0, 2.0), Point::new(9.0, 9.0)];
        let graph = ProximityGraphBuilder::new(2)
            .build(&points)
            .expect("build must succeed");
        assert_eq!(graph.weight(0, 1), Some(0.0));
    }

    fn point_cloud() -> impl Strategy<Value = Vec<Point>> {
        prop::collection::vec((0.0_f64..200.0, 0.0_f64..200.0), 0..60)
            .prop_map(|coords| coords.into_iter().map(|(x, y)| Point::new(x, y)).collect())
    }

    proptest! {
        #[test]
        fn mesh_has_no_self_loops_and_bounded_selection(
            points in point_cloud(),
            neighbours in 1_usize..8,
        ) {
            let graph = ProximityGraphBuilder::new(neighbours)
                .build(&points)
                .expect("finite points must build");
            prop_assert_eq!(graph.node_count(), points.len());
            for edge in graph.edges() {
                prop_assert_ne!(edge.source(), edge.target());
                let expected = points[edge.source()].distance(points[edge.target()]);
                let actual = edge.weight();
                prop_assert!((actual - expected).abs() <= 1e-9);
            }
            // Each node selects at most `neighbours - 1` others, so the edge
            // total is bounded by the sum of selections.
            prop_assert!(graph.edge_count() <= points.len() * neighbours.saturating_sub(1));
        }
    }
}
