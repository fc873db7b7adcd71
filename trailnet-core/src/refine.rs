//! Station-to-station shortest paths and the per-level backbone subgraphs
//! built from them.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::{
    Result,
    cancel::CancellationToken,
    error::GraphError,
    exec::Backend,
    graph::{Edge, Graph, NodeId},
    paths::dijkstra,
};

/// Shortest-path lengths between ordered pairs of connected stations.
///
/// # Examples
/// ```
/// use trailnet_core::DistanceTable;
///
/// let table = DistanceTable::from_entries([((4, 7), 2.5), ((7, 4), 2.5)]);
/// assert_eq!(table.get(4, 7), Some(2.5));
/// assert_eq!(table.get(4, 5), None);
/// assert_eq!(table.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DistanceTable {
    entries: BTreeMap<(NodeId, NodeId), f64>,
}

impl DistanceTable {
    /// Builds a table from `((source, target), length)` entries. Later
    /// duplicates replace earlier ones.
    #[must_use]
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = ((NodeId, NodeId), f64)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Returns the shortest-path length from `source` to `target`, if connected.
    #[must_use]
    pub fn get(&self, source: NodeId, target: NodeId) -> Option<f64> {
        self.entries.get(&(source, target)).copied()
    }

    /// Iterates over `((source, target), length)` in ascending pair order.
    pub fn iter(&self) -> impl Iterator<Item = ((NodeId, NodeId), f64)> + '_ {
        self.entries.iter().map(|(&pair, &length)| (pair, length))
    }

    /// Returns the number of connected ordered pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no pair of stations is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Backbone graph for one proximity level.
#[derive(Clone, Debug, PartialEq)]
pub struct ProximitySubgraph {
    level: usize,
    graph: Graph,
}

impl ProximitySubgraph {
    /// Assembles a subgraph holding every station plus the given edges.
    ///
    /// # Errors
    /// Returns [`GraphError`] when an edge is invalid or conflicts with an
    /// earlier edge over the same pair.
    pub fn from_edges<S, E>(
        level: usize,
        stations: S,
        edges: E,
    ) -> core::result::Result<Self, GraphError>
    where
        S: IntoIterator<Item = NodeId>,
        E: IntoIterator<Item = Edge>,
    {
        let mut graph = Graph::new();
        for station in stations {
            graph.add_node(station);
        }
        for edge in edges {
            graph.add_edge(edge.source(), edge.target(), edge.weight())?;
        }
        Ok(Self { level, graph })
    }

    /// Returns the proximity level this subgraph was built for.
    #[must_use]
    #[rustfmt::skip]
    pub fn level(&self) -> usize { self.level }

    /// Returns the backbone graph.
    #[must_use]
    #[rustfmt::skip]
    pub fn graph(&self) -> &Graph { &self.graph }

    /// Consumes the subgraph, returning its graph.
    #[must_use]
    pub fn into_graph(self) -> Graph {
        self.graph
    }
}

/// Output of [`StationNetworkRefiner::refine`]: the distance table and one
/// subgraph per requested level, in ascending level order.
#[derive(Clone, Debug, PartialEq)]
pub struct Refinement {
    distances: DistanceTable,
    subgraphs: Vec<ProximitySubgraph>,
}

impl Refinement {
    /// Reassembles a refinement from previously computed parts.
    #[must_use]
    pub fn from_parts(distances: DistanceTable, mut subgraphs: Vec<ProximitySubgraph>) -> Self {
        subgraphs.sort_by_key(ProximitySubgraph::level);
        Self {
            distances,
            subgraphs,
        }
    }

    /// Returns the station distance table.
    #[must_use]
    #[rustfmt::skip]
    pub fn distances(&self) -> &DistanceTable { &self.distances }

    /// Returns every subgraph in ascending level order.
    #[must_use]
    #[rustfmt::skip]
    pub fn subgraphs(&self) -> &[ProximitySubgraph] { &self.subgraphs }

    /// Returns the subgraph built for `level`, if it was requested.
    #[must_use]
    pub fn level(&self, level: usize) -> Option<&ProximitySubgraph> {
        self.subgraphs.iter().find(|subgraph| subgraph.level == level)
    }
}

/// One station's shortest path to another station.
#[derive(Clone, Debug, PartialEq)]
struct StationPath {
    target: NodeId,
    length: f64,
    nodes: Vec<NodeId>,
}

/// Computes station shortest paths over the mesh and unions the nearest
/// ones into one backbone per proximity level.
///
/// # Examples
/// ```
/// use trailnet_core::{CancellationToken, Graph, StationNetworkRefiner};
///
/// // Stations 0, 2 and 4 along a path; node 1 and 3 are relays.
/// let mut mesh = Graph::with_nodes(5);
/// for node in 0..4 {
///     mesh.add_edge(node, node + 1, 1.0)?;
/// }
/// let refinement = StationNetworkRefiner::new([1, 2])
///     .refine(&mesh, &[0, 2, 4], &CancellationToken::new())?;
/// assert_eq!(refinement.distances().get(0, 4), Some(4.0));
/// let nearest = refinement.level(1).expect("level 1 requested").graph();
/// assert_eq!(nearest.edge_count(), 4);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StationNetworkRefiner {
    levels: Vec<usize>,
}

impl StationNetworkRefiner {
    /// Creates a refiner for the given proximity levels; they are sorted and
    /// deduplicated.
    #[must_use]
    pub fn new<I>(levels: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut levels: Vec<usize> = levels.into_iter().collect();
        levels.sort_unstable();
        levels.dedup();
        Self { levels }
    }

    /// Returns the proximity levels in ascending order.
    #[must_use]
    #[rustfmt::skip]
    pub fn levels(&self) -> &[usize] { &self.levels }

    /// Refines `mesh` around `stations`.
    ///
    /// # Errors
    /// Returns [`crate::TrailnetError::Cancelled`] when `cancel` fires between
    /// sources.
    pub fn refine(
        &self,
        mesh: &Graph,
        stations: &[NodeId],
        cancel: &CancellationToken,
    ) -> Result<Refinement> {
        self.refine_with(Backend::default(), mesh, stations, cancel)
    }

    #[instrument(
        name = "core.refine",
        err,
        skip(self, mesh, stations, cancel),
        fields(stations = stations.len(), levels = ?self.levels),
    )]
    pub(crate) fn refine_with(
        &self,
        backend: Backend,
        mesh: &Graph,
        stations: &[NodeId],
        cancel: &CancellationToken,
    ) -> Result<Refinement> {
        let per_source = backend.try_map(stations, |&source| {
            cancel.check()?;
            #[cfg(feature = "metrics")]
            metrics::counter!("trailnet_refinement_sources_total").increment(1);
            Ok(station_paths(mesh, source, stations))
        })?;

        let mut distances = BTreeMap::new();
        for (&source, paths) in stations.iter().zip(&per_source) {
            for path in paths {
                distances.insert((source, path.target), path.length);
            }
        }

        let mut subgraphs = Vec::with_capacity(self.levels.len());
        for &level in &self.levels {
            let edges = per_source
                .iter()
                .flat_map(|paths| paths.iter().take(level))
                .flat_map(|path| path_edges(mesh, &path.nodes));
            subgraphs.push(ProximitySubgraph::from_edges(
                level,
                stations.iter().copied(),
                edges,
            )?);
        }

        debug!(pairs = distances.len(), "station refinement complete");
        Ok(Refinement {
            distances: DistanceTable { entries: distances },
            subgraphs,
        })
    }
}

/// Returns every reachable station path from `source`, shortest first with
/// ties broken by target id.
fn station_paths(mesh: &Graph, source: NodeId, stations: &[NodeId]) -> Vec<StationPath> {
    let tree = dijkstra(mesh, source);
    let mut paths: Vec<StationPath> = stations
        .iter()
        .filter(|&&target| target != source)
        .filter_map(|&target| {
            let length = tree.distance(target)?;
            let nodes = tree.path_to(target)?;
            Some(StationPath {
                target,
                length,
                nodes,
            })
        })
        .collect();
    paths.sort_by(|left, right| {
        left.length
            .total_cmp(&right.length)
            .then(left.target.cmp(&right.target))
    });
    paths
}

fn path_edges<'a>(mesh: &'a Graph, nodes: &'a [NodeId]) -> impl Iterator<Item = Edge> + 'a {
    nodes.windows(2).filter_map(|pair| match *pair {
        [left, right] => mesh.weight(left, right).map(|weight| Edge::new(left, right, weight)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::TrailnetError;

    /// Stations 0, 1, 2 on a line with relays: 0 -r3- 1 -r4- 2, plus an
    /// unreachable station 5.
    fn relay_mesh() -> Graph {
        let mut mesh = Graph::with_nodes(6);
        for (left, right, weight) in [(0, 3, 1.0), (3, 1, 1.0), (1, 4, 2.0), (4, 2, 2.0)] {
            mesh.add_edge(left, right, weight).expect("valid edge");
        }
        mesh
    }

    #[test]
    fn distances_skip_disconnected_pairs() {
        let refinement = StationNetworkRefiner::new([1])
            .refine(&relay_mesh(), &[0, 1, 2, 5], &CancellationToken::new())
            .expect("refinement must succeed");
        let table = refinement.distances();
        assert_eq!(table.get(0, 2), Some(6.0));
        assert_eq!(table.get(2, 0), Some(6.0));
        assert_eq!(table.get(0, 5), None);
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn levels_grow_monotonically() {
        let refinement = StationNetworkRefiner::new([2, 1])
            .refine(&relay_mesh(), &[0, 1, 2, 5], &CancellationToken::new())
            .expect("refinement must succeed");
        let first = refinement.level(1).expect("level 1").graph();
        let second = refinement.level(2).expect("level 2").graph();
        assert_eq!(refinement.subgraphs()[0].level(), 1);
        for edge in first.edges() {
            assert!(second.contains_edge(edge.source(), edge.target()));
        }
        assert!(first.contains_node(5), "stations are always present");
        assert_eq!(second.weight(1, 4), Some(2.0));
    }

    #[test]
    fn cancellation_aborts_refinement() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = StationNetworkRefiner::new([1])
            .refine(&relay_mesh(), &[0, 1, 2], &cancel)
            .expect_err("cancelled refinement must fail");
        assert_eq!(err, TrailnetError::Cancelled);
    }

    #[test]
    fn equal_lengths_prefer_lower_target() {
        // Station 0 is equidistant from stations 1 and 2.
        let mut mesh = Graph::with_nodes(3);
        mesh.add_edge(0, 1, 1.0).expect("valid edge");
        mesh.add_edge(0, 2, 1.0).expect("valid edge");
        let paths = station_paths(&mesh, 0, &[2, 0, 1]);
        let targets: Vec<_> = paths.iter().map(|path| path.target).collect();
        assert_eq!(targets, vec![1, 2]);
    }
}
