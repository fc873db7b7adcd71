//! Structural scores for station networks: cost, mean travel time,
//! vulnerability, and connectivity.

use tracing::{debug, instrument};

use crate::{
    Result,
    cancel::CancellationToken,
    exec::Backend,
    graph::{Edge, Graph, NodeId},
    paths::{dijkstra, is_connected},
};

/// Returns the total edge weight of `graph`, counting each edge once.
///
/// # Examples
/// ```
/// use trailnet_core::{Graph, cost};
///
/// let mut graph = Graph::with_nodes(3);
/// assert_eq!(cost(&graph), 0.0);
/// graph.add_edge(0, 1, 1.5)?;
/// graph.add_edge(1, 2, 2.0)?;
/// assert_eq!(cost(&graph), 3.5);
/// # Ok::<(), trailnet_core::GraphError>(())
/// ```
#[must_use]
pub fn cost(graph: &Graph) -> f64 {
    graph.total_weight()
}

/// Returns the mean shortest-path length over ordered pairs of distinct
/// stations.
///
/// A pair without a path, or involving a station missing from `graph`,
/// contributes the graph's own [`cost`]. Fewer than two stations yield `0`.
///
/// # Examples
/// ```
/// use trailnet_core::{Graph, mean_travel_time};
///
/// let mut graph = Graph::with_nodes(3);
/// graph.add_edge(0, 1, 4.0)?;
/// // 0 <-> 1 costs 4 each way; both pairs with 2 pay the penalty of 4.
/// assert_eq!(mean_travel_time(&graph, &[0, 1]), 4.0);
/// assert_eq!(mean_travel_time(&graph, &[0, 2]), 4.0);
/// assert_eq!(mean_travel_time(&graph, &[0]), 0.0);
/// # Ok::<(), trailnet_core::GraphError>(())
/// ```
#[must_use]
pub fn mean_travel_time(graph: &Graph, stations: &[NodeId]) -> f64 {
    if stations.len() < 2 {
        return 0.0;
    }
    let penalty = cost(graph);
    let mut total = 0.0;
    for (source_idx, &source) in stations.iter().enumerate() {
        let tree = dijkstra(graph, source);
        for (target_idx, &target) in stations.iter().enumerate() {
            if source_idx != target_idx {
                total += tree.distance(target).unwrap_or(penalty);
            }
        }
    }
    let pairs = stations.len() * (stations.len() - 1);
    total / pairs as f64
}

/// Per-edge sensitivity of [`mean_travel_time`] to removing that edge.
///
/// Each value is `|reference - reduced|`, plus the base graph's [`cost`]
/// when the removal disconnects the graph. Results follow the canonical
/// edge order of [`Graph::edges`].
///
/// # Errors
/// Returns [`crate::TrailnetError::Cancelled`] when `cancel` fires between
/// trials.
pub fn edge_vulnerabilities(
    graph: &Graph,
    stations: &[NodeId],
    cancel: &CancellationToken,
) -> Result<Vec<(Edge, f64)>> {
    edge_vulnerabilities_with(Backend::default(), graph, stations, cancel)
}

pub(crate) fn edge_vulnerabilities_with(
    backend: Backend,
    graph: &Graph,
    stations: &[NodeId],
    cancel: &CancellationToken,
) -> Result<Vec<(Edge, f64)>> {
    let reference = mean_travel_time(graph, stations);
    let disconnect_penalty = cost(graph);
    let edges: Vec<Edge> = graph.edges().collect();

    backend.try_map(&edges, |&edge| {
        cancel.check()?;
        #[cfg(feature = "metrics")]
        metrics::counter!("trailnet_vulnerability_trials_total").increment(1);
        let mut reduced = graph.clone();
        reduced.remove_edge(edge.source(), edge.target());
        let mut score = (reference - mean_travel_time(&reduced, stations)).abs();
        if !is_connected(&reduced) {
            score += disconnect_penalty;
        }
        Ok((edge, score))
    })
}

/// Mean of [`edge_vulnerabilities`]; a graph without edges scores `0`.
///
/// # Errors
/// Returns [`crate::TrailnetError::Cancelled`] when `cancel` fires between
/// trials. A cancelled computation never yields a partial mean.
pub fn vulnerability(
    graph: &Graph,
    stations: &[NodeId],
    cancel: &CancellationToken,
) -> Result<f64> {
    vulnerability_with(Backend::default(), graph, stations, cancel)
}

#[instrument(
    name = "core.vulnerability",
    err,
    skip(graph, stations, cancel),
    fields(edges = graph.edge_count(), stations = stations.len()),
)]
pub(crate) fn vulnerability_with(
    backend: Backend,
    graph: &Graph,
    stations: &[NodeId],
    cancel: &CancellationToken,
) -> Result<f64> {
    let scores = edge_vulnerabilities_with(backend, graph, stations, cancel)?;
    if scores.is_empty() {
        return Ok(0.0);
    }
    let total: f64 = scores.iter().map(|(_, score)| score).sum();
    Ok(total / scores.len() as f64)
}

/// The scores reported for one network.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NetworkReport {
    /// Sum of edge weights.
    pub cost: f64,
    /// Mean station-to-station travel time.
    pub mean_travel_time: f64,
    /// Mean edge vulnerability.
    pub vulnerability: f64,
    /// Whether every node reaches every other.
    pub connected: bool,
}

impl NetworkReport {
    /// Scores `graph` with respect to `stations`.
    ///
    /// # Errors
    /// Returns [`crate::TrailnetError::Cancelled`] when `cancel` fires during
    /// the vulnerability trials.
    pub fn measure(
        graph: &Graph,
        stations: &[NodeId],
        cancel: &CancellationToken,
    ) -> Result<Self> {
        Self::measure_with(Backend::default(), graph, stations, cancel)
    }

    pub(crate) fn measure_with(
        backend: Backend,
        graph: &Graph,
        stations: &[NodeId],
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let report = Self {
            cost: cost(graph),
            mean_travel_time: mean_travel_time(graph, stations),
            vulnerability: vulnerability_with(backend, graph, stations, cancel)?,
            connected: is_connected(graph),
        };
        debug!(?report, "network measured");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::{fixture, rstest};

    use crate::error::TrailnetError;

    /// Unit triangle 0-1-2 with a unit bridge 2-3.
    #[fixture]
    fn bridged() -> Graph {
        let mut graph = Graph::with_nodes(4);
        for (left, right) in [(0, 1), (1, 2), (0, 2), (2, 3)] {
            graph.add_edge(left, right, 1.0).expect("valid edge");
        }
        graph
    }

    #[rstest]
    fn bridge_outweighs_redundant_edges(bridged: Graph) {
        let scores = edge_vulnerabilities(&bridged, &[0, 3], &CancellationToken::new())
            .expect("trials must succeed");
        let score = |left, right| {
            scores
                .iter()
                .find(|(edge, _)| (edge.source(), edge.target()) == (left, right))
                .map(|(_, score)| *score)
                .expect("edge must be scored")
        };
        assert_eq!(score(2, 3), 5.0);
        assert_eq!(score(0, 1), 0.0);
        assert_eq!(score(0, 2), 1.0);
        assert!(score(2, 3) > score(0, 2));
    }

    #[rstest]
    fn vulnerability_is_mean_of_edges(bridged: Graph) {
        // Edge scores: (0,1)=0, (0,2)=1, (1,2)=0, (2,3)=5.
        let value = vulnerability(&bridged, &[0, 3], &CancellationToken::new())
            .expect("trials must succeed");
        assert_eq!(value, 1.5);
    }

    #[test]
    fn empty_graph_scores_zero() {
        let graph = Graph::with_nodes(2);
        let report = NetworkReport::measure(&graph, &[0, 1], &CancellationToken::new())
            .expect("measure must succeed");
        assert_eq!(report.cost, 0.0);
        assert_eq!(report.mean_travel_time, 0.0);
        assert_eq!(report.vulnerability, 0.0);
        assert!(!report.connected);
    }

    #[test]
    fn disconnected_pair_costs_the_whole_network() {
        let mut graph = Graph::with_nodes(4);
        graph.add_edge(0, 2, 3.0).expect("valid edge");
        graph.add_edge(1, 3, 4.0).expect("valid edge");
        assert_eq!(mean_travel_time(&graph, &[0, 1]), cost(&graph));
    }

    #[rstest]
    fn cancelled_trials_return_no_mean(bridged: Graph) {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = vulnerability(&bridged, &[0, 3], &cancel).expect_err("cancel must abort");
        assert_eq!(err, TrailnetError::Cancelled);
    }
}
