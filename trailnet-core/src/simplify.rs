//! Degree-two contraction producing the network skeleton.

use std::collections::BTreeSet;

use tracing::{debug, instrument};

use crate::graph::{Graph, NodeId};

/// Removes relay nodes of degree two, joining their neighbours directly.
///
/// A non-station node with exactly two neighbours `left` and `right` is
/// replaced by an edge `left`–`right` weighing the sum of its two edges. If
/// that edge already exists, or the sum is not finite, the node is kept and
/// never revisited. Nodes are
/// processed from an ascending-id worklist and the neighbours of every
/// contracted node are queued again, so the result is a fixed point.
///
/// Contraction never changes the degree of a surviving node, which makes the
/// operation idempotent and preserves shortest-path lengths between the
/// nodes it keeps.
///
/// # Examples
/// ```
/// use trailnet_core::{Graph, TopologySimplifier};
///
/// let mut chain = Graph::with_nodes(4);
/// chain.add_edge(0, 1, 1.0)?;
/// chain.add_edge(1, 2, 2.0)?;
/// chain.add_edge(2, 3, 3.0)?;
/// let skeleton = TopologySimplifier::new().simplify(&chain, &[0, 3]);
/// assert_eq!(skeleton.node_count(), 2);
/// assert_eq!(skeleton.weight(0, 3), Some(6.0));
/// # Ok::<(), trailnet_core::GraphError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TopologySimplifier;

impl TopologySimplifier {
    /// Creates a simplifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the skeleton of `graph`, keeping every node in `stations`.
    #[must_use]
    #[instrument(
        name = "core.simplify",
        skip(self, graph, stations),
        fields(nodes = graph.node_count(), stations = stations.len()),
    )]
    pub fn simplify(&self, graph: &Graph, stations: &[NodeId]) -> Graph {
        let protected: BTreeSet<NodeId> = stations.iter().copied().collect();
        let mut skeleton = graph.clone();
        let mut blacklist = BTreeSet::new();
        let mut worklist: BTreeSet<NodeId> = skeleton.nodes().collect();
        let mut contracted = 0_usize;

        while let Some(node) = worklist.pop_first() {
            if protected.contains(&node)
                || blacklist.contains(&node)
                || skeleton.degree(node) != 2
            {
                continue;
            }
            let neighbours: Vec<(NodeId, f64)> = skeleton.neighbours(node).collect();
            let &[(left, w1), (right, w2)] = neighbours.as_slice() else {
                continue;
            };
            // An existing shortcut or an overflowing sum keeps the relay.
            if skeleton.contains_edge(left, right)
                || skeleton.add_edge(left, right, w1 + w2).is_err()
            {
                blacklist.insert(node);
                continue;
            }
            skeleton.remove_node(node);
            worklist.insert(left);
            worklist.insert(right);
            contracted += 1;
        }

        debug!(
            contracted,
            blacklisted = blacklist.len(),
            "contracted relay nodes"
        );
        skeleton
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::paths::dijkstra;

    #[test]
    fn triangle_relay_is_blacklisted() {
        // 0 - 1 - 2 with a direct 0 - 2 edge: node 1 cannot be contracted.
        let mut graph = Graph::with_nodes(3);
        graph.add_edge(0, 1, 1.0).expect("valid edge");
        graph.add_edge(1, 2, 1.0).expect("valid edge");
        graph.add_edge(0, 2, 5.0).expect("valid edge");
        let skeleton = TopologySimplifier::new().simplify(&graph, &[]);
        assert_eq!(skeleton, graph);
    }

    #[test]
    fn overflowing_relay_is_kept() {
        let mut graph = Graph::with_nodes(4);
        graph.add_edge(0, 1, f64::MAX).expect("valid edge");
        graph.add_edge(1, 2, f64::MAX).expect("valid edge");
        graph.add_edge(2, 3, 1.0).expect("valid edge");
        let skeleton = TopologySimplifier::new().simplify(&graph, &[0, 3]);

        // Relay 1 would need an infinite edge; relay 2 still contracts.
        assert_eq!(skeleton.nodes().collect::<Vec<_>>(), vec![0, 1, 3]);
        assert_eq!(skeleton.weight(0, 1), Some(f64::MAX));
        assert!(skeleton.contains_edge(1, 3));
    }

    #[test]
    fn stations_are_never_contracted() {
        let mut graph = Graph::with_nodes(3);
        graph.add_edge(0, 1, 1.0).expect("valid edge");
        graph.add_edge(1, 2, 1.0).expect("valid edge");
        let skeleton = TopologySimplifier::new().simplify(&graph, &[1]);
        assert_eq!(skeleton, graph);
    }

    #[test]
    fn isolated_and_leaf_nodes_are_kept() {
        let mut graph = Graph::with_nodes(5);
        graph.add_edge(0, 1, 1.0).expect("valid edge");
        graph.add_edge(1, 2, 1.0).expect("valid edge");
        let skeleton = TopologySimplifier::new().simplify(&graph, &[]);
        let nodes: Vec<_> = skeleton.nodes().collect();
        assert_eq!(nodes, vec![0, 2, 3, 4]);
        assert_eq!(skeleton.weight(0, 2), Some(2.0));
    }

    fn random_graph() -> impl Strategy<Value = (Graph, Vec<NodeId>)> {
        (3_usize..14).prop_flat_map(|nodes| {
            (
                prop::collection::vec((0..nodes, 0..nodes, 1_u8..10), 0..(nodes * 2)),
                prop::collection::vec(0..nodes, 0..4),
            )
                .prop_map(move |(edges, stations)| {
                    let mut graph = Graph::with_nodes(nodes);
                    for (left, right, weight) in edges {
                        if left != right && !graph.contains_edge(left, right) {
                            graph
                                .add_edge(left, right, f64::from(weight))
                                .expect("integral weights are valid");
                        }
                    }
                    (graph, stations)
                })
        })
    }

    proptest! {
        #[test]
        fn simplification_is_idempotent((graph, stations) in random_graph()) {
            let simplifier = TopologySimplifier::new();
            let once = simplifier.simplify(&graph, &stations);
            let twice = simplifier.simplify(&once, &stations);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn simplification_preserves_retained_distances((graph, stations) in random_graph()) {
            let skeleton = TopologySimplifier::new().simplify(&graph, &stations);
            for source in skeleton.nodes() {
                let before = dijkstra(&graph, source);
                let after = dijkstra(&skeleton, source);
                for target in skeleton.nodes() {
                    prop_assert_eq!(before.distance(target), after.distance(target));
                }
            }
            for station in &stations {
                prop_assert!(skeleton.contains_node(*station));
            }
        }
    }
}
