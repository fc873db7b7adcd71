//! Single-source shortest paths and reachability over [`Graph`].

use std::{
    cmp::{Ordering, Reverse},
    collections::{BinaryHeap, VecDeque},
};

use crate::graph::{Graph, NodeId};

/// Frontier entry ordered by tentative distance, then node id, so equal
/// distances settle in ascending id order.
#[derive(Clone, Copy, Debug)]
struct Frontier {
    distance: f64,
    node: NodeId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.node.cmp(&other.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest-path tree rooted at one source, produced by [`dijkstra`].
///
/// # Examples
/// ```
/// use trailnet_core::{Graph, dijkstra};
///
/// let mut graph = Graph::with_nodes(4);
/// graph.add_edge(0, 1, 1.0)?;
/// graph.add_edge(1, 2, 1.0)?;
/// graph.add_edge(0, 2, 5.0)?;
/// let tree = dijkstra(&graph, 0);
/// assert_eq!(tree.distance(2), Some(2.0));
/// assert_eq!(tree.path_to(2), Some(vec![0, 1, 2]));
/// assert_eq!(tree.distance(3), None);
/// # Ok::<(), trailnet_core::GraphError>(())
/// ```
#[derive(Clone, Debug)]
pub struct ShortestPaths {
    source: NodeId,
    distances: Vec<Option<f64>>,
    predecessors: Vec<Option<NodeId>>,
}

impl ShortestPaths {
    /// Returns the root of the tree.
    #[must_use]
    #[rustfmt::skip]
    pub fn source(&self) -> NodeId { self.source }

    /// Returns the shortest-path length to `target`, or `None` if unreachable.
    #[must_use]
    pub fn distance(&self, target: NodeId) -> Option<f64> {
        self.distances.get(target).copied().flatten()
    }

    /// Returns the node sequence from the source to `target`, both included.
    #[must_use]
    pub fn path_to(&self, target: NodeId) -> Option<Vec<NodeId>> {
        self.distance(target)?;
        let mut path = vec![target];
        let mut current = target;
        while let Some(previous) = self.predecessors.get(current).copied().flatten() {
            path.push(previous);
            current = previous;
        }
        path.reverse();
        Some(path)
    }

    /// Iterates over `(node, distance)` for every reachable node, source included.
    pub fn reachable(&self) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.distances
            .iter()
            .enumerate()
            .filter_map(|(node, distance)| distance.map(|value| (node, value)))
    }
}

/// Runs Dijkstra's algorithm from `source`.
///
/// A source missing from the graph reaches nothing, not even itself.
#[must_use]
pub fn dijkstra(graph: &Graph, source: NodeId) -> ShortestPaths {
    let bound = graph.node_bound();
    let mut distances: Vec<Option<f64>> = vec![None; bound];
    let mut predecessors: Vec<Option<NodeId>> = vec![None; bound];
    let mut settled = vec![false; bound];
    let mut frontier = BinaryHeap::new();

    if graph.contains_node(source) {
        if let Some(slot) = distances.get_mut(source) {
            *slot = Some(0.0);
        }
        frontier.push(Reverse(Frontier {
            distance: 0.0,
            node: source,
        }));
    }

    while let Some(Reverse(Frontier { distance, node })) = frontier.pop() {
        match settled.get_mut(node) {
            Some(done) if !*done => *done = true,
            _ => continue,
        }
        for (neighbour, weight) in graph.neighbours(node) {
            let candidate = distance + weight;
            let Some(slot) = distances.get_mut(neighbour) else {
                continue;
            };
            if slot.is_none_or(|current| candidate < current) {
                *slot = Some(candidate);
                if let Some(previous) = predecessors.get_mut(neighbour) {
                    *previous = Some(node);
                }
                frontier.push(Reverse(Frontier {
                    distance: candidate,
                    node: neighbour,
                }));
            }
        }
    }

    ShortestPaths {
        source,
        distances,
        predecessors,
    }
}

/// Returns `true` when every node can reach every other node.
///
/// Graphs with fewer than two nodes are connected.
///
/// # Examples
/// ```
/// use trailnet_core::{Graph, is_connected};
///
/// let mut graph = Graph::with_nodes(3);
/// graph.add_edge(0, 1, 1.0)?;
/// assert!(!is_connected(&graph));
/// graph.add_edge(1, 2, 1.0)?;
/// assert!(is_connected(&graph));
/// # Ok::<(), trailnet_core::GraphError>(())
/// ```
#[must_use]
pub fn is_connected(graph: &Graph) -> bool {
    let Some(start) = graph.nodes().next() else {
        return true;
    };
    let mut visited = vec![false; graph.node_bound()];
    let mut queue = VecDeque::from([start]);
    let mut seen = 0_usize;
    if let Some(flag) = visited.get_mut(start) {
        *flag = true;
    }
    while let Some(node) = queue.pop_front() {
        seen += 1;
        for (neighbour, _) in graph.neighbours(node) {
            if let Some(flag) = visited.get_mut(neighbour) {
                if !*flag {
                    *flag = true;
                    queue.push_back(neighbour);
                }
            }
        }
    }
    seen == graph.node_count()
}
