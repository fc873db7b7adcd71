//! Weighted undirected simple graph shared by every pipeline stage.
//!
//! Nodes are explicit so isolated nodes survive pruning, and adjacency is
//! kept in ordered maps so node and edge iteration is deterministic.

use std::{cmp::Ordering, collections::BTreeMap};

use crate::error::GraphError;

/// Identifier of a node: an index into the experiment's point list.
pub type NodeId = usize;

/// An undirected edge in canonical form (`source < target`).
///
/// # Examples
/// ```
/// use trailnet_core::Edge;
///
/// let edge = Edge::new(5, 2, 1.5);
/// assert_eq!((edge.source(), edge.target()), (2, 5));
/// assert_eq!(edge.weight(), 1.5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    source: NodeId,
    target: NodeId,
    weight: f64,
}

impl Edge {
    /// Creates an edge, ordering the endpoints canonically.
    #[must_use]
    pub fn new(left: NodeId, right: NodeId, weight: f64) -> Self {
        let (source, target) = if left <= right {
            (left, right)
        } else {
            (right, left)
        };
        Self {
            source,
            target,
            weight,
        }
    }

    /// Returns the smaller endpoint id.
    #[must_use]
    #[rustfmt::skip]
    pub fn source(&self) -> NodeId { self.source }

    /// Returns the larger endpoint id.
    #[must_use]
    #[rustfmt::skip]
    pub fn target(&self) -> NodeId { self.target }

    /// Returns the edge weight.
    #[must_use]
    #[rustfmt::skip]
    pub fn weight(&self) -> f64 { self.weight }
}

impl Eq for Edge {}

impl Ord for Edge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.source
            .cmp(&other.source)
            .then_with(|| self.target.cmp(&other.target))
            .then_with(|| self.weight.total_cmp(&other.weight))
    }
}

impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Weighted undirected graph without self-loops or parallel edges.
///
/// # Examples
/// ```
/// use trailnet_core::Graph;
///
/// let mut graph = Graph::with_nodes(3);
/// graph.add_edge(0, 1, 2.0)?;
/// graph.add_edge(1, 2, 0.5)?;
/// assert_eq!(graph.node_count(), 3);
/// assert_eq!(graph.edge_count(), 2);
/// assert_eq!(graph.weight(2, 1), Some(0.5));
/// assert_eq!(graph.total_weight(), 2.5);
/// # Ok::<(), trailnet_core::GraphError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    adjacency: BTreeMap<NodeId, BTreeMap<NodeId, f64>>,
    edge_count: usize,
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a graph holding the isolated nodes `0..count`.
    #[must_use]
    pub fn with_nodes(count: usize) -> Self {
        let mut graph = Self::new();
        for node in 0..count {
            graph.add_node(node);
        }
        graph
    }

    /// Inserts `node` if it is not already present.
    pub fn add_node(&mut self, node: NodeId) {
        self.adjacency.entry(node).or_default();
    }

    /// Inserts an undirected edge, adding missing endpoints.
    ///
    /// Returns `Ok(true)` when the edge is new and `Ok(false)` when an
    /// identical edge was already present.
    ///
    /// # Errors
    /// Returns [`GraphError`] for self-loops, non-finite or negative weights,
    /// or an existing edge stored with a different weight.
    pub fn add_edge(
        &mut self,
        left: NodeId,
        right: NodeId,
        weight: f64,
    ) -> Result<bool, GraphError> {
        if left == right {
            return Err(GraphError::SelfLoop { node: left });
        }
        if !weight.is_finite() {
            return Err(GraphError::NonFiniteWeight { left, right });
        }
        if weight < 0.0 {
            return Err(GraphError::NegativeWeight {
                left,
                right,
                weight,
            });
        }
        if let Some(existing) = self.weight(left, right) {
            if existing == weight {
                return Ok(false);
            }
            return Err(GraphError::ConflictingWeight {
                left,
                right,
                existing,
                requested: weight,
            });
        }
        self.adjacency.entry(left).or_default().insert(right, weight);
        self.adjacency.entry(right).or_default().insert(left, weight);
        self.edge_count += 1;
        Ok(true)
    }

    /// Removes the edge between `left` and `right`, returning its weight.
    pub fn remove_edge(&mut self, left: NodeId, right: NodeId) -> Option<f64> {
        let weight = self.adjacency.get_mut(&left)?.remove(&right)?;
        if let Some(neighbours) = self.adjacency.get_mut(&right) {
            neighbours.remove(&left);
        }
        self.edge_count -= 1;
        Some(weight)
    }

    /// Removes `node` and its incident edges. Returns `false` when absent.
    pub fn remove_node(&mut self, node: NodeId) -> bool {
        let Some(neighbours) = self.adjacency.remove(&node) else {
            return false;
        };
        for neighbour in neighbours.keys() {
            if let Some(back) = self.adjacency.get_mut(neighbour) {
                back.remove(&node);
            }
        }
        self.edge_count -= neighbours.len();
        true
    }

    /// Returns whether `node` is part of the graph.
    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.adjacency.contains_key(&node)
    }

    /// Returns the weight of the edge between `left` and `right`, if any.
    #[must_use]
    pub fn weight(&self, left: NodeId, right: NodeId) -> Option<f64> {
        self.adjacency.get(&left)?.get(&right).copied()
    }

    /// Returns whether an edge joins `left` and `right`.
    #[must_use]
    pub fn contains_edge(&self, left: NodeId, right: NodeId) -> bool {
        self.weight(left, right).is_some()
    }

    /// Returns the number of edges incident to `node` (zero when absent).
    #[must_use]
    pub fn degree(&self, node: NodeId) -> usize {
        self.adjacency.get(&node).map_or(0, BTreeMap::len)
    }

    /// Iterates over `(neighbour, weight)` pairs of `node` in ascending order.
    pub fn neighbours(&self, node: NodeId) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.adjacency
            .get(&node)
            .into_iter()
            .flat_map(|neighbours| neighbours.iter().map(|(&id, &weight)| (id, weight)))
    }

    /// Iterates over node ids in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.keys().copied()
    }

    /// Iterates over every edge once, in canonical ascending order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.adjacency.iter().flat_map(|(&source, neighbours)| {
            neighbours
                .range(source.saturating_add(1)..)
                .map(move |(&target, &weight)| Edge {
                    source,
                    target,
                    weight,
                })
        })
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns the number of undirected edges.
    #[must_use]
    #[rustfmt::skip]
    pub fn edge_count(&self) -> usize { self.edge_count }

    /// Returns `true` when the graph holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Returns one past the largest node id, sizing dense per-node buffers.
    #[must_use]
    pub fn node_bound(&self) -> usize {
        self.adjacency
            .last_key_value()
            .map_or(0, |(&id, _)| id.saturating_add(1))
    }

    /// Returns the sum of all edge weights, counting each edge once.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.edges().map(|edge| edge.weight).sum()
    }
}
