//! Text encodings for cached edge lists and distance tables.
//!
//! Edge lists use the weighted edge-list form `a b {'weight': w}`, one edge
//! per line. Distance tables are JSON objects keyed by source station, then
//! by target station.

use std::{collections::BTreeMap, fmt::Write as _};

use trailnet_core::{DistanceTable, Edge, Graph, NodeId};

use crate::errors::CodecError;

const WEIGHT_PREFIX: &str = "{'weight':";
const WEIGHT_SUFFIX: &str = "}";

/// Renders every edge of `graph` on its own line in canonical order.
///
/// # Examples
/// ```
/// use trailnet_core::Graph;
/// use trailnet_providers_cache::encode_edge_list;
///
/// let mut graph = Graph::with_nodes(3);
/// graph.add_edge(2, 0, 1.5)?;
/// graph.add_edge(1, 2, 2.0)?;
/// assert_eq!(encode_edge_list(&graph), "0 2 {'weight': 1.5}\n1 2 {'weight': 2.0}\n");
/// # Ok::<(), trailnet_core::GraphError>(())
/// ```
#[must_use]
pub fn encode_edge_list(graph: &Graph) -> String {
    let mut out = String::new();
    for edge in graph.edges() {
        // `{:?}` keeps a trailing `.0` on integral weights and round-trips.
        let _ = writeln!(
            out,
            "{} {} {WEIGHT_PREFIX} {:?}{WEIGHT_SUFFIX}",
            edge.source(),
            edge.target(),
            edge.weight()
        );
    }
    out
}

/// Parses an edge list produced by [`encode_edge_list`]. Blank lines are
/// skipped.
///
/// # Errors
/// Returns [`CodecError`] naming the first malformed line (1-based).
pub fn decode_edge_list(text: &str) -> Result<Vec<Edge>, CodecError> {
    let mut edges = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let malformed = || CodecError::MalformedEdge {
            line,
            text: trimmed.to_owned(),
        };
        let mut parts = trimmed.splitn(3, char::is_whitespace);
        let (Some(left), Some(right), Some(attrs)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        let weight = attrs
            .trim()
            .strip_prefix(WEIGHT_PREFIX)
            .and_then(|rest| rest.strip_suffix(WEIGHT_SUFFIX))
            .map(str::trim)
            .ok_or_else(malformed)?;
        edges.push(Edge::new(
            parse_node(left, line)?,
            parse_node(right, line)?,
            weight.parse().map_err(|_| CodecError::InvalidWeight {
                line,
                token: weight.to_owned(),
            })?,
        ));
    }
    Ok(edges)
}

fn parse_node(token: &str, line: usize) -> Result<NodeId, CodecError> {
    token.parse().map_err(|_| CodecError::InvalidNode {
        line,
        token: token.to_owned(),
    })
}

/// Serialises `table` as nested JSON objects.
///
/// # Errors
/// Returns the serializer error; finite lengths always serialise.
pub fn encode_distances(table: &DistanceTable) -> Result<Vec<u8>, serde_json::Error> {
    let mut nested: BTreeMap<NodeId, BTreeMap<NodeId, f64>> = BTreeMap::new();
    for ((source, target), length) in table.iter() {
        nested.entry(source).or_default().insert(target, length);
    }
    serde_json::to_vec(&nested)
}

/// Parses a table produced by [`encode_distances`].
///
/// # Errors
/// Returns [`CodecError::Json`] when the document is not a nested map
/// of node ids to lengths.
///
/// # Examples
/// ```
/// use trailnet_providers_cache::decode_distances;
///
/// let table = decode_distances(br#"{"3": {"5": 2.5}, "5": {"3": 2.5}}"#)?;
/// assert_eq!(table.get(3, 5), Some(2.5));
/// assert_eq!(table.len(), 2);
/// # Ok::<(), trailnet_providers_cache::CodecError>(())
/// ```
pub fn decode_distances(bytes: &[u8]) -> Result<DistanceTable, CodecError> {
    let nested: BTreeMap<NodeId, BTreeMap<NodeId, f64>> = serde_json::from_slice(bytes)?;
    Ok(DistanceTable::from_entries(nested.into_iter().flat_map(
        |(source, targets)| {
            targets
                .into_iter()
                .map(move |(target, length)| ((source, target), length))
        },
    )))
}
