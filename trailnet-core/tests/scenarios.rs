//! Worked scenarios exercising the mesh, pruning, and simplification stages
//! together.

mod common;

use common::points;
use rstest::rstest;
use trailnet_core::{
    Graph, MapAwareEdgePruner, ProximityGraphBuilder, TerrainGrid, TopologySimplifier, cost,
    is_connected, mean_travel_time,
};
use trailnet_test_support::fixtures::{line, square};

fn edge_list(graph: &Graph) -> Vec<(usize, usize, f64)> {
    graph
        .edges()
        .map(|edge| (edge.source(), edge.target(), edge.weight()))
        .collect()
}

#[rstest]
#[case::no_stations(vec![])]
#[case::endpoint_stations(vec![0, 4])]
fn line_collapses_to_single_edge(#[case] stations: Vec<usize>) {
    let coords = points(&line(5, 1.0));
    let terrain = TerrainGrid::passable(10, 10);

    let mesh = ProximityGraphBuilder::new(2).build(&coords).expect("mesh builds");
    let pruned = MapAwareEdgePruner::default()
        .prune(&mesh, &coords, &terrain)
        .expect("mesh prunes");
    assert_eq!(
        edge_list(&pruned),
        vec![(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0)]
    );

    let skeleton = TopologySimplifier::new().simplify(&pruned, &stations);
    assert_eq!(edge_list(&skeleton), vec![(0, 4, 4.0)]);
    assert_eq!(skeleton.nodes().collect::<Vec<_>>(), vec![0, 4]);
}

#[test]
fn square_diagonals_are_pruned_by_blocked_centre() {
    // Side 10 so each diagonal passes three blocked pixels, one more than the
    // default tolerance.
    let coords = points(&square(10.0));
    let mut terrain = TerrainGrid::passable(11, 11);
    for x in 4..=6 {
        for y in 4..=6 {
            terrain.block(x, y);
        }
    }

    let mesh = ProximityGraphBuilder::new(4).build(&coords).expect("mesh builds");
    assert_eq!(mesh.edge_count(), 6);

    let pruned = MapAwareEdgePruner::default()
        .prune(&mesh, &coords, &terrain)
        .expect("mesh prunes");
    assert_eq!(
        edge_list(&pruned),
        vec![(0, 1, 10.0), (0, 2, 10.0), (1, 3, 10.0), (2, 3, 10.0)]
    );
    assert!(is_connected(&pruned));
}

#[test]
fn separated_stations_travel_at_network_cost() {
    let mut graph = Graph::with_nodes(4);
    graph.add_edge(0, 1, 2.5).expect("valid edge");
    graph.add_edge(2, 3, 4.0).expect("valid edge");
    assert!(!is_connected(&graph));
    assert_eq!(mean_travel_time(&graph, &[0, 3]), cost(&graph));
    assert_eq!(mean_travel_time(&graph, &[0, 3]), 6.5);
}
