use std::path::Path;

use rstest::{fixture, rstest};
use trailnet_core::{CancellationToken, Graph, Refinement, StationNetworkRefiner};

use super::{
    ArtifactStore, FsArtifactStore, MemoryArtifactStore, RefinementCache, RefinementParameters,
    distances_key, edge_list_key, parameters_key,
};

const STATIONS: [usize; 3] = [0, 1, 2];
const LEVELS: [usize; 2] = [1, 2];
const PARAMS: RefinementParameters = RefinementParameters {
    neighbours: 10,
    max_water_crossings: 2,
    stations: 3,
};

#[fixture]
fn refinement() -> Refinement {
    let mut mesh = Graph::with_nodes(5);
    for (left, right, weight) in [(0, 3, 1.0), (3, 1, 1.5), (1, 4, 2.0), (4, 2, 2.0)] {
        mesh.add_edge(left, right, weight).expect("valid edge");
    }
    StationNetworkRefiner::new(LEVELS)
        .refine(&mesh, &STATIONS, &CancellationToken::new())
        .expect("refinement must succeed")
}

#[rstest]
fn keys_extend_the_experiment_path() {
    let path = Path::new("runs/exp.json");
    assert_eq!(
        edge_list_key(path, 3),
        Path::new("runs/exp.json.p3.weighted.edgelist")
    );
    assert_eq!(distances_key(path), Path::new("runs/exp.json.distances.json"));
    assert_eq!(parameters_key(path), Path::new("runs/exp.json.params.json"));
}

#[rstest]
fn stored_refinement_is_loaded_back(refinement: Refinement) {
    let cache = RefinementCache::new(MemoryArtifactStore::new());
    let path = Path::new("exp.json");
    assert_eq!(cache.load(path, &PARAMS, &STATIONS, &LEVELS).expect("load"), None);

    cache.store(path, &PARAMS, &refinement).expect("store");
    let loaded = cache
        .load(path, &PARAMS, &STATIONS, &LEVELS)
        .expect("load")
        .expect("cache must hit");
    assert_eq!(loaded, refinement);
    assert_eq!(cache.artifacts().keys().len(), 4);
}

#[rstest]
fn distance_table_is_retracted_first_and_published_last(refinement: Refinement) {
    #[derive(Default)]
    struct Journal(std::sync::Mutex<Vec<(&'static str, std::path::PathBuf)>>);

    impl Journal {
        fn record(&self, op: &'static str, key: &Path) {
            self.0.lock().expect("journal lock").push((op, key.to_path_buf()));
        }
    }

    impl ArtifactStore for Journal {
        fn load(&self, _key: &Path) -> Result<Option<Vec<u8>>, crate::StoreError> {
            Ok(None)
        }

        fn publish(&self, key: &Path, _bytes: &[u8]) -> Result<(), crate::StoreError> {
            self.record("publish", key);
            Ok(())
        }

        fn retract(&self, key: &Path) -> Result<(), crate::StoreError> {
            self.record("retract", key);
            Ok(())
        }
    }

    let journal = Journal::default();
    let path = Path::new("exp.json");
    RefinementCache::new(&journal)
        .store(path, &PARAMS, &refinement)
        .expect("store");
    let order = journal.0.into_inner().expect("journal lock");
    assert_eq!(
        order,
        vec![
            ("retract", distances_key(path)),
            ("publish", edge_list_key(path, 1)),
            ("publish", edge_list_key(path, 2)),
            ("publish", parameters_key(path)),
            ("publish", distances_key(path)),
        ]
    );
}

#[rstest]
#[case::neighbours(RefinementParameters { neighbours: 3, ..PARAMS })]
#[case::threshold(RefinementParameters { max_water_crossings: 100, ..PARAMS })]
#[case::stations(RefinementParameters { stations: 4, ..PARAMS })]
fn changed_parameters_are_a_miss(refinement: Refinement, #[case] other: RefinementParameters) {
    let cache = RefinementCache::new(MemoryArtifactStore::new());
    let path = Path::new("exp.json");
    cache.store(path, &PARAMS, &refinement).expect("store");

    assert_eq!(cache.load(path, &other, &STATIONS, &LEVELS).expect("load"), None);
    assert!(
        cache
            .load(path, &PARAMS, &STATIONS, &LEVELS)
            .expect("load")
            .is_some()
    );
}

#[rstest]
fn interrupted_republish_is_a_miss(refinement: Refinement) {
    let cache = RefinementCache::new(MemoryArtifactStore::new());
    let path = Path::new("exp.json");
    cache.store(path, &PARAMS, &refinement).expect("store");

    // A later run under new parameters stops after writing its parameters.
    let other = RefinementParameters { neighbours: 3, ..PARAMS };
    let store = cache.artifacts();
    store.retract(&distances_key(path)).expect("retract");
    store
        .publish(&parameters_key(path), &serde_json::to_vec(&other).expect("encode"))
        .expect("publish");

    assert_eq!(cache.load(path, &other, &STATIONS, &LEVELS).expect("load"), None);
    assert_eq!(cache.load(path, &PARAMS, &STATIONS, &LEVELS).expect("load"), None);
}

#[rstest]
fn missing_level_is_a_miss(refinement: Refinement) {
    let cache = RefinementCache::new(MemoryArtifactStore::new());
    let path = Path::new("exp.json");
    cache.store(path, &PARAMS, &refinement).expect("store");

    assert_eq!(cache.load(path, &PARAMS, &STATIONS, &[1, 2, 3]).expect("load"), None);
    assert!(cache.artifacts().remove(&edge_list_key(path, 2)));
    assert_eq!(cache.load(path, &PARAMS, &STATIONS, &LEVELS).expect("load"), None);
}

#[rstest]
fn subset_of_cached_levels_hits(refinement: Refinement) {
    let cache = RefinementCache::new(MemoryArtifactStore::new());
    let path = Path::new("exp.json");
    cache.store(path, &PARAMS, &refinement).expect("store");

    let loaded = cache
        .load(path, &PARAMS, &STATIONS, &[2])
        .expect("load")
        .expect("cache must hit");
    assert_eq!(loaded.subgraphs().len(), 1);
    assert_eq!(loaded.level(2), refinement.level(2));
}

#[rstest]
#[case::garbled_edges("exp.json.p1.weighted.edgelist", b"0 1 weight".as_slice())]
#[case::conflicting_edges(
    "exp.json.p1.weighted.edgelist",
    b"0 3 {'weight': 1.0}\n3 0 {'weight': 2.0}\n".as_slice()
)]
#[case::invalid_utf8("exp.json.p2.weighted.edgelist", [0xff_u8, 0xfe].as_slice())]
#[case::garbled_distances("exp.json.distances.json", b"{not json".as_slice())]
#[case::garbled_parameters("exp.json.params.json", b"[10, 2]".as_slice())]
fn corrupt_artifacts_are_a_miss(
    refinement: Refinement,
    #[case] key: &str,
    #[case] bytes: &[u8],
) {
    let cache = RefinementCache::new(MemoryArtifactStore::new());
    let path = Path::new("exp.json");
    cache.store(path, &PARAMS, &refinement).expect("store");
    cache.artifacts().publish(Path::new(key), bytes).expect("overwrite");

    assert_eq!(cache.load(path, &PARAMS, &STATIONS, &LEVELS).expect("load"), None);
}

#[rstest]
fn filesystem_cache_round_trips(refinement: Refinement) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("exp.json");
    let cache = RefinementCache::new(FsArtifactStore);

    cache.store(&path, &PARAMS, &refinement).expect("store");
    assert!(edge_list_key(&path, 1).is_file());
    assert!(distances_key(&path).is_file());
    assert!(parameters_key(&path).is_file());
    let loaded = cache
        .load(&path, &PARAMS, &STATIONS, &LEVELS)
        .expect("load")
        .expect("cache must hit");
    assert_eq!(loaded, refinement);
}
