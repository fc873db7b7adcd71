//! Proximity mesh benchmarks.
//!
//! Measures k-nearest-neighbour mesh construction and terrain pruning on
//! seeded scatters of increasing size.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use trailnet_benches::{
    params::MeshBenchParams,
    scenario::{ScenarioConfig, ScenarioError, generate},
};
use trailnet_core::{MapAwareEdgePruner, ProximityGraphBuilder, TrailnetError};

const SEED: u64 = 42;

const POINT_COUNTS: &[usize] = &[500, 2_000, 5_000];

const NEIGHBOURS: usize = 10;

#[derive(Debug, thiserror::Error)]
enum SetupError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Core(#[from] TrailnetError),
}

fn mesh_impl(c: &mut Criterion) -> Result<(), SetupError> {
    let mut group = c.benchmark_group("mesh");
    group.sample_size(20);

    for &point_count in POINT_COUNTS {
        let experiment = generate(&ScenarioConfig {
            nucleus_count: point_count,
            station_count: 8,
            extent: 256,
            seed: SEED,
        })?;
        let builder = ProximityGraphBuilder::new(NEIGHBOURS);
        let pruner = MapAwareEdgePruner::new(2);
        let mesh = builder.build(experiment.points())?;
        let params = MeshBenchParams {
            point_count,
            neighbours: NEIGHBOURS,
        };

        group.bench_with_input(
            BenchmarkId::new("knn", &params),
            experiment.points(),
            |b, points| b.iter(|| builder.build(points)),
        );
        group.bench_with_input(BenchmarkId::new("prune", &params), &mesh, |b, mesh| {
            b.iter(|| pruner.prune(mesh, experiment.points(), experiment.terrain()));
        });
    }

    group.finish();
    Ok(())
}

fn mesh(c: &mut Criterion) {
    if let Err(err) = mesh_impl(c) {
        panic!("mesh benchmark setup failed: {err}");
    }
}

criterion_group!(benches, mesh);
criterion_main!(benches);
