//! End-to-end pipeline benchmarks.
//!
//! Runs mesh construction, refinement, simplification and scoring for one
//! synthetic experiment under each execution strategy. Vulnerability trials
//! dominate at these sizes.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use trailnet_benches::{
    params::PipelineBenchParams,
    scenario::{ScenarioConfig, ScenarioError, generate},
};
use trailnet_core::{CancellationToken, ExecutionStrategy, PipelineBuilder, TrailnetError};

const SEED: u64 = 42;

const POINT_COUNTS: &[usize] = &[250, 1_000];

const STRATEGIES: &[ExecutionStrategy] =
    &[ExecutionStrategy::Sequential, ExecutionStrategy::Auto];

#[derive(Debug, thiserror::Error)]
enum SetupError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Core(#[from] TrailnetError),
}

fn pipeline_impl(c: &mut Criterion) -> Result<(), SetupError> {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);
    let cancel = CancellationToken::new();

    for &point_count in POINT_COUNTS {
        let experiment = generate(&ScenarioConfig {
            nucleus_count: point_count,
            station_count: 12,
            extent: 128,
            seed: SEED,
        })?;
        for &strategy in STRATEGIES {
            let pipeline = PipelineBuilder::new()
                .with_execution_strategy(strategy)
                .build()?;
            let params = PipelineBenchParams {
                point_count,
                strategy,
            };
            group.bench_with_input(
                BenchmarkId::from_parameter(&params),
                &experiment,
                |b, experiment| b.iter(|| pipeline.run(experiment, &cancel)),
            );
        }
    }

    group.finish();
    Ok(())
}

fn pipeline(c: &mut Criterion) {
    if let Err(err) = pipeline_impl(c) {
        panic!("pipeline benchmark setup failed: {err}");
    }
}

criterion_group!(benches, pipeline);
criterion_main!(benches);
