//! Seeded synthetic experiments for benchmarking.
//!
//! Nuclei and stations are scattered uniformly over a square raster that is
//! cut by a vertical river with a single ford, so pruning has real work to
//! do and every station remains reachable.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use trailnet_core::{ExperimentError, ExperimentMetadata, ExperimentResult, Point, TerrainGrid};

/// Errors that may occur during scenario generation.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// At least two stations are needed for a meaningful network.
    #[error("station count must be at least two, got {0}")]
    TooFewStations(usize),
    /// The raster must leave room for both river banks.
    #[error("extent must be at least 8 cells, got {0}")]
    ExtentTooSmall(usize),
    /// The generated experiment was rejected.
    #[error("generated experiment is invalid: {0}")]
    Experiment(#[from] ExperimentError),
}

/// Configuration for synthetic experiment generation.
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    /// Number of candidate nuclei.
    pub nucleus_count: usize,
    /// Number of stations.
    pub station_count: usize,
    /// Side length of the square raster in cells.
    pub extent: usize,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

/// Generates a seeded experiment from `config`.
///
/// # Errors
/// Returns [`ScenarioError`] when the configuration cannot produce a valid
/// experiment.
///
/// # Examples
/// ```
/// use trailnet_benches::scenario::{ScenarioConfig, generate};
///
/// let config = ScenarioConfig { nucleus_count: 50, station_count: 4, extent: 32, seed: 7 };
/// let experiment = generate(&config).expect("valid config");
/// assert_eq!(experiment.point_count(), 54);
/// assert_eq!(experiment.station_indices().len(), 4);
/// ```
pub fn generate(config: &ScenarioConfig) -> Result<ExperimentResult, ScenarioError> {
    if config.station_count < 2 {
        return Err(ScenarioError::TooFewStations(config.station_count));
    }
    if config.extent < 8 {
        return Err(ScenarioError::ExtentTooSmall(config.extent));
    }

    let mut rng = SmallRng::seed_from_u64(config.seed);
    let upper = (config.extent - 1) as f64;
    let mut scatter = |count: usize| -> Vec<Point> {
        (0..count)
            .map(|_| Point::new(rng.gen_range(1.0..upper), rng.gen_range(1.0..upper)))
            .collect()
    };
    let nuclei = scatter(config.nucleus_count);
    let stations = scatter(config.station_count);

    let river = config.extent / 2;
    let ford = config.extent / 4;
    let columns = (0..config.extent)
        .map(|x| {
            (0..config.extent)
                .map(|y| i64::from(x != river || (ford..ford + 2).contains(&y)))
                .collect()
        })
        .collect();

    Ok(ExperimentResult::try_new(
        &nuclei,
        &stations,
        TerrainGrid::try_from_columns(columns)?,
        ExperimentMetadata {
            seed: config.seed,
            start_position: Point::new(upper / 2.0, upper / 2.0),
        },
    )?)
}
