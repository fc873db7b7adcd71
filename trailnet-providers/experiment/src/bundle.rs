//! Serde model of the experiment bundle document.

use serde::{Deserialize, de::IgnoredAny};
use trailnet_core::{ExperimentError, ExperimentMetadata, ExperimentResult, Point, TerrainGrid};

/// Raw arrays exported by the simulation for one run.
///
/// `all_trails` must be present but its content is not used.
#[derive(Debug, Deserialize)]
pub(crate) struct ExperimentBundle {
    #[serde(rename = "all_trails")]
    _all_trails: IgnoredAny,
    nuclei: Vec<[f64; 2]>,
    stations: Vec<[f64; 2]>,
    map_with_stations: Vec<Vec<i64>>,
    start_pos: [f64; 2],
    seed: u64,
}

impl ExperimentBundle {
    pub(crate) fn into_experiment(self) -> Result<ExperimentResult, ExperimentError> {
        let nuclei: Vec<Point> = self.nuclei.into_iter().map(Point::from).collect();
        let stations: Vec<Point> = self.stations.into_iter().map(Point::from).collect();
        let terrain = TerrainGrid::try_from_columns(self.map_with_stations)?;
        ExperimentResult::try_new(
            &nuclei,
            &stations,
            terrain,
            ExperimentMetadata {
                seed: self.seed,
                start_position: Point::from(self.start_pos),
            },
        )
    }
}
