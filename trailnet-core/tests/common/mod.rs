use serde_json::Value;
use trailnet_core::{ExperimentMetadata, ExperimentResult, Point, TerrainGrid};
use trailnet_test_support::fixtures::BundleFixture;

#[must_use]
pub fn points(coords: &[[f64; 2]]) -> Vec<Point> {
    coords.iter().copied().map(Point::from).collect()
}

fn field<T: serde::de::DeserializeOwned>(bundle: &Value, name: &str) -> T {
    serde_json::from_value(bundle[name].clone()).expect("fixture field must decode")
}

/// Builds an experiment straight from a bundle fixture, bypassing the
/// provider crate.
#[must_use]
pub fn experiment(fixture: &BundleFixture) -> ExperimentResult {
    let bundle = fixture.to_json();
    let nuclei: Vec<[f64; 2]> = field(&bundle, "nuclei");
    let stations: Vec<[f64; 2]> = field(&bundle, "stations");
    let start: [f64; 2] = field(&bundle, "start_pos");
    let terrain = TerrainGrid::try_from_columns(field(&bundle, "map_with_stations"))
        .expect("fixture terrain is rectangular");
    ExperimentResult::try_new(
        &points(&nuclei),
        &points(&stations),
        terrain,
        ExperimentMetadata {
            seed: field(&bundle, "seed"),
            start_position: Point::from(start),
        },
    )
    .expect("fixture coordinates are finite")
}
