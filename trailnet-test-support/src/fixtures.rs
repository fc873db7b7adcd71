//! Geometric scenarios and experiment bundle documents.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde_json::{Value, json};

/// `count` points on the x axis starting at `x = 1`, `spacing` apart.
///
/// The first point avoids the origin, which bundles treat as an unused
/// nucleus slot.
#[must_use]
pub fn line(count: usize, spacing: f64) -> Vec<[f64; 2]> {
    (0..count)
        .map(|step| [1.0 + spacing * step as f64, 0.0])
        .collect()
}

/// Corners of an axis-aligned square of side `scale`, in the order
/// `(0, 0)`, `(0, s)`, `(s, 0)`, `(s, s)`.
#[must_use]
pub fn square(scale: f64) -> Vec<[f64; 2]> {
    vec![[0.0, 0.0], [0.0, scale], [scale, 0.0], [scale, scale]]
}

/// Builder for experiment bundle JSON documents.
///
/// # Examples
/// ```
/// use trailnet_test_support::fixtures::BundleFixture;
///
/// let bundle = BundleFixture::new(4, 3)
///     .with_nuclei([[1.0, 1.0]])
///     .with_stations([[2.0, 2.0]])
///     .blocking(1, 2)
///     .to_json();
/// assert_eq!(bundle["map_with_stations"][1][2], 0);
/// assert_eq!(bundle["stations"][0][0], 2.0);
/// ```
#[derive(Clone, Debug)]
pub struct BundleFixture {
    nuclei: Vec<[f64; 2]>,
    stations: Vec<[f64; 2]>,
    terrain: Vec<Vec<i64>>,
    start: [f64; 2],
    seed: u64,
}

impl BundleFixture {
    /// Starts a bundle with a fully passable `width` x `height` raster.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            nuclei: Vec::new(),
            stations: Vec::new(),
            terrain: vec![vec![1; height]; width],
            start: [0.0, 0.0],
            seed: 0,
        }
    }

    /// A 20 x 20 experiment with a lattice of nuclei, four corner stations,
    /// and a river along `x = 9..=10` that leaves a ford at the top.
    #[must_use]
    pub fn river_crossing() -> Self {
        let lattice = (0..6).flat_map(|col| {
            (0..6).map(move |row| [2.0 + 3.0 * f64::from(col), 2.0 + 3.0 * f64::from(row)])
        });
        let mut bundle = Self::new(20, 20)
            .with_nuclei(lattice)
            .with_stations([[1.0, 1.0], [18.0, 1.0], [1.0, 18.0], [18.0, 18.0]])
            .with_start([10.0, 19.0])
            .with_seed(7);
        for x in 9..=10 {
            for y in 0..16 {
                bundle = bundle.blocking(x, y);
            }
        }
        bundle
    }

    /// Appends nuclei.
    #[must_use]
    pub fn with_nuclei<I: IntoIterator<Item = [f64; 2]>>(mut self, nuclei: I) -> Self {
        self.nuclei.extend(nuclei);
        self
    }

    /// Appends stations.
    #[must_use]
    pub fn with_stations<I: IntoIterator<Item = [f64; 2]>>(mut self, stations: I) -> Self {
        self.stations.extend(stations);
        self
    }

    /// Marks the cell at `(x, y)` invalid.
    #[must_use]
    pub fn blocking(mut self, x: usize, y: usize) -> Self {
        if let Some(cell) = self.terrain.get_mut(x).and_then(|column| column.get_mut(y)) {
            *cell = 0;
        }
        self
    }

    /// Sets the agents' start position.
    #[must_use]
    pub fn with_start(mut self, start: [f64; 2]) -> Self {
        self.start = start;
        self
    }

    /// Sets the simulation seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Renders the bundle document.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "all_trails": [],
            "nuclei": self.nuclei,
            "stations": self.stations,
            "map_with_stations": self.terrain,
            "start_pos": self.start,
            "seed": self.seed,
        })
    }

    /// Writes the bundle to `dir/name` and returns the path.
    ///
    /// # Errors
    /// Returns any I/O error raised while writing.
    pub fn write(&self, dir: &Path, name: &str) -> io::Result<PathBuf> {
        let path = dir.join(name);
        fs::write(&path, self.to_json().to_string())?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(0, 2.0, vec![])]
    #[case(3, 2.0, vec![[1.0, 0.0], [3.0, 0.0], [5.0, 0.0]])]
    fn line_starts_off_origin(
        #[case] count: usize,
        #[case] spacing: f64,
        #[case] expected: Vec<[f64; 2]>,
    ) {
        assert_eq!(line(count, spacing), expected);
    }

    #[test]
    fn write_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = BundleFixture::river_crossing()
            .write(dir.path(), "run.json")
            .expect("write bundle");
        let text = fs::read_to_string(path).expect("read bundle");
        let value: Value = serde_json::from_str(&text).expect("parse bundle");
        assert_eq!(value["nuclei"].as_array().map(Vec::len), Some(36));
        assert_eq!(value["map_with_stations"][9][3], 0);
        assert_eq!(value["map_with_stations"][9][17], 1);
        assert_eq!(value["seed"], 7);
    }
}
