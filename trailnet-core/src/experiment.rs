//! Normalised view of one simulation run.

use std::ops::Range;

use crate::{
    error::ExperimentError,
    geometry::{Point, TerrainGrid},
    graph::NodeId,
};

/// Provenance carried from the simulation into summary rows.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExperimentMetadata {
    /// Seed the simulation ran with.
    pub seed: u64,
    /// Position the foraging agents started from.
    pub start_position: Point,
}

/// Candidate points, station indices, and terrain for one experiment.
///
/// Nuclei equal to the `(0, 0)` sentinel are discarded and the stations are
/// appended after the remaining nuclei, so station indices always form the
/// tail of [`ExperimentResult::points`].
///
/// # Examples
/// ```
/// use trailnet_core::{ExperimentMetadata, ExperimentResult, Point, TerrainGrid};
///
/// let experiment = ExperimentResult::try_new(
///     &[Point::new(1.0, 1.0), Point::new(0.0, 0.0), Point::new(2.0, 5.0)],
///     &[Point::new(9.0, 9.0)],
///     TerrainGrid::passable(10, 10),
///     ExperimentMetadata::default(),
/// )?;
/// assert_eq!(experiment.point_count(), 3);
/// assert_eq!(experiment.station_indices(), 2..3);
/// assert!(experiment.is_station(2));
/// # Ok::<(), trailnet_core::ExperimentError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentResult {
    points: Vec<Point>,
    stations: Range<NodeId>,
    terrain: TerrainGrid,
    metadata: ExperimentMetadata,
}

impl ExperimentResult {
    /// Assembles an experiment from raw simulation arrays.
    ///
    /// # Errors
    /// Returns [`ExperimentError::NonFiniteCoordinate`] when any retained
    /// nucleus or station has a NaN or infinite coordinate.
    pub fn try_new(
        nuclei: &[Point],
        stations: &[Point],
        terrain: TerrainGrid,
        metadata: ExperimentMetadata,
    ) -> Result<Self, ExperimentError> {
        let mut points = Vec::with_capacity(nuclei.len().saturating_add(stations.len()));
        for (index, nucleus) in nuclei.iter().enumerate() {
            if nucleus.is_origin() {
                continue;
            }
            if !nucleus.is_finite() {
                return Err(ExperimentError::NonFiniteCoordinate {
                    array: "nuclei",
                    index,
                });
            }
            points.push(*nucleus);
        }
        let first_station = points.len();
        for (index, station) in stations.iter().enumerate() {
            if !station.is_finite() {
                return Err(ExperimentError::NonFiniteCoordinate {
                    array: "stations",
                    index,
                });
            }
            points.push(*station);
        }
        Ok(Self {
            stations: first_station..points.len(),
            points,
            terrain,
            metadata,
        })
    }

    /// Returns every candidate point, stations last.
    #[must_use]
    #[rustfmt::skip]
    pub fn points(&self) -> &[Point] { &self.points }

    /// Returns the number of candidate points.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Returns the contiguous index range of the stations.
    #[must_use]
    pub fn station_indices(&self) -> Range<NodeId> {
        self.stations.clone()
    }

    /// Returns the station node ids as a vector.
    #[must_use]
    pub fn stations(&self) -> Vec<NodeId> {
        self.stations.clone().collect()
    }

    /// Returns whether `node` is a station.
    #[must_use]
    pub fn is_station(&self, node: NodeId) -> bool {
        self.stations.contains(&node)
    }

    /// Returns the terrain raster.
    #[must_use]
    #[rustfmt::skip]
    pub fn terrain(&self) -> &TerrainGrid { &self.terrain }

    /// Returns the run's provenance.
    #[must_use]
    #[rustfmt::skip]
    pub fn metadata(&self) -> &ExperimentMetadata { &self.metadata }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stations_form_the_tail() {
        let experiment = ExperimentResult::try_new(
            &[Point::new(0.0, 0.0), Point::new(3.0, 1.0), Point::new(0.0, 0.0)],
            &[Point::new(1.0, 1.0), Point::new(0.0, 0.0)],
            TerrainGrid::default(),
            ExperimentMetadata::default(),
        )
        .expect("finite input must load");
        assert_eq!(experiment.point_count(), 3);
        assert_eq!(experiment.stations(), vec![1, 2]);
        assert_eq!(experiment.points()[2], Point::new(0.0, 0.0));
    }

    #[test]
    fn rejects_non_finite_station() {
        let err = ExperimentResult::try_new(
            &[],
            &[Point::new(1.0, f64::INFINITY)],
            TerrainGrid::default(),
            ExperimentMetadata::default(),
        )
        .expect_err("infinite coordinate must fail");
        assert_eq!(
            err,
            ExperimentError::NonFiniteCoordinate {
                array: "stations",
                index: 0
            }
        );
    }
}
