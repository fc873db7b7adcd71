//! Planar points, the terrain raster, and integer line rasterisation.

use crate::error::ExperimentError;

/// A coordinate in raster space.
///
/// # Examples
/// ```
/// use trailnet_core::Point;
///
/// let a = Point::new(0.0, 0.0);
/// let b = Point::new(3.0, 4.0);
/// assert_eq!(a.distance(b), 5.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    /// Horizontal coordinate; the outer raster axis.
    pub x: f64,
    /// Vertical coordinate; the inner raster axis.
    pub y: f64,
}

impl Point {
    /// Creates a point from its coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Returns `true` when both coordinates are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Returns `true` for the all-zero sentinel the simulation uses for
    /// unused nucleus slots.
    #[must_use]
    pub fn is_origin(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub(crate) fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

/// Passability raster sampled by integer `(x, y)` pixel coordinates.
///
/// Cells holding `0` are impassable; any other value (including station
/// markers) is passable. Pixels outside the raster are passable.
///
/// # Examples
/// ```
/// use trailnet_core::TerrainGrid;
///
/// let grid = TerrainGrid::try_from_columns(vec![vec![1, 0], vec![1, 1]])?;
/// assert_eq!((grid.width(), grid.height()), (2, 2));
/// assert!(!grid.is_passable(0, 1));
/// assert!(grid.is_passable(-4, 9));
/// # Ok::<(), trailnet_core::ExperimentError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TerrainGrid {
    width: usize,
    height: usize,
    cells: Vec<i64>,
}

impl TerrainGrid {
    /// Builds a raster from nested columns where `columns[x][y]` is the cell
    /// at pixel `(x, y)`.
    ///
    /// # Errors
    /// Returns [`ExperimentError::RaggedTerrain`] when columns differ in height.
    pub fn try_from_columns(columns: Vec<Vec<i64>>) -> Result<Self, ExperimentError> {
        let width = columns.len();
        let height = columns.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(width.saturating_mul(height));
        for (column, values) in columns.into_iter().enumerate() {
            if values.len() != height {
                return Err(ExperimentError::RaggedTerrain {
                    column,
                    expected: height,
                    actual: values.len(),
                });
            }
            cells.extend(values);
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Builds a fully passable raster of the given size.
    #[must_use]
    pub fn passable(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![1; width.saturating_mul(height)],
        }
    }

    /// Marks the pixel at `(x, y)` impassable. Out-of-range pixels are ignored.
    pub fn block(&mut self, x: usize, y: usize) {
        if let Some(cell) = self.offset(x, y).and_then(|idx| self.cells.get_mut(idx)) {
            *cell = 0;
        }
    }

    /// Returns the extent of the outer (`x`) axis.
    #[must_use]
    #[rustfmt::skip]
    pub fn width(&self) -> usize { self.width }

    /// Returns the extent of the inner (`y`) axis.
    #[must_use]
    #[rustfmt::skip]
    pub fn height(&self) -> usize { self.height }

    /// Returns whether the pixel at `(x, y)` can be crossed.
    #[must_use]
    pub fn is_passable(&self, x: i64, y: i64) -> bool {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return true;
        };
        self.offset(x, y)
            .and_then(|idx| self.cells.get(idx))
            .is_none_or(|&cell| cell != 0)
    }

    /// Counts the impassable pixels on the rasterised segment from `start` to
    /// `end`, endpoints included.
    ///
    /// Only the stretch of the segment that overlaps the raster is walked, so
    /// far-off endpoints cost no more than the raster extent.
    #[must_use]
    pub fn count_crossings(&self, start: Point, end: Point) -> usize {
        rasterize_line(start, end)
            .clip(self.width, self.height)
            .filter(|&(x, y)| !self.is_passable(x, y))
            .count()
    }

    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| x * self.height + y)
    }
}

/// Largest pixel coordinate magnitude; rounded coordinates saturate here so
/// the error term of [`LinePixels`] fits in `i128`.
const PIXEL_LIMIT: f64 = 2_305_843_009_213_693_952.0;

fn pixel(value: f64) -> i64 {
    // `as` maps NaN to zero; the clamp keeps everything else in range.
    value.round().clamp(-PIXEL_LIMIT, PIXEL_LIMIT) as i64
}

/// Rasterises the segment between two points with Bresenham's algorithm.
///
/// Endpoints are rounded to the nearest pixel. The axis with the larger delta
/// advances one pixel per step while an accumulated error term decides when
/// the other axis moves, so the result is an 8-connected run of pixels from
/// `start` to `end` inclusive.
///
/// # Examples
/// ```
/// use trailnet_core::{Point, rasterize_line};
///
/// let pixels: Vec<_> = rasterize_line(Point::new(0.2, 0.0), Point::new(3.0, 1.4)).collect();
/// assert_eq!(pixels, vec![(0, 0), (1, 0), (2, 1), (3, 1)]);
/// ```
#[must_use]
pub fn rasterize_line(start: Point, end: Point) -> LinePixels {
    let (x0, y0) = (pixel(start.x), pixel(start.y));
    let (x1, y1) = (pixel(end.x), pixel(end.y));
    let dx = i128::from(x1) - i128::from(x0);
    let dy = i128::from(y1) - i128::from(y0);
    let x_major = dx.abs() >= dy.abs();
    let ((major, major_step), (minor, minor_step)) = if x_major {
        ((dx.abs(), dx.signum()), (dy.abs(), dy.signum()))
    } else {
        ((dy.abs(), dy.signum()), (dx.abs(), dx.signum()))
    };
    let origin = if x_major { (x0, y0) } else { (y0, x0) };

    let mut pixels = LinePixels {
        origin: (i128::from(origin.0), i128::from(origin.1)),
        major,
        minor,
        major_step,
        minor_step,
        x_major,
        index: 0,
        last: major,
        offset: 0,
        error: 0,
    };
    pixels.seek(0);
    pixels
}

/// Pixels of a rasterised segment, produced lazily by [`rasterize_line`].
///
/// Coordinates are tracked along a major axis (the one with the larger
/// delta) and a minor axis. Any step can be reached directly, which lets
/// [`LinePixels::clip`] skip the part of a long segment that lies outside a
/// raster.
#[derive(Clone, Debug)]
pub struct LinePixels {
    origin: (i128, i128),
    major: i128,
    minor: i128,
    major_step: i128,
    minor_step: i128,
    x_major: bool,
    index: i128,
    last: i128,
    offset: i128,
    error: i128,
}

impl LinePixels {
    /// Restricts the run to the steps whose major coordinate falls inside a
    /// `width` by `height` raster anchored at the origin.
    ///
    /// Pixels outside the raster along the minor axis are still yielded.
    ///
    /// # Examples
    /// ```
    /// use trailnet_core::{Point, rasterize_line};
    ///
    /// let pixels: Vec<_> = rasterize_line(Point::new(-1e12, 1.0), Point::new(1e12, 1.0))
    ///     .clip(3, 3)
    ///     .collect();
    /// assert_eq!(pixels, vec![(0, 1), (1, 1), (2, 1)]);
    /// ```
    #[must_use]
    pub fn clip(mut self, width: usize, height: usize) -> Self {
        let extent = if self.x_major { width } else { height };
        let extent = i128::try_from(extent).unwrap_or(i128::MAX);
        let start = self.origin.0;
        let (first, last) = match self.major_step {
            1 => (-start, extent - 1 - start),
            -1 => (start - extent + 1, start),
            _ if (0..extent).contains(&start) => (0, 0),
            _ => (1, 0),
        };
        self.last = self.last.min(last);
        self.seek(first.max(self.index));
        self
    }

    /// Positions the walk at step `index` without visiting earlier steps.
    fn seek(&mut self, index: i128) {
        self.index = index;
        self.offset = if self.major == 0 {
            0
        } else {
            ceil_div(2 * self.minor * index - self.major, 2 * self.major).max(0)
        };
        self.error = 2 * self.minor * (index + 1) - self.major - 2 * self.major * self.offset;
    }
}

impl Iterator for LinePixels {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index > self.last {
            return None;
        }
        let along = self.origin.0 + self.major_step * self.index;
        let across = self.origin.1 + self.minor_step * self.offset;
        if self.error > 0 {
            self.offset += 1;
            self.error -= 2 * self.major;
        }
        self.error += 2 * self.minor;
        self.index += 1;

        // Both coordinates lie between the rounded endpoints.
        let (along, across) = (along as i64, across as i64);
        Some(if self.x_major {
            (along, across)
        } else {
            (across, along)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from((self.last - self.index + 1).max(0)).ok();
        (remaining.unwrap_or(usize::MAX), remaining)
    }
}

fn ceil_div(numerator: i128, denominator: i128) -> i128 {
    numerator.div_euclid(denominator) + i128::from(numerator.rem_euclid(denominator) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case::horizontal((0.0, 0.0), (3.0, 0.0), vec![(0, 0), (1, 0), (2, 0), (3, 0)])]
    #[case::vertical_reverse((1.0, 2.0), (1.0, -1.0), vec![(1, 2), (1, 1), (1, 0), (1, -1)])]
    #[case::diagonal((0.0, 0.0), (2.0, 2.0), vec![(0, 0), (1, 1), (2, 2)])]
    #[case::anti_diagonal((2.0, 0.0), (0.0, 2.0), vec![(2, 0), (1, 1), (0, 2)])]
    #[case::steep((0.0, 0.0), (1.0, 3.0), vec![(0, 0), (0, 1), (1, 2), (1, 3)])]
    #[case::single_pixel((0.4, 0.4), (0.1, -0.2), vec![(0, 0)])]
    fn rasterize_line_visits_expected_pixels(
        #[case] start: (f64, f64),
        #[case] end: (f64, f64),
        #[case] expected: Vec<(i64, i64)>,
    ) {
        let pixels: Vec<_> =
            rasterize_line(Point::new(start.0, start.1), Point::new(end.0, end.1)).collect();
        assert_eq!(pixels, expected);
    }

    #[rstest]
    #[case((0.0, 0.0), (17.0, 5.0))]
    #[case((12.0, 3.0), (-4.0, 9.0))]
    #[case((5.0, 30.0), (6.0, -2.0))]
    fn rasterize_line_is_eight_connected(#[case] start: (f64, f64), #[case] end: (f64, f64)) {
        let pixels: Vec<_> =
            rasterize_line(Point::new(start.0, start.1), Point::new(end.0, end.1)).collect();
        for pair in pixels.windows(2) {
            let [(ax, ay), (bx, by)] = pair else {
                panic!("windows(2) must yield pairs");
            };
            assert!((ax - bx).abs() <= 1 && (ay - by).abs() <= 1, "gap in {pixels:?}");
            assert_ne!((ax, ay), (bx, by), "repeated pixel in {pixels:?}");
        }
        assert_eq!(pixels.last().copied(), Some((end.0 as i64, end.1 as i64)));
    }

    #[test]
    fn terrain_rejects_ragged_columns() {
        let err = TerrainGrid::try_from_columns(vec![vec![1, 1], vec![1]])
            .expect_err("ragged raster must fail");
        assert_eq!(
            err,
            ExperimentError::RaggedTerrain {
                column: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn crossings_ignore_out_of_bounds_pixels() {
        let mut grid = TerrainGrid::passable(3, 3);
        grid.block(1, 1);
        let crossings = grid.count_crossings(Point::new(-5.0, -5.0), Point::new(8.0, 8.0));
        assert_eq!(crossings, 1);
    }

    #[rstest]
    #[case::horizontal((-1e19, 3.0), (1e19, 3.0), 1)]
    #[case::reversed((1e19, 3.0), (-1e19, 3.0), 1)]
    #[case::vertical((2.0, -1e18), (2.0, 1e18), 2)]
    #[case::one_far_end((0.0, 3.0), (1e10, 3.0), 1)]
    #[case::misses_raster((-1e19, -1e19), (-1e18, 1e19), 0)]
    fn far_outlier_endpoints_are_clipped(
        #[case] start: (f64, f64),
        #[case] end: (f64, f64),
        #[case] expected: usize,
    ) {
        let mut grid = TerrainGrid::passable(5, 5);
        grid.block(2, 3);
        grid.block(2, 1);
        let crossings =
            grid.count_crossings(Point::new(start.0, start.1), Point::new(end.0, end.1));
        assert_eq!(crossings, expected);
    }

    #[test]
    fn clipped_walk_is_bounded_by_the_raster() {
        let pixels = rasterize_line(Point::new(-1e19, -7e18), Point::new(1e19, 9e18)).clip(4, 4);
        assert!(pixels.size_hint().1.is_some_and(|len| len <= 4));
    }

    #[test]
    fn non_finite_endpoints_do_not_panic() {
        let grid = TerrainGrid::passable(3, 3);
        let _ = grid.count_crossings(Point::new(f64::NAN, 1.0), Point::new(f64::INFINITY, 1.0));
        let _ = grid.count_crossings(Point::new(f64::NEG_INFINITY, 0.0), Point::new(2.0, 2.0));
    }

    proptest! {
        #[test]
        fn clipping_keeps_every_in_raster_pixel(
            x0 in -40_i32..40,
            y0 in -40_i32..40,
            x1 in -40_i32..40,
            y1 in -40_i32..40,
            width in 0_usize..12,
            height in 0_usize..12,
        ) {
            let start = Point::new(f64::from(x0), f64::from(y0));
            let end = Point::new(f64::from(x1), f64::from(y1));
            let inside = |&(x, y): &(i64, i64)| {
                usize::try_from(x).is_ok_and(|x| x < width)
                    && usize::try_from(y).is_ok_and(|y| y < height)
            };
            let full: Vec<_> = rasterize_line(start, end).filter(inside).collect();
            let clipped: Vec<_> = rasterize_line(start, end)
                .clip(width, height)
                .filter(inside)
                .collect();
            prop_assert_eq!(clipped, full);
        }
    }
}
