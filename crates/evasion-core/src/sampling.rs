//! Blue-noise Sampling
//!
//! Poisson-disc point generation over a rectangular region using Bridson-style
//! dart throwing. A background grid with cells of side `min_distance / √2`
//! holds at most one accepted point per cell, so the spacing test only has to
//! look at the 5×5 block of cells around a candidate.

use std::f32::consts::{SQRT_2, TAU};
use std::iter::FusedIterator;

use glam::Vec2;
use rand::Rng;
use thiserror::Error;

/// Placement attempts per active point before it is retired.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Largest background grid a sampler will allocate.
pub const MAX_GRID_CELLS: usize = 1 << 22;

/// Errors raised for sampler parameters that cannot describe a region.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplingError {
    #[error("sample region must have a positive, finite extent (got {width} x {height})")]
    InvalidRegion { width: f32, height: f32 },
    #[error("minimum point spacing must be positive and finite (got {0})")]
    InvalidSpacing(f32),
    #[error("at least one placement attempt per point is required")]
    NoAttempts,
    #[error("region needs a {columns} x {rows} cell grid, over the {} cell limit", MAX_GRID_CELLS)]
    GridTooLarge { columns: usize, rows: usize },
}

/// Rectangular sampling domain `[0, width) x [0, height)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRegion {
    pub width: f32,
    pub height: f32,
    /// Minimum distance enforced between any two accepted points
    pub min_distance: f32,
}

impl SampleRegion {
    pub fn new(width: f32, height: f32, min_distance: f32) -> Self {
        Self {
            width,
            height,
            min_distance,
        }
    }

    /// Square region of side `size`.
    pub fn square(size: f32, min_distance: f32) -> Self {
        Self::new(size, size, min_distance)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x < self.width && point.y >= 0.0 && point.y < self.height
    }

    /// Checks the region can be sampled, including the size of its grid.
    pub fn validate(&self) -> Result<(), SamplingError> {
        let extent_ok = |v: f32| v.is_finite() && v > 0.0;
        if !extent_ok(self.width) || !extent_ok(self.height) {
            return Err(SamplingError::InvalidRegion {
                width: self.width,
                height: self.height,
            });
        }
        if !extent_ok(self.min_distance) {
            return Err(SamplingError::InvalidSpacing(self.min_distance));
        }
        self.grid_dimensions().map(|_| ())
    }

    fn cell_size(&self) -> f32 {
        self.min_distance / SQRT_2
    }

    /// Columns and rows of the background grid covering this region.
    fn grid_dimensions(&self) -> Result<(usize, usize), SamplingError> {
        // Float to usize casts saturate, so a huge ratio lands on usize::MAX
        let columns = ((self.width / self.cell_size()).ceil() as usize).max(1);
        let rows = ((self.height / self.cell_size()).ceil() as usize).max(1);

        match columns.checked_mul(rows) {
            Some(cells) if cells <= MAX_GRID_CELLS => Ok((columns, rows)),
            _ => Err(SamplingError::GridTooLarge { columns, rows }),
        }
    }
}

/// Uniform acceleration grid mapping each cell to the point stored in it.
#[derive(Debug)]
struct BackgroundGrid {
    cell_size: f32,
    columns: usize,
    rows: usize,
    cells: Vec<Option<Vec2>>,
}

impl BackgroundGrid {
    fn new(region: &SampleRegion) -> Result<Self, SamplingError> {
        let (columns, rows) = region.grid_dimensions()?;

        Ok(Self {
            cell_size: region.cell_size(),
            columns,
            rows,
            cells: vec![None; columns * rows],
        })
    }

    fn cell_of(&self, point: Vec2) -> (usize, usize) {
        // Float rounding can put a point just under the far edge into the
        // cell past the last one, so clamp.
        let column = ((point.x / self.cell_size) as usize).min(self.columns - 1);
        let row = ((point.y / self.cell_size) as usize).min(self.rows - 1);
        (column, row)
    }

    fn insert(&mut self, point: Vec2) {
        let (column, row) = self.cell_of(point);
        self.cells[row * self.columns + column] = Some(point);
    }

    /// True when no stored point lies closer than `min_distance`.
    fn is_clear(&self, point: Vec2, min_distance: f32) -> bool {
        let (column, row) = self.cell_of(point);
        let min_sq = min_distance * min_distance;

        let column_range = column.saturating_sub(2)..=(column + 2).min(self.columns - 1);
        let row_range = row.saturating_sub(2)..=(row + 2).min(self.rows - 1);

        for r in row_range {
            for c in column_range.clone() {
                if let Some(existing) = self.cells[r * self.columns + c] {
                    if (r, c) == (row, column) || existing.distance_squared(point) < min_sq {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// Lazily yields a blue-noise point set, seed point first.
///
/// The sequence is finite and cannot be restarted; build a new sampler with a
/// freshly seeded random source to reproduce it.
#[derive(Debug)]
pub struct PoissonDiscSampler<R: Rng> {
    region: SampleRegion,
    max_attempts: u32,
    rng: R,
    grid: BackgroundGrid,
    active: Vec<Vec2>,
    seeded: bool,
    accepted: usize,
}

impl<R: Rng> PoissonDiscSampler<R> {
    pub fn new(region: SampleRegion, max_attempts: u32, rng: R) -> Result<Self, SamplingError> {
        region.validate()?;
        if max_attempts == 0 {
            return Err(SamplingError::NoAttempts);
        }

        Ok(Self {
            grid: BackgroundGrid::new(&region)?,
            region,
            max_attempts,
            rng,
            active: Vec::new(),
            seeded: false,
            accepted: 0,
        })
    }

    pub fn region(&self) -> &SampleRegion {
        &self.region
    }

    /// Number of points yielded so far.
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    fn accept(&mut self, point: Vec2) -> Vec2 {
        self.grid.insert(point);
        self.active.push(point);
        self.accepted += 1;
        point
    }

    /// Draws a point uniformly by area from the annulus `[d, 2d)` around `origin`.
    fn candidate_around(&mut self, origin: Vec2) -> Vec2 {
        let d = self.region.min_distance;
        let angle = self.rng.gen::<f32>() * TAU;
        let radius = (self.rng.gen::<f32>() * 3.0 * d * d + d * d).sqrt();
        origin + Vec2::from_angle(angle) * radius
    }
}

impl<R: Rng> Iterator for PoissonDiscSampler<R> {
    type Item = Vec2;

    fn next(&mut self) -> Option<Vec2> {
        if !self.seeded {
            self.seeded = true;
            let seed = Vec2::new(
                self.rng.gen::<f32>() * self.region.width,
                self.rng.gen::<f32>() * self.region.height,
            );
            return Some(self.accept(seed));
        }

        while !self.active.is_empty() {
            let index = self.rng.gen_range(0..self.active.len());
            let origin = self.active[index];

            for _ in 0..self.max_attempts {
                let candidate = self.candidate_around(origin);
                if self.region.contains(candidate)
                    && self.grid.is_clear(candidate, self.region.min_distance)
                {
                    return Some(self.accept(candidate));
                }
            }

            // Exhausted: stays accepted, stops spawning neighbours.
            self.active.swap_remove(index);
        }

        None
    }
}

impl<R: Rng> FusedIterator for PoissonDiscSampler<R> {}

/// Runs a full sampling pass and collects every accepted point.
pub fn generate<R: Rng>(
    region: SampleRegion,
    max_attempts: u32,
    rng: R,
) -> Result<Vec<Vec2>, SamplingError> {
    Ok(PoissonDiscSampler::new(region, max_attempts, rng)?.collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn assert_spacing(points: &[Vec2], min_distance: f32) {
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                assert!(
                    a.distance(*b) >= min_distance,
                    "points {a} and {b} are closer than {min_distance}"
                );
            }
        }
    }

    #[test]
    fn test_spacing_and_bounds_hold_across_seeds() {
        for seed in 0..20u64 {
            let region = SampleRegion::square(20.0, 1.0);
            let points = generate(region, DEFAULT_MAX_ATTEMPTS, SmallRng::seed_from_u64(seed)).unwrap();

            assert!(points.len() > 50, "seed {seed} produced only {} points", points.len());
            assert!(points.iter().all(|p| region.contains(*p)));
            assert_spacing(&points, 1.0);
        }
    }

    #[test]
    fn test_non_square_region() {
        let region = SampleRegion::new(30.0, 4.0, 1.5);
        let points = generate(region, DEFAULT_MAX_ATTEMPTS, SmallRng::seed_from_u64(7)).unwrap();

        assert!(points.iter().all(|p| p.x < 30.0 && p.y < 4.0));
        assert!(points.iter().any(|p| p.x > 20.0), "should spread along the long axis");
        assert_spacing(&points, 1.5);
    }

    #[test]
    fn test_fractional_spacing_region() {
        // Width is not a multiple of the cell size
        let region = SampleRegion::new(7.3, 5.9, 0.7);
        let points = generate(region, 12, SmallRng::seed_from_u64(99)).unwrap();

        assert!(points.iter().all(|p| region.contains(*p)));
        assert_spacing(&points, 0.7);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let region = SampleRegion::square(10.0, 0.8);
        let first = generate(region, 30, SmallRng::seed_from_u64(12345)).unwrap();
        let second = generate(region, 30, SmallRng::seed_from_u64(12345)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_different_seeds_differ() {
        let region = SampleRegion::square(10.0, 0.8);
        let first = generate(region, 30, SmallRng::seed_from_u64(1)).unwrap();
        let second = generate(region, 30, SmallRng::seed_from_u64(2)).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_region_smaller_than_spacing_yields_seed_only() {
        // Every annulus point lands outside a region this small
        let region = SampleRegion::square(0.5, 1.0);
        let points = generate(region, 30, SmallRng::seed_from_u64(3)).unwrap();

        assert_eq!(points.len(), 1);
        assert!(region.contains(points[0]));
    }

    #[test]
    fn test_sampler_is_lazy_and_fused() {
        let region = SampleRegion::square(5.0, 1.0);
        let mut rng = SmallRng::seed_from_u64(5);
        let mut sampler = PoissonDiscSampler::new(region, 30, &mut rng).unwrap();
        assert_eq!(sampler.region(), &region);

        let first = sampler.next();
        assert!(first.is_some());
        assert_eq!(sampler.accepted(), 1);

        let rest: Vec<_> = sampler.by_ref().collect();
        assert_eq!(sampler.accepted(), rest.len() + 1);
        assert_eq!(sampler.next(), None);
        assert_eq!(sampler.next(), None);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let rng = || SmallRng::seed_from_u64(0);

        assert_eq!(
            generate(SampleRegion::square(0.0, 1.0), 30, rng()).unwrap_err(),
            SamplingError::InvalidRegion { width: 0.0, height: 0.0 }
        );
        assert!(matches!(
            generate(SampleRegion::new(f32::NAN, 5.0, 1.0), 30, rng()),
            Err(SamplingError::InvalidRegion { .. })
        ));
        assert_eq!(
            generate(SampleRegion::square(5.0, -1.0), 30, rng()).unwrap_err(),
            SamplingError::InvalidSpacing(-1.0)
        );
        assert_eq!(
            generate(SampleRegion::square(5.0, 1.0), 0, rng()).unwrap_err(),
            SamplingError::NoAttempts
        );

        // Tiny spacing over a huge region would need an enormous grid
        assert!(matches!(
            generate(SampleRegion::square(1e6, 1e-3), 30, rng()),
            Err(SamplingError::GridTooLarge { .. })
        ));
        assert!(matches!(
            generate(SampleRegion::square(1e30, 1e-30), 30, rng()),
            Err(SamplingError::GridTooLarge { .. })
        ));
        assert!(SampleRegion::square(20.0, 1.0).validate().is_ok());
    }

    #[test]
    fn test_grid_rejects_occupied_cell() {
        let region = SampleRegion::square(10.0, 1.0);
        let mut grid = BackgroundGrid::new(&region).unwrap();
        grid.insert(Vec2::new(5.0, 5.0));

        assert!(!grid.is_clear(Vec2::new(5.1, 5.1), 1.0));
        assert!(!grid.is_clear(Vec2::new(5.9, 5.0), 1.0));
        assert!(grid.is_clear(Vec2::new(6.5, 5.0), 1.0));
        assert!(grid.is_clear(Vec2::new(2.0, 2.0), 1.0));
    }
}
