//! Synthetic elevation models.
//!
//! Grids are row-major `Vec<f32>` with a north-up transform, so the
//! generators stay independent of the engine's grid types.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use flood_common::{AffineTransform, Crs};

/// Raw elevation raster with its georeferencing.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticDem {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    pub transform: AffineTransform,
    pub crs: Crs,
}

impl SyntheticDem {
    /// Same grid with every elevation shifted by `offset`.
    pub fn shifted(&self, offset: f32) -> Self {
        Self {
            data: self.data.iter().map(|v| v + offset).collect(),
            ..self.clone()
        }
    }

    /// Same grid with cell `(col, row)` replaced.
    pub fn with_cell(mut self, col: usize, row: usize, value: f32) -> Self {
        self.data[row * self.width + col] = value;
        self
    }
}

/// Paraboloid bowl with its lowest point at the grid centre.
///
/// `depth` is the rim-to-floor relief, `floor` the lowest elevation.
pub fn create_bowl_dem(size: usize, cell: f64, floor: f32, depth: f32) -> SyntheticDem {
    let centre = (size as f32 - 1.0) / 2.0;
    let max_r2 = 2.0 * centre * centre;
    let mut data = Vec::with_capacity(size * size);
    for row in 0..size {
        for col in 0..size {
            let dx = col as f32 - centre;
            let dy = row as f32 - centre;
            let r2 = if max_r2 > 0.0 { (dx * dx + dy * dy) / max_r2 } else { 0.0 };
            data.push(floor + depth * r2);
        }
    }
    SyntheticDem {
        data,
        width: size,
        height: size,
        transform: AffineTransform::north_up(500_000.0, 4_000_000.0, cell, cell),
        crs: Crs::epsg(32633),
    }
}

/// V-shaped valley running north-south, sloping down towards the south.
///
/// Useful for checking a dam-style impoundment: the lowest cell sits at
/// the centre of the bottom row.
pub fn create_valley_dem(width: usize, height: usize, cell: f64) -> SyntheticDem {
    let centre = (width as f32 - 1.0) / 2.0;
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        let along = (height - 1 - row) as f32 * 0.5;
        for col in 0..width {
            let across = (col as f32 - centre).abs() * 2.0;
            data.push(100.0 + along + across);
        }
    }
    SyntheticDem {
        data,
        width,
        height,
        transform: AffineTransform::north_up(300_000.0, 5_100_000.0, cell, cell),
        crs: Crs::epsg(32618),
    }
}

/// Uniformly random terrain in `[low, high)` from a fixed seed.
pub fn create_random_dem(width: usize, height: usize, seed: u64, low: f32, high: f32) -> SyntheticDem {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width * height).map(|_| rng.gen_range(low..high)).collect();
    SyntheticDem {
        data,
        width,
        height,
        transform: AffineTransform::north_up(0.0, height as f64 * 30.0, 30.0, 30.0),
        crs: Crs::epsg(32633),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bowl_minimum_at_centre() {
        let dem = create_bowl_dem(5, 10.0, 50.0, 20.0);
        let min = dem.data.iter().cloned().fold(f32::INFINITY, f32::min);
        assert_eq!(min, 50.0);
        assert_eq!(dem.data[2 * 5 + 2], 50.0);
        assert_eq!(dem.data[0], 70.0);
    }

    #[test]
    fn test_valley_lowest_on_bottom_row() {
        let dem = create_valley_dem(5, 4, 10.0);
        assert_eq!(dem.data[3 * 5 + 2], 100.0);
        assert!(dem.data[2] > dem.data[3 * 5 + 2]);
    }

    #[test]
    fn test_random_dem_is_seeded() {
        let a = create_random_dem(8, 8, 7, 0.0, 10.0);
        let b = create_random_dem(8, 8, 7, 0.0, 10.0);
        assert_eq!(a, b);
        assert!(a.data.iter().all(|v| (0.0..10.0).contains(v)));
    }

    #[test]
    fn test_shifted() {
        let dem = create_bowl_dem(3, 1.0, 0.0, 4.0).shifted(100.0);
        assert_eq!(dem.data[4], 100.0);
    }
}
