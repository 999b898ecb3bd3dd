//! Synthetic elevation model and an unreliable oracle wrapper.

use flyover_core::spatial::local_offset_m;
use flyover_core::{GeoBounds, TerrainGrid, TerrainOracle};
use rand::Rng;
use std::cell::Cell;

/// Valley floor elevation at the landscape center.
const BASE_ELEVATION_M: f64 = 600.0;
/// Rise per meter travelled north.
const NORTH_GRADE: f64 = 0.08;
const RIDGE_HEIGHT_M: f64 = 220.0;
const RIDGE_SPACING_EAST_M: f64 = 1800.0;
const RIDGE_SPACING_NORTH_M: f64 = 2600.0;
const BOWL_RIM_M: f64 = 120.0;
const BOWL_RADIUS_M: f64 = 4000.0;

/// Alpine-ish terrain: a northward grade, crossing ridges and a bowl rim.
#[derive(Debug, Clone, Copy)]
pub struct Landscape {
    pub center_lat: f64,
    pub center_lng: f64,
}

impl Landscape {
    pub fn new(center_lat: f64, center_lng: f64) -> Self {
        Self {
            center_lat,
            center_lng,
        }
    }

    pub fn elevation(&self, lng: f64, lat: f64) -> f64 {
        let (east, north) = local_offset_m(self.center_lat, self.center_lng, lat, lng);
        let grade = NORTH_GRADE * north;
        let ridges = RIDGE_HEIGHT_M
            * (east / RIDGE_SPACING_EAST_M).sin()
            * (north / RIDGE_SPACING_NORTH_M).cos();
        let radius = (east * east + north * north).sqrt();
        let bowl = BOWL_RIM_M * (radius / BOWL_RADIUS_M).min(2.0);
        (BASE_ELEVATION_M + grade + ridges + bowl).max(0.0)
    }

    /// Rasterize over `bounds` for use as the controller's oracle.
    pub fn grid(&self, bounds: &GeoBounds, spacing_m: f64) -> TerrainGrid {
        TerrainGrid::from_fn(
            bounds.min_lat,
            bounds.min_lng,
            bounds.max_lat,
            bounds.max_lng,
            spacing_m,
            |lng, lat| self.elevation(lng, lat),
        )
    }
}

/// Oracle that randomly forgets, like a tile source that has not loaded yet.
pub struct FlakyTerrain<T> {
    inner: T,
    miss_probability: f64,
    misses: Cell<u64>,
    queries: Cell<u64>,
}

impl<T: TerrainOracle> FlakyTerrain<T> {
    pub fn new(inner: T, miss_probability: f64) -> Self {
        let miss_probability = if miss_probability.is_finite() {
            miss_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            inner,
            miss_probability,
            misses: Cell::new(0),
            queries: Cell::new(0),
        }
    }

    pub fn misses(&self) -> u64 {
        self.misses.get()
    }

    pub fn queries(&self) -> u64 {
        self.queries.get()
    }
}

impl<T: TerrainOracle> TerrainOracle for FlakyTerrain<T> {
    fn elevation_at(&self, lng: f64, lat: f64) -> Option<f64> {
        self.queries.set(self.queries.get() + 1);
        let mut rng = rand::rng();
        if rng.random_bool(self.miss_probability) {
            self.misses.set(self.misses.get() + 1);
            return None;
        }
        self.inner.elevation_at(lng, lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flyover_core::spatial::offset_position;

    #[test]
    fn test_landscape_rises_to_the_north() {
        let land = Landscape::new(46.5, 8.0);
        let (south_lat, south_lng) = offset_position(46.5, 8.0, -3000.0, 0.0);
        let (north_lat, north_lng) = offset_position(46.5, 8.0, 3000.0, 0.0);
        assert!(land.elevation(north_lng, north_lat) > land.elevation(south_lng, south_lat));
        assert!((land.elevation(8.0, 46.5) - BASE_ELEVATION_M).abs() < 1e-6);
    }

    #[test]
    fn test_grid_matches_closure_at_nodes() {
        let land = Landscape::new(46.5, 8.0);
        let bounds = GeoBounds {
            min_lat: 46.45,
            max_lat: 46.55,
            min_lng: 7.95,
            max_lng: 8.05,
        };
        let grid = land.grid(&bounds, 50.0);
        let sampled = grid.elevation_at(bounds.min_lng, bounds.min_lat).unwrap();
        let exact = land.elevation(bounds.min_lng, bounds.min_lat);
        assert!((sampled - exact).abs() < 1e-6);
    }

    struct Constant;

    impl TerrainOracle for Constant {
        fn elevation_at(&self, _lng: f64, _lat: f64) -> Option<f64> {
            Some(100.0)
        }
    }

    #[test]
    fn test_flaky_terrain_extremes() {
        let always = FlakyTerrain::new(Constant, 1.0);
        assert_eq!(always.elevation_at(8.0, 46.5), None);
        assert_eq!(always.misses(), 1);

        let never = FlakyTerrain::new(Constant, 0.0);
        for _ in 0..100 {
            assert_eq!(never.elevation_at(8.0, 46.5), Some(100.0));
        }
        assert_eq!(never.misses(), 0);
        assert_eq!(never.queries(), 100);

        let clamped = FlakyTerrain::new(Constant, f64::NAN);
        assert_eq!(clamped.elevation_at(8.0, 46.5), Some(100.0));
    }
}
