//! Terrain sampling and the camera clearance floor.

use crate::config::GuardConfig;
use crate::models::CameraPose;
use crate::spatial::{haversine_distance, meters_per_deg_lat, meters_per_deg_lon};

/// Source of ground elevation.
///
/// Implementations must answer synchronously; an async backend should sit
/// behind a cache and return `None` until it has data.
pub trait TerrainOracle {
    /// Elevation in meters at the position, or `None` when unknown.
    fn elevation_at(&self, lng: f64, lat: f64) -> Option<f64>;
}

impl<T: TerrainOracle + ?Sized> TerrainOracle for &T {
    fn elevation_at(&self, lng: f64, lat: f64) -> Option<f64> {
        (**self).elevation_at(lng, lat)
    }
}

impl<T: TerrainOracle + ?Sized> TerrainOracle for std::sync::Arc<T> {
    fn elevation_at(&self, lng: f64, lat: f64) -> Option<f64> {
        (**self).elevation_at(lng, lat)
    }
}

impl<T: TerrainOracle + ?Sized> TerrainOracle for std::rc::Rc<T> {
    fn elevation_at(&self, lng: f64, lat: f64) -> Option<f64> {
        (**self).elevation_at(lng, lat)
    }
}

/// Oracle that never knows anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTerrain;

impl TerrainOracle for NoTerrain {
    fn elevation_at(&self, _lng: f64, _lat: f64) -> Option<f64> {
        None
    }
}

/// Regular lat/lng elevation grid with bilinear sampling.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
    lat_step_deg: f64,
    lon_step_deg: f64,
    rows: usize,
    cols: usize,
    elevations_m: Vec<f64>,
}

impl TerrainGrid {
    /// Sample `elevation(lng, lat)` over the box at roughly `spacing_m`.
    pub fn from_fn(
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
        spacing_m: f64,
        elevation: impl Fn(f64, f64) -> f64,
    ) -> Self {
        let mean_lat = (min_lat + max_lat) / 2.0;
        let spacing_m = spacing_m.max(1.0);
        let lat_step_deg = spacing_m / meters_per_deg_lat(mean_lat).max(1e-9);
        let lon_step_deg = spacing_m / meters_per_deg_lon(mean_lat).max(1e-9);
        let rows = ((max_lat - min_lat) / lat_step_deg).ceil().max(1.0) as usize + 1;
        let cols = ((max_lon - min_lon) / lon_step_deg).ceil().max(1.0) as usize + 1;

        let mut elevations_m = Vec::with_capacity(rows.saturating_mul(cols));
        for row in 0..rows {
            let lat = min_lat + row as f64 * lat_step_deg;
            for col in 0..cols {
                let lon = min_lon + col as f64 * lon_step_deg;
                let value = elevation(lon, lat);
                elevations_m.push(if value.is_finite() { value } else { 0.0 });
            }
        }

        Self {
            min_lat,
            min_lon,
            max_lat: min_lat + (rows - 1) as f64 * lat_step_deg,
            max_lon: min_lon + (cols - 1) as f64 * lon_step_deg,
            lat_step_deg,
            lon_step_deg,
            rows,
            cols,
            elevations_m,
        }
    }

    /// Bilinear elevation, clamped to the grid edges.
    pub fn sample(&self, lat: f64, lon: f64) -> Option<f64> {
        if !lat.is_finite() || !lon.is_finite() || self.elevations_m.is_empty() {
            return None;
        }
        let clamped_lat = lat.clamp(self.min_lat, self.max_lat);
        let clamped_lon = lon.clamp(self.min_lon, self.max_lon);

        let lat_step = self.lat_step_deg.max(1e-9);
        let lon_step = self.lon_step_deg.max(1e-9);

        let max_y = (self.rows - 1) as f64;
        let max_x = (self.cols - 1) as f64;
        let y = ((clamped_lat - self.min_lat) / lat_step).clamp(0.0, max_y);
        let x = ((clamped_lon - self.min_lon) / lon_step).clamp(0.0, max_x);

        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let y1 = (y0 + 1).min(self.rows - 1);
        let x1 = (x0 + 1).min(self.cols - 1);
        let dy = y - y0 as f64;
        let dx = x - x0 as f64;

        let v00 = self.value_at(y0, x0);
        let v10 = self.value_at(y0, x1);
        let v01 = self.value_at(y1, x0);
        let v11 = self.value_at(y1, x1);

        let v0 = v00 + (v10 - v00) * dx;
        let v1 = v01 + (v11 - v01) * dx;
        Some(v0 + (v1 - v0) * dy)
    }

    fn value_at(&self, row: usize, col: usize) -> f64 {
        let idx = row.saturating_mul(self.cols) + col.min(self.cols - 1);
        self.elevations_m.get(idx).copied().unwrap_or(0.0)
    }
}

impl TerrainOracle for TerrainGrid {
    fn elevation_at(&self, lng: f64, lat: f64) -> Option<f64> {
        self.sample(lat, lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CachedElevation {
    lng: f64,
    lat: f64,
    elevation_m: f64,
}

/// Last known-good terrain sample, reused when the oracle has nothing.
#[derive(Debug, Clone)]
pub struct TerrainCache {
    last: Option<CachedElevation>,
    reuse_radius_m: f64,
}

impl TerrainCache {
    pub fn new(reuse_radius_m: f64) -> Self {
        Self {
            last: None,
            reuse_radius_m,
        }
    }

    /// Query the oracle, falling back to the cached sample when it is close enough.
    pub fn elevation_at(&mut self, oracle: &dyn TerrainOracle, lng: f64, lat: f64) -> Option<f64> {
        if let Some(elevation_m) = oracle.elevation_at(lng, lat).filter(|e| e.is_finite()) {
            self.last = Some(CachedElevation {
                lng,
                lat,
                elevation_m,
            });
            return Some(elevation_m);
        }

        let cached = self.last?;
        let distance = haversine_distance(cached.lat, cached.lng, lat, lng);
        if distance <= self.reuse_radius_m {
            tracing::debug!(
                "Terrain unknown at ({:.5}, {:.5}), reusing sample {:.0}m away",
                lng,
                lat,
                distance
            );
            Some(cached.elevation_m)
        } else {
            None
        }
    }
}

/// Result of running a pose through the guard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardOutcome {
    pub pose: CameraPose,
    /// Altitude was raised
    pub adjusted: bool,
    /// Terrain used for the floor, if any was available
    pub terrain_m: Option<f64>,
    pub floor_m: f64,
}

/// Keeps the camera above the ground and above the rider.
#[derive(Debug, Clone)]
pub struct TerrainGuard {
    config: GuardConfig,
}

impl TerrainGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    /// Clearance above camera-site terrain. Grows when that terrain is higher
    /// than the rider so the camera can see over it.
    pub fn terrain_clearance(&self, terrain_m: f64, tracked_alt: f64) -> f64 {
        let rise = (terrain_m - tracked_alt).max(0.0);
        self.config.terrain_clearance_m
            + (rise * self.config.slope_clearance_factor).min(self.config.max_slope_clearance_m)
    }

    /// Lowest permissible camera altitude.
    pub fn min_altitude(&self, terrain_m: Option<f64>, tracked_alt: f64) -> f64 {
        let rider_floor = tracked_alt + self.config.rider_clearance_m;
        match terrain_m {
            Some(terrain) => (terrain + self.terrain_clearance(terrain, tracked_alt)).max(rider_floor),
            None => rider_floor,
        }
    }

    pub fn apply(
        &self,
        pose: CameraPose,
        tracked_alt: f64,
        cache: &mut TerrainCache,
        oracle: &dyn TerrainOracle,
    ) -> GuardOutcome {
        let terrain_m = cache.elevation_at(oracle, pose.lng, pose.lat);
        let floor_m = self.min_altitude(terrain_m, tracked_alt);
        let mut pose = pose;
        let adjusted = pose.alt.is_nan() || pose.alt < floor_m;
        if adjusted {
            pose.alt = floor_m;
        }
        GuardOutcome {
            pose,
            adjusted,
            terrain_m,
            floor_m,
        }
    }
}
