//! Distance-parameterized route sampling.

use crate::models::PathPoint;
use crate::spatial::{bearing_deg, haversine_distance};

const MIN_HEADING_SPAN_M: f64 = 1.0;

/// Turns a distance along the route into a point on it.
pub trait PathSampler {
    /// Total route length in kilometers.
    fn length_km(&self) -> f64;

    /// Point at `distance_km` from the start, or `None` outside the route.
    fn sample_at(&self, distance_km: f64) -> Option<PathPoint>;
}

/// Lat/lng bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl GeoBounds {
    /// Smallest box containing every finite point, or `None` if there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a PathPoint>) -> Option<Self> {
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lng = f64::INFINITY;
        let mut max_lng = f64::NEG_INFINITY;
        for point in points {
            if !point.lat.is_finite() || !point.lng.is_finite() {
                continue;
            }
            min_lat = min_lat.min(point.lat);
            max_lat = max_lat.max(point.lat);
            min_lng = min_lng.min(point.lng);
            max_lng = max_lng.max(point.lng);
        }
        if !min_lat.is_finite() || !min_lng.is_finite() {
            return None;
        }
        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Grow each side by `pad_ratio` of the span.
    pub fn expand(&self, pad_ratio: f64) -> Self {
        let pad_lat = (self.max_lat - self.min_lat) * pad_ratio;
        let pad_lng = (self.max_lng - self.min_lng) * pad_ratio;
        Self {
            min_lat: self.min_lat - pad_lat,
            max_lat: self.max_lat + pad_lat,
            min_lng: self.min_lng - pad_lng,
            max_lng: self.max_lng + pad_lng,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }
}

/// Route built from an ordered list of points, linearly interpolated.
#[derive(Debug, Clone)]
pub struct PolylinePath {
    points: Vec<PathPoint>,
    /// Cumulative distance in km at each point
    cumulative_km: Vec<f64>,
}

impl PolylinePath {
    /// Build a path. Non-finite points are dropped.
    pub fn new(points: Vec<PathPoint>) -> Self {
        let points: Vec<PathPoint> = points.into_iter().filter(PathPoint::is_finite).collect();
        let mut cumulative_km = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (idx, point) in points.iter().enumerate() {
            if idx > 0 {
                let prev = &points[idx - 1];
                total += haversine_distance(prev.lat, prev.lng, point.lat, point.lng) / 1000.0;
            }
            cumulative_km.push(total);
        }
        Self {
            points,
            cumulative_km,
        }
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }
}

impl PathSampler for PolylinePath {
    fn length_km(&self) -> f64 {
        self.cumulative_km.last().copied().unwrap_or(0.0)
    }

    fn sample_at(&self, distance_km: f64) -> Option<PathPoint> {
        if !distance_km.is_finite() || self.points.is_empty() {
            return None;
        }
        let length = self.length_km();
        // Allow a hair of float slop at either end
        if distance_km < -1e-9 || distance_km > length + 1e-9 {
            return None;
        }
        let distance_km = distance_km.clamp(0.0, length);

        let idx = self
            .cumulative_km
            .partition_point(|&d| d <= distance_km)
            .saturating_sub(1);
        let start = self.points.get(idx)?;
        let Some(end) = self.points.get(idx + 1) else {
            return Some(*start);
        };

        let seg_start = self.cumulative_km[idx];
        let seg_len = self.cumulative_km[idx + 1] - seg_start;
        if seg_len <= f64::EPSILON {
            return Some(*start);
        }
        let t = ((distance_km - seg_start) / seg_len).clamp(0.0, 1.0);
        Some(PathPoint {
            lng: start.lng + (end.lng - start.lng) * t,
            lat: start.lat + (end.lat - start.lat) * t,
            alt: start.alt + (end.alt - start.alt) * t,
        })
    }
}

/// Bounding box over `samples` evenly spaced points along the route.
pub fn route_bounds(path: &dyn PathSampler, samples: usize) -> Option<GeoBounds> {
    let samples = samples.max(2);
    let length = path.length_km();
    let points: Vec<PathPoint> = (0..samples)
        .filter_map(|i| path.sample_at(length * i as f64 / (samples - 1) as f64))
        .collect();
    GeoBounds::from_points(&points)
}

/// Heading of the first stretch of the route in compass degrees.
pub fn initial_heading(path: &dyn PathSampler) -> Option<f64> {
    let start = path.sample_at(0.0)?;
    let ahead_km = path.length_km().min(0.5);
    let ahead = path.sample_at(ahead_km)?;
    if haversine_distance(start.lat, start.lng, ahead.lat, ahead.lng) < 0.5 {
        return None;
    }
    Some(bearing_deg(start.lat, start.lng, ahead.lat, ahead.lng))
}

/// Direction of travel at `distance_km` in compass degrees.
///
/// Looks `look_ahead_km` forward; near the route end, where the look-ahead
/// collapses onto the tracked point, looks the same distance back instead.
pub fn heading_at(path: &dyn PathSampler, distance_km: f64, look_ahead_km: f64) -> Option<f64> {
    let here = path.sample_at(distance_km)?;
    let ahead_km = (distance_km + look_ahead_km).min(path.length_km());
    if let Some(ahead) = path.sample_at(ahead_km) {
        if haversine_distance(here.lat, here.lng, ahead.lat, ahead.lng) >= MIN_HEADING_SPAN_M {
            return Some(bearing_deg(here.lat, here.lng, ahead.lat, ahead.lng));
        }
    }
    let behind = path.sample_at((distance_km - look_ahead_km).max(0.0))?;
    if haversine_distance(behind.lat, behind.lng, here.lat, here.lng) >= MIN_HEADING_SPAN_M {
        return Some(bearing_deg(behind.lat, behind.lng, here.lat, here.lng));
    }
    None
}
