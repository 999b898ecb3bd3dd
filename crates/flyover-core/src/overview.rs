//! High framing used while the user scrubs through the route.

use crate::config::OverviewConfig;
use crate::models::{CameraPose, LngLat, PathPoint};
use crate::path::{initial_heading, route_bounds, GeoBounds, PathSampler};
use crate::spatial::{
    bearing_deg, haversine_distance, lat_to_meters, lon_to_meters, offset_by_bearing_deg,
};

/// A computed overview: where to put the camera and what it frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverviewFrame {
    pub pose: CameraPose,
    pub look_at: LngLat,
    /// Padded box the pose was derived from
    pub bounds: GeoBounds,
    /// Height above the framed ground
    pub height_m: f64,
}

#[derive(Debug, Clone)]
pub struct OverviewFramer {
    config: OverviewConfig,
}

impl OverviewFramer {
    pub fn new(config: OverviewConfig) -> Self {
        Self { config }
    }

    /// Frame the scrub start and the current scrub position, facing from one to the other.
    pub fn frame_points(
        &self,
        start: &PathPoint,
        current: &PathPoint,
        fallback_bearing: f64,
    ) -> Option<OverviewFrame> {
        let bounds = GeoBounds::from_points([start, current])?;
        let bearing = if haversine_distance(start.lat, start.lng, current.lat, current.lng) >= 1.0 {
            bearing_deg(start.lat, start.lng, current.lat, current.lng)
        } else {
            fallback_bearing
        };
        Some(self.frame_bounds(&bounds, start.alt.max(current.alt), bearing))
    }

    /// Frame the whole route, facing along its first stretch.
    pub fn frame_route(&self, path: &dyn PathSampler) -> Option<OverviewFrame> {
        let bounds = route_bounds(path, self.config.route_samples)?;
        let samples = self.config.route_samples.max(2);
        let length = path.length_km();
        let ground = (0..samples)
            .filter_map(|i| path.sample_at(length * i as f64 / (samples - 1) as f64))
            .map(|p| p.alt)
            .filter(|alt| alt.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        let ground = if ground.is_finite() { ground } else { 0.0 };
        let bearing = initial_heading(path).unwrap_or(0.0);
        Some(self.frame_bounds(&bounds, ground, bearing))
    }

    /// Pad the box, size the altitude off its larger span, and pull the
    /// camera back along `bearing` so the steep pitch lands on the center.
    pub fn frame_bounds(&self, bounds: &GeoBounds, ground_alt: f64, bearing: f64) -> OverviewFrame {
        let padded = bounds.expand(self.config.padding_ratio);
        let (center_lat, center_lng) = padded.center();
        let lat_span_m = lat_to_meters(padded.max_lat - padded.min_lat, center_lat);
        let lng_span_m = lon_to_meters(padded.max_lng - padded.min_lng, center_lat);
        let span_m = lat_span_m.max(lng_span_m);
        let height_m = (span_m * self.config.fov_factor).max(self.config.min_altitude_m);

        let pitch = self.config.pitch_deg;
        let tan = pitch.abs().to_radians().tan().max(1e-3);
        let pull_back_m = height_m / tan;
        let (lat, lng) = offset_by_bearing_deg(center_lat, center_lng, pull_back_m, bearing + 180.0);

        OverviewFrame {
            pose: CameraPose::new(lng, lat, ground_alt + height_m, bearing, pitch),
            look_at: LngLat {
                lng: center_lng,
                lat: center_lat,
            },
            bounds: padded,
            height_m,
        }
    }
}

/// Live state of a scrub drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrubFrame {
    start_point: PathPoint,
    pose: CameraPose,
    target: CameraPose,
    look_at: LngLat,
    /// Share of the gap to the target closed so far
    progress: f64,
}

impl ScrubFrame {
    /// Begin from whatever the camera currently shows.
    pub fn begin(start_point: PathPoint, current_pose: CameraPose) -> Self {
        Self {
            start_point,
            pose: current_pose,
            target: current_pose,
            look_at: start_point.horizontal(),
            progress: 0.0,
        }
    }

    pub fn start_point(&self) -> PathPoint {
        self.start_point
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn target(&self) -> CameraPose {
        self.target
    }

    pub fn look_at(&self) -> LngLat {
        self.look_at
    }

    /// How far the blend toward the overview has come, in [0, 1]. Each update
    /// closes `blend_factor` of what remains, so this only approaches 1.
    pub fn transition_progress(&self) -> f64 {
        self.progress
    }

    /// Retarget and move `blend_factor` of the way there.
    pub fn update(&mut self, frame: &OverviewFrame, blend_factor: f64) -> CameraPose {
        let blend_factor = blend_factor.clamp(0.0, 1.0);
        self.target = frame.pose;
        self.look_at = frame.look_at;
        self.pose = self.pose.interpolate(&self.target, blend_factor);
        self.progress += (1.0 - self.progress) * blend_factor;
        self.pose
    }
}
