//! Per-tick rate limiting of camera altitude, position and bearing.

use crate::config::SmoothingConfig;
use crate::models::{CameraMode, CameraPose};
use crate::spatial::{local_offset_m, normalize_bearing, offset_position, shortest_angle_delta};

/// Last emitted value per axis. `None` means the next tick is unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SmoothingState {
    pub altitude: Option<f64>,
    pub bearing: Option<f64>,
    /// (lng, lat)
    pub position: Option<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct SmoothingStage {
    config: SmoothingConfig,
    state: SmoothingState,
}

impl SmoothingStage {
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            config,
            state: SmoothingState::default(),
        }
    }

    pub fn state(&self) -> SmoothingState {
        self.state
    }

    /// Forget history so the next pose passes through untouched.
    pub fn reset(&mut self) {
        self.state = SmoothingState::default();
    }

    pub fn apply(&mut self, pose: CameraPose, mode: CameraMode) -> CameraPose {
        let mut out = pose;

        if let Some(prev) = self.state.altitude {
            out.alt = limit_scalar(prev, pose.alt, self.config.max_altitude_per_tick_m);
        }

        if let Some((prev_lng, prev_lat)) = self.state.position {
            let (lng, lat) = limit_position(
                prev_lng,
                prev_lat,
                pose.lng,
                pose.lat,
                self.config.max_horizontal_per_tick_m,
            );
            out.lng = lng;
            out.lat = lat;
        }

        if let Some(prev) = self.state.bearing {
            let max = self.config.max_bearing_per_tick(mode);
            let delta = shortest_angle_delta(prev, pose.bearing).clamp(-max, max);
            out.bearing = normalize_bearing(prev + delta);
        }

        self.state = SmoothingState {
            altitude: Some(out.alt),
            bearing: Some(out.bearing),
            position: Some((out.lng, out.lat)),
        };
        out
    }
}

fn limit_scalar(prev: f64, next: f64, max_delta: f64) -> f64 {
    prev + (next - prev).clamp(-max_delta, max_delta)
}

/// Pull `next` back toward `prev` along the same direction when it moved too far.
fn limit_position(prev_lng: f64, prev_lat: f64, lng: f64, lat: f64, max_m: f64) -> (f64, f64) {
    let (east, north) = local_offset_m(prev_lat, prev_lng, lat, lng);
    let distance = (east * east + north * north).sqrt();
    if distance <= max_m || distance <= f64::EPSILON {
        return (lng, lat);
    }
    let scale = max_m / distance;
    let (new_lat, new_lng) = offset_position(prev_lat, prev_lng, north * scale, east * scale);
    (new_lng, new_lat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{bearing_deg, haversine_distance, offset_by_bearing_deg};

    fn stage() -> SmoothingStage {
        SmoothingStage::new(SmoothingConfig::default())
    }

    #[test]
    fn first_pose_passes_through() {
        let mut stage = stage();
        let pose = CameraPose::new(7.0, 46.0, 1234.0, 77.0, -30.0);
        assert_eq!(stage.apply(pose, CameraMode::Chase), pose);
    }

    #[test]
    fn altitude_step_is_capped() {
        let mut stage = stage();
        stage.apply(CameraPose::new(7.0, 46.0, 1000.0, 0.0, -30.0), CameraMode::Chase);
        let out = stage.apply(CameraPose::new(7.0, 46.0, 1500.0, 0.0, -30.0), CameraMode::Chase);
        assert!((out.alt - 1012.0).abs() < 1e-9);
    }

    #[test]
    fn bearing_wraps_the_short_way() {
        let mut stage = stage();
        stage.apply(CameraPose::new(7.0, 46.0, 1000.0, 359.0, -30.0), CameraMode::Chase);
        let out = stage.apply(CameraPose::new(7.0, 46.0, 1000.0, 20.0, -30.0), CameraMode::Chase);
        assert!((out.bearing - 2.0).abs() < 1e-9, "got {}", out.bearing);
    }

    #[test]
    fn birds_eye_twists_slower() {
        let mut stage = stage();
        stage.apply(CameraPose::new(7.0, 46.0, 1000.0, 90.0, -85.0), CameraMode::BirdsEye);
        let out = stage.apply(CameraPose::new(7.0, 46.0, 1000.0, 120.0, -85.0), CameraMode::BirdsEye);
        assert!((out.bearing - 91.0).abs() < 1e-9);
    }

    #[test]
    fn large_jump_is_pulled_back_along_direction() {
        let mut stage = stage();
        stage.apply(CameraPose::new(7.0, 46.0, 1000.0, 0.0, -30.0), CameraMode::Chase);
        let (lat, lng) = offset_by_bearing_deg(46.0, 7.0, 1000.0, 45.0);
        let out = stage.apply(CameraPose::new(lng, lat, 1000.0, 0.0, -30.0), CameraMode::Chase);
        let moved = haversine_distance(46.0, 7.0, out.lat, out.lng);
        assert!((moved - 80.0).abs() < 0.5, "moved {moved}");
        let direction = bearing_deg(46.0, 7.0, out.lat, out.lng);
        assert!((direction - 45.0).abs() < 0.5);
    }

    #[test]
    fn reset_exempts_next_tick() {
        let mut stage = stage();
        stage.apply(CameraPose::new(7.0, 46.0, 1000.0, 0.0, -30.0), CameraMode::Chase);
        stage.reset();
        let target = CameraPose::new(7.5, 46.5, 3000.0, 180.0, -30.0);
        assert_eq!(stage.apply(target, CameraMode::Chase), target);
    }
}
