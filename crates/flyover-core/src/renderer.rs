//! Rendering surface seam.

use crate::error::RenderError;
use crate::models::{CameraPose, LngLat};
use crate::spatial::haversine_distance;

/// Meters per pixel at zoom 0 on the equator for 512px tiles.
const METERS_PER_PIXEL_Z0: f64 = 78_271.517;
const VIEWPORT_PX: f64 = 512.0;
/// Camera distance expressed in viewport heights.
const VIEWPORT_DISTANCE_RATIO: f64 = 1.5;
const MAX_ZOOM: f64 = 22.0;

/// Lower-fidelity camera description used when a full pose is rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoarseView {
    pub center: LngLat,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

/// The surface that draws the scene.
pub trait Renderer {
    /// Place the camera. May fail; the caller falls back to [`Renderer::jump_to`].
    fn set_pose(&mut self, pose: &CameraPose, look_at: LngLat) -> Result<(), RenderError>;

    /// Center/zoom/pitch/bearing camera call.
    fn jump_to(&mut self, view: &CoarseView) -> Result<(), RenderError>;

    /// What the surface is showing now, including manual changes by the user.
    fn current_pose(&self) -> Option<CameraPose>;
}

/// Web-mercator zoom that puts a camera `distance_m` from its target.
pub fn zoom_for_distance(distance_m: f64, lat: f64) -> f64 {
    if !distance_m.is_finite() || distance_m <= 0.0 {
        return MAX_ZOOM;
    }
    let meters_per_pixel = distance_m / (VIEWPORT_DISTANCE_RATIO * VIEWPORT_PX);
    let scale = METERS_PER_PIXEL_Z0 * lat.to_radians().cos().max(1e-6) / meters_per_pixel;
    scale.log2().clamp(0.0, MAX_ZOOM)
}

/// Coarse equivalent of a pose looking at `look_at`.
pub fn coarse_view(pose: &CameraPose, look_at: LngLat, target_alt: f64) -> CoarseView {
    let ground_m = haversine_distance(pose.lat, pose.lng, look_at.lat, look_at.lng);
    let height_m = (pose.alt - target_alt).max(0.0);
    let distance_m = (ground_m * ground_m + height_m * height_m).sqrt();
    CoarseView {
        center: look_at,
        zoom: zoom_for_distance(distance_m, look_at.lat),
        pitch: pose.pitch,
        bearing: pose.bearing,
    }
}

/// Renderer that records every call. Used headless by tooling and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pub poses: Vec<(CameraPose, LngLat)>,
    pub coarse: Vec<CoarseView>,
    /// Make `set_pose` fail
    pub reject_poses: bool,
    /// Make `jump_to` fail too
    pub reject_coarse: bool,
    /// Pose the user dragged the view to, if any
    pub user_pose: Option<CameraPose>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_pose(&self) -> Option<CameraPose> {
        self.poses.last().map(|(pose, _)| *pose)
    }

    pub fn write_count(&self) -> usize {
        self.poses.len() + self.coarse.len()
    }
}

impl Renderer for RecordingRenderer {
    fn set_pose(&mut self, pose: &CameraPose, look_at: LngLat) -> Result<(), RenderError> {
        if self.reject_poses {
            return Err(RenderError("free camera unavailable".to_string()));
        }
        self.user_pose = None;
        self.poses.push((*pose, look_at));
        Ok(())
    }

    fn jump_to(&mut self, view: &CoarseView) -> Result<(), RenderError> {
        if self.reject_coarse {
            return Err(RenderError("map not ready".to_string()));
        }
        self.user_pose = None;
        self.coarse.push(*view);
        Ok(())
    }

    fn current_pose(&self) -> Option<CameraPose> {
        self.user_pose.or_else(|| self.last_pose())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_drops_as_distance_grows() {
        let near = zoom_for_distance(500.0, 46.0);
        let far = zoom_for_distance(5_000.0, 46.0);
        assert!(near > far);
        assert!((near - far - 10f64.log2()).abs() < 1e-9);
        assert_eq!(zoom_for_distance(0.0, 46.0), 22.0);
        assert_eq!(zoom_for_distance(1e12, 46.0), 0.0);
    }

    #[test]
    fn coarse_view_centers_on_look_at() {
        let pose = CameraPose::new(7.0, 46.0, 1500.0, 30.0, -40.0);
        let look_at = LngLat { lng: 7.01, lat: 46.01 };
        let view = coarse_view(&pose, look_at, 500.0);
        assert_eq!(view.center, look_at);
        assert_eq!(view.bearing, 30.0);
        assert_eq!(view.pitch, -40.0);
        assert!(view.zoom > 10.0 && view.zoom < 18.0, "zoom {}", view.zoom);
    }

    #[test]
    fn recording_renderer_reports_user_pose_first() {
        let mut renderer = RecordingRenderer::new();
        let pose = CameraPose::new(7.0, 46.0, 1000.0, 0.0, -30.0);
        renderer
            .set_pose(&pose, LngLat { lng: 7.0, lat: 46.0 })
            .unwrap();
        assert_eq!(renderer.current_pose(), Some(pose));
        let dragged = CameraPose::new(7.2, 46.1, 3000.0, 90.0, -60.0);
        renderer.user_pose = Some(dragged);
        assert_eq!(renderer.current_pose(), Some(dragged));
    }
}
