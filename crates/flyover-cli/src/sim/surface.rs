//! Headless rendering surface for simulation runs.

use flyover_core::{CameraPose, CoarseView, LngLat, RenderError, Renderer};
use rand::Rng;

/// Keeps only the latest pose and counters, and can reject free-camera
/// writes at random to exercise the coarse fallback.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    pose: Option<CameraPose>,
    reject_probability: f64,
    pub pose_writes: u64,
    pub coarse_writes: u64,
    pub rejected: u64,
}

impl HeadlessSurface {
    pub fn new(reject_probability: f64) -> Self {
        let reject_probability = if reject_probability.is_finite() {
            reject_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            reject_probability,
            ..Self::default()
        }
    }
}

impl Renderer for HeadlessSurface {
    fn set_pose(&mut self, pose: &CameraPose, _look_at: LngLat) -> Result<(), RenderError> {
        if self.reject_probability > 0.0 && rand::rng().random_bool(self.reject_probability) {
            self.rejected += 1;
            return Err(RenderError("simulated free camera failure".to_string()));
        }
        self.pose = Some(*pose);
        self.pose_writes += 1;
        Ok(())
    }

    fn jump_to(&mut self, view: &CoarseView) -> Result<(), RenderError> {
        self.coarse_writes += 1;
        if let Some(pose) = self.pose.as_mut() {
            pose.bearing = view.bearing;
            pose.pitch = view.pitch;
        }
        Ok(())
    }

    fn current_pose(&self) -> Option<CameraPose> {
        self.pose
    }
}
