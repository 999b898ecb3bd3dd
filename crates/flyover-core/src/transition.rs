//! Eased blending between camera poses and the mode transition state machine.

use crate::models::{CameraMode, CameraPose, LngLat};
use crate::spatial::{
    bearing_deg, ease_out_cubic, haversine_distance, lerp, lerp_bearing, offset_by_bearing_deg,
};

/// How the camera position travels between the ends of a blend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendPath {
    /// Straight line between start and target
    Direct,
    /// Arc around the pivot, keeping the camera aimed at it
    Around,
}

/// An eased blend from a fixed start pose toward a target that may move
/// every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blend {
    start: CameraPose,
    progress: f64,
    duration_s: f64,
    path: BlendPath,
}

impl Blend {
    pub fn new(start: CameraPose, duration_s: f64) -> Self {
        Self {
            start,
            progress: 0.0,
            duration_s: duration_s.max(1e-3),
            path: BlendPath::Direct,
        }
    }

    /// A blend that swings around a pivot instead of cutting across it.
    pub fn around(start: CameraPose, duration_s: f64) -> Self {
        Self {
            path: BlendPath::Around,
            ..Self::new(start, duration_s)
        }
    }

    pub fn path(&self) -> BlendPath {
        self.path
    }

    pub fn start(&self) -> CameraPose {
        self.start
    }

    /// Linear progress in [0, 1].
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }

    /// Pose at the current progress against `target`, without advancing.
    pub fn sample(&self, target: &CameraPose) -> CameraPose {
        if self.is_complete() {
            return *target;
        }
        self.start.interpolate(target, ease_out_cubic(self.progress))
    }

    /// Move progress forward by `dt_s`. Negative or non-finite steps do nothing.
    pub fn step(&mut self, dt_s: f64) {
        if dt_s.is_finite() && dt_s > 0.0 {
            self.progress = (self.progress + dt_s / self.duration_s).min(1.0);
        }
    }

    /// Advance by `dt_s` and sample.
    pub fn advance(&mut self, dt_s: f64, target: &CameraPose) -> CameraPose {
        self.step(dt_s);
        self.sample(target)
    }

    /// Like [`Blend::sample`], but an `Around` blend moves on an arc about
    /// `pivot`: bearing and distance from the pivot are interpolated, and the
    /// camera looks at the pivot.
    pub fn sample_around(&self, target: &CameraPose, pivot: LngLat) -> CameraPose {
        if self.path == BlendPath::Direct || self.is_complete() {
            return self.sample(target);
        }
        let t = ease_out_cubic(self.progress);
        let polar = |pose: &CameraPose| {
            (
                bearing_deg(pivot.lat, pivot.lng, pose.lat, pose.lng),
                haversine_distance(pivot.lat, pivot.lng, pose.lat, pose.lng),
            )
        };
        let (from_bearing, from_m) = polar(&self.start);
        let (to_bearing, to_m) = polar(target);
        let distance_m = lerp(from_m, to_m, t);
        if distance_m < 1.0 {
            return self.sample(target);
        }
        let (lat, lng) = offset_by_bearing_deg(
            pivot.lat,
            pivot.lng,
            distance_m,
            lerp_bearing(from_bearing, to_bearing, t),
        );
        CameraPose::new(
            lng,
            lat,
            lerp(self.start.alt, target.alt, t),
            bearing_deg(lat, lng, pivot.lat, pivot.lng),
            lerp(self.start.pitch, target.pitch, t),
        )
    }
}

/// Which mode drives the camera, and whether it is being blended into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionState {
    Stable(CameraMode),
    Transitioning {
        from: CameraMode,
        to: CameraMode,
        blend: Blend,
    },
}

#[derive(Debug, Clone)]
pub struct ModeTransitionManager {
    state: TransitionState,
}

impl ModeTransitionManager {
    pub fn new(mode: CameraMode) -> Self {
        Self {
            state: TransitionState::Stable(mode),
        }
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    /// The mode being left during a transition, otherwise the stable mode.
    pub fn current_mode(&self) -> CameraMode {
        match self.state {
            TransitionState::Stable(mode) => mode,
            TransitionState::Transitioning { from, .. } => from,
        }
    }

    /// The mode whose target pose drives the camera.
    pub fn target_mode(&self) -> CameraMode {
        match self.state {
            TransitionState::Stable(mode) => mode,
            TransitionState::Transitioning { to, .. } => to,
        }
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.state, TransitionState::Transitioning { .. })
    }

    pub fn progress(&self) -> Option<f64> {
        match &self.state {
            TransitionState::Stable(_) => None,
            TransitionState::Transitioning { blend, .. } => Some(blend.progress()),
        }
    }

    /// Start blending from `start_pose` toward `to`. A request arriving
    /// mid-transition restarts from whatever pose the caller passes, which
    /// should be the pose last shown.
    pub fn request(&mut self, to: CameraMode, start_pose: CameraPose, duration_s: f64) {
        let from = self.target_mode();
        tracing::debug!("Camera transition {} -> {} over {:.2}s", from, to, duration_s);
        self.state = TransitionState::Transitioning {
            from,
            to,
            blend: Blend::new(start_pose, duration_s),
        };
    }

    /// Same as [`ModeTransitionManager::request`], but the camera swings
    /// around the tracked point on its way.
    pub fn request_around(&mut self, to: CameraMode, start_pose: CameraPose, duration_s: f64) {
        let from = self.target_mode();
        tracing::debug!("Camera sweep {} -> {} over {:.2}s", from, to, duration_s);
        self.state = TransitionState::Transitioning {
            from,
            to,
            blend: Blend::around(start_pose, duration_s),
        };
    }

    /// Jump straight to `mode` with no blend.
    pub fn settle(&mut self, mode: CameraMode) {
        self.state = TransitionState::Stable(mode);
    }

    /// Advance an active transition. Returns the blended pose, or `None` when stable.
    /// The tick that reaches progress 1 returns `live_target` and settles.
    /// `pivot` is the tracked point, used by sweeping transitions.
    pub fn advance(
        &mut self,
        dt_s: f64,
        live_target: &CameraPose,
        pivot: LngLat,
    ) -> Option<CameraPose> {
        let TransitionState::Transitioning { to, blend, .. } = &mut self.state else {
            return None;
        };
        blend.step(dt_s);
        let pose = blend.sample_around(live_target, pivot);
        if blend.is_complete() {
            let to = *to;
            tracing::debug!("Camera transition into {} complete", to);
            self.state = TransitionState::Stable(to);
        }
        Some(pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RIDER: LngLat = LngLat { lng: 7.0, lat: 46.0 };

    fn pose(lng: f64, bearing: f64) -> CameraPose {
        CameraPose::new(lng, 46.0, 1000.0, bearing, -30.0)
    }

    #[test]
    fn blend_starts_at_start_and_ends_at_target() {
        let start = pose(7.0, 10.0);
        let target = pose(7.1, 350.0);
        let mut blend = Blend::new(start, 1.0);
        assert_eq!(blend.advance(0.0, &target), start);
        let end = blend.advance(1.0, &target);
        assert_eq!(end, target);
        assert!(blend.is_complete());
    }

    #[test]
    fn blend_is_eased_out() {
        let start = pose(7.0, 0.0);
        let target = pose(8.0, 0.0);
        let mut blend = Blend::new(start, 1.0);
        let half = blend.advance(0.5, &target);
        // ease-out covers more than half the distance by the midpoint
        assert!((half.lng - 7.875).abs() < 1e-9);
    }

    #[test]
    fn negative_dt_does_not_rewind() {
        let mut blend = Blend::new(pose(7.0, 0.0), 2.0);
        blend.advance(1.0, &pose(8.0, 0.0));
        blend.advance(-5.0, &pose(8.0, 0.0));
        assert!((blend.progress() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn transition_tracks_moving_target_and_settles() {
        let mut manager = ModeTransitionManager::new(CameraMode::Chase);
        manager.request(CameraMode::BirdsEye, pose(7.0, 0.0), 1.0);
        assert_eq!(manager.current_mode(), CameraMode::Chase);
        assert_eq!(manager.target_mode(), CameraMode::BirdsEye);

        let mut target_lng = 7.5;
        let mut last_progress = 0.0;
        let mut last_pose = None;
        for _ in 0..9 {
            target_lng += 0.01;
            last_pose = manager.advance(0.1, &pose(target_lng, 0.0), RIDER);
            let progress = manager.progress().unwrap();
            assert!(progress >= last_progress);
            last_progress = progress;
        }
        assert!(last_pose.unwrap().lng < target_lng);

        let final_target = pose(target_lng + 0.01, 0.0);
        let done = manager.advance(0.2, &final_target, RIDER).unwrap();
        assert_eq!(done, final_target);
        assert_eq!(manager.state(), &TransitionState::Stable(CameraMode::BirdsEye));
        assert!(manager.advance(0.1, &final_target, RIDER).is_none());
    }

    #[test]
    fn second_request_restarts_from_given_pose() {
        let mut manager = ModeTransitionManager::new(CameraMode::Chase);
        manager.request(CameraMode::BirdsEye, pose(7.0, 0.0), 1.0);
        let mid = manager.advance(0.5, &pose(8.0, 0.0), RIDER).unwrap();
        manager.request(CameraMode::Cinematic, mid, 2.0);
        assert_eq!(manager.current_mode(), CameraMode::BirdsEye);
        assert_eq!(manager.target_mode(), CameraMode::Cinematic);
        assert_eq!(manager.progress(), Some(0.0));
        let first = manager.advance(0.0, &pose(9.0, 0.0), RIDER).unwrap();
        assert_eq!(first, mid);
    }

    #[test]
    fn sweep_circles_the_pivot() {
        let north = offset_by_bearing_deg(46.0, 7.0, 350.0, 0.0);
        let south = offset_by_bearing_deg(46.0, 7.0, 350.0, 180.0);
        let start = CameraPose::new(north.1, north.0, 900.0, 180.0, -20.0);
        let target = CameraPose::new(south.1, south.0, 900.0, 0.0, -20.0);

        let mut manager = ModeTransitionManager::new(CameraMode::SideView);
        manager.request_around(CameraMode::SideView, start, 1.0);
        for _ in 0..9 {
            let pose = manager.advance(0.1, &target, RIDER).unwrap();
            let d = haversine_distance(RIDER.lat, RIDER.lng, pose.lat, pose.lng);
            assert!((d - 350.0).abs() < 1.0, "camera {d}m from the pivot");
            let aim = bearing_deg(pose.lat, pose.lng, RIDER.lat, RIDER.lng);
            assert!(crate::spatial::shortest_angle_delta(pose.bearing, aim).abs() < 1e-6);
        }
        assert_eq!(manager.advance(0.2, &target, RIDER), Some(target));
        assert_eq!(manager.state(), &TransitionState::Stable(CameraMode::SideView));
    }

    #[test]
    fn direct_blend_ignores_pivot() {
        let blend = Blend::new(pose(7.0, 0.0), 1.0);
        assert_eq!(blend.path(), BlendPath::Direct);
        assert_eq!(blend.sample_around(&pose(8.0, 0.0), RIDER), blend.sample(&pose(8.0, 0.0)));
    }
}
