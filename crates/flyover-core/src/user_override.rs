//! Suspends guided control while the user drives the view, then eases back.

use crate::config::OverrideConfig;
use crate::models::CameraPose;
use crate::transition::Blend;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverrideState {
    /// Guided control
    Inactive,
    /// Pointer or touch is down
    Interacting,
    /// Interaction ended; waiting out the grace period
    Grace { idle_s: f64 },
    /// Easing from the user's view back to the guided pose
    Returning(Blend),
}

/// What the controller should do about the override this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideStatus {
    Inactive,
    /// Write nothing to the renderer
    Suspended,
    /// Emit [`UserOverrideManager::return_pose`]
    Returning,
}

#[derive(Debug, Clone)]
pub struct UserOverrideManager {
    config: OverrideConfig,
    state: OverrideState,
}

impl UserOverrideManager {
    pub fn new(config: OverrideConfig) -> Self {
        Self {
            config,
            state: OverrideState::Inactive,
        }
    }

    pub fn state(&self) -> &OverrideState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, OverrideState::Inactive)
    }

    pub fn interaction_start(&mut self) {
        if !matches!(self.state, OverrideState::Interacting) {
            tracing::debug!("User took over the camera");
        }
        self.state = OverrideState::Interacting;
    }

    pub fn interaction_end(&mut self) {
        if matches!(self.state, OverrideState::Interacting) {
            self.state = OverrideState::Grace { idle_s: 0.0 };
        }
    }

    /// Drop the override immediately; guided control resumes next tick.
    pub fn cancel(&mut self) {
        if self.is_active() {
            tracing::debug!("User override cancelled");
        }
        self.state = OverrideState::Inactive;
    }

    /// Advance timers. `capture` supplies the pose the return starts from and
    /// is only called on the tick the grace period runs out.
    pub fn tick(&mut self, dt_s: f64, capture: impl FnOnce() -> CameraPose) -> OverrideStatus {
        let dt_s = if dt_s.is_finite() { dt_s.max(0.0) } else { 0.0 };
        match &mut self.state {
            OverrideState::Inactive => OverrideStatus::Inactive,
            OverrideState::Interacting => OverrideStatus::Suspended,
            OverrideState::Grace { idle_s } => {
                *idle_s += dt_s;
                if *idle_s < self.config.grace_s {
                    return OverrideStatus::Suspended;
                }
                let overshoot = *idle_s - self.config.grace_s;
                let mut blend = Blend::new(capture(), self.config.return_s);
                blend.step(overshoot);
                tracing::debug!("Returning camera to guided control");
                self.state = OverrideState::Returning(blend);
                OverrideStatus::Returning
            }
            OverrideState::Returning(blend) => {
                blend.step(dt_s);
                OverrideStatus::Returning
            }
        }
    }

    /// Pose for a returning tick. Finishes the override once the blend completes.
    pub fn return_pose(&mut self, guided: &CameraPose) -> Option<CameraPose> {
        let OverrideState::Returning(blend) = &self.state else {
            return None;
        };
        let pose = blend.sample(guided);
        if blend.is_complete() {
            self.state = OverrideState::Inactive;
        }
        Some(pose)
    }

    pub fn return_progress(&self) -> Option<f64> {
        match &self.state {
            OverrideState::Returning(blend) => Some(blend.progress()),
            _ => None,
        }
    }
}
