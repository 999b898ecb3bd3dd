//! Tunables for the flyover camera.

use crate::error::FlyoverError;
use crate::models::CameraMode;
use serde::{Deserialize, Serialize};

/// Top-level configuration for a camera controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyoverConfig {
    pub playback: PlaybackConfig,
    pub chase: ChaseConfig,
    pub birds_eye: BirdsEyeConfig,
    pub side_view: SideViewConfig,
    pub cinematic: CinematicConfig,
    pub guard: GuardConfig,
    pub smoothing: SmoothingConfig,
    pub overview: OverviewConfig,
    pub override_return: OverrideConfig,
    /// Distance ahead of the tracked point used for the forward bearing
    pub look_ahead_km: f64,
    /// How far a cached terrain sample may be reused
    pub terrain_cache_radius_m: f64,
}

impl Default for FlyoverConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            chase: ChaseConfig::default(),
            birds_eye: BirdsEyeConfig::default(),
            side_view: SideViewConfig::default(),
            cinematic: CinematicConfig::default(),
            guard: GuardConfig::default(),
            smoothing: SmoothingConfig::default(),
            overview: OverviewConfig::default(),
            override_return: OverrideConfig::default(),
            look_ahead_km: 0.1,
            terrain_cache_radius_m: 750.0,
        }
    }
}

impl FlyoverConfig {
    /// Seconds a transition into `mode` takes.
    pub fn transition_duration_s(&self, mode: CameraMode) -> f64 {
        match mode {
            CameraMode::Chase => self.chase.transition_s,
            CameraMode::BirdsEye => self.birds_eye.transition_s,
            CameraMode::SideView => self.side_view.transition_s,
            CameraMode::Cinematic => self.cinematic.transition_s,
        }
    }

    /// Reject values the controller cannot work with.
    pub fn validate(&self) -> Result<(), FlyoverError> {
        let positive = [
            ("playback.base_duration_per_100km_s", self.playback.base_duration_per_100km_s),
            ("playback.min_duration_s", self.playback.min_duration_s),
            ("chase.transition_s", self.chase.transition_s),
            ("birds_eye.transition_s", self.birds_eye.transition_s),
            ("side_view.transition_s", self.side_view.transition_s),
            ("cinematic.transition_s", self.cinematic.transition_s),
            ("override_return.return_s", self.override_return.return_s),
            ("overview.return_s", self.overview.return_s),
            ("smoothing.max_altitude_per_tick_m", self.smoothing.max_altitude_per_tick_m),
            ("smoothing.max_horizontal_per_tick_m", self.smoothing.max_horizontal_per_tick_m),
            ("smoothing.max_bearing_per_tick_deg", self.smoothing.max_bearing_per_tick_deg),
            (
                "smoothing.max_bearing_per_tick_birds_eye_deg",
                self.smoothing.max_bearing_per_tick_birds_eye_deg,
            ),
            ("look_ahead_km", self.look_ahead_km),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(FlyoverError::InvalidConfig(format!(
                    "{name} must be > 0, got {value}"
                )));
            }
        }
        if self.override_return.grace_s < 0.0 || !self.override_return.grace_s.is_finite() {
            return Err(FlyoverError::InvalidConfig(
                "override_return.grace_s must be >= 0".to_string(),
            ));
        }
        if self.chase.min_pitch_deg >= self.chase.max_pitch_deg || self.chase.max_pitch_deg > 0.0 {
            return Err(FlyoverError::InvalidConfig(format!(
                "chase pitch range [{}, {}] is not a downward range",
                self.chase.min_pitch_deg, self.chase.max_pitch_deg
            )));
        }
        if !(0.0..=1.0).contains(&self.overview.padding_ratio) {
            return Err(FlyoverError::InvalidConfig(format!(
                "overview.padding_ratio must be in [0, 1], got {}",
                self.overview.padding_ratio
            )));
        }
        if !(self.overview.blend_factor > 0.0 && self.overview.blend_factor <= 1.0) {
            return Err(FlyoverError::InvalidConfig(format!(
                "overview.blend_factor must be in (0, 1], got {}",
                self.overview.blend_factor
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Seconds to traverse 100 km at speed 1
    pub base_duration_per_100km_s: f64,
    /// Floor on traversal time regardless of route length
    pub min_duration_s: f64,
    pub min_speed_multiplier: f64,
    pub max_speed_multiplier: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            base_duration_per_100km_s: 600.0,
            min_duration_s: 180.0,
            min_speed_multiplier: 0.1,
            max_speed_multiplier: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseConfig {
    /// Horizontal distance behind the rider
    pub behind_m: f64,
    pub default_pitch_deg: f64,
    pub min_pitch_deg: f64,
    pub max_pitch_deg: f64,
    pub transition_s: f64,
}

impl Default for ChaseConfig {
    fn default() -> Self {
        Self {
            behind_m: 250.0,
            default_pitch_deg: -30.0,
            min_pitch_deg: -75.0,
            max_pitch_deg: -5.0,
            transition_s: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BirdsEyeConfig {
    /// Height above the rider
    pub height_m: f64,
    /// Small backward offset so the look vector is never vertical
    pub back_offset_m: f64,
    pub pitch_deg: f64,
    pub transition_s: f64,
}

impl Default for BirdsEyeConfig {
    fn default() -> Self {
        Self {
            height_m: 900.0,
            back_offset_m: 40.0,
            pitch_deg: -85.0,
            transition_s: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideViewConfig {
    pub lateral_m: f64,
    pub height_m: f64,
    pub pitch_deg: f64,
    pub transition_s: f64,
    /// The other side must be at least this much lower to switch
    pub hysteresis_m: f64,
    /// Distance ahead over which a switch must stay preferable
    pub look_ahead_m: f64,
    pub look_ahead_step_m: f64,
}

impl Default for SideViewConfig {
    fn default() -> Self {
        Self {
            lateral_m: 350.0,
            height_m: 120.0,
            pitch_deg: -20.0,
            transition_s: 2.0,
            hysteresis_m: 25.0,
            look_ahead_m: 300.0,
            look_ahead_step_m: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CinematicConfig {
    pub radius_m: f64,
    pub base_height_m: f64,
    pub height_swing_m: f64,
    pub orbit_rate_deg_per_s: f64,
    pub base_pitch_deg: f64,
    pub pitch_swing_deg: f64,
    pub transition_s: f64,
}

impl Default for CinematicConfig {
    fn default() -> Self {
        Self {
            radius_m: 450.0,
            base_height_m: 220.0,
            height_swing_m: 90.0,
            orbit_rate_deg_per_s: 8.0,
            base_pitch_deg: -28.0,
            pitch_swing_deg: 8.0,
            transition_s: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Minimum height above terrain under the camera
    pub terrain_clearance_m: f64,
    /// Extra clearance per meter the camera-site terrain sits above the rider
    pub slope_clearance_factor: f64,
    pub max_slope_clearance_m: f64,
    /// Minimum height above the rider
    pub rider_clearance_m: f64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            terrain_clearance_m: 40.0,
            slope_clearance_factor: 0.5,
            max_slope_clearance_m: 250.0,
            rider_clearance_m: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub max_altitude_per_tick_m: f64,
    pub max_horizontal_per_tick_m: f64,
    pub max_bearing_per_tick_deg: f64,
    pub max_bearing_per_tick_birds_eye_deg: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            max_altitude_per_tick_m: 12.0,
            max_horizontal_per_tick_m: 80.0,
            max_bearing_per_tick_deg: 3.0,
            max_bearing_per_tick_birds_eye_deg: 1.0,
        }
    }
}

impl SmoothingConfig {
    pub fn max_bearing_per_tick(&self, mode: CameraMode) -> f64 {
        match mode {
            CameraMode::BirdsEye => self.max_bearing_per_tick_birds_eye_deg,
            _ => self.max_bearing_per_tick_deg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewConfig {
    /// Fraction of the span added on each side of the box
    pub padding_ratio: f64,
    /// Altitude per meter of the larger box span
    pub fov_factor: f64,
    pub min_altitude_m: f64,
    pub pitch_deg: f64,
    /// Fraction of the remaining distance covered per tick while dragging
    pub blend_factor: f64,
    /// Duration of the return to guided control after a scrub
    pub return_s: f64,
    /// Samples taken along the route for full-route bounds
    pub route_samples: usize,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            padding_ratio: 0.2,
            fov_factor: 1.25,
            min_altitude_m: 1500.0,
            pitch_deg: -65.0,
            blend_factor: 0.18,
            return_s: 1.5,
            route_samples: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideConfig {
    /// Quiet time after the last interaction before returning
    pub grace_s: f64,
    pub return_s: f64,
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            grace_s: 2.0,
            return_s: 1.5,
        }
    }
}
