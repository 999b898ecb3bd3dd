//! Core data models for the flyover camera.

use crate::error::FlyoverError;
use crate::spatial::{lerp, lerp_bearing, normalize_bearing};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A sampled point on the route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub lng: f64,
    pub lat: f64,
    /// Altitude in meters
    pub alt: f64,
}

impl PathPoint {
    pub fn new(lng: f64, lat: f64, alt: f64) -> Self {
        Self { lng, lat, alt }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite() && self.alt.is_finite()
    }

    pub fn horizontal(&self) -> LngLat {
        LngLat {
            lng: self.lng,
            lat: self.lat,
        }
    }
}

/// A horizontal position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

/// Full camera placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub lng: f64,
    pub lat: f64,
    /// Altitude in meters
    pub alt: f64,
    /// Compass degrees in [0, 360)
    pub bearing: f64,
    /// Degrees, negative looks down
    pub pitch: f64,
}

impl CameraPose {
    pub fn new(lng: f64, lat: f64, alt: f64, bearing: f64, pitch: f64) -> Self {
        Self {
            lng,
            lat,
            alt,
            bearing: normalize_bearing(bearing),
            pitch,
        }
    }

    pub fn horizontal(&self) -> LngLat {
        LngLat {
            lng: self.lng,
            lat: self.lat,
        }
    }

    /// Interpolate toward `other`. Bearing follows the shortest arc.
    pub fn interpolate(&self, other: &CameraPose, t: f64) -> CameraPose {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        CameraPose {
            lng: lerp(self.lng, other.lng, t),
            lat: lerp(self.lat, other.lat, t),
            alt: lerp(self.alt, other.alt, t),
            bearing: lerp_bearing(self.bearing, other.bearing, t),
            pitch: lerp(self.pitch, other.pitch, t),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite()
            && self.lat.is_finite()
            && self.alt.is_finite()
            && self.bearing.is_finite()
            && self.pitch.is_finite()
    }
}

/// Cinematic behavior of the guided camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    /// Behind the rider, looking along the route
    #[default]
    Chase,
    /// Nearly overhead
    BirdsEye,
    /// Beside the route on the valley side
    SideView,
    /// Slow orbit with varying height
    Cinematic,
}

impl CameraMode {
    pub const ALL: [CameraMode; 4] = [
        CameraMode::Chase,
        CameraMode::BirdsEye,
        CameraMode::SideView,
        CameraMode::Cinematic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraMode::Chase => "chase",
            CameraMode::BirdsEye => "birds_eye",
            CameraMode::SideView => "side_view",
            CameraMode::Cinematic => "cinematic",
        }
    }
}

impl fmt::Display for CameraMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CameraMode {
    type Err = FlyoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "chase" | "follow" => Ok(CameraMode::Chase),
            "birds_eye" | "birdseye" | "overhead" => Ok(CameraMode::BirdsEye),
            "side_view" | "sideview" | "side" => Ok(CameraMode::SideView),
            "cinematic" | "orbit" => Ok(CameraMode::Cinematic),
            _ => Err(FlyoverError::UnknownMode(s.to_string())),
        }
    }
}

/// Which side of the direction of travel the side camera sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewSide {
    Left,
    Right,
}

impl ViewSide {
    pub fn opposite(self) -> ViewSide {
        match self {
            ViewSide::Left => ViewSide::Right,
            ViewSide::Right => ViewSide::Left,
        }
    }

    /// Bearing offset from the direction of travel, in degrees.
    pub fn bearing_offset(self) -> f64 {
        match self {
            ViewSide::Left => -90.0,
            ViewSide::Right => 90.0,
        }
    }
}

impl FromStr for ViewSide {
    type Err = FlyoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(ViewSide::Left),
            "right" => Ok(ViewSide::Right),
            _ => Err(FlyoverError::UnknownSide(s.to_string())),
        }
    }
}

/// What the overview framer keeps in shot while scrubbing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverviewScope {
    /// Scrub start and current scrub position
    #[default]
    Local,
    /// Whole route
    FullRoute,
}

/// Which stage decided the pose emitted on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseSource {
    Overview,
    Suspended,
    OverrideReturn,
    Transition,
    Guided,
    Held,
}

/// Per-tick telemetry for UI consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickReport {
    pub progress: f64,
    pub distance_km: f64,
    pub mode: CameraMode,
    pub source: PoseSource,
    /// Guard lifted the camera this tick
    pub terrain_adjusted: bool,
    /// Pose written to the renderer, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pose: Option<CameraPose>,
}
