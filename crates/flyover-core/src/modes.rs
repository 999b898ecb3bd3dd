//! Desired camera pose per mode, before guarding and smoothing.
//!
//! The per-mode pose functions are pure. The two bits of memory some modes
//! need, the side the side camera sits on and the cinematic orbit phase, live
//! in [`ModeStrategies`] so each controller owns its own copy.

use crate::config::{BirdsEyeConfig, ChaseConfig, CinematicConfig, FlyoverConfig, SideViewConfig};
use crate::models::{CameraMode, CameraPose, PathPoint, ViewSide};
use crate::path::{heading_at, PathSampler};
use crate::spatial::{bearing_deg, normalize_bearing, offset_by_bearing_deg};
use crate::terrain::TerrainOracle;

/// Everything a strategy may look at for one tick.
pub struct ModeInput<'a> {
    pub tracked: PathPoint,
    /// Direction of travel, from the tracked point toward the look-ahead point
    pub forward_bearing: f64,
    /// Multiplier for every configured distance and height
    pub zoom: f64,
    pub dt_s: f64,
    pub distance_km: f64,
    pub look_ahead_km: f64,
    pub path: &'a dyn PathSampler,
    pub terrain: &'a dyn TerrainOracle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeOutput {
    pub pose: CameraPose,
    /// Side camera flipped to the other side this tick
    pub side_switched: bool,
}

/// Place a camera `distance_m` from the tracked point along `bearing_from_tracked`,
/// `height_m` above it, looking back at it.
fn place_looking_at(
    tracked: &PathPoint,
    distance_m: f64,
    bearing_from_tracked: f64,
    height_m: f64,
    pitch_deg: f64,
) -> CameraPose {
    let (lat, lng) = offset_by_bearing_deg(tracked.lat, tracked.lng, distance_m, bearing_from_tracked);
    let look_bearing = if distance_m.abs() > f64::EPSILON {
        bearing_deg(lat, lng, tracked.lat, tracked.lng)
    } else {
        normalize_bearing(bearing_from_tracked + 180.0)
    };
    CameraPose::new(lng, lat, tracked.alt + height_m, look_bearing, pitch_deg)
}

/// Behind the rider, height chosen so the configured pitch frames the rider.
pub fn chase_pose(
    config: &ChaseConfig,
    pitch_deg: f64,
    tracked: &PathPoint,
    forward_bearing: f64,
    zoom: f64,
) -> CameraPose {
    let pitch_deg = pitch_deg.clamp(config.min_pitch_deg, config.max_pitch_deg);
    let behind_m = config.behind_m * zoom;
    let height_m = behind_m * pitch_deg.abs().to_radians().tan();
    place_looking_at(tracked, behind_m, forward_bearing + 180.0, height_m, pitch_deg)
}

pub fn birds_eye_pose(
    config: &BirdsEyeConfig,
    tracked: &PathPoint,
    forward_bearing: f64,
    zoom: f64,
) -> CameraPose {
    place_looking_at(
        tracked,
        config.back_offset_m * zoom,
        forward_bearing + 180.0,
        config.height_m * zoom,
        config.pitch_deg,
    )
}

pub fn side_view_pose(
    config: &SideViewConfig,
    side: ViewSide,
    tracked: &PathPoint,
    forward_bearing: f64,
    zoom: f64,
) -> CameraPose {
    place_looking_at(
        tracked,
        config.lateral_m * zoom,
        forward_bearing + side.bearing_offset(),
        config.height_m * zoom,
        config.pitch_deg,
    )
}

/// Orbit position for a given phase. `anchor_bearing` is the travel direction
/// when the orbit started; phase 0 sits directly behind it.
pub fn cinematic_pose(
    config: &CinematicConfig,
    phase_deg: f64,
    anchor_bearing: f64,
    tracked: &PathPoint,
    zoom: f64,
) -> CameraPose {
    let wave = (2.0 * phase_deg.to_radians()).sin();
    let height_m = (config.base_height_m + config.height_swing_m * wave) * zoom;
    // Steeper when higher
    let pitch_deg = config.base_pitch_deg - config.pitch_swing_deg * wave;
    place_looking_at(
        tracked,
        config.radius_m * zoom,
        anchor_bearing + 180.0 + phase_deg,
        height_m,
        pitch_deg,
    )
}

/// Valley-side selection with hysteresis.
#[derive(Debug, Clone, Default)]
pub struct SideSelector {
    current: Option<ViewSide>,
    pinned: Option<ViewSide>,
}

impl SideSelector {
    pub fn current(&self) -> Option<ViewSide> {
        self.pinned.or(self.current)
    }

    pub fn pin(&mut self, side: Option<ViewSide>) {
        self.pinned = side;
    }

    pub fn pinned(&self) -> Option<ViewSide> {
        self.pinned
    }

    /// Forget the chosen side; the next call picks afresh.
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Returns the side to use and whether it changed from the previous tick.
    pub fn select(&mut self, config: &SideViewConfig, input: &ModeInput<'_>) -> (ViewSide, bool) {
        // Side actually shown last tick, pinned or not
        let previous = self.current;
        if let Some(pinned) = self.pinned {
            self.current = Some(pinned);
            return (pinned, previous.is_some_and(|p| p != pinned));
        }

        let lateral_m = config.lateral_m * input.zoom;
        let here = side_elevations(input.terrain, &input.tracked, input.forward_bearing, lateral_m);

        let Some(current) = self.current else {
            let side = match here {
                (Some(left), Some(right)) if left < right => ViewSide::Left,
                _ => ViewSide::Right,
            };
            self.current = Some(side);
            return (side, false);
        };

        let alternate = current.opposite();
        let (Some(cur_e), Some(alt_e)) = pick(here, current) else {
            return (current, false);
        };
        if alt_e + config.hysteresis_m >= cur_e {
            return (current, false);
        }
        if !self.stays_preferable(config, input, current, lateral_m) {
            return (current, false);
        }

        tracing::debug!(
            "Side view switching {:?} -> {:?} ({:.0}m vs {:.0}m)",
            current,
            alternate,
            alt_e,
            cur_e
        );
        self.current = Some(alternate);
        (alternate, true)
    }

    /// The alternate side must stay lower over the upcoming stretch.
    fn stays_preferable(
        &self,
        config: &SideViewConfig,
        input: &ModeInput<'_>,
        current: ViewSide,
        lateral_m: f64,
    ) -> bool {
        let step_m = config.look_ahead_step_m.max(1.0);
        let mut ahead_m = step_m;
        while ahead_m <= config.look_ahead_m + 1e-6 {
            let distance_km = input.distance_km + ahead_m / 1000.0;
            ahead_m += step_m;

            let Some(point) = input.path.sample_at(distance_km) else {
                break;
            };
            let heading = heading_at(input.path, distance_km, input.look_ahead_km)
                .unwrap_or(input.forward_bearing);
            let elevations = side_elevations(input.terrain, &point, heading, lateral_m);
            if let (Some(cur_e), Some(alt_e)) = pick(elevations, current) {
                if alt_e >= cur_e {
                    return false;
                }
            }
        }
        true
    }
}

/// Terrain at the (left, right) candidate camera sites.
fn side_elevations(
    terrain: &dyn TerrainOracle,
    tracked: &PathPoint,
    forward_bearing: f64,
    lateral_m: f64,
) -> (Option<f64>, Option<f64>) {
    let sample = |side: ViewSide| {
        let (lat, lng) = offset_by_bearing_deg(
            tracked.lat,
            tracked.lng,
            lateral_m,
            forward_bearing + side.bearing_offset(),
        );
        terrain.elevation_at(lng, lat).filter(|e| e.is_finite())
    };
    (sample(ViewSide::Left), sample(ViewSide::Right))
}

/// Reorder (left, right) into (current, alternate).
fn pick(elevations: (Option<f64>, Option<f64>), current: ViewSide) -> (Option<f64>, Option<f64>) {
    match current {
        ViewSide::Left => (elevations.0, elevations.1),
        ViewSide::Right => (elevations.1, elevations.0),
    }
}

/// Cinematic orbit memory.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrbitState {
    /// Accumulated orbit angle in degrees; only grows
    pub phase_deg: f64,
    pub anchor_bearing: Option<f64>,
}

/// Per-controller strategy state plus the mode configs.
#[derive(Debug, Clone)]
pub struct ModeStrategies {
    chase: ChaseConfig,
    birds_eye: BirdsEyeConfig,
    side_view: SideViewConfig,
    cinematic: CinematicConfig,
    chase_pitch_deg: f64,
    side: SideSelector,
    orbit: OrbitState,
}

impl ModeStrategies {
    pub fn new(config: &FlyoverConfig) -> Self {
        Self {
            chase: config.chase.clone(),
            birds_eye: config.birds_eye.clone(),
            side_view: config.side_view.clone(),
            cinematic: config.cinematic.clone(),
            chase_pitch_deg: config.chase.default_pitch_deg,
            side: SideSelector::default(),
            orbit: OrbitState::default(),
        }
    }

    pub fn chase_pitch(&self) -> f64 {
        self.chase_pitch_deg
    }

    /// Set the chase pitch, clamped to the configured range. Returns the value applied.
    pub fn set_chase_pitch(&mut self, pitch_deg: f64) -> f64 {
        self.chase_pitch_deg = pitch_deg.clamp(self.chase.min_pitch_deg, self.chase.max_pitch_deg);
        self.chase_pitch_deg
    }

    pub fn side(&self) -> &SideSelector {
        &self.side
    }

    pub fn pin_side(&mut self, side: Option<ViewSide>) {
        self.side.pin(side);
    }

    pub fn orbit(&self) -> OrbitState {
        self.orbit
    }

    /// Called when `mode` is explicitly (re-)entered.
    pub fn enter(&mut self, mode: CameraMode) {
        match mode {
            CameraMode::Cinematic => self.orbit = OrbitState::default(),
            CameraMode::SideView => self.side.clear(),
            CameraMode::Chase | CameraMode::BirdsEye => {}
        }
    }

    pub fn target_pose(&mut self, mode: CameraMode, input: &ModeInput<'_>) -> ModeOutput {
        let tracked = &input.tracked;
        match mode {
            CameraMode::Chase => ModeOutput {
                pose: chase_pose(
                    &self.chase,
                    self.chase_pitch_deg,
                    tracked,
                    input.forward_bearing,
                    input.zoom,
                ),
                side_switched: false,
            },
            CameraMode::BirdsEye => ModeOutput {
                pose: birds_eye_pose(&self.birds_eye, tracked, input.forward_bearing, input.zoom),
                side_switched: false,
            },
            CameraMode::SideView => {
                let (side, side_switched) = self.side.select(&self.side_view, input);
                ModeOutput {
                    pose: side_view_pose(
                        &self.side_view,
                        side,
                        tracked,
                        input.forward_bearing,
                        input.zoom,
                    ),
                    side_switched,
                }
            }
            CameraMode::Cinematic => {
                let anchor = *self
                    .orbit
                    .anchor_bearing
                    .get_or_insert(input.forward_bearing);
                if input.dt_s.is_finite() && input.dt_s > 0.0 {
                    self.orbit.phase_deg += self.cinematic.orbit_rate_deg_per_s * input.dt_s;
                }
                ModeOutput {
                    pose: cinematic_pose(
                        &self.cinematic,
                        self.orbit.phase_deg,
                        anchor,
                        tracked,
                        input.zoom,
                    ),
                    side_switched: false,
                }
            }
        }
    }
}
