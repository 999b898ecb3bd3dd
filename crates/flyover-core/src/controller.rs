//! Top-level camera orchestration.
//!
//! Commands arrive between ticks and take effect immediately on the
//! controller's state; [`CameraController::tick`] then resolves which stage
//! owns the camera (scrub overview, user override, override return, mode
//! transition or plain guided output) and writes at most one pose.

use crate::config::FlyoverConfig;
use crate::models::{
    CameraMode, CameraPose, LngLat, OverviewScope, PathPoint, PoseSource, TickReport, ViewSide,
};
use crate::modes::{ModeInput, ModeStrategies};
use crate::overview::{OverviewFrame, OverviewFramer, ScrubFrame};
use crate::path::{heading_at, PathSampler};
use crate::playback::PlaybackClock;
use crate::renderer::{coarse_view, Renderer};
use crate::smoothing::{SmoothingStage, SmoothingState};
use crate::terrain::{TerrainCache, TerrainGuard, TerrainOracle};
use crate::transition::{ModeTransitionManager, TransitionState};
use crate::user_override::{OverrideState, OverrideStatus, UserOverrideManager};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.3;
pub const MAX_ZOOM: f64 = 3.0;

/// Every command the controller accepts, as a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Play,
    Pause,
    TogglePlayback,
    Seek { progress: f64 },
    SetMode { mode: String },
    SetZoom { factor: f64 },
    SetSpeedMultiplier { value: f64 },
    SetChasePitch { degrees: f64 },
    SetSidePin { side: Option<ViewSide> },
    SetOverviewScope { scope: OverviewScope },
    BeginScrub,
    UpdateScrub { progress: f64 },
    EndScrub,
    UserInteractionStart,
    UserInteractionEnd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScrubPhase {
    Idle,
    Dragging(ScrubFrame),
    /// Drag ended while paused; the overview stays until playback resumes
    Holding(ScrubFrame),
}

/// Guided pose for the tick plus what the guard did to it.
struct GuidedPose {
    pose: CameraPose,
    terrain_adjusted: bool,
}

pub struct CameraController {
    config: FlyoverConfig,
    path: Box<dyn PathSampler>,
    terrain: Box<dyn TerrainOracle>,
    clock: PlaybackClock,
    strategies: ModeStrategies,
    transitions: ModeTransitionManager,
    overrides: UserOverrideManager,
    framer: OverviewFramer,
    scrub: ScrubPhase,
    smoothing: SmoothingStage,
    guard: TerrainGuard,
    terrain_cache: TerrainCache,
    zoom: f64,
    overview_scope: OverviewScope,
    route_frame: Option<OverviewFrame>,
    last_pose: Option<CameraPose>,
    last_forward_bearing: f64,
    last_seek: Option<f64>,
}

impl CameraController {
    pub fn new(
        config: FlyoverConfig,
        path: Box<dyn PathSampler>,
        terrain: Box<dyn TerrainOracle>,
    ) -> Self {
        let clock = PlaybackClock::new(config.playback.clone(), path.length_km());
        let last_forward_bearing = crate::path::initial_heading(path.as_ref()).unwrap_or(0.0);
        Self {
            clock,
            strategies: ModeStrategies::new(&config),
            transitions: ModeTransitionManager::new(CameraMode::default()),
            overrides: UserOverrideManager::new(config.override_return.clone()),
            framer: OverviewFramer::new(config.overview.clone()),
            scrub: ScrubPhase::Idle,
            smoothing: SmoothingStage::new(config.smoothing.clone()),
            guard: TerrainGuard::new(config.guard.clone()),
            terrain_cache: TerrainCache::new(config.terrain_cache_radius_m),
            zoom: 1.0,
            overview_scope: OverviewScope::default(),
            route_frame: None,
            last_pose: None,
            last_forward_bearing,
            last_seek: None,
            path,
            terrain,
            config,
        }
    }

    pub fn with_mode(mut self, mode: CameraMode) -> Self {
        self.transitions.settle(mode);
        self.strategies.enter(mode);
        self
    }

    // ==== Accessors ====

    pub fn config(&self) -> &FlyoverConfig {
        &self.config
    }

    pub fn path(&self) -> &dyn PathSampler {
        self.path.as_ref()
    }

    pub fn progress(&self) -> f64 {
        self.clock.progress()
    }

    pub fn distance_km(&self) -> f64 {
        self.clock.distance_km()
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    /// Mode the camera is in or heading into.
    pub fn mode(&self) -> CameraMode {
        self.transitions.target_mode()
    }

    pub fn transition_state(&self) -> &TransitionState {
        self.transitions.state()
    }

    pub fn override_state(&self) -> &OverrideState {
        self.overrides.state()
    }

    pub fn smoothing_state(&self) -> SmoothingState {
        self.smoothing.state()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn chase_pitch(&self) -> f64 {
        self.strategies.chase_pitch()
    }

    pub fn side(&self) -> Option<ViewSide> {
        self.strategies.side().current()
    }

    pub fn is_scrubbing(&self) -> bool {
        matches!(self.scrub, ScrubPhase::Dragging(_))
    }

    pub fn is_overview_held(&self) -> bool {
        matches!(self.scrub, ScrubPhase::Holding(_))
    }

    /// How far the camera has blended toward the scrub overview, if scrubbing.
    pub fn scrub_progress(&self) -> Option<f64> {
        match &self.scrub {
            ScrubPhase::Dragging(frame) | ScrubPhase::Holding(frame) => {
                Some(frame.transition_progress())
            }
            ScrubPhase::Idle => None,
        }
    }

    pub fn last_pose(&self) -> Option<CameraPose> {
        self.last_pose
    }

    // ==== Commands ====

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::TogglePlayback => self.toggle_playback(),
            Command::Seek { progress } => self.seek(progress),
            Command::SetMode { mode } => self.set_mode_by_name(&mode),
            Command::SetZoom { factor } => self.set_zoom(factor),
            Command::SetSpeedMultiplier { value } => self.set_speed_multiplier(value),
            Command::SetChasePitch { degrees } => self.set_chase_pitch(degrees),
            Command::SetSidePin { side } => self.set_side_pin(side),
            Command::SetOverviewScope { scope } => self.set_overview_scope(scope),
            Command::BeginScrub => self.begin_scrub(),
            Command::UpdateScrub { progress } => self.update_scrub(progress),
            Command::EndScrub => self.end_scrub(),
            Command::UserInteractionStart => self.notify_user_interaction_start(),
            Command::UserInteractionEnd => self.notify_user_interaction_end(),
        }
    }

    pub fn play(&mut self) {
        if self.clock.progress() >= 1.0 {
            self.clock.seek(0.0);
            self.discontinuity();
        }
        if let ScrubPhase::Holding(frame) = self.scrub {
            self.return_from_overview(frame);
        }
        tracing::debug!("Playback started at {:.4}", self.clock.progress());
        self.clock.play();
    }

    pub fn pause(&mut self) {
        tracing::debug!("Playback paused at {:.4}", self.clock.progress());
        self.clock.pause();
    }

    pub fn toggle_playback(&mut self) {
        if self.clock.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Jump to `progress`. Repeating the last seek is a no-op.
    pub fn seek(&mut self, progress: f64) {
        if !progress.is_finite() {
            tracing::warn!("Ignoring seek to non-finite progress {}", progress);
            return;
        }
        let target = progress.clamp(0.0, 1.0);
        if target != progress {
            tracing::warn!("Seek to {} clamped to {}", progress, target);
        }
        if self.last_seek == Some(target) && self.clock.progress() == target {
            return;
        }
        tracing::debug!("Seek to {:.4}", target);
        self.clock.seek(target);
        self.last_seek = Some(target);
        self.overrides.cancel();
        self.discontinuity();
    }

    pub fn set_mode(&mut self, mode: CameraMode) {
        if mode == self.transitions.target_mode() {
            return;
        }
        tracing::info!("Camera mode {} -> {}", self.transitions.target_mode(), mode);
        self.overrides.cancel();
        self.strategies.enter(mode);
        match self.last_pose {
            Some(start) => {
                let duration = self.config.transition_duration_s(mode);
                self.transitions.request(mode, start, duration);
            }
            None => self.transitions.settle(mode),
        }
        self.smoothing.reset();
    }

    /// Unknown names are logged and ignored.
    pub fn set_mode_by_name(&mut self, name: &str) {
        match name.parse::<CameraMode>() {
            Ok(mode) => self.set_mode(mode),
            Err(err) => tracing::warn!("Ignoring mode change: {}", err),
        }
    }

    pub fn set_zoom(&mut self, factor: f64) {
        if !factor.is_finite() {
            tracing::warn!("Ignoring non-finite zoom {}", factor);
            return;
        }
        self.zoom = factor.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn set_speed_multiplier(&mut self, value: f64) {
        if self.clock.set_speed_multiplier(value).is_none() {
            tracing::warn!("Ignoring non-finite speed multiplier {}", value);
        }
    }

    pub fn set_chase_pitch(&mut self, degrees: f64) {
        if !degrees.is_finite() {
            tracing::warn!("Ignoring non-finite chase pitch {}", degrees);
            return;
        }
        self.strategies.set_chase_pitch(degrees);
    }

    pub fn set_side_pin(&mut self, side: Option<ViewSide>) {
        self.strategies.pin_side(side);
    }

    pub fn set_overview_scope(&mut self, scope: OverviewScope) {
        self.overview_scope = scope;
    }

    pub fn begin_scrub(&mut self) {
        if self.is_scrubbing() {
            return;
        }
        let Some(start) = self.path.sample_at(self.clock.distance_km()) else {
            tracing::warn!("Cannot begin scrub: no route point at current progress");
            return;
        };
        let held = match self.scrub {
            ScrubPhase::Holding(frame) => Some(frame.pose()),
            _ => None,
        };
        let from = match held.or(self.last_pose) {
            Some(pose) => pose,
            None => self
                .framer
                .frame_points(&start, &start, self.last_forward_bearing)
                .map(|frame| frame.pose)
                .unwrap_or_else(|| {
                    CameraPose::new(start.lng, start.lat, start.alt, self.last_forward_bearing, -90.0)
                }),
        };
        tracing::debug!("Scrub started at {:.4}", self.clock.progress());
        self.scrub = ScrubPhase::Dragging(ScrubFrame::begin(start, from));
        self.overrides.cancel();
        self.transitions.settle(self.transitions.target_mode());
        self.discontinuity();
    }

    pub fn update_scrub(&mut self, progress: f64) {
        if !self.is_scrubbing() {
            tracing::warn!("Ignoring scrub update outside a scrub");
            return;
        }
        if !progress.is_finite() {
            tracing::warn!("Ignoring scrub to non-finite progress {}", progress);
            return;
        }
        self.clock.seek(progress.clamp(0.0, 1.0));
        self.last_seek = None;
    }

    pub fn end_scrub(&mut self) {
        let ScrubPhase::Dragging(frame) = self.scrub else {
            return;
        };
        tracing::debug!("Scrub ended at {:.4}", self.clock.progress());
        self.discontinuity();
        if self.clock.is_playing() {
            self.return_from_overview(frame);
        } else {
            self.scrub = ScrubPhase::Holding(frame);
        }
    }

    pub fn notify_user_interaction_start(&mut self) {
        if self.transitions.is_transitioning() {
            self.transitions.settle(self.transitions.target_mode());
        }
        self.overrides.interaction_start();
    }

    pub fn notify_user_interaction_end(&mut self) {
        self.overrides.interaction_end();
    }

    fn return_from_overview(&mut self, frame: ScrubFrame) {
        let mode = self.transitions.target_mode();
        self.transitions
            .request(mode, frame.pose(), self.config.overview.return_s);
        self.scrub = ScrubPhase::Idle;
        self.smoothing.reset();
    }

    /// Deliberate jump: the next tick is exempt from rate limiting.
    fn discontinuity(&mut self) {
        self.smoothing.reset();
    }

    // ==== Tick ====

    /// Advance one frame and write the resulting pose, if any.
    pub fn tick(&mut self, dt_s: f64, renderer: &mut dyn Renderer) -> TickReport {
        let dt_s = if dt_s.is_finite() { dt_s.max(0.0) } else { 0.0 };

        if !self.is_scrubbing() {
            let before = self.clock.progress();
            if self.clock.advance(dt_s) != before {
                self.last_seek = None;
            }
        }

        let distance_km = self.clock.distance_km();
        let Some(tracked) = self.path.sample_at(distance_km) else {
            tracing::debug!("No route point at {:.3}km, holding camera", distance_km);
            return self.report(PoseSource::Held, false, None);
        };

        let guided = self.guided_pose(&tracked, distance_km, dt_s);
        let last_pose = self.last_pose;
        let override_status = self.overrides.tick(dt_s, || {
            renderer
                .current_pose()
                .or(last_pose)
                .unwrap_or(guided.pose)
        });

        let source = self.resolve_source(override_status);
        let mut look_at = tracked.horizontal();
        let candidate = match source {
            PoseSource::Overview => {
                let (pose, frame_look_at) = self.overview_pose(&tracked);
                look_at = frame_look_at;
                Some(pose)
            }
            PoseSource::Suspended | PoseSource::Held => None,
            PoseSource::OverrideReturn => self.overrides.return_pose(&guided.pose),
            PoseSource::Transition => {
                self.transitions
                    .advance(dt_s, &guided.pose, tracked.horizontal())
            }
            PoseSource::Guided => Some(guided.pose),
        };

        let mut terrain_adjusted = guided.terrain_adjusted && source == PoseSource::Guided;
        let emitted = candidate.map(|pose| {
            if source == PoseSource::Guided {
                return pose;
            }
            let outcome =
                self.guard
                    .apply(pose, tracked.alt, &mut self.terrain_cache, self.terrain.as_ref());
            terrain_adjusted |= outcome.adjusted;
            outcome.pose
        });

        if let Some(pose) = emitted {
            self.emit(renderer, &pose, look_at, tracked.alt);
        }
        tracing::trace!(
            "tick dt={:.4} progress={:.5} source={:?} pose={:?}",
            dt_s,
            self.clock.progress(),
            source,
            emitted
        );
        self.report(source, terrain_adjusted, emitted)
    }

    /// Priority: scrub, override, override return, mode transition, guided.
    fn resolve_source(&self, override_status: OverrideStatus) -> PoseSource {
        match (&self.scrub, override_status, self.transitions.is_transitioning()) {
            (ScrubPhase::Dragging(_) | ScrubPhase::Holding(_), _, _) => PoseSource::Overview,
            (ScrubPhase::Idle, OverrideStatus::Suspended, _) => PoseSource::Suspended,
            (ScrubPhase::Idle, OverrideStatus::Returning, _) => PoseSource::OverrideReturn,
            (ScrubPhase::Idle, OverrideStatus::Inactive, true) => PoseSource::Transition,
            (ScrubPhase::Idle, OverrideStatus::Inactive, false) => PoseSource::Guided,
        }
    }

    /// Mode target run through guard, smoothing, and the guard again at the
    /// smoothed position.
    fn guided_pose(&mut self, tracked: &PathPoint, distance_km: f64, dt_s: f64) -> GuidedPose {
        let look_ahead_km = self.config.look_ahead_km;
        if let Some(heading) = heading_at(self.path.as_ref(), distance_km, look_ahead_km) {
            self.last_forward_bearing = heading;
        }

        let mode = self.transitions.target_mode();
        let input = ModeInput {
            tracked: *tracked,
            forward_bearing: self.last_forward_bearing,
            zoom: self.zoom,
            dt_s,
            distance_km,
            look_ahead_km,
            path: self.path.as_ref(),
            terrain: self.terrain.as_ref(),
        };
        let output = self.strategies.target_pose(mode, &input);

        if output.side_switched {
            self.smoothing.reset();
            let on_screen = matches!(self.scrub, ScrubPhase::Idle) && !self.overrides.is_active();
            if let (Some(start), true) = (self.last_pose, on_screen) {
                // Any blend in flight restarts from the pose last shown
                self.transitions
                    .request_around(mode, start, self.config.side_view.transition_s);
            }
        }

        let terrain = self.terrain.as_ref();
        let first = self
            .guard
            .apply(output.pose, tracked.alt, &mut self.terrain_cache, terrain);
        let smoothed = self.smoothing.apply(first.pose, mode);
        let second = self
            .guard
            .apply(smoothed, tracked.alt, &mut self.terrain_cache, terrain);
        GuidedPose {
            pose: second.pose,
            terrain_adjusted: first.adjusted || second.adjusted,
        }
    }

    fn overview_pose(&mut self, tracked: &PathPoint) -> (CameraPose, LngLat) {
        let frame = match self.overview_scope {
            OverviewScope::FullRoute => {
                if self.route_frame.is_none() {
                    self.route_frame = self.framer.frame_route(self.path.as_ref());
                }
                self.route_frame
            }
            OverviewScope::Local => {
                let start = match &self.scrub {
                    ScrubPhase::Dragging(frame) | ScrubPhase::Holding(frame) => frame.start_point(),
                    ScrubPhase::Idle => *tracked,
                };
                self.framer
                    .frame_points(&start, tracked, self.last_forward_bearing)
            }
        };

        let blend_factor = self.config.overview.blend_factor;
        match (&mut self.scrub, frame) {
            (ScrubPhase::Dragging(scrub) | ScrubPhase::Holding(scrub), Some(frame)) => {
                (scrub.update(&frame, blend_factor), scrub.look_at())
            }
            (ScrubPhase::Dragging(scrub) | ScrubPhase::Holding(scrub), None) => {
                (scrub.pose(), scrub.look_at())
            }
            (ScrubPhase::Idle, Some(frame)) => (frame.pose, frame.look_at),
            (ScrubPhase::Idle, None) => (
                self.last_pose.unwrap_or_else(|| {
                    CameraPose::new(tracked.lng, tracked.lat, tracked.alt, 0.0, -90.0)
                }),
                tracked.horizontal(),
            ),
        }
    }

    fn emit(&mut self, renderer: &mut dyn Renderer, pose: &CameraPose, look_at: LngLat, target_alt: f64) {
        if let Err(err) = renderer.set_pose(pose, look_at) {
            tracing::warn!("{}; falling back to coarse camera", err);
            let view = coarse_view(pose, look_at, target_alt);
            if let Err(err) = renderer.jump_to(&view) {
                tracing::warn!("Coarse camera update failed too: {}", err);
            }
        }
        self.last_pose = Some(*pose);
    }

    fn report(&self, source: PoseSource, terrain_adjusted: bool, pose: Option<CameraPose>) -> TickReport {
        TickReport {
            progress: self.clock.progress(),
            distance_km: self.clock.distance_km(),
            mode: self.transitions.target_mode(),
            source,
            terrain_adjusted,
            pose,
        }
    }
}
