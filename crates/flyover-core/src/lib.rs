pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod modes;
pub mod overview;
pub mod path;
pub mod playback;
pub mod renderer;
pub mod smoothing;
pub mod spatial;
pub mod terrain;
pub mod transition;
pub mod user_override;

pub use config::FlyoverConfig;
pub use controller::{CameraController, Command};
pub use error::{FlyoverError, RenderError};
pub use models::{
    CameraMode, CameraPose, LngLat, OverviewScope, PathPoint, PoseSource, TickReport, ViewSide,
};
pub use modes::{ModeInput, ModeOutput, ModeStrategies};
pub use overview::{OverviewFrame, OverviewFramer};
pub use path::{initial_heading, route_bounds, GeoBounds, PathSampler, PolylinePath};
pub use playback::PlaybackClock;
pub use renderer::{CoarseView, RecordingRenderer, Renderer};
pub use smoothing::SmoothingStage;
pub use terrain::{NoTerrain, TerrainCache, TerrainGrid, TerrainGuard, TerrainOracle};
pub use transition::{BlendPath, ModeTransitionManager, TransitionState};
pub use user_override::{OverrideState, UserOverrideManager};
pub use spatial::haversine_distance;
