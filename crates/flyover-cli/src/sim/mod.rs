//! Synthetic inputs and harness pieces for headless runs.

pub mod routes;
pub mod scenarios;
pub mod stats;
pub mod surface;
pub mod terrain;

pub use routes::{create_climb_route, create_loop_route, create_switchbacks_route, SimRoute};
pub use scenarios::{demo_script, Script, ScriptedCommand};
pub use stats::RunStats;
pub use surface::HeadlessSurface;
pub use terrain::{FlakyTerrain, Landscape};
