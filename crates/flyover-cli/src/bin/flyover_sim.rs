//! Headless flyover simulation.
//!
//! Drives a camera controller over a synthetic route at a fixed frame rate,
//! applying an optional command script, and prints one JSON tick report per
//! line on stdout. Logs and the final summary go to stderr.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use flyover_cli::config::resolve_config;
use flyover_cli::sim::{
    create_climb_route, create_loop_route, create_switchbacks_route, demo_script, FlakyTerrain,
    HeadlessSurface, Landscape, RunStats, Script,
};
use flyover_core::{route_bounds, CameraController, CameraMode, PathSampler, TerrainOracle};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Grid spacing for the synthetic terrain raster.
const TERRAIN_SPACING_M: f64 = 30.0;
/// Margin around the route the terrain raster covers, as a share of its span.
const TERRAIN_MARGIN: f64 = 0.5;

/// Available synthetic routes
#[derive(Debug, Clone, ValueEnum)]
enum RouteType {
    /// 12 km climb to the north
    Climb,
    /// 3 km radius loop
    Loop,
    /// Hairpin ascent
    Switchbacks,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Chase,
    BirdsEye,
    SideView,
    Cinematic,
}

impl From<ModeArg> for CameraMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Chase => CameraMode::Chase,
            ModeArg::BirdsEye => CameraMode::BirdsEye,
            ModeArg::SideView => CameraMode::SideView,
            ModeArg::Cinematic => CameraMode::Cinematic,
        }
    }
}

/// Route flyover camera simulator
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Route to fly
    #[arg(long, value_enum, default_value = "climb")]
    route: RouteType,

    /// Landscape center latitude
    #[arg(long, default_value_t = 46.55)]
    lat: f64,

    /// Landscape center longitude
    #[arg(long, default_value_t = 8.05)]
    lon: f64,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 120.0)]
    duration_s: f64,

    /// Frames per second
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Playback speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Starting camera mode
    #[arg(long, value_enum, default_value = "chase")]
    mode: ModeArg,

    /// JSON command script; `demo` runs the built-in tour
    #[arg(long)]
    script: Option<String>,

    /// JSON controller config (falls back to FLYOVER_CONFIG, then defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Probability that a terrain lookup comes back empty
    #[arg(long, default_value_t = 0.0)]
    flaky: f64,

    /// Probability that the surface rejects a full camera pose
    #[arg(long, default_value_t = 0.0)]
    reject_poses: f64,

    /// Print every Nth tick report
    #[arg(long, default_value_t = 1)]
    every: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("flyover_cli=info".parse()?)
            .add_directive("flyover_sim=info".parse()?))
        .init();

    let args = Args::parse();
    if !(args.fps.is_finite() && args.fps > 0.0) {
        anyhow::bail!("--fps must be positive, got {}", args.fps);
    }
    if !(args.duration_s.is_finite() && args.duration_s >= 0.0) {
        anyhow::bail!("--duration-s must be non-negative, got {}", args.duration_s);
    }

    let config = resolve_config(args.config.as_deref())?;

    let landscape = Landscape::new(args.lat, args.lon);
    let route = match args.route {
        RouteType::Climb => create_climb_route(&landscape),
        RouteType::Loop => create_loop_route(&landscape),
        RouteType::Switchbacks => create_switchbacks_route(&landscape),
    };
    let route_length_km = route.path.length_km();
    let bounds = route_bounds(&route.path, config.overview.route_samples)
        .context("route has no usable points")?;
    let terrain = Rc::new(FlakyTerrain::new(
        landscape.grid(&bounds.expand(TERRAIN_MARGIN), TERRAIN_SPACING_M),
        args.flaky,
    ));

    let mut script = match args.script.as_deref() {
        Some("demo") => demo_script(),
        Some(path) => Script::load(path.as_ref())?,
        None => Script::default(),
    };

    tracing::info!(
        "Route {}: {:.2} km, {} scripted commands",
        route.name,
        route_length_km,
        script.len()
    );

    let mut controller = CameraController::new(
        config,
        Box::new(route.path.clone()),
        Box::new(Rc::clone(&terrain)),
    )
    .with_mode(args.mode.into());
    controller.set_speed_multiplier(args.speed);
    if script.is_empty() {
        controller.play();
    }

    let mut surface = HeadlessSurface::new(args.reject_poses);
    let mut stats = RunStats::default();
    let dt = 1.0 / args.fps;
    let frames = (args.duration_s * args.fps).ceil() as u64;
    let every = args.every.max(1);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for frame in 0..frames {
        let elapsed = frame as f64 * dt;
        for command in script.due(elapsed) {
            tracing::info!("t={:.2}s applying {:?}", elapsed, command);
            controller.apply(command);
        }

        let report = controller.tick(dt, &mut surface);
        let ground = report
            .pose
            .and_then(|pose| terrain.elevation_at(pose.lng, pose.lat));
        stats.record(&report, dt, ground);

        if frame % every == 0 {
            serde_json::to_writer(&mut out, &report)?;
            out.write_all(b"\n")?;
        }

        if controller.progress() >= 1.0 && !controller.is_playing() && script.is_finished() {
            tracing::info!("Route finished after {:.2}s", elapsed + dt);
            break;
        }
    }
    out.flush()?;

    let summary = stats.summary(&route.name, route_length_km);
    tracing::info!(
        "Simulation complete: {} frames, {} terrain-adjusted, {} terrain misses, {} coarse fallbacks",
        summary.stats.frames,
        summary.stats.terrain_adjusted,
        terrain.misses(),
        surface.coarse_writes
    );
    eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
