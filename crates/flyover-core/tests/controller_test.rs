//! End-to-end controller scenarios driven through a recording renderer.

use flyover_core::overview::OverviewFramer;
use flyover_core::spatial::offset_by_bearing_deg;
use flyover_core::{
    haversine_distance, CameraController, CameraMode, Command, FlyoverConfig, OverrideState,
    PathPoint, PathSampler, PolylinePath, PoseSource, RecordingRenderer, TerrainOracle,
    TransitionState, ViewSide,
};

struct Flat(f64);

impl TerrainOracle for Flat {
    fn elevation_at(&self, _lng: f64, _lat: f64) -> Option<f64> {
        Some(self.0)
    }
}

/// Ground rising to the north of latitude 46, about 63m over 350m.
struct NorthRise;

impl TerrainOracle for NorthRise {
    fn elevation_at(&self, _lng: f64, lat: f64) -> Option<f64> {
        Some(500.0 + (lat - 46.0) * 20_000.0)
    }
}

/// Route with a stretch that has no samples, like tiles that never loaded.
struct GappyPath {
    inner: PolylinePath,
    gap_km: (f64, f64),
}

impl PathSampler for GappyPath {
    fn length_km(&self) -> f64 {
        self.inner.length_km()
    }

    fn sample_at(&self, distance_km: f64) -> Option<PathPoint> {
        if distance_km >= self.gap_km.0 && distance_km <= self.gap_km.1 {
            return None;
        }
        self.inner.sample_at(distance_km)
    }
}

fn eastbound(length_km: f64) -> PolylinePath {
    let (lat, lng) = offset_by_bearing_deg(46.0, 7.0, length_km * 1000.0, 90.0);
    PolylinePath::new(vec![
        PathPoint::new(7.0, 46.0, 500.0),
        PathPoint::new(lng, lat, 500.0),
    ])
}

fn controller(length_km: f64, ground_m: f64) -> CameraController {
    CameraController::new(
        FlyoverConfig::default(),
        Box::new(eastbound(length_km)),
        Box::new(Flat(ground_m)),
    )
}

fn run(ctrl: &mut CameraController, renderer: &mut RecordingRenderer, seconds: f64, dt: f64) {
    let steps = (seconds / dt).round() as usize;
    for _ in 0..steps {
        ctrl.tick(dt, renderer);
    }
}

#[test]
fn test_fifty_km_route_is_half_done_after_150_seconds() {
    let mut ctrl = controller(50.0, 0.0);
    let mut renderer = RecordingRenderer::new();
    ctrl.play();
    run(&mut ctrl, &mut renderer, 150.0, 1.0 / 60.0);
    assert!((ctrl.progress() - 0.5).abs() < 1e-6, "progress {}", ctrl.progress());
    assert_eq!(renderer.poses.len(), 9000);
}

#[test]
fn test_override_suspends_then_returns_after_grace() {
    let mut ctrl = controller(50.0, 0.0);
    let mut renderer = RecordingRenderer::new();
    ctrl.play();
    run(&mut ctrl, &mut renderer, 1.0, 0.1);

    ctrl.notify_user_interaction_start();
    let writes = renderer.write_count();
    run(&mut ctrl, &mut renderer, 0.5, 0.1);
    assert_eq!(renderer.write_count(), writes);

    let dragged = flyover_core::CameraPose::new(7.05, 46.02, 3000.0, 200.0, -60.0);
    renderer.user_pose = Some(dragged);
    ctrl.notify_user_interaction_end();

    for _ in 0..19 {
        let report = ctrl.tick(0.1, &mut renderer);
        assert_eq!(report.source, PoseSource::Suspended);
        assert!(report.pose.is_none());
    }
    assert_eq!(renderer.write_count(), writes);
    // progress keeps moving while the user drives
    assert!(ctrl.progress() > 1.0 / 300.0);

    ctrl.tick(0.1, &mut renderer);
    let report = ctrl.tick(0.1, &mut renderer);
    assert_eq!(report.source, PoseSource::OverrideReturn);
    let pose = report.pose.unwrap();
    // early in the return the camera is still near the user's view
    assert!(pose.alt > 1500.0, "alt {}", pose.alt);

    run(&mut ctrl, &mut renderer, 2.0, 0.1);
    assert_eq!(ctrl.override_state(), &OverrideState::Inactive);
    assert_eq!(ctrl.tick(0.1, &mut renderer).source, PoseSource::Guided);
}

#[test]
fn test_repeated_seek_does_not_move_camera() {
    let mut ctrl = controller(50.0, 0.0);
    let mut renderer = RecordingRenderer::new();
    ctrl.seek(0.3);
    let first = ctrl.tick(1.0 / 60.0, &mut renderer).pose.unwrap();
    ctrl.seek(0.3);
    let second = ctrl.tick(1.0 / 60.0, &mut renderer).pose.unwrap();
    assert!((first.lng - second.lng).abs() < 1e-12);
    assert!((first.lat - second.lat).abs() < 1e-12);
    assert!((first.alt - second.alt).abs() < 1e-9);
    assert!((first.bearing - second.bearing).abs() < 1e-9);
}

#[test]
fn test_scrub_frames_start_and_current_position() {
    let mut ctrl = controller(50.0, 0.0);
    let mut renderer = RecordingRenderer::new();
    ctrl.seek(0.2);
    ctrl.tick(0.1, &mut renderer);

    let path = eastbound(50.0);
    let a = path.sample_at(10.0).unwrap();
    let b = path.sample_at(30.0).unwrap();

    assert_eq!(ctrl.scrub_progress(), None);
    ctrl.begin_scrub();
    assert_eq!(ctrl.scrub_progress(), Some(0.0));
    ctrl.update_scrub(0.6);
    let mut last = None;
    for _ in 0..300 {
        let report = ctrl.tick(1.0 / 60.0, &mut renderer);
        assert_eq!(report.source, PoseSource::Overview);
        last = report.pose;
    }
    // dragging does not advance playback
    assert!((ctrl.progress() - 0.6).abs() < 1e-12);
    assert!(ctrl.scrub_progress().unwrap() > 0.999);

    let pose = last.unwrap();
    let framer = OverviewFramer::new(FlyoverConfig::default().overview);
    let frame = framer.frame_points(&a, &b, 90.0).unwrap();
    assert!(frame.bounds.contains(a.lat, a.lng));
    assert!(frame.bounds.contains(b.lat, b.lng));
    assert!(pose.alt >= a.alt.max(b.alt) + 1500.0 - 1e-6);
    assert!((pose.alt - frame.pose.alt).abs() < 1e-3);
    assert!((pose.lat - frame.pose.lat).abs() < 1e-7);
    assert!((pose.lng - frame.pose.lng).abs() < 1e-7);

    let (_, look_at) = *renderer.poses.last().unwrap();
    assert!((look_at.lng - frame.look_at.lng).abs() < 1e-9);
}

#[test]
fn test_scrub_end_while_playing_blends_back() {
    let mut ctrl = controller(50.0, 0.0);
    let mut renderer = RecordingRenderer::new();
    ctrl.play();
    run(&mut ctrl, &mut renderer, 1.0, 0.1);
    ctrl.begin_scrub();
    ctrl.update_scrub(0.5);
    run(&mut ctrl, &mut renderer, 1.0, 0.1);
    ctrl.end_scrub();

    assert_eq!(ctrl.tick(0.1, &mut renderer).source, PoseSource::Transition);
    run(&mut ctrl, &mut renderer, 1.5, 0.1);
    assert_eq!(ctrl.tick(0.1, &mut renderer).source, PoseSource::Guided);
}

#[test]
fn test_scrub_end_while_paused_holds_until_play() {
    let mut ctrl = controller(50.0, 0.0);
    let mut renderer = RecordingRenderer::new();
    ctrl.tick(0.1, &mut renderer);
    ctrl.begin_scrub();
    ctrl.update_scrub(0.4);
    run(&mut ctrl, &mut renderer, 1.0, 0.1);
    ctrl.end_scrub();
    assert!(ctrl.is_overview_held());

    for _ in 0..20 {
        assert_eq!(ctrl.tick(0.1, &mut renderer).source, PoseSource::Overview);
    }
    ctrl.play();
    assert!(!ctrl.is_overview_held());
    assert_eq!(ctrl.tick(0.1, &mut renderer).source, PoseSource::Transition);
}

#[test]
fn test_rejected_pose_falls_back_to_coarse_view() {
    let mut ctrl = controller(50.0, 0.0);
    let mut renderer = RecordingRenderer {
        reject_poses: true,
        ..RecordingRenderer::default()
    };
    let report = ctrl.tick(0.1, &mut renderer);
    assert!(report.pose.is_some());
    assert!(renderer.poses.is_empty());
    assert_eq!(renderer.coarse.len(), 1);
    assert!(renderer.coarse[0].zoom > 0.0 && renderer.coarse[0].zoom <= 22.0);

    renderer.reject_coarse = true;
    let report = ctrl.tick(0.1, &mut renderer);
    assert!(report.pose.is_some());
    assert_eq!(renderer.coarse.len(), 1);
    assert_eq!(ctrl.last_pose(), report.pose);
}

#[test]
fn test_missing_sample_holds_last_pose() {
    let path = GappyPath {
        inner: eastbound(50.0),
        gap_km: (20.0, 30.0),
    };
    let mut ctrl = CameraController::new(FlyoverConfig::default(), Box::new(path), Box::new(Flat(0.0)));
    let mut renderer = RecordingRenderer::new();
    ctrl.tick(0.1, &mut renderer);
    let before = ctrl.last_pose();
    let writes = renderer.write_count();

    ctrl.seek(0.5);
    let report = ctrl.tick(0.1, &mut renderer);
    assert_eq!(report.source, PoseSource::Held);
    assert!(report.pose.is_none());
    assert_eq!(renderer.write_count(), writes);
    assert_eq!(ctrl.last_pose(), before);

    ctrl.seek(0.9);
    assert_eq!(ctrl.tick(0.1, &mut renderer).source, PoseSource::Guided);
}

#[test]
fn test_mode_transition_eases_monotonically() {
    let mut ctrl = controller(50.0, 0.0);
    let mut renderer = RecordingRenderer::new();
    ctrl.seek(0.3);
    run(&mut ctrl, &mut renderer, 0.5, 0.1);
    let chase_alt = ctrl.last_pose().unwrap().alt;

    ctrl.set_mode(CameraMode::BirdsEye);
    assert!(ctrl.transition_state() != &TransitionState::Stable(CameraMode::BirdsEye));

    let mut prev = chase_alt;
    let mut finished = false;
    for _ in 0..25 {
        let report = ctrl.tick(0.1, &mut renderer);
        let alt = report.pose.unwrap().alt;
        assert!(alt + 1e-9 >= prev, "altitude fell from {} to {}", prev, alt);
        prev = alt;
        if report.source == PoseSource::Guided {
            finished = true;
        }
    }
    assert!(finished);
    assert_eq!(ctrl.transition_state(), &TransitionState::Stable(CameraMode::BirdsEye));
    assert!((prev - 1400.0).abs() < 1e-6, "birds-eye altitude {}", prev);
}

#[test]
fn test_unknown_mode_name_is_ignored() {
    let mut ctrl = controller(50.0, 0.0);
    let mut renderer = RecordingRenderer::new();
    ctrl.tick(0.1, &mut renderer);
    ctrl.set_mode_by_name("drone");
    assert_eq!(ctrl.mode(), CameraMode::Chase);
    assert_eq!(ctrl.transition_state(), &TransitionState::Stable(CameraMode::Chase));

    ctrl.set_mode(CameraMode::Chase);
    assert_eq!(ctrl.transition_state(), &TransitionState::Stable(CameraMode::Chase));
}

#[test]
fn test_high_terrain_lifts_every_pose() {
    let mut ctrl = controller(50.0, 2000.0);
    let mut renderer = RecordingRenderer::new();
    ctrl.play();
    // 2000m ground under a 500m rider: 40m plus capped slope clearance
    let floor = 2000.0 + 40.0 + 250.0;
    for _ in 0..120 {
        let report = ctrl.tick(1.0 / 30.0, &mut renderer);
        let pose = report.pose.unwrap();
        assert!(pose.alt >= floor - 1e-9, "alt {}", pose.alt);
        assert!(report.terrain_adjusted);
    }
}

#[test]
fn test_play_at_end_restarts() {
    let mut ctrl = controller(10.0, 0.0);
    let mut renderer = RecordingRenderer::new();
    ctrl.play();
    run(&mut ctrl, &mut renderer, 200.0, 1.0);
    assert_eq!(ctrl.progress(), 1.0);
    assert!(!ctrl.is_playing());

    ctrl.play();
    assert_eq!(ctrl.progress(), 0.0);
    assert!(ctrl.is_playing());
}

#[test]
fn test_commands_apply_from_json_script() {
    let mut ctrl = controller(50.0, 0.0);
    let script = r#"[
        {"type": "set_speed_multiplier", "value": 4.0},
        {"type": "set_mode", "mode": "side-view"},
        {"type": "set_zoom", "factor": 1.5},
        {"type": "play"}
    ]"#;
    let commands: Vec<Command> = serde_json::from_str(script).unwrap();
    for command in commands {
        ctrl.apply(command);
    }
    assert_eq!(ctrl.mode(), CameraMode::SideView);
    assert_eq!(ctrl.clock().speed_multiplier(), 4.0);
    assert_eq!(ctrl.zoom(), 1.5);
    assert!(ctrl.is_playing());
}

/// Tick through a side flip and check the camera swings around the rider
/// rather than cutting across it.
fn assert_sweeps_around_rider(ctrl: &mut CameraController, renderer: &mut RecordingRenderer) {
    let path = eastbound(50.0);
    let dt = 1.0 / 30.0;
    let mut closest_m = f64::MAX;
    let mut settled = false;
    for _ in 0..90 {
        let report = ctrl.tick(dt, renderer);
        let pose = report.pose.unwrap();
        let rider = path.sample_at(report.distance_km).unwrap();
        closest_m = closest_m.min(haversine_distance(rider.lat, rider.lng, pose.lat, pose.lng));
        if report.source == PoseSource::Guided {
            settled = true;
            break;
        }
        assert_eq!(report.source, PoseSource::Transition);
    }
    assert!(settled, "side flip never settled");
    assert!(closest_m > 300.0, "camera came within {closest_m:.1}m of the rider");
    assert_eq!(ctrl.transition_state(), &TransitionState::Stable(CameraMode::SideView));
}

fn assert_side_sweep_started(ctrl: &CameraController) {
    assert!(
        matches!(
            ctrl.transition_state(),
            TransitionState::Transitioning {
                from: CameraMode::SideView,
                to: CameraMode::SideView,
                ..
            }
        ),
        "expected a side view sweep, got {:?}",
        ctrl.transition_state()
    );
}

#[test]
fn test_side_flip_starts_transition() {
    let mut renderer = RecordingRenderer::new();
    let mut ctrl = controller(50.0, 0.0).with_mode(CameraMode::SideView);
    ctrl.play();
    run(&mut ctrl, &mut renderer, 1.0, 1.0 / 30.0);
    let shown = ctrl.side().unwrap();

    ctrl.set_side_pin(Some(shown.opposite()));
    let report = ctrl.tick(1.0 / 30.0, &mut renderer);
    assert_eq!(report.source, PoseSource::Transition);
    assert_side_sweep_started(&ctrl);
    assert_sweeps_around_rider(&mut ctrl, &mut renderer);
    assert_eq!(ctrl.side(), Some(shown.opposite()));
}

#[test]
fn test_terrain_side_flip_starts_transition() {
    let mut renderer = RecordingRenderer::new();
    let mut ctrl = CameraController::new(
        FlyoverConfig::default(),
        Box::new(eastbound(50.0)),
        Box::new(NorthRise),
    )
    .with_mode(CameraMode::SideView);
    // start on the high side, then let the terrain decide
    ctrl.set_side_pin(Some(ViewSide::Left));
    ctrl.play();
    run(&mut ctrl, &mut renderer, 1.0, 1.0 / 30.0);
    assert_eq!(ctrl.side(), Some(ViewSide::Left));

    ctrl.set_side_pin(None);
    let report = ctrl.tick(1.0 / 30.0, &mut renderer);
    assert_eq!(report.source, PoseSource::Transition);
    assert_side_sweep_started(&ctrl);
    assert_sweeps_around_rider(&mut ctrl, &mut renderer);
    assert_eq!(ctrl.side(), Some(ViewSide::Right));
}
