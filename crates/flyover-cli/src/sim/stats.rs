//! Aggregate counters over a simulation run.

use chrono::{DateTime, Utc};
use flyover_core::{CameraMode, PoseSource, TickReport};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceCounts {
    pub overview: u64,
    pub suspended: u64,
    pub override_return: u64,
    pub transition: u64,
    pub guided: u64,
    pub held: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub frames: u64,
    pub sim_seconds: f64,
    pub terrain_adjusted: u64,
    pub sources: SourceCounts,
    pub mode_changes: u64,
    pub min_clearance_m: Option<f64>,
    pub final_progress: f64,
    #[serde(skip)]
    last_mode: Option<CameraMode>,
}

impl RunStats {
    /// Fold in one tick. `ground_m` is the terrain under the emitted pose, if known.
    pub fn record(&mut self, report: &TickReport, dt_s: f64, ground_m: Option<f64>) {
        self.frames += 1;
        self.sim_seconds += dt_s;
        self.final_progress = report.progress;
        if report.terrain_adjusted {
            self.terrain_adjusted += 1;
        }

        let counter = match report.source {
            PoseSource::Overview => &mut self.sources.overview,
            PoseSource::Suspended => &mut self.sources.suspended,
            PoseSource::OverrideReturn => &mut self.sources.override_return,
            PoseSource::Transition => &mut self.sources.transition,
            PoseSource::Guided => &mut self.sources.guided,
            PoseSource::Held => &mut self.sources.held,
        };
        *counter += 1;

        if self.last_mode.is_some_and(|mode| mode != report.mode) {
            self.mode_changes += 1;
        }
        self.last_mode = Some(report.mode);

        if let (Some(pose), Some(ground)) = (report.pose, ground_m) {
            let clearance = pose.alt - ground;
            self.min_clearance_m = Some(match self.min_clearance_m {
                Some(min) => min.min(clearance),
                None => clearance,
            });
        }
    }

    pub fn summary(&self, route: &str, route_length_km: f64) -> RunSummary {
        RunSummary {
            generated_at: Utc::now(),
            route: route.to_string(),
            route_length_km,
            stats: self.clone(),
        }
    }
}

/// Printed once at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub route: String,
    pub route_length_km: f64,
    #[serde(flatten)]
    pub stats: RunStats,
}
