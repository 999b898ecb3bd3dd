//! Pre-defined routes draped over a [`Landscape`].

use super::terrain::Landscape;
use flyover_core::spatial::{offset_by_bearing_deg, offset_position};
use flyover_core::{PathPoint, PolylinePath};

/// Rider sits this far above the ground.
const RIDER_HEIGHT_M: f64 = 2.0;

/// A named route for a simulation run.
pub struct SimRoute {
    pub name: String,
    pub path: PolylinePath,
}

/// Turn (lat, lng) vertices into route points on the ground.
fn drape(landscape: &Landscape, vertices: impl IntoIterator<Item = (f64, f64)>) -> PolylinePath {
    let points = vertices
        .into_iter()
        .map(|(lat, lng)| PathPoint::new(lng, lat, landscape.elevation(lng, lat) + RIDER_HEIGHT_M))
        .collect();
    PolylinePath::new(points)
}

/// Long climb from 6 km south of the center to 6 km north, weaving gently.
pub fn create_climb_route(landscape: &Landscape) -> SimRoute {
    let step_m = 250.0;
    let vertices = (0..=48).map(|i| {
        let north = -6000.0 + i as f64 * step_m;
        let east = 400.0 * (i as f64 * 0.15).sin();
        offset_position(landscape.center_lat, landscape.center_lng, north, east)
    });

    SimRoute {
        name: "climb".to_string(),
        path: drape(landscape, vertices),
    }
}

/// Closed 3 km radius loop around the center, clockwise from the south.
pub fn create_loop_route(landscape: &Landscape) -> SimRoute {
    let radius_m = 3000.0;
    let segments = 120;
    let vertices = (0..=segments).map(|i| {
        // Bearing from the center; starting due south and walking west first
        let bearing = 180.0 + 360.0 * i as f64 / segments as f64;
        offset_by_bearing_deg(
            landscape.center_lat,
            landscape.center_lng,
            radius_m,
            bearing,
        )
    });

    SimRoute {
        name: "loop".to_string(),
        path: drape(landscape, vertices),
    }
}

/// Hairpin ascent: eight 1.2 km legs alternating north-east and north-west.
pub fn create_switchbacks_route(landscape: &Landscape) -> SimRoute {
    let leg_m = 1200.0;
    let step_m = 100.0;
    let steps_per_leg = (leg_m / step_m) as usize;

    let (mut lat, mut lng) =
        offset_position(landscape.center_lat, landscape.center_lng, -3000.0, 0.0);
    let mut vertices = vec![(lat, lng)];
    for leg in 0..8 {
        let bearing = if leg % 2 == 0 { 45.0 } else { 315.0 };
        for _ in 0..steps_per_leg {
            (lat, lng) = offset_by_bearing_deg(lat, lng, step_m, bearing);
            vertices.push((lat, lng));
        }
    }

    SimRoute {
        name: "switchbacks".to_string(),
        path: drape(landscape, vertices),
    }
}
