//! Synthetic routes for tracker and session tests.

use route_guide::polyline::{DEFAULT_PRECISION, RoutePoint, encode};
use route_guide::route::{Leg, Maneuver, ManeuverKind, Route, ShapeRange};

/// Meters per degree of latitude on the mean-radius sphere.
pub const METERS_PER_DEGREE_LAT: f64 = 111_195.0;

pub const ORIGIN_LAT: f64 = 48.2082;
pub const ORIGIN_LON: f64 = 16.3738;
pub const POINT_SPACING_DEG: f64 = 0.001;

/// Ten shape points heading due north, about 111 m apart.
pub fn shape_points() -> Vec<RoutePoint> {
    (0..10)
        .map(|i| RoutePoint::new(ORIGIN_LON, ORIGIN_LAT + i as f64 * POINT_SPACING_DEG))
        .collect()
}

/// (lat, lon) of a shape point, shifted `meters_south` back along the route.
pub fn near_point(index: usize, meters_south: f64) -> (f64, f64) {
    let p = shape_points()[index];
    (p.lat - meters_south / METERS_PER_DEGREE_LAT, p.lon)
}

pub fn maneuver(kind: ManeuverKind, text: &str, begin: usize, end: usize) -> Maneuver {
    Maneuver {
        kind,
        text: text.to_string(),
        length_meters: (end - begin) as f64 * 111.0,
        duration_seconds: (end - begin) as f64 * 80.0,
        shape_range: ShapeRange { begin, end },
    }
}

/// Three maneuvers ending at shape indices 0, 5 and 9.
pub fn walking_route(label: &str) -> Route {
    let leg = Leg::new(
        encode(&shape_points(), DEFAULT_PRECISION),
        DEFAULT_PRECISION,
        vec![
            maneuver(ManeuverKind::Start, &format!("{label}: Walk north"), 0, 0),
            maneuver(ManeuverKind::Right, "Turn right onto <b>Main St</b>.", 0, 5),
            maneuver(ManeuverKind::Destination, "You have arrived.", 5, 9),
        ],
        999.0,
        720.0,
    )
    .expect("fixture shape decodes");
    Route::new(vec![leg], "Found route between points").expect("fixture route is valid")
}

/// Provider response body for [`walking_route`], lengths in kilometers.
pub fn walking_route_json() -> String {
    walking_route_json_at(DEFAULT_PRECISION)
}

/// Same body with the shape encoded at `precision`.
pub fn walking_route_json_at(precision: u32) -> String {
    serde_json::json!({
        "trip": {
            "legs": [{
                "shape": encode(&shape_points(), precision),
                "maneuvers": [
                    {"type": 1, "instruction": "Walk north", "time": 0.0,
                     "begin_shape_index": 0, "end_shape_index": 0},
                    {"type": 10, "instruction": "Turn right onto <b>Main St</b>.", "length": 0.555,
                     "time": 400.0, "begin_shape_index": 0, "end_shape_index": 5},
                    {"type": 4, "instruction": "You have arrived.", "length": 0.444,
                     "time": 320.0, "begin_shape_index": 5, "end_shape_index": 9}
                ],
                "summary": {"length": 0.999, "time": 720.0}
            }],
            "status": 0,
            "status_message": "Found route between points",
            "units": "kilometers"
        }
    })
    .to_string()
}
