//! Addresses along a few Toronto residential streets (Annex / Seaton Village).
//!
//! House numbers step by two along each side; coordinates are interpolated
//! along the street centreline, offset slightly per side.

use canvass_planner::model::{Coordinates, Stop};
use canvass_planner::request::RouteRequest;

/// A street segment: name, first house number, start and end coordinates.
pub struct Street {
    pub name: &'static str,
    pub first_number: u32,
    pub start: (f64, f64),
    pub end: (f64, f64),
}

pub const STREETS: &[Street] = &[
    Street {
        name: "Palmerston Ave",
        first_number: 400,
        start: (43.6612, -79.4143),
        end: (43.6668, -79.4167),
    },
    Street {
        name: "Markham St",
        first_number: 500,
        start: (43.6615, -79.4128),
        end: (43.6671, -79.4151),
    },
    Street {
        name: "Euclid Ave",
        first_number: 300,
        start: (43.6604, -79.4112),
        end: (43.6660, -79.4135),
    },
    Street {
        name: "Bathurst St",
        first_number: 700,
        start: (43.6630, -79.4102),
        end: (43.6686, -79.4125),
    },
];

/// Community centre used as the depot in most scenarios.
pub const DEPOT: Coordinates = Coordinates::new(43.6640, -79.4135);

/// `per_side` houses on each side of `street`.
pub fn street_stops(street: &Street, per_side: usize) -> Vec<Stop> {
    let mut stops = Vec::with_capacity(per_side * 2);
    for side in 0..2u32 {
        for k in 0..per_side {
            let t = if per_side > 1 { k as f64 / (per_side - 1) as f64 } else { 0.0 };
            let lat = street.start.0 + (street.end.0 - street.start.0) * t;
            let lon = street.start.1 + (street.end.1 - street.start.1) * t + if side == 0 { -0.0001 } else { 0.0001 };
            let number = street.first_number + side + 2 * k as u32;
            stops.push(Stop::new(
                format!("{}-{}", street.name.replace(' ', "-").to_lowercase(), number),
                lat,
                lon,
                number.to_string(),
                street.name,
            ));
        }
    }
    stops
}

/// `per_side` houses on each side of the first `n_streets` streets,
/// interleaved so input order is deliberately scrambled.
pub fn neighbourhood(n_streets: usize, per_side: usize) -> Vec<Stop> {
    let per_street: Vec<Vec<Stop>> = STREETS[..n_streets].iter().map(|s| street_stops(s, per_side)).collect();
    let longest = per_street.iter().map(Vec::len).max().unwrap_or(0);
    let mut stops = Vec::new();
    for i in 0..longest {
        for street in per_street.iter().rev() {
            if let Some(stop) = street.get(i) {
                stops.push(stop.clone());
            }
        }
    }
    stops
}

/// The five-address scenario on Main St / Oak Ave around (43.700, -79.400).
pub fn two_street_scenario() -> Vec<Stop> {
    vec![
        Stop::new("1", 43.700, -79.400, "100", "Main St"),
        Stop::new("2", 43.701, -79.401, "102", "Main St"),
        Stop::new("3", 43.702, -79.402, "104", "Main St"),
        Stop::new("4", 43.703, -79.403, "200", "Oak Ave"),
        Stop::new("5", 43.704, -79.404, "202", "Oak Ave"),
    ]
}

pub fn request(stops: Vec<Stop>, n_agents: i64) -> RouteRequest {
    RouteRequest::new(stops, n_agents).with_depot(DEPOT)
}
