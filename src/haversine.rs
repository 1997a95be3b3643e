//! Haversine distance/time matrix provider.
//!
//! Uses great-circle distance and a constant walking speed. Ignores the
//! street network entirely, so times are a lower bound on real walks.

use tracing::debug;

use crate::error::PlannerError;
use crate::matrix::TravelMatrices;
use crate::model::Coordinates;
use crate::traits::DistanceMatrixProvider;

/// Average walking speed assumption for time estimation.
pub const DEFAULT_WALKING_SPEED_KMH: f64 = 5.0;

/// Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine-based matrix provider.
#[derive(Debug, Clone)]
pub struct HaversineMatrix {
    /// Assumed average walking speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_WALKING_SPEED_KMH,
        }
    }
}

impl HaversineMatrix {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    fn speed_m_per_s(&self) -> f64 {
        self.speed_kmh * 1000.0 / 3600.0
    }

    /// Convert a distance in meters to whole seconds of walking, truncated.
    fn meters_to_seconds(&self, meters: f64) -> i64 {
        (meters / self.speed_m_per_s()) as i64
    }
}

/// Great-circle distance between two points in meters.
pub fn haversine_m(from: Coordinates, to: Coordinates) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrices_for(&self, locations: &[Coordinates]) -> Result<TravelMatrices, PlannerError> {
        let n = locations.len();
        if n < 2 {
            return Err(PlannerError::Matrix(format!(
                "need at least 2 locations to build a matrix, got {}",
                n
            )));
        }
        if !(self.speed_kmh.is_finite() && self.speed_kmh > 0.0) {
            return Err(PlannerError::Matrix(format!("walking speed must be positive, got {}", self.speed_kmh)));
        }

        let mut times = vec![vec![0; n]; n];
        let mut distances = vec![vec![0; n]; n];

        // Fill the upper triangle and mirror it so symmetry holds bit-for-bit.
        for i in 0..n {
            for j in (i + 1)..n {
                let meters = haversine_m(locations[i], locations[j]);
                let seconds = self.meters_to_seconds(meters);
                let meters = meters as i64;
                distances[i][j] = meters;
                distances[j][i] = meters;
                times[i][j] = seconds;
                times[j][i] = seconds;
            }
        }

        debug!(locations = n, speed_kmh = self.speed_kmh, "built haversine matrix");
        TravelMatrices::from_grids(times, distances)
    }
}
