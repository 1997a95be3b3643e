//! Location list and travel matrices.

use crate::error::PlannerError;
use crate::model::{Coordinates, Stop};

/// Build the location list `[depot, stop_0, ..., stop_{n-1}]`.
///
/// Without an explicit depot the first stop's position stands in as a
/// synthetic start node, so index 0 is always the depot and stop `i` always
/// sits at index `i + 1`.
pub fn location_list(depot: Option<Coordinates>, stops: &[Stop]) -> Vec<Coordinates> {
    let start = depot.or_else(|| stops.first().map(Stop::coordinates));
    let mut locations = Vec::with_capacity(stops.len() + 1);
    if let Some(start) = start {
        locations.push(start);
    }
    locations.extend(stops.iter().map(Stop::coordinates));
    locations
}

/// Integer travel times (seconds) and distances (meters) between locations.
///
/// Always square, with a zero diagonal, non-negative and symmetric entries.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelMatrices {
    times: Vec<Vec<i64>>,
    distances: Vec<Vec<i64>>,
}

impl TravelMatrices {
    /// Wrap precomputed grids, checking the matrix invariants.
    pub fn from_grids(times: Vec<Vec<i64>>, distances: Vec<Vec<i64>>) -> Result<Self, PlannerError> {
        let size = times.len();
        if distances.len() != size {
            return Err(PlannerError::Matrix(format!(
                "time matrix has {} rows but distance matrix has {}",
                size,
                distances.len()
            )));
        }
        check_grid("time", &times, size)?;
        check_grid("distance", &distances, size)?;
        Ok(Self { times, distances })
    }

    /// Number of locations, depot included.
    pub fn size(&self) -> usize {
        self.times.len()
    }

    pub fn time(&self, from: usize, to: usize) -> i64 {
        self.times[from][to]
    }

    pub fn distance(&self, from: usize, to: usize) -> i64 {
        self.distances[from][to]
    }

    pub fn times(&self) -> &[Vec<i64>] {
        &self.times
    }

    pub fn distances(&self) -> &[Vec<i64>] {
        &self.distances
    }
}

fn check_grid(name: &str, grid: &[Vec<i64>], size: usize) -> Result<(), PlannerError> {
    for (i, row) in grid.iter().enumerate() {
        if row.len() != size {
            return Err(PlannerError::Matrix(format!(
                "{} matrix row {} has {} entries, expected {}",
                name,
                i,
                row.len(),
                size
            )));
        }
        if row[i] != 0 {
            return Err(PlannerError::Matrix(format!("{} matrix diagonal at {} is not zero", name, i)));
        }
        for (j, &value) in row.iter().enumerate() {
            if value < 0 {
                return Err(PlannerError::Matrix(format!("{} matrix entry ({}, {}) is negative", name, i, j)));
            }
            if grid[j][i] != value {
                return Err(PlannerError::Matrix(format!("{} matrix is not symmetric at ({}, {})", name, i, j)));
            }
        }
    }
    Ok(())
}
