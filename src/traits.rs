//! Seams between the routing pipeline stages.
//!
//! The matrix builder and the extractor only ever see `TravelMatrices` and
//! `RouteAssignment`, so the optimizer behind `SolverBackend` can be swapped
//! (exact solver, metaheuristic, hand-rolled heuristic) without touching
//! either side.

use std::time::Duration;

use crate::error::PlannerError;
use crate::matrix::TravelMatrices;
use crate::model::Coordinates;

/// Provides time and distance matrices for a location list.
///
/// The matrices are indexed by the provided location order; index 0 is the
/// depot.
pub trait DistanceMatrixProvider {
    fn matrices_for(&self, locations: &[Coordinates]) -> Result<TravelMatrices, PlannerError>;
}

/// Constraints of one optimization run.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingConstraints {
    /// One vehicle per available agent.
    pub n_agents: usize,
    /// Maximum number of stops per agent (every stop has demand 1).
    pub capacity: usize,
    /// Ceiling on a route's cumulative travel time, in seconds.
    pub route_time_ceiling: i64,
    /// Whether routes end back at the depot.
    pub return_to_depot: bool,
    /// Cost of leaving a stop unserved. `None` makes every stop mandatory.
    pub drop_penalty: Option<i64>,
}

/// Solver output: per-agent node sequences over the location list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteAssignment {
    /// Node indices visited by each agent, depot excluded, in visiting order.
    pub routes: Vec<Vec<usize>>,
    /// Node indices left out of every route.
    pub dropped: Vec<usize>,
    /// Objective value (travel time plus drop penalties).
    pub objective: i64,
}

/// Builds a solvable model from matrices and constraints.
pub trait SolverBackend {
    type Model: RoutingModel;

    fn build_model(
        &self,
        matrices: &TravelMatrices,
        constraints: &RoutingConstraints,
    ) -> Result<Self::Model, PlannerError>;
}

/// A model ready to be searched within a wall-clock budget.
pub trait RoutingModel {
    /// Returns a feasible assignment or `PlannerError::NoSolution`.
    fn solve(self, budget: Duration) -> Result<RouteAssignment, PlannerError>;
}
