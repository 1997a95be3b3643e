//! Routing pipeline: validate, pre-sort, build matrices, optimize, extract.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{error, info, warn};

use crate::config::PlannerConfig;
use crate::error::{ErrorCategory, PlannerError};
use crate::extract::{extract_clusters, unassigned_ids};
use crate::haversine::HaversineMatrix;
use crate::matrix::location_list;
use crate::presort::sort_by_street_side;
use crate::request::RouteRequest;
use crate::response::{FailureResponse, PlanOutcome, RouteResponse, Summary};
use crate::solver::{GuidedLocalSearch, SearchParameters};
use crate::traits::{DistanceMatrixProvider, RoutingConstraints, RoutingModel, SolverBackend};
use crate::validate::validate_request;

/// Plans canvassing routes. Holds no per-request state.
#[derive(Debug, Clone)]
pub struct Planner<B = GuidedLocalSearch> {
    config: PlannerConfig,
    backend: B,
}

impl Planner<GuidedLocalSearch> {
    pub fn new(config: PlannerConfig) -> Self {
        let backend = GuidedLocalSearch::new(SearchParameters {
            solution_limit: config.solution_limit,
            ..SearchParameters::default()
        });
        Self { config, backend }
    }
}

impl Default for Planner<GuidedLocalSearch> {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl<B: SolverBackend> Planner<B> {
    pub fn with_backend(config: PlannerConfig, backend: B) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Run the full pipeline for one request.
    pub fn plan(&self, request: &RouteRequest) -> Result<RouteResponse, PlannerError> {
        self.config.validate()?;
        let job = validate_request(request, &self.config)?;

        info!(
            addresses = job.stops.len(),
            agents = job.n_agents,
            max_houses_per_agent = job.max_houses_per_agent,
            "optimizing canvass routes"
        );

        let stops = if job.street_side_bias {
            sort_by_street_side(job.stops)
        } else {
            job.stops
        };

        let locations = location_list(job.depot, &stops);
        let matrix_started = Instant::now();
        let matrices = HaversineMatrix::new(job.walking_speed_kmh).matrices_for(&locations)?;
        let matrix_time = matrix_started.elapsed();
        info!(
            size = matrices.size(),
            elapsed_ms = matrix_time.as_millis() as u64,
            "calculated haversine matrix"
        );

        let constraints = RoutingConstraints {
            n_agents: job.n_agents,
            capacity: job.max_houses_per_agent,
            route_time_ceiling: self.config.route_time_ceiling_secs,
            return_to_depot: job.return_to_depot,
            drop_penalty: self.config.drop_penalty,
        };

        let model = self.backend.build_model(&matrices, &constraints)?;
        let assignment = model.solve(self.config.search_time_limit)?;
        info!(objective = assignment.objective, "solution found");

        let clusters = extract_clusters(&assignment, &matrices, &stops, job.n_agents, job.return_to_depot)?;
        let unassigned = unassigned_ids(&assignment, &stops);
        if !unassigned.is_empty() {
            warn!(
                dropped = unassigned.len(),
                capacity = job.n_agents * job.max_houses_per_agent,
                "stops left out of every route"
            );
        }

        let summary = Summary::from_clusters(&clusters, stops.len(), job.max_houses_per_agent);
        Ok(RouteResponse {
            success: true,
            clusters,
            summary,
            unassigned,
            matrix_time_sec: matrix_time.as_secs_f64(),
        })
    }

    /// Boundary entry point: never fails, never panics outward.
    pub fn handle(&self, request: &RouteRequest) -> PlanOutcome {
        match panic::catch_unwind(AssertUnwindSafe(|| self.plan(request))) {
            Ok(Ok(response)) => PlanOutcome::Success(response),
            Ok(Err(err)) => {
                match err.category() {
                    ErrorCategory::InvalidInput => warn!(error = %err, "rejected routing request"),
                    ErrorCategory::Configuration => error!(error = %err, "planner misconfigured"),
                    ErrorCategory::SolverFailed => warn!(error = %err, "routing solver failed"),
                    ErrorCategory::Internal => error!(error = ?err, "routing failed unexpectedly"),
                }
                PlanOutcome::Failure(FailureResponse::from(&err))
            }
            Err(payload) => {
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(panic = %detail, "routing panicked");
                PlanOutcome::Failure(FailureResponse::internal())
            }
        }
    }

    /// Decode a JSON body and handle it.
    pub fn handle_json(&self, body: &str) -> PlanOutcome {
        match RouteRequest::from_json(body) {
            Ok(request) => self.handle(&request),
            Err(err) => {
                warn!(error = %err, "could not decode routing request");
                PlanOutcome::Failure(FailureResponse::from(&err))
            }
        }
    }
}
