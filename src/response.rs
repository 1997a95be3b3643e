//! Routing response and failure envelopes.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCategory, PlannerError};
use crate::model::Stop;

/// Message returned for internal failures; details stay in the logs.
pub const INTERNAL_FAILURE_MESSAGE: &str = "internal error while planning routes";

/// A stop placed on an agent's route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedStop {
    #[serde(flatten)]
    pub stop: Stop,
    /// 0-based position within the agent's route.
    pub sequence: usize,
    /// Walking time from the depot to this stop along the route (seconds).
    pub walk_time_sec: i64,
    /// Walking distance from the depot to this stop along the route (meters).
    pub distance_m: i64,
}

/// One agent's route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub agent_id: usize,
    pub addresses: Vec<RoutedStop>,
    pub n_addresses: usize,
    /// Depot to last stop.
    pub total_time_sec: i64,
    pub total_distance_m: i64,
    pub estimated_walk_time_min: i64,
    /// Closing leg back to the depot; zero on open routes.
    pub return_time_sec: i64,
    pub return_distance_m: i64,
}

impl Cluster {
    pub fn empty(agent_id: usize) -> Self {
        Self {
            agent_id,
            addresses: Vec::new(),
            n_addresses: 0,
            total_time_sec: 0,
            total_distance_m: 0,
            estimated_walk_time_min: 0,
            return_time_sec: 0,
            return_distance_m: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub n_addresses: usize,
    pub n_agents: usize,
    pub avg_houses_per_agent: f64,
    pub max_houses_per_agent: usize,
    pub total_walk_time_min: f64,
    pub total_distance_km: f64,
    pub n_assigned: usize,
    pub n_dropped: usize,
}

impl Summary {
    pub fn from_clusters(clusters: &[Cluster], n_addresses: usize, max_houses_per_agent: usize) -> Self {
        let n_agents = clusters.len();
        let n_assigned: usize = clusters.iter().map(|cluster| cluster.n_addresses).sum();
        let total_time: i64 = clusters.iter().map(|cluster| cluster.total_time_sec).sum();
        let total_distance: i64 = clusters.iter().map(|cluster| cluster.total_distance_m).sum();

        Self {
            n_addresses,
            n_agents,
            avg_houses_per_agent: if n_agents == 0 { 0.0 } else { n_addresses as f64 / n_agents as f64 },
            max_houses_per_agent,
            total_walk_time_min: total_time as f64 / 60.0,
            total_distance_km: total_distance as f64 / 1000.0,
            n_assigned,
            n_dropped: n_addresses.saturating_sub(n_assigned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub success: bool,
    pub clusters: Vec<Cluster>,
    pub summary: Summary,
    /// Ids of stops left out of every route.
    pub unassigned: Vec<String>,
    /// Time spent building the travel matrices.
    pub matrix_time_sec: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error_code: String,
    pub error: String,
}

impl FailureResponse {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: category.code().to_string(),
            error: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::new(ErrorCategory::Internal, INTERNAL_FAILURE_MESSAGE)
    }
}

impl From<&PlannerError> for FailureResponse {
    fn from(err: &PlannerError) -> Self {
        match err.category() {
            ErrorCategory::Internal => Self::internal(),
            category => Self::new(category, err.to_string()),
        }
    }
}

/// What crosses the planner boundary: a response or a structured failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanOutcome {
    Success(RouteResponse),
    Failure(FailureResponse),
}

impl PlanOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PlanOutcome::Success(_))
    }

    pub fn status_code(&self) -> u16 {
        match self {
            PlanOutcome::Success(_) => 200,
            PlanOutcome::Failure(failure) => match failure.error_code.as_str() {
                "invalid_input" => ErrorCategory::InvalidInput.status_code(),
                _ => 500,
            },
        }
    }
}
