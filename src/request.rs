//! Routing request as handed over by a front door.

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;
use crate::model::{Coordinates, Stop};

fn default_agents() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    #[serde(default)]
    pub addresses: Vec<Stop>,
    /// Number of agents (one route each).
    #[serde(default = "default_agents")]
    pub n_agents: i64,
    /// Start point; the first pre-sorted stop stands in when absent.
    #[serde(default)]
    pub depot: Option<Coordinates>,
    #[serde(default)]
    pub options: RouteOptions,
}

/// Per-request options. Unset fields fall back to planner defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteOptions {
    #[serde(default)]
    pub max_houses_per_agent: Option<i64>,
    /// Walking speed in km/h.
    #[serde(default)]
    pub walking_speed: Option<f64>,
    #[serde(default)]
    pub street_side_bias: Option<bool>,
    #[serde(default)]
    pub return_to_depot: Option<bool>,
}

impl RouteRequest {
    pub fn new(addresses: Vec<Stop>, n_agents: i64) -> Self {
        Self {
            addresses,
            n_agents,
            depot: None,
            options: RouteOptions::default(),
        }
    }

    pub fn with_depot(mut self, depot: Coordinates) -> Self {
        self.depot = Some(depot);
        self
    }

    pub fn with_options(mut self, options: RouteOptions) -> Self {
        self.options = options;
        self
    }

    /// Decode a JSON request body.
    pub fn from_json(body: &str) -> Result<Self, PlannerError> {
        serde_json::from_str(body).map_err(|err| PlannerError::InvalidInput(format!("malformed request: {}", err)))
    }
}
