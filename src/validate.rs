//! Request validation and option resolution.

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::model::{Coordinates, Stop};
use crate::request::RouteRequest;

/// Minimum number of stops worth optimizing.
pub const MIN_STOPS: usize = 2;

/// A request that passed validation, with every option resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub stops: Vec<Stop>,
    pub n_agents: usize,
    pub depot: Option<Coordinates>,
    pub max_houses_per_agent: usize,
    pub walking_speed_kmh: f64,
    pub street_side_bias: bool,
    pub return_to_depot: bool,
}

/// Default per-agent cap: `floor(n / agents) + 1`.
pub fn default_capacity(n_stops: usize, n_agents: usize) -> usize {
    n_stops / n_agents + 1
}

pub fn validate_request(request: &RouteRequest, config: &PlannerConfig) -> Result<ValidatedRequest, PlannerError> {
    if request.addresses.len() < MIN_STOPS {
        return Err(PlannerError::InvalidInput(format!(
            "need at least {} addresses, got {}",
            MIN_STOPS,
            request.addresses.len()
        )));
    }

    if request.n_agents < 1 {
        return Err(PlannerError::InvalidInput(format!(
            "n_agents must be positive, got {}",
            request.n_agents
        )));
    }
    let n_agents = usize::try_from(request.n_agents)
        .map_err(|_| PlannerError::InvalidInput(format!("n_agents is too large: {}", request.n_agents)))?;

    for stop in &request.addresses {
        if !stop.coordinates().is_valid() {
            return Err(PlannerError::InvalidInput(format!(
                "address {:?} has invalid coordinates ({}, {})",
                stop.id, stop.lat, stop.lon
            )));
        }
    }

    if let Some(depot) = request.depot {
        if !depot.is_valid() {
            return Err(PlannerError::InvalidInput(format!(
                "depot has invalid coordinates ({}, {})",
                depot.lat, depot.lon
            )));
        }
    }

    let options = &request.options;
    let max_houses_per_agent = match options.max_houses_per_agent {
        Some(cap) if cap < 1 => {
            return Err(PlannerError::InvalidInput(format!(
                "max_houses_per_agent must be positive, got {}",
                cap
            )));
        }
        Some(cap) => usize::try_from(cap).unwrap_or(usize::MAX),
        None => default_capacity(request.addresses.len(), n_agents),
    };

    let walking_speed_kmh = options.walking_speed.unwrap_or(config.default_walking_speed_kmh);
    if !(walking_speed_kmh.is_finite() && walking_speed_kmh > 0.0) {
        return Err(PlannerError::InvalidInput(format!(
            "walking_speed must be positive, got {}",
            walking_speed_kmh
        )));
    }

    Ok(ValidatedRequest {
        stops: request.addresses.clone(),
        n_agents,
        depot: request.depot,
        max_houses_per_agent,
        walking_speed_kmh,
        street_side_bias: options.street_side_bias.unwrap_or(true),
        return_to_depot: options.return_to_depot.unwrap_or(true),
    })
}
