//! canvass-planner core
//!
//! Splits a set of door-to-door stops between field agents and sequences
//! each agent's walk (capacitated vehicle routing from a single depot).

pub mod config;
pub mod error;
pub mod extract;
pub mod haversine;
pub mod matrix;
pub mod model;
pub mod planner;
pub mod presort;
pub mod request;
pub mod response;
pub mod solver;
pub mod traits;
pub mod validate;

pub use config::PlannerConfig;
pub use error::{ErrorCategory, PlannerError};
pub use planner::Planner;
pub use request::{RouteOptions, RouteRequest};
pub use response::{PlanOutcome, RouteResponse};
