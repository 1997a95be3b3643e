//! Planner configuration

use std::time::Duration;

use crate::error::PlannerError;
use crate::haversine::DEFAULT_WALKING_SPEED_KMH;

/// Default wall-clock budget for the optimizer.
pub const DEFAULT_SEARCH_TIME_LIMIT: Duration = Duration::from_secs(10);
/// Default per-route ceiling on cumulative travel time (4 hours).
pub const DEFAULT_ROUTE_TIME_CEILING_SECS: i64 = 14_400;
/// Default cost of leaving a stop unserved.
pub const DEFAULT_DROP_PENALTY: i64 = 1_000_000;
/// Longest optimizer budget accepted (one day).
pub const MAX_SEARCH_TIME_LIMIT: Duration = Duration::from_secs(86_400);
/// Largest drop penalty accepted. Keeps penalty totals well inside `i64`.
pub const MAX_DROP_PENALTY: i64 = 1_000_000_000_000;

/// Planner-wide settings shared by every request.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    /// Hard cap on optimizer wall-clock time.
    pub search_time_limit: Duration,
    pub route_time_ceiling_secs: i64,
    /// `None` makes every stop mandatory: unplaceable stops fail the solve.
    pub drop_penalty: Option<i64>,
    /// Number of improving solutions after which search stops.
    /// `None` keeps searching until the time limit.
    pub solution_limit: Option<u32>,
    /// Walking speed used when a request does not set one (km/h).
    pub default_walking_speed_kmh: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            search_time_limit: DEFAULT_SEARCH_TIME_LIMIT,
            route_time_ceiling_secs: DEFAULT_ROUTE_TIME_CEILING_SECS,
            drop_penalty: Some(DEFAULT_DROP_PENALTY),
            solution_limit: Some(1),
            default_walking_speed_kmh: DEFAULT_WALKING_SPEED_KMH,
        }
    }
}

impl PlannerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, PlannerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PlannerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("CANVASS_SEARCH_TIME_LIMIT_SECS") {
            let secs: f64 = parse("CANVASS_SEARCH_TIME_LIMIT_SECS", &raw)?;
            config.search_time_limit = Duration::try_from_secs_f64(secs).map_err(|err| {
                PlannerError::Configuration(format!("CANVASS_SEARCH_TIME_LIMIT_SECS is out of range ({}): {}", err, raw))
            })?;
        }

        if let Some(raw) = lookup("CANVASS_ROUTE_TIME_CEILING_SECS") {
            config.route_time_ceiling_secs = parse("CANVASS_ROUTE_TIME_CEILING_SECS", &raw)?;
        }

        if let Some(raw) = lookup("CANVASS_DROP_PENALTY") {
            config.drop_penalty = if is_disabled(&raw) {
                None
            } else {
                Some(parse("CANVASS_DROP_PENALTY", &raw)?)
            };
        }

        if let Some(raw) = lookup("CANVASS_SOLUTION_LIMIT") {
            config.solution_limit = if is_disabled(&raw) {
                None
            } else {
                Some(parse("CANVASS_SOLUTION_LIMIT", &raw)?)
            };
        }

        if let Some(raw) = lookup("CANVASS_WALKING_SPEED_KMH") {
            config.default_walking_speed_kmh = parse("CANVASS_WALKING_SPEED_KMH", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the optimizer cannot work with.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.search_time_limit.is_zero() {
            return Err(PlannerError::Configuration("search time limit must be positive".into()));
        }
        if self.search_time_limit > MAX_SEARCH_TIME_LIMIT {
            return Err(PlannerError::Configuration(format!(
                "search time limit must be at most {}s, got {}s",
                MAX_SEARCH_TIME_LIMIT.as_secs(),
                self.search_time_limit.as_secs_f64()
            )));
        }
        if self.route_time_ceiling_secs <= 0 {
            return Err(PlannerError::Configuration(format!(
                "route time ceiling must be positive, got {}",
                self.route_time_ceiling_secs
            )));
        }
        if let Some(penalty) = self.drop_penalty {
            if penalty <= 0 || penalty > MAX_DROP_PENALTY {
                return Err(PlannerError::Configuration(format!(
                    "drop penalty must be between 1 and {}, got {}",
                    MAX_DROP_PENALTY, penalty
                )));
            }
        }
        if self.solution_limit == Some(0) {
            return Err(PlannerError::Configuration("solution limit must be at least 1".into()));
        }
        if !(self.default_walking_speed_kmh.is_finite() && self.default_walking_speed_kmh > 0.0) {
            return Err(PlannerError::Configuration(format!(
                "default walking speed must be positive, got {}",
                self.default_walking_speed_kmh
            )));
        }
        Ok(())
    }
}

fn is_disabled(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "off" | "none")
}

fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, PlannerError> {
    raw.trim()
        .parse()
        .map_err(|_| PlannerError::Configuration(format!("{} has an invalid value: {:?}", key, raw)))
}
