//! Planner error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    /// The request itself is unusable (too few stops, bad coordinates, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Planner configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The optimizer returned without an admissible assignment.
    #[error("solver failed to find a solution: {0}")]
    NoSolution(String),

    #[error("matrix construction failed: {0}")]
    Matrix(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure category reported across the planner boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidInput,
    Configuration,
    SolverFailed,
    Internal,
}

impl ErrorCategory {
    pub fn code(self) -> &'static str {
        match self {
            ErrorCategory::InvalidInput => "invalid_input",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::SolverFailed => "solver_failed",
            ErrorCategory::Internal => "internal",
        }
    }

    /// HTTP-style status a transport envelope should answer with.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorCategory::InvalidInput => 400,
            _ => 500,
        }
    }
}

impl PlannerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PlannerError::InvalidInput(_) => ErrorCategory::InvalidInput,
            PlannerError::Configuration(_) => ErrorCategory::Configuration,
            PlannerError::NoSolution(_) => ErrorCategory::SolverFailed,
            PlannerError::Matrix(_) | PlannerError::Internal(_) => ErrorCategory::Internal,
        }
    }
}
