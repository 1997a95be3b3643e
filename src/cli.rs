//! CLI argument parsing for the canvass-planner binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use canvass_planner::{PlannerConfig, PlannerError};

#[derive(Parser, Debug)]
#[command(name = "canvass-planner", about = "Split canvassing stops between agents and order each walk")]
pub struct Cli {
    /// JSON request file, or `-` for stdin
    #[arg(short, long, default_value = "-")]
    pub input: String,

    /// Write the JSON response here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the response
    #[arg(long)]
    pub pretty: bool,

    /// Override the optimizer time limit (seconds)
    #[arg(long)]
    pub time_limit: Option<f64>,
}

impl Cli {
    /// Apply command-line overrides to the loaded configuration and validate
    /// the result.
    pub fn resolve_config(&self, loaded: Result<PlannerConfig, PlannerError>) -> Result<PlannerConfig, PlannerError> {
        let mut config = loaded?;
        if let Some(secs) = self.time_limit {
            config.search_time_limit = Duration::try_from_secs_f64(secs)
                .map_err(|err| PlannerError::Configuration(format!("invalid --time-limit {} ({})", secs, err)))?;
        }
        config.validate()?;
        Ok(config)
    }
}
