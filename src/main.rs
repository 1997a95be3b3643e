//! canvass-planner - route one canvassing request from the command line.
//!
//! Reads a JSON request, writes the JSON outcome. Logs go to stderr.

mod cli;

use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use canvass_planner::response::FailureResponse;
use canvass_planner::{PlanOutcome, Planner, PlannerConfig};

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let outcome = match cli.resolve_config(PlannerConfig::from_env()) {
        Ok(config) => {
            info!(time_limit_secs = config.search_time_limit.as_secs_f64(), "configuration loaded");
            let body = read_input(&cli.input)?;
            Planner::new(config).handle_json(&body)
        }
        Err(err) => {
            error!(error = %err, "planner misconfigured");
            PlanOutcome::Failure(FailureResponse::from(&err))
        }
    };

    write_outcome(&cli, &outcome)?;

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut body = String::new();
        io::stdin().read_to_string(&mut body).context("failed to read request from stdin")?;
        Ok(body)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input))
    }
}

fn write_outcome(cli: &cli::Cli, outcome: &PlanOutcome) -> Result<()> {
    let json = if cli.pretty {
        serde_json::to_string_pretty(outcome)?
    } else {
        serde_json::to_string(outcome)?
    };

    match &cli.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}
