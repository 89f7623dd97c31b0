#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays cooking-trial sessions headlessly.

mod config;
mod hud;
mod scenario;
mod session;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use cooking_trial_core::SessionType;
use cooking_trial_system_intervention_log::{CsvFileSink, InterventionLogger};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{config::ExperimentConfig, hud::TracingHud, scenario::Scenario, session::Session};

#[derive(Debug, Parser)]
#[command(
    name = "cooking-trial",
    about = "Replays a scripted cooking-trial session and records trial summaries"
)]
struct Cli {
    /// Experiment TOML file with [simulation], [automation], [logging] and [arms] sections.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Scenario TOML file; the built-in demo is replayed when omitted.
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// CSV file receiving one row per trial.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Participant identifier written to every row.
    #[arg(long)]
    participant: Option<String>,
    /// Experimental condition written to every row.
    #[arg(long, value_enum)]
    session_type: Option<SessionTypeArg>,
    /// Simulated frame length in milliseconds.
    #[arg(long, default_value_t = 20)]
    frame_ms: u64,
    /// Skip writing trial summaries.
    #[arg(long)]
    no_summary: bool,
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SessionTypeArg {
    Manual,
    Request,
    Auto,
}

impl From<SessionTypeArg> for SessionType {
    fn from(value: SessionTypeArg) -> Self {
        match value {
            SessionTypeArg::Manual => SessionType::Manual,
            SessionTypeArg::Request => SessionType::Request,
            SessionTypeArg::Auto => SessionType::Auto,
        }
    }
}

/// Entry point for the cooking-trial command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut experiment = match &cli.config {
        Some(path) => ExperimentConfig::load(path)?,
        None => ExperimentConfig::default(),
    };
    if let Some(output) = cli.output {
        experiment.logging.output = output;
    }
    if let Some(participant) = cli.participant {
        experiment.logging.participant_id = participant;
    }
    if let Some(session_type) = cli.session_type {
        experiment.logging.session_type = session_type.into();
    }
    if cli.no_summary {
        experiment.logging.enabled = false;
    }

    let scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::demo()?,
    };
    let frame = frame_duration(cli.frame_ms)?;

    let logger = if experiment.logging.enabled {
        Some(InterventionLogger::new(
            experiment.logger_config()?,
            CsvFileSink::new(experiment.logging.output.clone()),
        ))
    } else {
        None
    };

    info!(
        phases = scenario.phases.len(),
        duration = ?scenario.total_duration(),
        frame = ?frame,
        summaries = logger.is_some(),
        "replaying session"
    );

    let mut session = Session::new(
        experiment.world_config()?,
        logger,
        experiment.arms_config(),
        frame,
    );
    let report = session.run(&scenario, &mut TracingHud::default())?;

    info!(
        frames = report.frames,
        started = report.trials_started,
        completed = report.trials_completed,
        ended = report.trials_ended,
        "session finished"
    );
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn frame_duration(frame_ms: u64) -> Result<Duration> {
    if frame_ms == 0 {
        bail!("--frame-ms must be positive");
    }
    Ok(Duration::from_millis(frame_ms))
}
