//! MOT Tracker entry point
//!
//! Runs a headless session: the autopilot answers, frames go to the log and
//! responses go to a CSV file in the output directory.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;

use mot_tracker::persistence::log_file_name;
use mot_tracker::platform::{Autopilot, LogRenderer, RealtimeClock, TickClock, UnpacedClock};
use mot_tracker::{CsvSink, ExperimentConfig, ExperimentSession, SessionInfo, SessionOutcome};

/// Multiple object tracking task runner
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// participant identifier, used in the log file name
    #[arg(short, long)]
    participant: String,

    /// observer identifier, used in the log file name
    #[arg(short, long)]
    observer: String,

    /// JSON experiment config (defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// directory for the response log
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// RNG seed, overrides the config
    #[arg(long)]
    seed: Option<u64>,

    /// pace ticks to the wall clock
    #[arg(long)]
    realtime: bool,

    /// seconds the autopilot waits before answering
    #[arg(long, default_value_t = 1.0)]
    think_secs: f64,

    /// chance per trial that the autopilot picks one wrong object
    #[arg(long, default_value_t = 0.0)]
    error_rate: f64,

    /// debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    log::info!("MOT Tracker starting...");

    match run(cli) {
        Ok(SessionOutcome::Completed) => ExitCode::SUCCESS,
        Ok(SessionOutcome::Aborted) => {
            log::warn!("Session aborted before completion");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> mot_tracker::Result<SessionOutcome> {
    let mut config = match &cli.config {
        Some(path) => ExperimentConfig::load(path)?,
        None => ExperimentConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config.validate()?;

    let info = SessionInfo {
        participant: cli.participant,
        observer: cli.observer,
    };
    let path = cli.output_dir.join(log_file_name(&info, Local::now().naive_local()));
    let sink = CsvSink::create(&path)?;

    let think_ticks = (cli.think_secs.max(0.0) * config.tick_rate as f64).round() as u32;
    let autopilot = Autopilot::new(config.num_targets, config.seed.unwrap_or_else(rand::random))
        .with_think_ticks(think_ticks)
        .with_error_rate(cli.error_rate);
    let renderer = LogRenderer::new(&config);

    if cli.realtime {
        run_session(&config, autopilot, renderer, sink, RealtimeClock::new(config.tick_rate))
    } else {
        run_session(&config, autopilot, renderer, sink, UnpacedClock::new(config.tick_rate))
    }
}

fn run_session<C: TickClock>(
    config: &ExperimentConfig,
    autopilot: Autopilot,
    renderer: LogRenderer,
    sink: CsvSink,
    clock: C,
) -> mot_tracker::Result<SessionOutcome> {
    let mut session = ExperimentSession::new(config, autopilot, renderer, sink, clock);
    let summary = session.run()?;
    log::info!(
        "{} of {} real trials recorded",
        summary.records_written,
        config.real_trials
    );
    Ok(summary.outcome)
}
