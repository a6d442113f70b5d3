//! crcsim - Entry Point
//!
//! Simulates a cohort and writes one JSON line per disease state change.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;

use crcsim::core::config::SimulationConfig;
use crcsim::core::error::Result;
use crcsim::core::types::PersonSpec;
use crcsim::population::{check_unique_ids, FailurePolicy, PopulationLog, PopulationRunner};

/// Colorectal cancer natural history and screening simulation
#[derive(Parser, Debug)]
#[command(name = "crcsim")]
#[command(about = "Simulate a cohort and write its disease state changes as JSON lines")]
struct Args {
    /// Random seed for the run
    #[arg(long)]
    seed: u64,

    /// Number of people to simulate
    #[arg(long)]
    npeople: u64,

    /// TOML parameter file (missing keys take default values)
    #[arg(long)]
    params: Option<PathBuf>,

    /// Age at which every person enters the simulation
    #[arg(long, default_value_t = 0.0)]
    entry_age: f64,

    /// Simulate people on all cores
    #[arg(long)]
    parallel: bool,

    /// Skip people whose simulation fails instead of aborting the run
    #[arg(long)]
    skip_failures: bool,

    /// Output file (stdout if omitted)
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("crcsim=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.params {
        Some(path) => SimulationConfig::from_toml_file(path)?,
        None => SimulationConfig::default(),
    };

    let people: Vec<PersonSpec> = (0..args.npeople)
        .map(|id| PersonSpec::new(id).with_entry_age(args.entry_age))
        .collect();
    check_unique_ids(&people)?;

    let policy = if args.skip_failures {
        FailurePolicy::SkipPerson
    } else {
        FailurePolicy::Abort
    };
    let runner = PopulationRunner::new(config, args.seed)?.with_policy(policy);

    let log = if args.parallel {
        runner.run_parallel(&people)?
    } else {
        runner.run(&people)?
    };

    match &args.out {
        Some(path) => write_state_changes(&log, BufWriter::new(File::create(path)?))?,
        None => write_state_changes(&log, BufWriter::new(io::stdout().lock()))?,
    }

    let summary = log.summary();
    tracing::info!(
        people = summary.people,
        skipped = summary.skipped,
        cancer_deaths = summary.cancer_deaths,
        other_deaths = summary.other_deaths,
        cures = summary.cures,
        tests = summary.tests_performed,
        mean_expected_lifespan = summary.mean_expected_lifespan,
        "summary"
    );

    Ok(())
}

fn write_state_changes(log: &PopulationLog, mut out: impl Write) -> Result<()> {
    for change in log.state_changes() {
        serde_json::to_writer(&mut out, change)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
