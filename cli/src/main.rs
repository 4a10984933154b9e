//! `pinner`: one garbage-collection run against one IPFS node.
//!
//! Meant to be invoked periodically by an external scheduler. Exits 0 when
//! the run completed (unpin failures included, they are retried next time)
//! or when a previous invocation still holds the ledger; exits 1 otherwise.

use clap::Parser;
use pinner_core::ipfs::IpfsNode;
use pinner_core::registry::EthRegistry;
use pinner_core::types::PinnerConfig;
use pinner_core::{Pinner, PinnerError};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::SystemTime;
use tracing::{Level, error, info};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

#[derive(Parser, Debug)]
#[command(
    name = "pinner",
    about = "Unpins content from an IPFS node once its grace period expires, \
             unless an Origin listing references it."
)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Overrides `log_level` from the configuration file
    #[arg(long)]
    log_level: Option<Level>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match PinnerConfig::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!(
                "Error reading configuration file {}: {}",
                args.config.display(),
                err
            );
            return ExitCode::FAILURE;
        }
    };

    let problems = config.validate();
    if !problems.is_empty() {
        for problem in problems {
            eprintln!("Invalid configuration: {}", problem);
        }
        return ExitCode::FAILURE;
    }

    if let Err(err) = init_logging(&config, args.log_level) {
        eprintln!("Error opening log file: {}", err);
        return ExitCode::FAILURE;
    }

    info!("### pinner run started ###");
    info!("config: {:?}", config);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(PinnerError::RunInProgress) => {
            info!("previous invocation of pinner still running, nothing to do");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("pinner run failed: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &PinnerConfig) -> Result<(), PinnerError> {
    let mut pinner = Pinner::from_config(config)?;
    let registry = EthRegistry::from_config(config);
    let node = IpfsNode::from_config(config);

    let outcome = pinner.run(&registry, &node, SystemTime::now())?;

    for failure in &outcome.eviction_failures {
        error!("unpin of {} deferred to next run: {}", failure.hash, failure.error);
    }

    Ok(())
}

/// Logs to stdout, and also to `log_file` when one is configured.
fn init_logging(config: &PinnerConfig, level_override: Option<Level>) -> std::io::Result<()> {
    // Already validated.
    let level = level_override
        .or_else(|| config.log_level.parse().ok())
        .unwrap_or(Level::INFO);

    let writer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(std::io::stdout.and(Mutex::new(file)))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(config.log_file.is_none())
        .with_writer(writer)
        .init();

    Ok(())
}
