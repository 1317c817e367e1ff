mod analytics;
mod config;
mod error;
mod ingest;
mod invariants;
mod locate;
mod logging;
mod models;
mod parser;
mod pipeline;
mod ranking;
mod report;

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use config::Config;
use pipeline::{RunOutcome, run};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(version, about = "Builds an HTML latency report from the newest access log", long_about = None)]
struct Args {
    /// TOML file overriding the built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_default();
            error!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init(&config) {
        logging::init_default();
        error!("{e}");
        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(outcome) => {
            match outcome {
                RunOutcome::Rendered { report, rows } => {
                    info!(rows, "report saved to {}", report.display())
                }
                RunOutcome::NoLogFound => info!("nothing new to analyze"),
                RunOutcome::AlreadyReported { date, report } => {
                    info!(%date, "already analyzed, see {}", report.display())
                }
                RunOutcome::NothingToReport { log } => {
                    info!("{} contains no parsable requests", log.display())
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(stage = "failed", "{e}");
            ExitCode::FAILURE
        }
    }
}
