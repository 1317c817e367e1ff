mod args;
mod generator;
mod stream;

use args::CliArgs;
use chrono::{Local, NaiveDate};
use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};
use stream::{LogSpec, write_log_file};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let date = match args.date() {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y%m%d")?,
        None => Local::now().date_naive(),
    };
    let spec = LogSpec {
        service: args.service().clone(),
        date,
        lines: *args.lines(),
        error_rate: *args.error_rate(),
        gzip: *args.gzip(),
    };
    let mut rng = match args.seed() {
        Some(seed) => StdRng::seed_from_u64(*seed),
        None => StdRng::from_os_rng(),
    };

    if let Err(e) = write_log_file(args.folder(), &spec, &mut rng) {
        error!("failed to write {}: {e}", spec.file_name());
        return Err(e);
    }
    Ok(())
}
