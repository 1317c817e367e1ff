use std::{fs::OpenOptions, sync::Mutex};

use chrono::Local;
use tracing_subscriber::{EnvFilter, fmt, fmt::time::ChronoLocal};

use crate::{config::Config, error::AnalyzerError};

const TIMESTAMP_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Stderr logging at `info`, used until a config is available.
pub fn init_default() {
    fmt()
        .with_env_filter(filter("info"))
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Installs the process-wide subscriber. `RUST_LOG` takes precedence over
/// `log_level`; with `self_log_dir` set, output is appended to
/// `log_analyzer.log-YYYY-MM-DD` in that directory instead of stderr.
pub fn init(config: &Config) -> Result<(), AnalyzerError> {
    let builder = fmt()
        .with_env_filter(filter(&config.log_level))
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.into()))
        .with_target(false);

    match &config.self_log_dir {
        Some(dir) => {
            let path = dir.join(format!("log_analyzer.log-{}", Local::now().format("%Y-%m-%d")));
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(AnalyzerError::io("failed to open log file", &path))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}
