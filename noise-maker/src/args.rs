use std::path::PathBuf;

use clap::Parser;
use derive_getters::Getters;

#[derive(Parser, Debug, Getters)]
#[command(name = "noise-maker")]
#[command(about = "Generate fake nginx ui_short access logs for testing", long_about = None)]
pub struct CliArgs {
    #[arg(long, default_value = "./log")]
    folder: PathBuf,

    #[arg(long, default_value = "nginx")]
    service: String,

    /// Date embedded in the file name, YYYYMMDD. Defaults to today.
    #[arg(long, value_parser = parse_date)]
    date: Option<String>,

    #[arg(long, default_value_t = 10_000)]
    lines: usize,

    /// Share of deliberately malformed lines, 0.0..=1.0
    #[arg(long, default_value_t = 0.0, value_parser = parse_fraction)]
    error_rate: f64,

    #[arg(long)]
    gzip: bool,

    /// Fixed seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_date(raw: &str) -> Result<String, String> {
    chrono::NaiveDate::parse_from_str(raw, "%Y%m%d")
        .ok()
        .filter(|_| raw.len() == 8)
        .map(|_| raw.to_string())
        .ok_or_else(|| format!("expected a YYYYMMDD date, got {raw:?}"))
}

fn parse_fraction(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e| format!("{raw:?}: {e}"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is outside 0.0..=1.0"))
    }
}
