use std::path::PathBuf;

use num_format::{Locale, ToFormattedString};
use tracing::info;

use crate::{
    analytics::{Analytics, RecordFields},
    config::Config,
    error::AnalyzerError,
    ingest::{ErrorBudget, LogStream},
    invariants::LogDate,
    locate::find_latest_log,
    models::LogFileDescriptor,
    ranking::{to_table_json, top_by_time_sum},
    report::{ReportTemplate, already_reported, report_path, write_atomically},
};

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    NoLogFound,
    AlreadyReported { date: LogDate, report: PathBuf },
    /// The log had no lines matching the pattern, so there is nothing to rank.
    NothingToReport { log: PathBuf },
    Rendered { report: PathBuf, rows: usize },
}

/// Runs the whole analysis once against `config`. Nothing is written unless
/// every stage before rendering succeeded.
pub fn run(config: &Config) -> Result<RunOutcome, AnalyzerError> {
    let Some(log) = find_latest_log(&config.log_dir, &config.allowed_extensions)? else {
        info!(dir = %config.log_dir.display(), "no log file found");
        return Ok(RunOutcome::NoLogFound);
    };
    info!(stage = "located", log = %log.relative_path.display(), date = %log.date);

    let report = report_path(&config.report_dir, log.date);
    if already_reported(&config.report_dir, log.date) {
        info!(stage = "skipped", report = %report.display(), "report already exists");
        return Ok(RunOutcome::AlreadyReported {
            date: log.date,
            report,
        });
    }

    analyze(config, &log, report)
}

fn analyze(
    config: &Config,
    log: &LogFileDescriptor,
    report: PathBuf,
) -> Result<RunOutcome, AnalyzerError> {
    // template problems surface before the log is read
    let template = ReportTemplate::load(&config.template_path())?;
    let pattern = config.line_pattern()?;

    let log_path = log.path_in(&config.log_dir);
    info!(stage = "parsing", path = %log_path.display());
    let mut stream = LogStream::open(
        &log_path,
        log.compression(),
        &pattern,
        config.log_encoding,
        ErrorBudget::percent(config.allowed_errors_percent),
    )?;

    let mut analytics = Analytics::new(RecordFields {
        endpoint: config.endpoint_field.clone(),
        elapsed: config.elapsed_field.clone(),
    });
    info!(stage = "aggregating");
    analytics.consume(&mut stream)?;
    let summary = stream.summary();
    drop(stream);

    if analytics.is_empty() {
        info!(
            total = summary.total,
            "no parsed records in {}, nothing to report",
            log_path.display()
        );
        return Ok(RunOutcome::NothingToReport { log: log_path });
    }

    let totals = analytics.totals();
    let rows = top_by_time_sum(analytics.finalize(), config.report_size);
    info!(
        stage = "ranked",
        rows = rows.len(),
        requests = %totals.count().to_formatted_string(&Locale::en),
        error_ratio = summary.error_ratio()
    );

    let html = template.render(&to_table_json(&rows)?);
    write_atomically(&report, &html)?;
    info!(stage = "rendered", report = %report.display());
    Ok(RunOutcome::Rendered {
        report,
        rows: rows.len(),
    })
}
