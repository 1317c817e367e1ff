use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid log pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("log pattern has no named group '{field}' (configured as {key})")]
    MissingField { key: &'static str, field: String },

    #[error("allowed_errors_percent must be within 0..=100, got {0}")]
    ErrorBudget(f64),
}

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{context} {path}: {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error budget exceeded: {processed} of {total} lines matched, {allowed_percent}% errors allowed")]
    ErrorBudgetExceeded {
        total: u64,
        processed: u64,
        allowed_percent: f64,
    },

    #[error("line {line}: field '{field}' is missing from the parsed record")]
    MissingField { line: u64, field: String },

    #[error("line {line}: malformed elapsed time: {reason}")]
    MalformedElapsed { line: u64, reason: String },

    #[error("template {path} has no '{placeholder}' placeholder")]
    MissingPlaceholder {
        path: PathBuf,
        placeholder: &'static str,
    },

    #[error("failed to serialize report rows: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl AnalyzerError {
    pub fn io(context: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io {
            context,
            path,
            source,
        }
    }
}
