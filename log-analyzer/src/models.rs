use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::invariants::LogDate;

/// A rotated log discovered by the locator. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileDescriptor {
    pub relative_path: PathBuf,
    pub date: LogDate,
    pub extension: String,
}

impl LogFileDescriptor {
    pub fn path_in(&self, log_dir: &Path) -> PathBuf {
        log_dir.join(&self.relative_path)
    }

    pub fn compression(&self) -> Compression {
        match self.extension.as_str() {
            ".gz" => Compression::Gzip,
            _ => Compression::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
}

/// Named captures of one matching log line. Values stay raw strings; coercion
/// happens where a field is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub line_number: u64,
    pub fields: HashMap<String, String>,
}

impl ParsedRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// One finalized endpoint summary. Field order is the serialized column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub endpoint: String,
    pub count: u64,
    pub count_percent: Option<f64>,
    pub time_sum: f64,
    pub time_percent: Option<f64>,
    pub time_avg: f64,
    pub time_max: f64,
    pub time_median: f64,
}
