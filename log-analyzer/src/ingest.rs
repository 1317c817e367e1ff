use std::{
    borrow::Cow,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use flate2::read::MultiGzDecoder;
use num_format::{Locale, ToFormattedString};
use tracing::{debug, info, trace};

use crate::{
    config::LogEncoding,
    error::AnalyzerError,
    models::{Compression, ParsedRecord},
    parser::LinePattern,
};

/// Maximum tolerated share of non-matching lines, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorBudget(f64);

impl ErrorBudget {
    pub fn percent(allowed: f64) -> Self {
        Self(allowed)
    }

    pub fn allowed_percent(&self) -> f64 {
        self.0
    }

    /// Compared as `failed * 100 > allowed * total` so that a ratio sitting
    /// exactly on the budget never fails through float rounding.
    pub fn is_exceeded_by(&self, summary: &ParseSummary) -> bool {
        let failed = summary.total - summary.processed;
        failed as f64 * 100.0 > self.0 * summary.total as f64
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseSummary {
    pub total: u64,
    pub processed: u64,
}

impl ParseSummary {
    pub fn error_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            1.0 - self.processed as f64 / self.total as f64
        }
    }
}

/// Lazy, single-pass sequence of parsed records read from one log source.
///
/// The source is closed as soon as it is exhausted, on the first I/O error, or
/// when the stream is dropped early. After the last line the error budget is
/// checked and, if exceeded, yielded as a final `Err`.
pub struct LogStream<'p> {
    source: PathBuf,
    reader: Option<Box<dyn BufRead>>,
    pattern: &'p LinePattern,
    encoding: LogEncoding,
    budget: ErrorBudget,
    buf: Vec<u8>,
    summary: ParseSummary,
}

impl<'p> LogStream<'p> {
    pub fn open(
        path: &Path,
        compression: Compression,
        pattern: &'p LinePattern,
        encoding: LogEncoding,
        budget: ErrorBudget,
    ) -> Result<Self, AnalyzerError> {
        let file = File::open(path).map_err(AnalyzerError::io("failed to open log", path))?;
        let reader: Box<dyn BufRead> = match compression {
            Compression::Gzip => Box::new(BufReader::new(MultiGzDecoder::new(file))),
            Compression::None => Box::new(BufReader::new(file)),
        };
        debug!(path = %path.display(), ?compression, "opened log");
        Ok(Self::from_reader(path, reader, pattern, encoding, budget))
    }

    pub fn from_reader(
        source: impl Into<PathBuf>,
        reader: Box<dyn BufRead>,
        pattern: &'p LinePattern,
        encoding: LogEncoding,
        budget: ErrorBudget,
    ) -> Self {
        Self {
            source: source.into(),
            reader: Some(reader),
            pattern,
            encoding,
            budget,
            buf: Vec::new(),
            summary: ParseSummary::default(),
        }
    }

    /// Counters so far; final once the stream has returned `None`.
    pub fn summary(&self) -> ParseSummary {
        self.summary
    }

    fn decode<'b>(&self, bytes: &'b [u8]) -> Cow<'b, str> {
        match self.encoding {
            LogEncoding::Utf8 => String::from_utf8_lossy(bytes),
        }
    }

    fn finish(&mut self) -> Option<Result<ParsedRecord, AnalyzerError>> {
        self.reader = None;
        let ParseSummary { total, processed } = self.summary;
        info!(
            "processed {} of {} lines",
            processed.to_formatted_string(&Locale::en),
            total.to_formatted_string(&Locale::en)
        );
        if self.budget.is_exceeded_by(&self.summary) {
            return Some(Err(AnalyzerError::ErrorBudgetExceeded {
                total,
                processed,
                allowed_percent: self.budget.allowed_percent(),
            }));
        }
        None
    }
}

impl Iterator for LogStream<'_> {
    type Item = Result<ParsedRecord, AnalyzerError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let reader = self.reader.as_mut()?;
            self.buf.clear();
            match reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return self.finish(),
                Ok(_) => {}
                Err(source) => {
                    self.reader = None;
                    return Some(Err(AnalyzerError::Io {
                        context: "failed to read log",
                        path: self.source.clone(),
                        source,
                    }));
                }
            }
            let end = self
                .buf
                .strip_suffix(b"\n")
                .map(|b| b.strip_suffix(b"\r").unwrap_or(b))
                .map_or(self.buf.len(), <[u8]>::len);

            self.summary.total += 1;
            let line_number = self.summary.total;
            let parsed = {
                let line = self.decode(&self.buf[..end]);
                self.pattern.parse_line(&line)
            };
            match parsed {
                Some(fields) => {
                    self.summary.processed += 1;
                    return Some(Ok(ParsedRecord {
                        line_number,
                        fields,
                    }));
                }
                None => trace!(line = line_number, "line does not match pattern"),
            }
        }
    }
}
