use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::Builder;
use tracing::debug;

use crate::{error::AnalyzerError, invariants::LogDate};

pub const PLACEHOLDER: &str = "$table_json";

/// `<report_dir>/report-YYYY.MM.DD.html`
pub fn report_path(report_dir: &Path, date: LogDate) -> PathBuf {
    report_dir.join(format!("report-{}.html", date.report_stamp()))
}

/// Whether anything already occupies the report path for `date`. A missing
/// report directory simply means nothing has been reported yet.
///
/// Not a lock: two concurrent runs can both see `false`.
pub fn already_reported(report_dir: &Path, date: LogDate) -> bool {
    report_path(report_dir, date).exists()
}

/// Static HTML page with a single `$table_json` placeholder.
#[derive(Debug, Clone)]
pub struct ReportTemplate {
    html: String,
}

impl ReportTemplate {
    pub fn load(path: &Path) -> Result<Self, AnalyzerError> {
        let html =
            fs::read_to_string(path).map_err(AnalyzerError::io("failed to read template", path))?;
        Self::from_html(html).map_err(|_| AnalyzerError::MissingPlaceholder {
            path: path.to_path_buf(),
            placeholder: PLACEHOLDER,
        })
    }

    /// Fails, handing the text back, when it has no placeholder.
    pub fn from_html(html: String) -> Result<Self, String> {
        if html.contains(PLACEHOLDER) {
            Ok(Self { html })
        } else {
            Err(html)
        }
    }

    /// Literal one-pass substitution of the first placeholder. The payload is
    /// inserted as-is and never scanned for placeholders itself.
    pub fn render(&self, table_json: &str) -> String {
        self.html.replacen(PLACEHOLDER, table_json, 1)
    }
}

/// Writes `contents` to `path` through a temporary file in the same
/// directory, so the report appears complete or not at all. On unix the
/// report is created world-readable, subject to the umask.
pub fn write_atomically(path: &Path, contents: &str) -> Result<(), AnalyzerError> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(AnalyzerError::io("failed to create report directory", dir))?;
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }
    let mut tmp = builder
        .tempfile_in(dir)
        .map_err(AnalyzerError::io("failed to create temporary report in", dir))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(AnalyzerError::io("failed to write report", tmp.path()))?;
    tmp.persist(path)
        .map_err(|e| AnalyzerError::io("failed to save report", path)(e.error))?;
    debug!(path = %path.display(), bytes = contents.len(), "report written");
    Ok(())
}
