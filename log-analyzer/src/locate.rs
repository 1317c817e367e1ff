use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use tracing::{debug, trace};

use crate::{error::AnalyzerError, invariants::LogDate, models::LogFileDescriptor};

// <service>-access-ui.log-YYYYMMDD[<extension>]
static LOG_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.+-access-ui\.log-(?P<date>\d{8})(?P<ext>.*)$").expect("valid log name regex")
});

/// Describes `file_name` if it follows the rotated log naming convention.
/// The extension is not checked against any allowed set here.
pub fn describe(file_name: &str) -> Option<LogFileDescriptor> {
    let caps = LOG_NAME.captures(file_name)?;
    let date: LogDate = caps["date"].parse().ok()?;
    Some(LogFileDescriptor {
        relative_path: PathBuf::from(file_name),
        date,
        extension: caps["ext"].to_string(),
    })
}

/// Newest log in `dir` (one level, no recursion) whose extension is listed in
/// `allowed_extensions`.
///
/// Two logs sharing a date are decided by the position of their extensions in
/// `allowed_extensions`, earlier wins. An absent directory yields `Ok(None)`.
pub fn find_latest_log(
    dir: &Path,
    allowed_extensions: &[String],
) -> Result<Option<LogFileDescriptor>, AnalyzerError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "log directory does not exist");
            return Ok(None);
        }
        Err(e) => return Err(AnalyzerError::io("failed to list log directory", dir)(e)),
    };

    let mut latest: Option<(LogFileDescriptor, usize)> = None;
    for entry in entries {
        let entry = entry.map_err(AnalyzerError::io("failed to list log directory", dir))?;
        // follows symlinks
        if !entry.path().is_file() {
            continue;
        }
        let Some(candidate) = entry.file_name().to_str().and_then(describe) else {
            continue;
        };
        let Some(preference) = allowed_extensions
            .iter()
            .position(|ext| *ext == candidate.extension)
        else {
            trace!(file = %candidate.relative_path.display(), "extension not allowed");
            continue;
        };
        // newer date first, then lower preference index
        let better = latest.as_ref().is_none_or(|(best, best_preference)| {
            (candidate.date, std::cmp::Reverse(preference))
                > (best.date, std::cmp::Reverse(*best_preference))
        });
        if better {
            latest = Some((candidate, preference));
        }
    }
    Ok(latest.map(|(descriptor, _)| descriptor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use asserting::prelude::*;

    fn allowed() -> Vec<String> {
        vec![String::new(), ".gz".into()]
    }

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), "").unwrap();
        }
    }

    #[test]
    fn describe_extracts_date_and_extension() {
        let descriptor = describe("nginx-access-ui.log-20170630.gz").unwrap();
        assert_that!(descriptor.date).is_equal_to("20170630".parse::<LogDate>().unwrap());
        assert_that!(descriptor.extension).is_equal_to(".gz".to_string());
        assert_that!(describe("nginx-access-ui.log-20170630").unwrap().extension).is_equal_to(String::new());
    }

    #[test]
    fn describe_rejects_foreign_names() {
        assert_that!(describe("nginx-access-ui.log-2017063")).is_none();
        assert_that!(describe("nginx-access-ui.log-20171332")).is_none();
        assert_that!(describe("nginx-error.log-20170630")).is_none();
        assert_that!(describe("report-2017.06.30.html")).is_none();
    }

    #[test]
    fn picks_newest_allowed_log() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &[
                "svc-access-ui.log-20170629",
                "svc-access-ui.log-20170630.gz",
                "svc-access-ui.log-20170701.bad",
            ],
        );
        let latest = find_latest_log(dir.path(), &allowed()).unwrap().unwrap();
        assert_that!(latest.relative_path).is_equal_to(PathBuf::from("svc-access-ui.log-20170630.gz"));
        assert_that!(latest.extension).is_equal_to(".gz".to_string());
    }

    #[test]
    fn same_date_prefers_earlier_listed_extension() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &["svc-access-ui.log-20170630.gz", "svc-access-ui.log-20170630"],
        );
        let latest = find_latest_log(dir.path(), &allowed()).unwrap().unwrap();
        assert_that!(latest.extension).is_equal_to(String::new());

        let gz_first = vec![".gz".to_string(), String::new()];
        let latest = find_latest_log(dir.path(), &gz_first).unwrap().unwrap();
        assert_that!(latest.extension).is_equal_to(".gz".to_string());
    }

    #[test]
    fn ignores_directories_and_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("svc-access-ui.log-20180101");
        fs::create_dir(&nested).unwrap();
        touch(&nested, &["svc-access-ui.log-20190101"]);
        touch(dir.path(), &["svc-access-ui.log-20170101"]);

        let latest = find_latest_log(dir.path(), &allowed()).unwrap().unwrap();
        assert_that!(latest.relative_path).is_equal_to(PathBuf::from("svc-access-ui.log-20170101"));
    }

    #[test]
    fn empty_or_absent_directory_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_that!(find_latest_log(dir.path(), &allowed()).unwrap()).is_none();
        assert_that!(find_latest_log(&dir.path().join("absent"), &allowed()).unwrap()).is_none();
        touch(dir.path(), &["svc-access-ui.log-20170701.bz2", "notes.txt"]);
        assert_that!(find_latest_log(dir.path(), &allowed()).unwrap()).is_none();
    }

    #[cfg(unix)]
    #[test]
    fn follows_symlinked_logs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("rotated");
        fs::write(&target, "").unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("svc-access-ui.log-20170630")).unwrap();

        let latest = find_latest_log(dir.path(), &allowed()).unwrap().unwrap();
        assert_that!(latest.relative_path).is_equal_to(PathBuf::from("svc-access-ui.log-20170630"));
    }
}
