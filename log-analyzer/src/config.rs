use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{error::ConfigError, parser::LinePattern};

// nginx `log_format ui_short`:
// $remote_addr $remote_user $http_x_real_ip [$time_local] "$request" $status $body_bytes_sent
// "$http_referer" "$http_user_agent" "$http_x_forwarded_for" "$http_X_REQUEST_ID" "$http_X_RB_USER"
// $request_time
const UI_SHORT_PATTERN: &str = concat!(
    r#"(?P<remote_addr>\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\s+"#,
    r#"(?P<remote_user>\-|.*)\s+(?P<http_x_real_ip>\-|.*)\s+"#,
    r#"\[(?P<time_local>\d{2}/[a-zA-Z]{3}/\d{4}:\d{2}:\d{2}:\d{2}\s+"#,
    r#"(?P<offset_tz>(?P<offset_dir>\+|\-)(?P<offset_hour>\d{2})(?P<offset_min>\d{2})))\]\s+"#,
    r#"(?P<request>"(?P<method>GET|POST|PUT|UPDATE|DELETE|HEAD|OPTIONS)\s+(?P<url>.+)\s+"#,
    r#"(?P<http_version>HTTP/1\.[0-1])")\s+(?P<status>\d{3})\s+(?P<body_bytes_sent>\d+)\s+"#,
    r#""(?P<http_referer>.+)"\s+"(?P<http_user_agent>.+)"\s+"(?P<http_x_forwarded_for>\-|.*)"\s+"#,
    r#""(?P<http_X_REQUEST_ID>.+)"\s+"(?P<http_X_RB_USER>\-|.*)"\s+(?P<request_time>.+)"#,
);

pub const TEMPLATE_FILE: &str = "report.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LogEncoding {
    #[serde(rename = "utf-8", alias = "utf8", alias = "UTF-8", alias = "UTF8")]
    Utf8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub report_size: usize,
    pub report_dir: PathBuf,
    pub log_dir: PathBuf,
    pub self_log_dir: Option<PathBuf>,
    pub template_dir: PathBuf,
    pub log_pattern: String,
    pub endpoint_field: String,
    pub elapsed_field: String,
    pub allowed_errors_percent: f64,
    pub allowed_extensions: Vec<String>,
    pub log_encoding: LogEncoding,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            report_size: 1000,
            report_dir: "./reports".into(),
            log_dir: "./log".into(),
            self_log_dir: None,
            template_dir: "./resources".into(),
            log_pattern: UI_SHORT_PATTERN.into(),
            endpoint_field: "url".into(),
            elapsed_field: "request_time".into(),
            allowed_errors_percent: 15.0,
            allowed_extensions: vec![String::new(), ".gz".into()],
            log_encoding: LogEncoding::Utf8,
            log_level: "info".into(),
        }
    }
}

impl Config {
    /// Defaults, overridden by whatever keys the file at `path` sets.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.allowed_errors_percent) {
            return Err(ConfigError::ErrorBudget(self.allowed_errors_percent));
        }
        self.line_pattern().map(|_| ())
    }

    /// Compiles `log_pattern` and checks it captures both required fields.
    pub fn line_pattern(&self) -> Result<LinePattern, ConfigError> {
        let pattern = LinePattern::new(&self.log_pattern)?;
        for (key, field) in [
            ("endpoint_field", &self.endpoint_field),
            ("elapsed_field", &self.elapsed_field),
        ] {
            if !pattern.has_field(field) {
                return Err(ConfigError::MissingField {
                    key,
                    field: field.clone(),
                });
            }
        }
        Ok(pattern)
    }

    pub fn template_path(&self) -> PathBuf {
        self.template_dir.join(TEMPLATE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asserting::prelude::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_that!(config.validate().is_ok()).is_true();
        assert_that!(config.allowed_extensions).is_equal_to(vec![String::new(), ".gz".to_string()]);
    }

    #[test]
    fn file_overrides_only_named_keys() {
        let config = Config::from_toml(
            r#"
            allowed_errors_percent = 25
            log_pattern = '(?P<method>GET|POST)\s+(?P<url>.+)\s+HTTP/1.[0-1].+\s+(?P<request_time>\d+.\d+)$'
            "#,
        )
        .unwrap();
        assert_eq!(config.allowed_errors_percent, 25.0);
        assert_that!(config.report_size).is_equal_to(1000);
        assert_that!(config.validate().is_ok()).is_true();
        assert_that!(config.log_dir).is_equal_to(PathBuf::from("./log"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert_that!(Config::from_toml("report_sise = 10").is_err()).is_true();
    }

    #[test]
    fn only_utf8_is_accepted() {
        let config = Config::from_toml(r#"log_encoding = "UTF-8""#).unwrap();
        assert_that!(config.log_encoding).is_equal_to(LogEncoding::Utf8);
        assert_that!(Config::from_toml(r#"log_encoding = "cp1251""#).is_err()).is_true();
    }

    #[test]
    fn pattern_must_capture_required_fields() {
        let config = Config {
            log_pattern: r"(?P<path>\S+) (?P<request_time>\S+)".into(),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert_that!(matches!(err, ConfigError::MissingField { key: "endpoint_field", .. })).is_true();
    }

    #[test]
    fn error_budget_must_be_a_percentage() {
        let config = Config {
            allowed_errors_percent: 101.0,
            ..Config::default()
        };
        assert_that!(matches!(config.validate(), Err(ConfigError::ErrorBudget(_)))).is_true();
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.toml")));
        assert_that!(matches!(result, Err(ConfigError::ReadFile { .. }))).is_true();
    }

    #[test]
    fn load_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "report_size = 5\nallowed_extensions = [\".gz\"]").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_that!(config.report_size).is_equal_to(5);
        assert_that!(config.allowed_extensions).is_equal_to(vec![".gz".to_string()]);
    }
}
