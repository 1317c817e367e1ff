use std::{cmp::Ordering, str::FromStr};

use chrono::NaiveDate;
use derive_more::{AsRef, Debug, Display};

/// Request path used as the grouping key for aggregated statistics.
#[derive(Debug, Display, AsRef, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for Endpoint {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.into()))
    }
}

/// Calendar date embedded in a rotated log file name (`YYYYMMDD`).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("{}", _0.format("%Y%m%d"))]
pub struct LogDate(NaiveDate);

impl LogDate {
    /// Date as it appears in report file names, e.g. `2017.06.30`.
    pub fn report_stamp(&self) -> String {
        self.0.format("%Y.%m.%d").to_string()
    }
}

impl From<NaiveDate> for LogDate {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl FromStr for LogDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("expected 8 digits, got {s:?}"));
        }
        NaiveDate::parse_from_str(s, "%Y%m%d")
            .map(Self)
            .map_err(|e| format!("{s:?} is not a calendar date: {e}"))
    }
}

/// Request time in seconds. Always finite and non-negative, which makes the
/// total order below agree with the numeric one.
#[derive(Debug, Display, Clone, Copy, PartialEq)]
pub struct Elapsed(f64);

impl Elapsed {
    pub fn seconds(self) -> f64 {
        self.0
    }
}

impl Eq for Elapsed {}

impl PartialOrd for Elapsed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Elapsed {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl TryFrom<f64> for Elapsed {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.is_finite() && value >= 0.0 {
            // normalizes -0.0
            Ok(Self(value.abs()))
        } else {
            Err(format!("{value} is not a non-negative finite number"))
        }
    }
}

impl FromStr for Elapsed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|e| format!("{s:?} is not a number: {e}"))?;
        Self::try_from(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asserting::prelude::*;

    #[test]
    fn log_date_parses_eight_digit_dates() {
        let date: LogDate = "20170630".parse().unwrap();
        assert_that!(date.report_stamp()).is_equal_to("2017.06.30".to_string());
        assert_that!(date.to_string()).is_equal_to("20170630".to_string());
    }

    #[test]
    fn log_date_rejects_impossible_dates() {
        assert_that!("20171345".parse::<LogDate>().is_err()).is_true();
        assert_that!("2017063".parse::<LogDate>().is_err()).is_true();
        assert_that!("2017-6-30".parse::<LogDate>().is_err()).is_true();
    }

    #[test]
    fn elapsed_accepts_non_negative_numbers() {
        assert_eq!("0.390".parse::<Elapsed>().unwrap().seconds(), 0.39);
        assert_eq!(" 1 ".parse::<Elapsed>().unwrap().seconds(), 1.0);
        assert_eq!("-0".parse::<Elapsed>().unwrap().seconds().to_bits(), 0f64.to_bits());
    }

    #[test]
    fn elapsed_rejects_garbage() {
        for raw in ["-", "", "-0.1", "NaN", "inf", "0.1s"] {
            assert_that!(raw.parse::<Elapsed>().is_err()).is_true();
        }
    }

    #[test]
    fn elapsed_orders_numerically() {
        let mut values: Vec<Elapsed> = ["0.3", "0.01", "2", "0.2"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        values.sort();
        let seconds: Vec<f64> = values.into_iter().map(Elapsed::seconds).collect();
        assert_that!(seconds).is_equal_to(vec![0.01, 0.2, 0.3, 2.0]);
    }
}
