use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
};

use tracing::{debug, trace};

use crate::{
    error::AnalyzerError,
    invariants::{Elapsed, Endpoint},
    models::{ParsedRecord, ReportRow},
};

/// Neumaier-compensated running sum.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

/// Exact running median over every sample seen.
///
/// `lower` is a max-heap holding the smaller half, `upper` a min-heap holding
/// the larger half; `lower` has the same length as `upper` or one more.
#[derive(Debug, Default, Clone)]
pub struct RunningMedian {
    lower: BinaryHeap<Elapsed>,
    upper: BinaryHeap<Reverse<Elapsed>>,
}

impl RunningMedian {
    pub fn push(&mut self, value: Elapsed) {
        match self.lower.peek() {
            Some(top) if value > *top => self.upper.push(Reverse(value)),
            _ => self.lower.push(value),
        }
        if self.lower.len() > self.upper.len() + 1 {
            if let Some(moved) = self.lower.pop() {
                self.upper.push(Reverse(moved));
            }
        } else if self.upper.len() > self.lower.len() {
            if let Some(Reverse(moved)) = self.upper.pop() {
                self.lower.push(moved);
            }
        }
    }

    pub fn median(&self) -> Option<f64> {
        let low = self.lower.peek()?.seconds();
        if self.lower.len() > self.upper.len() {
            return Some(low);
        }
        let Reverse(high) = self.upper.peek()?;
        Some((low + high.seconds()) / 2.0)
    }
}

#[derive(Debug, Clone)]
pub struct EndpointStats {
    endpoint: Endpoint,
    count: u64,
    time_sum: CompensatedSum,
    time_max: f64,
    samples: RunningMedian,
}

impl EndpointStats {
    fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            count: 0,
            time_sum: CompensatedSum::default(),
            time_max: 0.0,
            samples: RunningMedian::default(),
        }
    }

    fn record(&mut self, elapsed: Elapsed) {
        let seconds = elapsed.seconds();
        self.count += 1;
        self.time_sum.add(seconds);
        self.time_max = self.time_max.max(seconds);
        self.samples.push(elapsed);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RunTotals {
    count: u64,
    time: CompensatedSum,
}

impl RunTotals {
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn time(&self) -> f64 {
        self.time.value()
    }
}

/// Names of the two captured fields aggregation depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFields {
    pub endpoint: String,
    pub elapsed: String,
}

/// Per-endpoint accumulators for a single run, kept in order of first
/// appearance.
#[derive(Debug)]
pub struct Analytics {
    fields: RecordFields,
    index: HashMap<Endpoint, usize>,
    endpoints: Vec<EndpointStats>,
    totals: RunTotals,
}

impl Analytics {
    pub fn new(fields: RecordFields) -> Self {
        Self {
            fields,
            index: HashMap::new(),
            endpoints: Vec::new(),
            totals: RunTotals::default(),
        }
    }

    pub fn record(&mut self, endpoint: Endpoint, elapsed: Elapsed) {
        let slot = match self.index.get(&endpoint) {
            Some(&slot) => slot,
            None => {
                let slot = self.endpoints.len();
                self.index.insert(endpoint.clone(), slot);
                self.endpoints.push(EndpointStats::new(endpoint));
                slot
            }
        };
        self.endpoints[slot].record(elapsed);
        self.totals.count += 1;
        self.totals.time.add(elapsed.seconds());
    }

    /// Coerces the required fields of `record` and folds it in.
    pub fn record_parsed(&mut self, record: &ParsedRecord) -> Result<(), AnalyzerError> {
        let line = record.line_number;
        let endpoint = Endpoint::from(required(record, &self.fields.endpoint)?);
        let elapsed = required(record, &self.fields.elapsed)?
            .parse::<Elapsed>()
            .map_err(|reason| AnalyzerError::MalformedElapsed { line, reason })?;
        trace!(line, %endpoint, %elapsed, "recorded");
        self.record(endpoint, elapsed);
        Ok(())
    }

    /// Drains `records`, stopping at the first error.
    pub fn consume<I>(&mut self, records: I) -> Result<u64, AnalyzerError>
    where
        I: IntoIterator<Item = Result<ParsedRecord, AnalyzerError>>,
    {
        let mut consumed = 0;
        for record in records {
            self.record_parsed(&record?)?;
            consumed += 1;
        }
        debug!(consumed, endpoints = self.endpoints.len(), "aggregation finished");
        Ok(consumed)
    }

    pub fn totals(&self) -> RunTotals {
        self.totals
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Summary rows in order of first appearance. Percentages are computed here,
    /// against the final totals, and left out when a total is zero.
    pub fn finalize(self) -> Vec<ReportRow> {
        let total_count = self.totals.count;
        let total_time = self.totals.time();
        self.endpoints
            .into_iter()
            .map(|stats| {
                let time_sum = stats.time_sum.value();
                ReportRow {
                    count_percent: percent(stats.count as f64, total_count as f64),
                    time_percent: percent(time_sum, total_time),
                    time_avg: time_sum / stats.count as f64,
                    time_max: stats.time_max,
                    time_median: stats.samples.median().unwrap_or_default(),
                    count: stats.count,
                    time_sum,
                    endpoint: stats.endpoint.into_string(),
                }
            })
            .collect()
    }
}

fn required<'r>(record: &'r ParsedRecord, field: &str) -> Result<&'r str, AnalyzerError> {
    record.field(field).ok_or_else(|| AnalyzerError::MissingField {
        line: record.line_number,
        field: field.to_string(),
    })
}

fn percent(part: f64, total: f64) -> Option<f64> {
    (total > 0.0).then(|| part * 100.0 / total)
}
