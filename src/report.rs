//! Turn an outcome into the single stdout line and exit code the scheduler reads.

use std::fmt;

use chrono::Utc;
use color_eyre::Report;

use crate::{Classification, QueryResult};

/// The one line a plugin prints, and the status it exits with.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginOutput {
    pub status: Classification,
    pub line: String,
}

impl PluginOutput {
    pub fn unknown(name: &str, message: impl fmt::Display) -> Self {
        Self {
            status: Classification::Unknown,
            line: format!("{name} {}: {message}", Classification::Unknown),
        }
    }

    pub fn exit(self) -> ! {
        println!("{}", self.line);
        std::process::exit(self.status.exit_code())
    }
}

pub trait Reporter {
    fn name(&self) -> &str;

    fn report(&self, classification: Classification, result: &QueryResult) -> PluginOutput;

    /// Any failure ends as `UNKNOWN` with the full error chain.
    fn report_error(&self, error: &Report) -> PluginOutput {
        PluginOutput::unknown(self.name(), format_args!("{error:#}"))
    }
}

#[derive(Debug, Clone)]
pub struct CheckReporter {
    name: String,
}

impl CheckReporter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Reporter for CheckReporter {
    fn name(&self) -> &str {
        &self.name
    }

    fn report(&self, classification: Classification, result: &QueryResult) -> PluginOutput {
        PluginOutput {
            status: classification,
            line: format!("{} {classification}: Results: {result}", self.name),
        }
    }
}

/// A graphite-style sample: `<scheme>.<metric> <value> <timestamp>`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub scheme: String,
    pub metric: String,
    pub value: f64,
    pub timestamp: i64,
}

impl MetricSample {
    pub fn now(scheme: &str, result: &QueryResult) -> Self {
        Self {
            scheme: scheme.to_owned(),
            metric: result.metric_name().to_owned(),
            value: result.value(),
            timestamp: Utc::now().timestamp(),
        }
    }
}

impl fmt::Display for MetricSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} {} {}",
            self.scheme, self.metric, self.value, self.timestamp
        )
    }
}

#[derive(Debug, Clone)]
pub struct MetricReporter {
    name: String,
    scheme: String,
}

impl MetricReporter {
    pub fn new(name: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scheme: scheme.into(),
        }
    }
}

impl Reporter for MetricReporter {
    fn name(&self) -> &str {
        &self.name
    }

    /// Metrics are never classified; emitting one is always `OK`.
    fn report(&self, _classification: Classification, result: &QueryResult) -> PluginOutput {
        PluginOutput {
            status: Classification::Ok,
            line: MetricSample::now(&self.scheme, result).to_string(),
        }
    }
}
