//! Check results and the aggregated report

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

pub mod render;

pub use render::{Rendered, Reporter};

/// Outcome category of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// The check ran and found nothing wrong
    Pass,
    /// The check ran and found a violation
    Fail,
    /// The check did not run (unknown, disabled, nothing to check)
    Skipped,
    /// The check could not run because of an infrastructure problem
    Errored,
}

impl CheckStatus {
    /// Whether this status makes the overall verdict a failure
    pub fn is_failure(self) -> bool {
        matches!(self, CheckStatus::Fail | CheckStatus::Errored)
    }

    pub fn label(self) -> &'static str {
        match self {
            CheckStatus::Pass => "passed",
            CheckStatus::Fail => "failed",
            CheckStatus::Skipped => "skipped",
            CheckStatus::Errored => "errored",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one hook occurrence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub messages: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl CheckResult {
    pub fn skipped(name: &str, message: impl Into<String>) -> Self {
        Self::without_run(name, CheckStatus::Skipped, message.into())
    }

    pub fn errored(name: &str, message: impl Into<String>) -> Self {
        Self::without_run(name, CheckStatus::Errored, message.into())
    }

    fn without_run(name: &str, status: CheckStatus, message: String) -> Self {
        Self {
            name: name.to_string(),
            status,
            messages: vec![message],
            warnings: Vec::new(),
            suggestions: Vec::new(),
            duration: Duration::ZERO,
        }
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Overall verdict of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Overall {
    Success,
    Failure,
}

/// Ordered results of a run with its verdict
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub results: Vec<CheckResult>,
    pub overall: Overall,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl Report {
    /// Seal the results, computing the verdict once
    pub fn new(results: Vec<CheckResult>, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> Self {
        let overall = Self::verdict(&results);
        Self {
            results,
            overall,
            started_at,
            finished_at,
        }
    }

    /// Failure iff any result failed or errored
    pub fn verdict(results: &[CheckResult]) -> Overall {
        if results.iter().any(|r| r.status.is_failure()) {
            Overall::Failure
        } else {
            Overall::Success
        }
    }

    pub fn is_success(&self) -> bool {
        self.overall == Overall::Success
    }

    pub fn count(&self, status: CheckStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Wall-clock time of the run
    pub fn total_duration(&self) -> Duration {
        (self.finished_at - self.started_at).to_std().unwrap_or_default()
    }

    /// Process exit status: 0 on success, 1 on failure
    pub fn exit_code(&self) -> i32 {
        match self.overall {
            Overall::Success => 0,
            Overall::Failure => 1,
        }
    }
}
