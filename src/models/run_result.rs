//! Failure aggregation for a run
//!
//! Defines recorded failures, per-suite counters and the run-wide result.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::descriptor::TestDescriptor;
use super::error::TestError;

/// One recorded failure
#[derive(Clone, Debug)]
pub struct Failure {
    pub suite: String,
    pub descriptor: TestDescriptor,
    pub error: TestError,
}

impl Failure {
    pub fn new(suite: impl Into<String>, descriptor: TestDescriptor, error: TestError) -> Self {
        Self {
            suite: suite.into(),
            descriptor,
            error,
        }
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    /// `Suite:method()` header used by the detailed report
    pub fn location(&self) -> String {
        format!("{}:{}()", self.suite, self.descriptor.name)
    }

    /// Full cause chain
    pub fn detail(&self) -> String {
        self.error.detail()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}() [X] {}", self.descriptor.display(), self.error)
    }
}

/// Per-suite test counters
#[derive(Clone, Debug, Default, Serialize)]
pub struct SuiteStats {
    pub name: String,
    pub tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

/// Ordered failures of a whole run
#[derive(Clone, Debug)]
pub struct RunResult {
    failures: Vec<Failure>,
    suites: Vec<SuiteStats>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl RunResult {
    pub fn new() -> Self {
        Self {
            failures: Vec::new(),
            suites: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn add_failure(&mut self, failure: Failure) {
        self.failures.push(failure);
    }

    pub fn record_suite(&mut self, stats: SuiteStats) {
        self.suites.push(stats);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Failures in completion order
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn suites(&self) -> &[SuiteStats] {
        &self.suites
    }

    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total_tests(&self) -> usize {
        self.suites.iter().map(|s| s.tests).sum()
    }

    pub fn passed_tests(&self) -> usize {
        self.suites.iter().map(|s| s.passed).sum()
    }

    pub fn duration_ms(&self) -> u64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds().max(0) as u64
    }

    /// Serializable snapshot for machine-readable output
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            started_at: self.started_at,
            finished_at: self.finished_at,
            duration_ms: self.duration_ms(),
            succeeded: self.succeeded(),
            tests: self.total_tests(),
            passed: self.passed_tests(),
            failures: self
                .failures
                .iter()
                .map(|f| FailureRecord {
                    suite: f.suite.clone(),
                    test: f.descriptor.name.clone(),
                    display_name: f.descriptor.display().to_string(),
                    message: f.message(),
                    detail: f.detail(),
                })
                .collect(),
            suites: self.suites.clone(),
        }
    }
}

impl Default for RunResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable view of one failure
#[derive(Clone, Debug, Serialize)]
pub struct FailureRecord {
    pub suite: String,
    pub test: String,
    pub display_name: String,
    pub message: String,
    pub detail: String,
}

/// Serializable view of a run
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
    pub succeeded: bool,
    pub tests: usize,
    pub passed: usize,
    pub suites: Vec<SuiteStats>,
    pub failures: Vec<FailureRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn failure(name: &str, msg: &str) -> Failure {
        Failure::new(
            "CalculatorSuite",
            TestDescriptor::new(name, Role::Test),
            TestError::Failed(msg.into()),
        )
    }

    #[test]
    fn test_empty_result_succeeds() {
        let result = RunResult::new();
        assert!(result.succeeded());
        assert!(result.failures().is_empty());
    }

    #[test]
    fn test_failures_keep_insertion_order() {
        let mut result = RunResult::new();
        result.add_failure(failure("b", "second"));
        result.add_failure(failure("a", "first"));

        assert!(!result.succeeded());
        let names: Vec<_> = result
            .failures()
            .iter()
            .map(|f| f.descriptor.name.as_str())
            .collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn test_failure_display() {
        let f = failure("add", "expected: <3> but was: <5>");
        assert_eq!(f.to_string(), "add() [X] expected: <3> but was: <5>");
        assert_eq!(f.location(), "CalculatorSuite:add()");
    }

    #[test]
    fn test_summary_counts() {
        let mut result = RunResult::new();
        result.record_suite(SuiteStats {
            name: "A".into(),
            tests: 3,
            passed: 2,
            failed: 1,
            duration_ms: 5,
        });
        result.add_failure(failure("x", "boom"));
        result.finish();

        let summary = result.summary();
        assert_eq!(summary.tests, 3);
        assert_eq!(summary.passed, 2);
        assert!(!summary.succeeded);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].message, "boom");
    }
}
