//! Live report of a run
//!
//! The engine emits events as tests finish. [`ConsoleReporter`] renders them
//! as a tree:
//!
//! ```text
//! '-- CalculatorSuite [OK]
//!   +-- testSubtract() [OK]
//!   +-- testAdd() [OK]
//!   |  +-- repetition 1 of 5 [OK]
//!   |  +-- repetition 2 of 5 [X] expected: <7> but was: <8>
//! ```

use serde::Serialize;
use std::io::{self, Write};
use tracing::debug;

use crate::models::{Outcome, TestDescriptor, TestError};

/// Outcome of a test or repetition as shown in reports
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum ReportOutcome {
    Ok,
    Failed(String),
}

impl ReportOutcome {
    pub fn from_outcome(outcome: &Outcome) -> Self {
        match outcome {
            Ok(()) => ReportOutcome::Ok,
            Err(error) => Self::from_error(error),
        }
    }

    pub fn from_error(error: &TestError) -> Self {
        ReportOutcome::Failed(error.to_string())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ReportOutcome::Ok)
    }
}

/// Receives run events in the order they happen
pub trait Reporter {
    fn suite_started(&mut self, suite: &str);

    fn test_completed(&mut self, descriptor: &TestDescriptor, outcome: &ReportOutcome);

    /// Emitted once before the first repetition of a repeated test
    fn repeated_test_started(&mut self, descriptor: &TestDescriptor);

    fn repetition_completed(
        &mut self,
        descriptor: &TestDescriptor,
        index: u32,
        total: u32,
        outcome: &ReportOutcome,
    );

    fn suite_finished(&mut self, suite: &str);
}

/// Tree-formatted report written to any output
pub struct ConsoleReporter<W: Write> {
    out: W,
    colorize: bool,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            colorize: false,
        }
    }

    pub fn colorize(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn status(&self, outcome: &ReportOutcome) -> String {
        match (outcome, self.colorize) {
            (ReportOutcome::Ok, true) => "\x1b[32m[OK]\x1b[0m".to_string(),
            (ReportOutcome::Ok, false) => "[OK]".to_string(),
            (ReportOutcome::Failed(msg), true) => format!("\x1b[31m[X]\x1b[0m {msg}"),
            (ReportOutcome::Failed(msg), false) => format!("[X] {msg}"),
        }
    }

    fn emit(&mut self, line: String) {
        if let Err(e) = writeln!(self.out, "{line}") {
            debug!("failed to write report line: {}", e);
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn suite_started(&mut self, suite: &str) {
        let status = self.status(&ReportOutcome::Ok);
        self.emit(format!("'-- {suite} {status}"));
    }

    fn test_completed(&mut self, descriptor: &TestDescriptor, outcome: &ReportOutcome) {
        let status = self.status(outcome);
        self.emit(format!("  +-- {descriptor} {status}"));
    }

    fn repeated_test_started(&mut self, descriptor: &TestDescriptor) {
        let status = self.status(&ReportOutcome::Ok);
        self.emit(format!("  +-- {descriptor} {status}"));
    }

    fn repetition_completed(
        &mut self,
        _descriptor: &TestDescriptor,
        index: u32,
        total: u32,
        outcome: &ReportOutcome,
    ) {
        let status = self.status(outcome);
        self.emit(format!("  |  +-- repetition {index} of {total} {status}"));
    }

    fn suite_finished(&mut self, _suite: &str) {
        if let Err(e) = self.out.flush() {
            debug!("failed to flush report: {}", e);
        }
    }
}

/// One recorded event
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReportEvent {
    SuiteStarted {
        suite: String,
    },
    TestCompleted {
        test: String,
        outcome: ReportOutcome,
    },
    RepeatedTestStarted {
        test: String,
    },
    RepetitionCompleted {
        test: String,
        index: u32,
        total: u32,
        outcome: ReportOutcome,
    },
    SuiteFinished {
        suite: String,
    },
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Vec<ReportEvent>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ReportEvent] {
        &self.events
    }

    /// Names of tests in the order their last result was reported
    pub fn completed_tests(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for event in &self.events {
            let name = match event {
                ReportEvent::TestCompleted { test, .. } => test.as_str(),
                ReportEvent::RepetitionCompleted {
                    test, index, total, ..
                } if index == total => test.as_str(),
                _ => continue,
            };
            names.push(name);
        }
        names
    }
}

impl Reporter for RecordingReporter {
    fn suite_started(&mut self, suite: &str) {
        self.events.push(ReportEvent::SuiteStarted {
            suite: suite.to_string(),
        });
    }

    fn test_completed(&mut self, descriptor: &TestDescriptor, outcome: &ReportOutcome) {
        self.events.push(ReportEvent::TestCompleted {
            test: descriptor.name.clone(),
            outcome: outcome.clone(),
        });
    }

    fn repeated_test_started(&mut self, descriptor: &TestDescriptor) {
        self.events.push(ReportEvent::RepeatedTestStarted {
            test: descriptor.name.clone(),
        });
    }

    fn repetition_completed(
        &mut self,
        descriptor: &TestDescriptor,
        index: u32,
        total: u32,
        outcome: &ReportOutcome,
    ) {
        self.events.push(ReportEvent::RepetitionCompleted {
            test: descriptor.name.clone(),
            index,
            total,
            outcome: outcome.clone(),
        });
    }

    fn suite_finished(&mut self, suite: &str) {
        self.events.push(ReportEvent::SuiteFinished {
            suite: suite.to_string(),
        });
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn suite_started(&mut self, _suite: &str) {}

    fn test_completed(&mut self, _descriptor: &TestDescriptor, _outcome: &ReportOutcome) {}

    fn repeated_test_started(&mut self, _descriptor: &TestDescriptor) {}

    fn repetition_completed(
        &mut self,
        _descriptor: &TestDescriptor,
        _index: u32,
        _total: u32,
        _outcome: &ReportOutcome,
    ) {
    }

    fn suite_finished(&mut self, _suite: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn render(f: impl FnOnce(&mut ConsoleReporter<Vec<u8>>)) -> String {
        let mut reporter = ConsoleReporter::new(Vec::new());
        f(&mut reporter);
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_console_tree_format() {
        let add = TestDescriptor::new("testAdd", Role::Test);
        let mut sub = TestDescriptor::new("testSubtractWithDescription", Role::Test);
        sub.display_name = Some("Display Name".into());

        let text = render(|r| {
            r.suite_started("CalculatorSuite");
            r.test_completed(&sub, &ReportOutcome::Failed("expected: <-1> but was: <-2>".into()));
            r.repeated_test_started(&add);
            r.repetition_completed(&add, 1, 2, &ReportOutcome::Ok);
            r.repetition_completed(&add, 2, 2, &ReportOutcome::Failed("boom".into()));
            r.suite_finished("CalculatorSuite");
        });

        assert_eq!(
            text,
            "'-- CalculatorSuite [OK]\n\
             \x20 +-- Display Name() [X] expected: <-1> but was: <-2>\n\
             \x20 +-- testAdd() [OK]\n\
             \x20 |  +-- repetition 1 of 2 [OK]\n\
             \x20 |  +-- repetition 2 of 2 [X] boom\n"
        );
    }

    #[test]
    fn test_console_colour() {
        let desc = TestDescriptor::new("ok", Role::Test);
        let mut reporter = ConsoleReporter::new(Vec::new()).colorize(true);
        reporter.test_completed(&desc, &ReportOutcome::Ok);
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(text.contains("\x1b[32m[OK]\x1b[0m"));
    }

    #[test]
    fn test_recording_completed_tests() {
        let a = TestDescriptor::new("a", Role::Test);
        let b = TestDescriptor::new("b", Role::Test);
        let mut reporter = RecordingReporter::new();
        reporter.test_completed(&a, &ReportOutcome::Ok);
        reporter.repeated_test_started(&b);
        reporter.repetition_completed(&b, 1, 2, &ReportOutcome::Ok);
        reporter.repetition_completed(&b, 2, 2, &ReportOutcome::Ok);

        assert_eq!(reporter.completed_tests(), ["a", "b"]);
        assert_eq!(reporter.events().len(), 4);
    }
}
