//! Repeated execution of one test
//!
//! Each repetition runs case setup, the guarded body and case teardown
//! through a [`CaseRunner`], and is reported and recorded on its own.
//! Nothing a repetition does can stop the ones after it.

use tracing::debug;

use crate::models::{Failure, Outcome, TestDescriptor, TestError};
use crate::output::{ReportOutcome, Reporter};

/// Runs single repetitions on behalf of the controller
pub trait CaseRunner {
    /// Case setup, guarded body and case teardown of one repetition
    fn run_case(&mut self, descriptor: &TestDescriptor) -> Outcome;

    /// Called once the repetition has been reported and recorded
    fn finish_case(&mut self, _descriptor: &TestDescriptor) {}

    fn reporter(&mut self) -> &mut dyn Reporter;

    fn record_failure(&mut self, failure: Failure);
}

/// Check a declared repeat count, returning it as a loop bound.
pub fn validate_repeat(suite: &str, descriptor: &TestDescriptor) -> Result<u32, TestError> {
    match u32::try_from(descriptor.repeat) {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(TestError::Configuration(format!(
            "Configuration error: repeated test [{suite}.{}()] must be declared with a positive repeat count (was {}).",
            descriptor.name, descriptor.repeat
        ))),
    }
}

pub struct RepetitionController<'a> {
    suite: &'a str,
    descriptor: &'a TestDescriptor,
    repeats: u32,
}

impl<'a> RepetitionController<'a> {
    pub fn new(suite: &'a str, descriptor: &'a TestDescriptor, repeats: u32) -> Self {
        Self {
            suite,
            descriptor,
            repeats,
        }
    }

    /// Run every repetition; returns whether all of them passed.
    pub fn run<R>(&self, runner: &mut R) -> bool
    where
        R: CaseRunner + ?Sized,
    {
        let total = self.repeats;
        if total > 1 {
            runner.reporter().repeated_test_started(self.descriptor);
        }

        let mut all_passed = true;
        for index in 1..=total {
            let outcome = runner.run_case(self.descriptor);
            let report = ReportOutcome::from_outcome(&outcome);
            debug!(test = %self.descriptor.name, index, total, ok = outcome.is_ok(), "repetition finished");

            if total == 1 {
                runner.reporter().test_completed(self.descriptor, &report);
            } else {
                runner
                    .reporter()
                    .repetition_completed(self.descriptor, index, total, &report);
            }

            if let Err(error) = outcome {
                all_passed = false;
                runner.record_failure(Failure::new(self.suite, self.descriptor.clone(), error));
            }
            runner.finish_case(self.descriptor);
        }

        all_passed
    }
}
