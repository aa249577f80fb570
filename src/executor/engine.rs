//! Test execution engine
//!
//! Runs suites one after another. Within a suite: suite setup once, every
//! test in declaration order (prerequisites first, each test at most once),
//! suite teardown once. Lifecycle failures at suite level abort the run;
//! everything else is recorded as a [`Failure`] and the run continues.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{
    ExceptionType, Failure, Outcome, Raised, RunResult, SuiteStats, TestDescriptor, TestError,
};
use crate::output::{ReportOutcome, Reporter};
use crate::utils::{Stopwatch, Timer};

use super::dependency::{DependencyResolver, Resolution, TestScheduler};
use super::repetition::{validate_repeat, CaseRunner, RepetitionController};
use super::state::TestRunState;
use super::suite::{RunnableSuite, SuiteHandle, SuitePlan, TestBody, TestMethod};
use super::timeout::{run_caught, TimeoutGuard};

/// Default wait for an abandoned timeout worker to release the suite instance
pub const DEFAULT_RECLAIM_GRACE: Duration = Duration::from_millis(5000);

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to construct suite {suite}")]
    Construction {
        suite: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("suite setup {suite}.{method}() failed: {cause}")]
    SuiteSetup {
        suite: String,
        method: String,
        #[source]
        cause: TestError,
    },

    #[error("suite teardown {suite}.{method}() failed: {cause}")]
    SuiteTeardown {
        suite: String,
        method: String,
        #[source]
        cause: TestError,
    },

    #[error("invalid suite {suite}: {reason}")]
    InvalidSuite { suite: String, reason: String },

    #[error("instance of suite {suite} was not released within {grace_ms} ms")]
    InstanceUnavailable { suite: String, grace_ms: u64 },
}

/// A fatal error together with everything recorded before it
#[derive(Debug, Error)]
#[error("run aborted: {source}")]
pub struct RunAborted {
    #[source]
    pub source: EngineError,
    pub partial: RunResult,
}

/// Engine settings
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    pub reclaim_grace: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reclaim_grace: DEFAULT_RECLAIM_GRACE,
        }
    }
}

/// State shared by every suite of one run
pub struct RunContext<'r> {
    pub reporter: &'r mut dyn Reporter,
    pub result: RunResult,
    pub config: EngineConfig,
}

/// Runs suites and aggregates their failures
pub struct TestRunner {
    config: EngineConfig,
}

impl TestRunner {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn reclaim_grace(mut self, grace: Duration) -> Self {
        self.config.reclaim_grace = grace;
        self
    }

    /// Run `suites` in the order given
    pub fn run(
        &self,
        suites: &[&dyn RunnableSuite],
        reporter: &mut dyn Reporter,
    ) -> Result<RunResult, RunAborted> {
        info!("Starting run of {} suite(s)", suites.len());
        let timer = Timer::start("run");

        let mut context = RunContext {
            reporter,
            result: RunResult::new(),
            config: self.config,
        };

        for suite in suites {
            if let Err(source) = suite.run(&mut context) {
                warn!(suite = suite.name(), error = %source, "run aborted");
                let mut partial = context.result;
                partial.finish();
                return Err(RunAborted { source, partial });
            }
        }

        let mut result = context.result;
        result.finish();
        info!(
            "Run completed in {}ms - {} failure(s)",
            timer.stop().as_millis(),
            result.failures().len()
        );
        Ok(result)
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Run `suites` with default settings
pub fn run_suites(
    suites: &[&dyn RunnableSuite],
    reporter: &mut dyn Reporter,
) -> Result<RunResult, RunAborted> {
    TestRunner::default().run(suites, reporter)
}

/// Decide what a test body's raw outcome means for its repetition.
///
/// Assertion failures pass through. A raised value matching the declared
/// expected type counts as success; any other raised value is a failure.
pub fn classify(outcome: Outcome, expected: Option<ExceptionType>) -> Outcome {
    let error = match outcome {
        Ok(()) => return Ok(()),
        Err(error) if error.is_assertion() => return Err(error),
        Err(error) => error,
    };

    let actual = error.thrown_type();
    match expected {
        Some(expected) if expected == actual => Ok(()),
        Some(expected) => Err(TestError::UnexpectedExceptionType { expected, actual }),
        None => Err(unhandled(error)),
    }
}

/// Case setup and teardown have no expected type.
fn lifecycle_failure(error: TestError) -> TestError {
    if error.is_assertion() {
        error
    } else {
        unhandled(error)
    }
}

fn not_released(suite: &str, grace: Duration) -> TestError {
    TestError::Failed(format!(
        "instance of suite {suite} was not released within {} ms",
        grace.as_millis()
    ))
}

fn unhandled(error: TestError) -> TestError {
    let cause = match error {
        TestError::Raised(raised) => raised,
        other => Raised::new(other),
    };
    TestError::Unhandled {
        kind: cause.kind(),
        cause,
    }
}

/// One suite's execution within a run
pub struct SuiteRun<'c, 'r, S> {
    plan: SuitePlan<S>,
    index: Arc<HashMap<String, TestDescriptor>>,
    handle: SuiteHandle<S>,
    context: &'c mut RunContext<'r>,
    states: HashMap<String, TestRunState>,
    chain: Vec<String>,
    deferred_teardown: bool,
}

impl<'c, 'r, S: Send + 'static> SuiteRun<'c, 'r, S> {
    pub fn new(plan: SuitePlan<S>, handle: SuiteHandle<S>, context: &'c mut RunContext<'r>) -> Self {
        let index = Arc::new(plan.index().clone());
        Self {
            plan,
            index,
            handle,
            context,
            states: HashMap::new(),
            chain: Vec::new(),
            deferred_teardown: false,
        }
    }

    pub fn execute(mut self) -> Result<(), EngineError> {
        let suite = self.plan.name().to_string();
        info!(suite = %suite, tests = self.plan.tests().len(), "running suite");
        let mut stopwatch = Stopwatch::new();
        self.context.reporter.suite_started(&suite);

        for method in self.plan.suite_setups.clone() {
            if let Err(cause) = self.invoke_lifecycle(method.body())? {
                return Err(EngineError::SuiteSetup {
                    suite,
                    method: method.descriptor().name.clone(),
                    cause,
                });
            }
        }
        stopwatch.lap("suite setup");

        let names: Vec<String> = self
            .plan
            .tests()
            .iter()
            .map(|m| m.descriptor().name.clone())
            .collect();
        for name in &names {
            self.run_test(name)?;
        }
        stopwatch.lap("tests");

        for method in self.plan.suite_teardowns.clone() {
            if let Err(cause) = self.invoke_lifecycle(method.body())? {
                return Err(EngineError::SuiteTeardown {
                    suite,
                    method: method.descriptor().name.clone(),
                    cause,
                });
            }
        }
        stopwatch.lap("suite teardown");
        debug!("{suite} timings:\n{}", stopwatch.format());

        let passed = names
            .iter()
            .filter(|name| self.state(name).successful())
            .count();
        let stats = SuiteStats {
            name: suite.clone(),
            tests: names.len(),
            passed,
            failed: names.len() - passed,
            duration_ms: stopwatch.total().as_millis() as u64,
        };
        info!(
            "Suite {} finished: {}/{} passed",
            suite, stats.passed, stats.tests
        );
        self.context.result.record_suite(stats);
        self.context.reporter.suite_finished(&suite);
        Ok(())
    }

    fn set_state(&mut self, name: &str, state: TestRunState) {
        self.states.insert(name.to_string(), state);
    }

    fn grace(&self) -> Duration {
        self.context.config.reclaim_grace
    }

    fn unavailable(&self) -> EngineError {
        EngineError::InstanceUnavailable {
            suite: self.plan.name().to_string(),
            grace_ms: self.grace().as_millis() as u64,
        }
    }

    /// Suite setup or teardown; an instance that is never released is fatal.
    fn invoke_lifecycle(&self, body: TestBody<S>) -> Result<Outcome, EngineError> {
        self.handle
            .with(self.grace(), |instance| run_caught(|| body(instance)))
            .map_err(|_| self.unavailable())
    }

    /// Case-level call; an instance that is never released fails only this call.
    fn invoke(&self, body: TestBody<S>) -> Outcome {
        let grace = self.grace();
        self.handle
            .with(grace, |instance| run_caught(|| body(instance)))
            .unwrap_or_else(|_| Err(not_released(self.plan.name(), grace)))
    }

    /// Call a test body, preemptively bounded when it declares a timeout.
    fn invoke_guarded(&self, method: &TestMethod<S>) -> Outcome {
        let guard = TimeoutGuard::for_descriptor(method.descriptor());
        if guard.limit().is_none() {
            return self.invoke(method.body());
        }

        let handle = self.handle.clone();
        let body = method.body();
        let grace = self.grace();
        let suite = self.plan.name().to_string();
        guard.run(move || {
            handle
                .with(grace, |instance| run_caught(|| body(instance)))
                .unwrap_or_else(|_| Err(not_released(&suite, grace)))
        })
    }

    /// Run case teardowns after a repetition.
    ///
    /// A teardown failure is returned only when the repetition had passed;
    /// otherwise it is logged and dropped.
    fn tear_down(&self, descriptor: &TestDescriptor, passed: bool) -> Option<TestError> {
        let mut failure = None;
        for teardown in self.plan.case_teardowns() {
            if let Err(error) = self.invoke(teardown.body()) {
                let error = lifecycle_failure(error);
                if passed && failure.is_none() {
                    failure = Some(error);
                } else {
                    warn!(
                        test = %descriptor.name,
                        teardown = %teardown.descriptor().name,
                        error = %error,
                        "case teardown failed after a failing repetition"
                    );
                }
            }
        }
        failure
    }

    /// Skip a test, recording why
    fn block(&mut self, descriptor: &TestDescriptor, error: TestError) {
        debug!(test = %descriptor.name, reason = %error, "test blocked");
        self.set_state(&descriptor.name, TestRunState::Blocked);
        let report = ReportOutcome::from_error(&error);
        self.context.reporter.test_completed(descriptor, &report);
        let failure = Failure::new(self.plan.name(), descriptor.clone(), error);
        self.record_failure(failure);
    }

    fn run_test(&mut self, name: &str) -> Result<(), EngineError> {
        if self.state(name).invoked() {
            return Ok(());
        }
        let Some(method) = self.plan.test(name).cloned() else {
            return Ok(());
        };
        let descriptor = method.descriptor().clone();
        self.set_state(name, TestRunState::Resolving);

        let repeats = match validate_repeat(self.plan.name(), &descriptor) {
            Ok(repeats) => repeats,
            Err(error) => {
                self.block(&descriptor, error);
                return Ok(());
            }
        };

        self.chain.push(name.to_string());
        let index = Arc::clone(&self.index);
        let resolution = DependencyResolver::new(&index).resolve(&descriptor, self);
        self.chain.pop();

        if let Resolution::Blocked(error) = resolution? {
            self.block(&descriptor, error);
            return Ok(());
        }

        debug!(test = %name, repeats, "running test");
        self.set_state(name, TestRunState::Running);
        let suite = self.plan.name().to_string();
        let passed = RepetitionController::new(&suite, &descriptor, repeats).run(self);
        self.set_state(
            name,
            if passed {
                TestRunState::Passed
            } else {
                TestRunState::Failed
            },
        );
        Ok(())
    }
}

impl<S: Send + 'static> TestScheduler for SuiteRun<'_, '_, S> {
    fn state(&self, name: &str) -> TestRunState {
        self.states.get(name).copied().unwrap_or_default()
    }

    fn execute(&mut self, name: &str) -> Result<(), EngineError> {
        self.run_test(name)
    }

    fn resolving_chain(&self) -> &[String] {
        &self.chain
    }
}

impl<S: Send + 'static> CaseRunner for SuiteRun<'_, '_, S> {
    fn run_case(&mut self, descriptor: &TestDescriptor) -> Outcome {
        let Some(method) = self.plan.test(&descriptor.name).cloned() else {
            return Err(TestError::Configuration(format!(
                "no test named {}",
                descriptor.name
            )));
        };

        let mut outcome = Ok(());
        for setup in self.plan.case_setups() {
            if let Err(error) = self.invoke(setup.body()) {
                outcome = Err(lifecycle_failure(error));
                break;
            }
        }

        if outcome.is_ok() {
            let timer = Timer::start(descriptor.name.as_str());
            outcome = classify(self.invoke_guarded(&method), descriptor.expected);
            debug!(
                test = %descriptor.name,
                elapsed_ms = timer.elapsed().as_millis() as u64,
                ok = outcome.is_ok(),
                "test body finished"
            );
        }

        // A timed-out worker still holds the instance; report first, tear down later.
        if self.handle.is_held() {
            debug!(test = %descriptor.name, "deferring case teardown until the repetition is reported");
            self.deferred_teardown = true;
            return outcome;
        }

        match self.tear_down(descriptor, outcome.is_ok()) {
            Some(error) => Err(error),
            None => outcome,
        }
    }

    fn finish_case(&mut self, descriptor: &TestDescriptor) {
        if std::mem::take(&mut self.deferred_teardown) {
            self.tear_down(descriptor, false);
        }
    }

    fn reporter(&mut self) -> &mut dyn Reporter {
        &mut *self.context.reporter
    }

    fn record_failure(&mut self, failure: Failure) {
        self.context.result.add_failure(failure);
    }
}
