//! Test execution engine
//!
//! Discovers suite methods, resolves prerequisites, repeats tests and
//! enforces timeouts.

mod dependency;
mod engine;
mod repetition;
mod state;
mod suite;
mod timeout;

pub use dependency::{DependencyResolver, Resolution, TestScheduler};
pub use engine::{
    classify, run_suites, EngineConfig, EngineError, RunAborted, RunContext, SuiteRun, TestRunner,
    DEFAULT_RECLAIM_GRACE,
};
pub use repetition::{validate_repeat, CaseRunner, RepetitionController};
pub use state::TestRunState;
pub use suite::{
    suite, InstanceBusy, RunnableSuite, Suite, SuiteHandle, SuitePlan, TestBody, TestMethod,
    TestSuite,
};
pub use timeout::{
    cancellation_requested, run_caught, run_preemptively, CancelSignal, TimeoutGuard,
};
