//! microunit - a minimal unit-test execution engine
//!
//! Suites declare their lifecycle methods and tests as [`TestMethod`]s. The
//! engine runs them with prerequisite ordering, repetition, per-test time
//! limits and expected-exception checks, and aggregates every failure into
//! a [`RunResult`] instead of stopping at the first one.
//!
//! ## Usage
//!
//! ```no_run
//! use microunit::{assert_equal, suite, NullReporter, TestMethod, TestRunner, TestSuite};
//!
//! #[derive(Default)]
//! struct Arithmetic;
//!
//! impl TestSuite for Arithmetic {
//!     fn name() -> &'static str {
//!         "Arithmetic"
//!     }
//!
//!     fn create() -> anyhow::Result<Self> {
//!         Ok(Self)
//!     }
//!
//!     fn methods() -> Vec<TestMethod<Self>> {
//!         vec![TestMethod::test("adds", |_| assert_equal(4, 2 + 2))]
//!     }
//! }
//!
//! let arithmetic = suite::<Arithmetic>();
//! let result = TestRunner::default()
//!     .run(&[&arithmetic], &mut NullReporter)
//!     .unwrap();
//! assert!(result.succeeded());
//! ```

pub mod assertions;
pub mod config;
pub mod executor;
pub mod models;
pub mod output;
pub mod suites;
pub mod utils;

pub use assertions::{
    assert_all, assert_equal, assert_equal_msg, assert_false, assert_false_msg, assert_not_equal,
    assert_not_equal_msg, assert_not_null, assert_not_null_msg, assert_null, assert_null_msg,
    assert_throws, assert_timeout, assert_timeout_msg, assert_timeout_preemptively,
    assert_timeout_preemptively_msg, assert_true, assert_true_msg, executable, fail, Executable,
    Message,
};
pub use executor::{
    cancellation_requested, run_suites, suite, EngineConfig, EngineError, RunAborted,
    RunnableSuite, Suite, SuiteHandle, TestMethod, TestRunner, TestSuite,
};
pub use models::{
    raise, throw, ExceptionType, Failure, Outcome, Raised, RunResult, TestDescriptor, TestError,
    TimeUnit,
};
pub use output::{ConsoleReporter, NullReporter, RecordingReporter, Reporter};
