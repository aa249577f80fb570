//! Data models for test execution
//!
//! This module contains the descriptors, failure taxonomy and run results
//! shared by the engine, the assertion library and the reporters.

mod descriptor;
mod error;
mod run_result;

pub use descriptor::{Role, TestDescriptor, TimeUnit, Timeout};
pub use error::{
    raise, throw, ExceptionType, MultiFailure, Outcome, Panic, Raised, TestError,
};
pub use run_result::{Failure, FailureRecord, RunResult, RunSummary, SuiteStats};
