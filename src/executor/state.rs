//! Per-run bookkeeping for one test

use std::fmt;

/// Phase of a test within one engine run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TestRunState {
    #[default]
    Pending,
    /// Prerequisites are being resolved
    Resolving,
    /// Skipped because of a prerequisite or configuration problem
    Blocked,
    Running,
    Passed,
    Failed,
}

impl TestRunState {
    /// Whether the engine has started on this test during the run
    pub fn invoked(self) -> bool {
        self != TestRunState::Pending
    }

    pub fn successful(self) -> bool {
        self == TestRunState::Passed
    }
}

impl fmt::Display for TestRunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestRunState::Pending => "pending",
            TestRunState::Resolving => "resolving",
            TestRunState::Blocked => "blocked",
            TestRunState::Running => "running",
            TestRunState::Passed => "passed",
            TestRunState::Failed => "failed",
        };
        f.write_str(s)
    }
}
