//! Test descriptor models
//!
//! Static metadata describing one declared method of a suite.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::error::ExceptionType;

/// Role of a declared method within its suite
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuiteSetup,
    CaseSetup,
    Test,
    CaseTeardown,
    SuiteTeardown,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::SuiteSetup => "suite-setup",
            Role::CaseSetup => "case-setup",
            Role::Test => "test",
            Role::CaseTeardown => "case-teardown",
            Role::SuiteTeardown => "suite-teardown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unit of a declared timeout value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Nanos,
    Micros,
    #[default]
    Millis,
    Seconds,
    Minutes,
}

impl TimeUnit {
    pub fn duration(self, value: u64) -> Duration {
        match self {
            TimeUnit::Nanos => Duration::from_nanos(value),
            TimeUnit::Micros => Duration::from_micros(value),
            TimeUnit::Millis => Duration::from_millis(value),
            TimeUnit::Seconds => Duration::from_secs(value),
            TimeUnit::Minutes => Duration::from_secs(value.saturating_mul(60)),
        }
    }
}

/// Declared timeout of a test
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeout {
    pub value: u64,
    pub unit: TimeUnit,
}

impl Timeout {
    pub fn new(value: u64, unit: TimeUnit) -> Self {
        Self { value, unit }
    }

    /// Wait bound, or `None` for a zero value (no timeout)
    pub fn limit(&self) -> Option<Duration> {
        (self.value > 0).then(|| self.unit.duration(self.value))
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            TimeUnit::Nanos => "ns",
            TimeUnit::Micros => "us",
            TimeUnit::Millis => "ms",
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "min",
        };
        write!(f, "{}{unit}", self.value)
    }
}

/// Static description of one declared method
#[derive(Clone, Debug, Serialize)]
pub struct TestDescriptor {
    /// Method name, unique within its suite
    pub name: String,
    pub role: Role,
    pub display_name: Option<String>,
    /// Number of repetitions; non-positive values are a configuration error
    pub repeat: i64,
    pub timeout: Option<Timeout>,
    /// Exact type the body is declared to raise
    pub expected: Option<ExceptionType>,
    /// Prerequisite test names, resolved in this order
    pub depends_on: Vec<String>,
}

impl TestDescriptor {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
            display_name: None,
            repeat: 1,
            timeout: None,
            expected: None,
            depends_on: Vec::new(),
        }
    }

    /// Name shown in reports
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.timeout.as_ref().and_then(Timeout::limit)
    }

    pub fn is_test(&self) -> bool {
        self.role == Role::Test
    }
}

impl fmt::Display for TestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults() {
        let desc = TestDescriptor::new("add", Role::Test);
        assert_eq!(desc.repeat, 1);
        assert_eq!(desc.display(), "add");
        assert!(desc.time_limit().is_none());
        assert!(desc.depends_on.is_empty());
    }

    #[test]
    fn test_display_name_override() {
        let mut desc = TestDescriptor::new("sub", Role::Test);
        desc.display_name = Some("Display Name".into());
        assert_eq!(desc.to_string(), "Display Name()");
    }

    #[test]
    fn test_zero_timeout_means_none() {
        assert!(Timeout::new(0, TimeUnit::Seconds).limit().is_none());
        assert_eq!(
            Timeout::new(2, TimeUnit::Minutes).limit(),
            Some(Duration::from_secs(120))
        );
        assert_eq!(
            Timeout::new(35, TimeUnit::Millis).limit(),
            Some(Duration::from_millis(35))
        );
    }
}
