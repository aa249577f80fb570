//! Failure taxonomy for test bodies
//!
//! Every guarded invocation returns an [`Outcome`]. Values raised by user
//! code travel as [`Raised`] until the engine classifies them.

use serde::{Serialize, Serializer};
use std::any::{Any, TypeId};
use std::error::Error as StdError;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result of running one test, lifecycle method or assertion.
pub type Outcome = Result<(), TestError>;

const DEFAULT_HEADING: &str = "Multiple Failures";

/// Exact runtime identity of a raised value.
///
/// Matching is by `TypeId` only: there is no notion of a subtype, so a value
/// whose `source()` is a `T` is still not a `T`.
#[derive(Clone, Copy)]
pub struct ExceptionType {
    id: TypeId,
    name: &'static str,
}

impl ExceptionType {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl PartialEq for ExceptionType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ExceptionType {}

impl Hash for ExceptionType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl Serialize for ExceptionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

/// Type recorded for a plain `panic!` (or a failed `assert!`/`unwrap`).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct Panic(pub String);

/// A value raised by user code, the analogue of a thrown exception.
#[derive(Clone)]
pub struct Raised {
    kind: ExceptionType,
    message: String,
    error: Arc<dyn StdError + Send + Sync>,
}

impl Raised {
    pub fn new<E: StdError + Send + Sync + 'static>(error: E) -> Self {
        Self {
            kind: ExceptionType::of::<E>(),
            message: error.to_string(),
            error: Arc::new(error),
        }
    }

    pub fn kind(&self) -> ExceptionType {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is<E: 'static>(&self) -> bool {
        self.kind == ExceptionType::of::<E>()
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let error: &(dyn StdError + 'static) = &*self.error;
        error.downcast_ref::<E>()
    }
}

impl fmt::Debug for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raised")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl fmt::Display for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(self.kind.short_name())
        } else {
            f.write_str(&self.message)
        }
    }
}

impl StdError for Raised {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.error.source()
    }
}

/// Wrap a user error so a test body can return it: `Err(raise(e))`.
pub fn raise<E: StdError + Send + Sync + 'static>(error: E) -> TestError {
    TestError::Raised(Raised::new(error))
}

/// Raise a user error by unwinding, keeping its exact type.
pub fn throw<E: StdError + Send + Sync + 'static>(error: E) -> ! {
    std::panic::panic_any(Raised::new(error))
}

/// Soft-assertion group failure: every collected cause, in encounter order.
#[derive(Clone, Debug)]
pub struct MultiFailure {
    heading: Option<String>,
    causes: Vec<TestError>,
}

impl MultiFailure {
    pub fn new(heading: Option<String>, causes: Vec<TestError>) -> Self {
        Self { heading, causes }
    }

    pub fn heading(&self) -> &str {
        self.heading.as_deref().unwrap_or(DEFAULT_HEADING)
    }

    pub fn causes(&self) -> &[TestError] {
        &self.causes
    }
}

impl fmt::Display for MultiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} failures)", self.heading(), self.causes.len())?;
        for cause in &self.causes {
            write!(f, "\n  |  +-- {cause}")?;
        }
        Ok(())
    }
}

impl StdError for MultiFailure {}

/// Every way a test, a repetition or a prerequisite check can fail.
#[derive(Clone, Debug, Error)]
pub enum TestError {
    #[error("{}expected: <{expected}> but was: <{actual}>", prefix(.message))]
    Mismatch {
        expected: String,
        actual: String,
        message: Option<String>,
    },

    #[error("Unexpected exception type thrown, expected: <{expected}> but was: <{actual}>")]
    UnexpectedExceptionType {
        expected: ExceptionType,
        actual: ExceptionType,
    },

    #[error("Expected {expected} to be thrown, but nothing was thrown.")]
    NoExceptionThrown { expected: ExceptionType },

    #[error("{}{}", prefix(.message), describe_timeout(.limit, .overshoot))]
    TimeoutExceeded {
        limit: Duration,
        overshoot: Option<Duration>,
        message: Option<String>,
    },

    #[error("No depending method found with name: {name}")]
    MissingDependency { name: String },

    #[error("Not successful depending method: {name}")]
    DependencyFailed { name: String },

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    MultipleFailures(MultiFailure),

    #[error("{kind}")]
    Unhandled {
        kind: ExceptionType,
        #[source]
        cause: Raised,
    },

    #[error("{0}")]
    Failed(String),

    #[error("{0}")]
    Raised(Raised),
}

fn prefix(message: &Option<String>) -> String {
    match message.as_deref() {
        Some(msg) if !msg.is_empty() => format!("{msg} ==> "),
        _ => String::new(),
    }
}

fn describe_timeout(limit: &Duration, overshoot: &Option<Duration>) -> String {
    match overshoot {
        Some(over) => format!(
            "execution exceeded timeout of {} ms by {} ms",
            limit.as_millis(),
            over.as_millis()
        ),
        None => format!("execution timed out after {} ms", limit.as_millis()),
    }
}

impl TestError {
    /// Convert a caught unwind payload into a failure.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let payload = match payload.downcast::<Raised>() {
            Ok(raised) => return TestError::Raised(*raised),
            Err(other) => other,
        };
        let payload = match payload.downcast::<TestError>() {
            Ok(error) => return *error,
            Err(other) => other,
        };

        let message = if let Some(msg) = payload.downcast_ref::<&str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        TestError::Raised(Raised::new(Panic(message)))
    }

    /// Runtime type used when this error is matched against an expected
    /// exception type.
    pub fn thrown_type(&self) -> ExceptionType {
        match self {
            TestError::Raised(raised) => raised.kind(),
            TestError::MultipleFailures(_) => ExceptionType::of::<MultiFailure>(),
            _ => ExceptionType::of::<TestError>(),
        }
    }

    /// Failures produced by the assertion library.
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            TestError::Mismatch { .. }
                | TestError::UnexpectedExceptionType { .. }
                | TestError::NoExceptionThrown { .. }
                | TestError::TimeoutExceeded { .. }
                | TestError::MultipleFailures(_)
                | TestError::Failed(_)
        )
    }

    /// Attach a message to assertion kinds that carry one.
    pub fn with_message(self, msg: Option<String>) -> Self {
        match (self, msg) {
            (
                TestError::TimeoutExceeded {
                    limit, overshoot, ..
                },
                Some(msg),
            ) => TestError::TimeoutExceeded {
                limit,
                overshoot,
                message: Some(msg),
            },
            (
                TestError::Mismatch {
                    expected, actual, ..
                },
                Some(msg),
            ) => TestError::Mismatch {
                expected,
                actual,
                message: Some(msg),
            },
            (error, _) => error,
        }
    }

    /// Multi-line rendering including nested causes and source chains.
    pub fn detail(&self) -> String {
        let mut out = String::new();
        self.write_detail(&mut out, 0);
        out
    }

    fn write_detail(&self, out: &mut String, depth: usize) {
        let indent = "    ".repeat(depth);
        match self {
            TestError::MultipleFailures(multi) => {
                out.push_str(&format!(
                    "{indent}{} ({} failures)\n",
                    multi.heading(),
                    multi.causes().len()
                ));
                for cause in multi.causes() {
                    cause.write_detail(out, depth + 1);
                }
            }
            other => {
                for line in other.to_string().lines() {
                    out.push_str(&format!("{indent}{line}\n"));
                }
                let mut source = StdError::source(other);
                while let Some(err) = source {
                    out.push_str(&format!("{indent}Caused by: {err}\n"));
                    source = err.source();
                }
            }
        }
    }
}
