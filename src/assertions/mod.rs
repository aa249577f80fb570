//! Assertion primitives
//!
//! Every assertion returns an [`Outcome`] (or the checked value) so a test
//! body can chain them with `?`. Optional messages are rendered only when
//! the assertion fails.

use std::borrow::Cow;
use std::fmt::{self, Debug};
use std::time::Duration;

use crate::executor::{run_caught, run_preemptively};
use crate::models::{ExceptionType, MultiFailure, Outcome, Raised, TestError};
use crate::utils::Timer;

/// Closure accepted by [`assert_all`]
pub type Executable<'a> = Box<dyn FnOnce() -> Outcome + 'a>;

/// Failure message attached to an assertion
pub enum Message<'a> {
    None,
    Text(Cow<'a, str>),
    /// Produced on failure only
    Lazy(Box<dyn FnOnce() -> String + 'a>),
}

impl<'a> Message<'a> {
    pub fn lazy(producer: impl FnOnce() -> String + 'a) -> Self {
        Message::Lazy(Box::new(producer))
    }

    fn resolve(self) -> Option<String> {
        match self {
            Message::None => None,
            Message::Text(text) => Some(text.into_owned()),
            Message::Lazy(producer) => Some(producer()),
        }
    }
}

impl Debug for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::None => f.write_str("None"),
            Message::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Message::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl<'a> From<&'a str> for Message<'a> {
    fn from(text: &'a str) -> Self {
        Message::Text(Cow::Borrowed(text))
    }
}

impl From<String> for Message<'_> {
    fn from(text: String) -> Self {
        Message::Text(Cow::Owned(text))
    }
}

impl<'a> From<Option<&'a str>> for Message<'a> {
    fn from(text: Option<&'a str>) -> Self {
        text.map_or(Message::None, Message::from)
    }
}

fn mismatch(expected: String, actual: String, message: Message<'_>) -> TestError {
    TestError::Mismatch {
        expected,
        actual,
        message: message.resolve(),
    }
}

pub fn assert_equal<T: PartialEq + Debug>(expected: T, actual: T) -> Outcome {
    assert_equal_msg(expected, actual, Message::None)
}

pub fn assert_equal_msg<'m, T: PartialEq + Debug>(
    expected: T,
    actual: T,
    message: impl Into<Message<'m>>,
) -> Outcome {
    if expected == actual {
        return Ok(());
    }
    Err(mismatch(
        format!("{expected:?}"),
        format!("{actual:?}"),
        message.into(),
    ))
}

pub fn assert_not_equal<T: PartialEq + Debug>(unexpected: T, actual: T) -> Outcome {
    assert_not_equal_msg(unexpected, actual, Message::None)
}

pub fn assert_not_equal_msg<'m, T: PartialEq + Debug>(
    unexpected: T,
    actual: T,
    message: impl Into<Message<'m>>,
) -> Outcome {
    if unexpected != actual {
        return Ok(());
    }
    Err(mismatch(
        format!("not equal to {unexpected:?}"),
        format!("{actual:?}"),
        message.into(),
    ))
}

pub fn assert_true(condition: bool) -> Outcome {
    assert_true_msg(condition, Message::None)
}

pub fn assert_true_msg<'m>(condition: bool, message: impl Into<Message<'m>>) -> Outcome {
    if condition {
        return Ok(());
    }
    Err(mismatch("true".into(), "false".into(), message.into()))
}

pub fn assert_false(condition: bool) -> Outcome {
    assert_false_msg(condition, Message::None)
}

pub fn assert_false_msg<'m>(condition: bool, message: impl Into<Message<'m>>) -> Outcome {
    if !condition {
        return Ok(());
    }
    Err(mismatch("false".into(), "true".into(), message.into()))
}

/// `None` plays the role of null
pub fn assert_null<T: Debug>(actual: &Option<T>) -> Outcome {
    assert_null_msg(actual, Message::None)
}

pub fn assert_null_msg<'m, T: Debug>(
    actual: &Option<T>,
    message: impl Into<Message<'m>>,
) -> Outcome {
    match actual {
        None => Ok(()),
        Some(value) => Err(mismatch("null".into(), format!("{value:?}"), message.into())),
    }
}

pub fn assert_not_null<T>(actual: &Option<T>) -> Outcome {
    assert_not_null_msg(actual, Message::None)
}

pub fn assert_not_null_msg<'m, T>(
    actual: &Option<T>,
    message: impl Into<Message<'m>>,
) -> Outcome {
    match actual {
        Some(_) => Ok(()),
        None => Err(mismatch("not null".into(), "null".into(), message.into())),
    }
}

/// Fail unconditionally
pub fn fail<T>(message: impl Into<String>) -> Result<T, TestError> {
    Err(TestError::Failed(message.into()))
}

/// Run `body` and require it to raise exactly `E`.
///
/// Both returned errors and unwinds count as raised. On success the raised
/// value is handed back for further inspection.
pub fn assert_throws<E, F>(body: F) -> Result<Raised, TestError>
where
    E: 'static,
    F: FnOnce() -> Outcome,
{
    let expected = ExceptionType::of::<E>();
    let error = match run_caught(body) {
        Ok(()) => return Err(TestError::NoExceptionThrown { expected }),
        Err(error) => error,
    };

    let actual = error.thrown_type();
    if actual != expected {
        return Err(TestError::UnexpectedExceptionType { expected, actual });
    }

    Ok(match error {
        TestError::Raised(raised) => raised,
        TestError::MultipleFailures(multi) => Raised::new(multi),
        other => Raised::new(other),
    })
}

/// Run `body` to completion and fail if it took longer than `limit`.
///
/// The body is never interrupted; its value is returned when it finishes
/// in time.
pub fn assert_timeout<T, F>(limit: Duration, body: F) -> Result<T, TestError>
where
    F: FnOnce() -> Result<T, TestError>,
{
    assert_timeout_msg(limit, body, Message::None)
}

pub fn assert_timeout_msg<'m, T, F>(
    limit: Duration,
    body: F,
    message: impl Into<Message<'m>>,
) -> Result<T, TestError>
where
    F: FnOnce() -> Result<T, TestError>,
{
    let timer = Timer::start("assert_timeout");
    let value = body()?;

    match timer.overshoot(limit) {
        Some(overshoot) => Err(TestError::TimeoutExceeded {
            limit,
            overshoot: Some(overshoot),
            message: message.into().resolve(),
        }),
        None => Ok(value),
    }
}

/// Run `body` on a separate worker and stop waiting for it after `limit`.
///
/// The worker is only signalled, not stopped: see
/// [`cancellation_requested`](crate::executor::cancellation_requested).
pub fn assert_timeout_preemptively<T, F>(limit: Duration, body: F) -> Result<T, TestError>
where
    F: FnOnce() -> Result<T, TestError> + Send + 'static,
    T: Send + 'static,
{
    assert_timeout_preemptively_msg(limit, body, Message::None)
}

pub fn assert_timeout_preemptively_msg<'m, T, F>(
    limit: Duration,
    body: F,
    message: impl Into<Message<'m>>,
) -> Result<T, TestError>
where
    F: FnOnce() -> Result<T, TestError> + Send + 'static,
    T: Send + 'static,
{
    run_preemptively(limit, body).map_err(|error| match error {
        timeout @ TestError::TimeoutExceeded { .. } => timeout.with_message(message.into().resolve()),
        other => other,
    })
}

/// Box a closure for [`assert_all`]
pub fn executable<'a, F>(body: F) -> Executable<'a>
where
    F: FnOnce() -> Outcome + 'a,
{
    Box::new(body)
}

/// Run every body, then report all failures together.
///
/// No body is skipped because an earlier one failed.
pub fn assert_all(heading: Option<&str>, bodies: Vec<Executable<'_>>) -> Outcome {
    let causes: Vec<TestError> = bodies
        .into_iter()
        .filter_map(|body| run_caught(body).err())
        .collect();

    if causes.is_empty() {
        return Ok(());
    }
    Err(TestError::MultipleFailures(MultiFailure::new(
        heading.map(str::to_string),
        causes,
    )))
}

/// Soft-assertion group over closure expressions.
///
/// ```ignore
/// assert_all!(heading = "Sums", || assert_equal(3, 3), || assert_equal(3, 4))?;
/// ```
#[macro_export]
macro_rules! assert_all {
    (heading = $heading:expr, $($body:expr),+ $(,)?) => {
        $crate::assertions::assert_all(
            Some($heading),
            vec![$($crate::assertions::executable($body)),+],
        )
    };
    ($($body:expr),+ $(,)?) => {
        $crate::assertions::assert_all(
            None,
            vec![$($crate::assertions::executable($body)),+],
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{raise, throw, Panic};
    use std::cell::Cell;
    use std::thread::sleep;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("illegal state")]
    struct IllegalState;

    #[derive(Debug, Error)]
    #[error("illegal argument")]
    struct IllegalArgument;

    #[test]
    fn test_assert_equal() {
        assert!(assert_equal(3, 3).is_ok());
        assert!(assert_equal("a", "a").is_ok());

        let err = assert_equal(3, 5).unwrap_err();
        match &err {
            TestError::Mismatch {
                expected,
                actual,
                message,
            } => {
                assert_eq!(expected, "3");
                assert_eq!(actual, "5");
                assert!(message.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.to_string(), "expected: <3> but was: <5>");
    }

    #[test]
    fn test_assert_equal_with_message() {
        let err = assert_equal_msg(1.5, 2.5, "halves").unwrap_err();
        assert_eq!(err.to_string(), "halves ==> expected: <1.5> but was: <2.5>");
    }

    #[test]
    fn test_lazy_message_only_on_failure() {
        let calls = Cell::new(0);
        let produce = || {
            calls.set(calls.get() + 1);
            "computed".to_string()
        };

        assert!(assert_true_msg(true, Message::lazy(produce)).is_ok());
        assert_eq!(calls.get(), 0);

        let err = assert_true_msg(false, Message::lazy(produce)).unwrap_err();
        assert_eq!(calls.get(), 1);
        assert_eq!(err.to_string(), "computed ==> expected: <true> but was: <false>");
    }

    #[test]
    fn test_assert_not_equal() {
        assert!(assert_not_equal(1, 2).is_ok());
        assert!(assert_not_equal(2, 2).is_err());
    }

    #[test]
    fn test_boolean_assertions() {
        assert!(assert_true(true).is_ok());
        assert!(assert_false(false).is_ok());
        assert_eq!(
            assert_false(true).unwrap_err().to_string(),
            "expected: <false> but was: <true>"
        );
    }

    #[test]
    fn test_null_assertions() {
        assert!(assert_null::<i32>(&None).is_ok());
        assert!(assert_not_null(&Some(1)).is_ok());

        let err = assert_null(&Some("test")).unwrap_err();
        assert_eq!(err.to_string(), "expected: <null> but was: <\"test\">");
        let err = assert_not_null::<u8>(&None).unwrap_err();
        assert_eq!(err.to_string(), "expected: <not null> but was: <null>");
    }

    #[test]
    fn test_fail() {
        let err = fail::<()>("stop here").unwrap_err();
        assert!(matches!(err, TestError::Failed(ref m) if m == "stop here"));
    }

    #[test]
    fn test_assert_throws_exact_type() {
        let raised = assert_throws::<IllegalState, _>(|| Err(raise(IllegalState))).unwrap();
        assert!(raised.is::<IllegalState>());

        let raised = assert_throws::<IllegalState, _>(|| throw(IllegalState)).unwrap();
        assert_eq!(raised.message(), "illegal state");
    }

    #[test]
    fn test_assert_throws_wrong_type() {
        let err = assert_throws::<IllegalState, _>(|| Err(raise(IllegalArgument))).unwrap_err();
        match err {
            TestError::UnexpectedExceptionType { expected, actual } => {
                assert_eq!(expected, ExceptionType::of::<IllegalState>());
                assert_eq!(actual, ExceptionType::of::<IllegalArgument>());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_assert_throws_nothing_thrown() {
        let err = assert_throws::<IllegalState, _>(|| Ok(())).unwrap_err();
        assert!(matches!(err, TestError::NoExceptionThrown { .. }));
        assert!(err.to_string().ends_with("to be thrown, but nothing was thrown."));
    }

    #[test]
    fn test_assert_throws_plain_panic() {
        assert!(assert_throws::<Panic, _>(|| panic!("plain")).is_ok());
        assert!(assert_throws::<IllegalState, _>(|| panic!("plain")).is_err());
    }

    #[test]
    fn test_assert_timeout_keeps_value() {
        let value = assert_timeout(Duration::from_secs(5), || Ok(42)).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_assert_timeout_exceeded() {
        let mut finished = false;
        let err = assert_timeout(Duration::from_millis(5), || {
            sleep(Duration::from_millis(30));
            finished = true;
            Ok(())
        })
        .unwrap_err();

        assert!(finished);
        match err {
            TestError::TimeoutExceeded { overshoot, .. } => assert!(overshoot.is_some()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_assert_timeout_preemptively() {
        let value = assert_timeout_preemptively(Duration::from_secs(5), || Ok("quick")).unwrap();
        assert_eq!(value, "quick");

        let err = assert_timeout_preemptively_msg(
            Duration::from_millis(20),
            || {
                sleep(Duration::from_secs(1));
                Ok(())
            },
            "too slow",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "too slow ==> execution timed out after 20 ms");
    }

    #[test]
    fn test_preemptive_surfaces_error_before_deadline() {
        let err = assert_timeout_preemptively::<(), _>(Duration::from_secs(5), || {
            Err(raise(IllegalArgument))
        })
        .unwrap_err();
        assert_eq!(err.thrown_type(), ExceptionType::of::<IllegalArgument>());
    }

    #[test]
    fn test_assert_all_runs_every_body() {
        let ran = Cell::new(0);
        let count = || ran.set(ran.get() + 1);

        let err = crate::assert_all!(
            heading = "Some Heading",
            || {
                count();
                assert_equal(3, 3)
            },
            || {
                count();
                assert_equal(3, 4)
            },
            || {
                count();
                panic!("boom")
            },
            || {
                count();
                assert_equal(3, -2)
            },
        )
        .unwrap_err();

        assert_eq!(ran.get(), 4);
        match err {
            TestError::MultipleFailures(multi) => {
                assert_eq!(multi.heading(), "Some Heading");
                assert_eq!(multi.causes().len(), 3);
                assert_eq!(multi.causes()[0].to_string(), "expected: <3> but was: <4>");
                assert_eq!(multi.causes()[1].to_string(), "boom");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_assert_all_passes_without_failures() {
        assert!(crate::assert_all!(|| assert_true(true), || assert_equal(1, 1)).is_ok());

        let err = assert_all(None, vec![executable(|| fail("once"))]).unwrap_err();
        assert!(err.to_string().starts_with("Multiple Failures (1 failures)"));
    }
}
