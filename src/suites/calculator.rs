//! Calculator demonstration suite
//!
//! Most tests here fail on purpose: together they exercise every kind of
//! failure the engine can record.

use rand::Rng;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::assert_all;
use crate::assertions::{
    assert_equal, assert_throws, assert_timeout, assert_timeout_preemptively,
    assert_timeout_preemptively_msg, assert_true,
};
use crate::executor::{cancellation_requested, TestMethod, TestSuite};
use crate::models::{raise, TestError, TimeUnit};

const LIMIT: Duration = Duration::from_millis(35);
const WORKLOAD: Duration = Duration::from_millis(60);

#[derive(Debug, Error)]
#[error("illegal state")]
pub struct IllegalStateError;

#[derive(Debug, Error)]
#[error("illegal argument")]
pub struct IllegalArgumentError;

#[derive(Debug, Default)]
pub struct Calculator;

impl Calculator {
    pub fn add(&self, a: i32, b: i32) -> i64 {
        i64::from(a) + i64::from(b)
    }

    pub fn sub(&self, a: i32, b: i32) -> i64 {
        i64::from(a) - i64::from(b)
    }
}

/// Parse numbers for roughly `duration`, stopping early when cancelled.
fn parse_for(duration: Duration) -> i64 {
    let start = Instant::now();
    let mut result = 0;
    let mut i: i64 = 0;
    while start.elapsed() < duration && !cancellation_requested() {
        result = i.to_string().parse().unwrap_or(result);
        i += 1;
    }
    result
}

#[derive(Debug, Default)]
pub struct CalculatorSuite {
    calculator: Option<Calculator>,
}

impl CalculatorSuite {
    fn calculator(&self) -> Result<&Calculator, TestError> {
        self.calculator
            .as_ref()
            .ok_or_else(|| TestError::Failed("calculator was not set up".into()))
    }
}

impl TestSuite for CalculatorSuite {
    fn name() -> &'static str {
        "CalculatorSuite"
    }

    fn create() -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    fn methods() -> Vec<TestMethod<Self>> {
        vec![
            TestMethod::case_setup("setUp", |s: &mut Self| {
                s.calculator = Some(Calculator);
                Ok(())
            }),
            TestMethod::case_teardown("tearDown", |_| Ok(())),
            TestMethod::test("add", |s: &mut Self| {
                let (n1, n2) = (3, 5);
                let _sum = s.calculator()?.add(n1, n2);
                assert_equal(n1, n2)?;
                assert_equal("0", "")
            }),
            TestMethod::test("testAdd", |s: &mut Self| {
                let result = s.calculator()?.add(3, 5);
                assert_equal(rand::rng().random_range(7..=8_i64), result)
            })
            .repeat(5),
            TestMethod::test("testNegativeRepeatCount", |_| Ok(())).repeat(-5),
            TestMethod::test("testSubtract", |s: &mut Self| {
                let result = s.calculator()?.sub(3, 5);
                assert_equal(-2, result)
            }),
            TestMethod::test("unexpectedException", |_| Err(raise(IllegalStateError))),
            TestMethod::test("wrongException", |_| {
                assert_throws::<IllegalStateError, _>(|| Err(raise(IllegalArgumentError)))?;
                Ok(())
            }),
            TestMethod::test("expectedException", |_| {
                assert_throws::<IllegalStateError, _>(|| Ok(()))?;
                Ok(())
            }),
            TestMethod::test("testSubtractWithDescription", |s: &mut Self| {
                let result = s.calculator()?.sub(3, 5);
                assert_equal(-1, result)?;
                assert_timeout(Duration::from_secs(5), || Ok(()))
            })
            .display_name("Display Name"),
            TestMethod::test("testFailedAssertTimeout", |_| {
                assert_timeout(LIMIT, || {
                    parse_for(WORKLOAD);
                    Ok(())
                })
            }),
            TestMethod::test("testFailedAssertTimeoutWithSupplier", |_| {
                let parsed = assert_timeout(LIMIT, || Ok(parse_for(WORKLOAD)))?;
                assert_true(parsed >= 0)
            }),
            TestMethod::test("testFailedAssertTimeoutPreemptively", |_| {
                assert_timeout_preemptively_msg(
                    LIMIT,
                    || {
                        parse_for(WORKLOAD);
                        Ok(())
                    },
                    "",
                )
            }),
            TestMethod::test("testFailedAssertTimeoutPreemptivelyWithSupplier", |_| {
                let parsed = assert_timeout_preemptively(LIMIT, || Ok(parse_for(WORKLOAD)))?;
                assert_true(parsed >= 0)
            }),
            TestMethod::test("testFailedAssertTimeoutWithDeclaredLimit", |_| {
                assert_timeout(Duration::from_secs(3), || {
                    parse_for(Duration::from_millis(500));
                    Ok(())
                })
            })
            .timeout(35, TimeUnit::Millis),
            TestMethod::test("testDependencyThree", |_| assert_true(false))
                .depends_on(["testDependencyTwo"]),
            TestMethod::test("testDependencyTwo", |_| Ok(())).depends_on(["testDependencyOne"]),
            TestMethod::test("testDependencyThreeAgain", |_| Ok(()))
                .depends_on(["testDependencyTwo"]),
            TestMethod::test("testDependencyOne", |_| Ok(())),
            TestMethod::test("testDependencyFourExpectedToFail", |_| Ok(()))
                .depends_on(["testDependencyThree"]),
            TestMethod::test("testFailedExpectedExceptionDeclaration", |_| {
                Err(raise(IllegalArgumentError))
            })
            .expect::<IllegalStateError>(),
            TestMethod::test("testAssertAllWithHeading", |_| {
                assert_all!(
                    heading = "Some Heading",
                    || assert_equal(3, 3),
                    || assert_equal(3, 4),
                    || assert_equal(3, -2),
                )
            }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculator() {
        let calc = Calculator;
        assert_eq!(calc.add(3, 5), 8);
        assert_eq!(calc.sub(3, 5), -2);
        assert_eq!(calc.add(i32::MAX, 1), i64::from(i32::MAX) + 1);
    }

    #[test]
    fn test_parse_for_stops() {
        let start = Instant::now();
        parse_for(Duration::from_millis(10));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_declared_methods() {
        let methods = CalculatorSuite::methods();
        let tests = methods.iter().filter(|m| m.descriptor().is_test()).count();
        assert_eq!(tests, 20);
        assert!(methods
            .iter()
            .any(|m| m.descriptor().display() == "Display Name"));
    }
}
