//! Prerequisite resolution
//!
//! Before a test body runs, every name in its `depends_on` list is looked
//! up, executed if it has not run yet (depth first, in declaration order)
//! and checked for success.

use std::collections::HashMap;
use tracing::debug;

use crate::models::{TestDescriptor, TestError};

use super::engine::EngineError;
use super::state::TestRunState;

/// What the resolver needs from the engine running the suite
pub trait TestScheduler {
    fn state(&self, name: &str) -> TestRunState;

    /// Run the named test now, including its own prerequisites
    fn execute(&mut self, name: &str) -> Result<(), EngineError>;

    /// Names currently being resolved, outermost first
    fn resolving_chain(&self) -> &[String];
}

/// Outcome of resolving one test's prerequisites
#[derive(Debug)]
pub enum Resolution {
    Ready,
    /// The test must be skipped; the error is recorded against it
    Blocked(TestError),
}

pub struct DependencyResolver<'a> {
    index: &'a HashMap<String, TestDescriptor>,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(index: &'a HashMap<String, TestDescriptor>) -> Self {
        Self { index }
    }

    pub fn resolve<T>(&self, descriptor: &TestDescriptor, scheduler: &mut T) -> Result<Resolution, EngineError>
    where
        T: TestScheduler + ?Sized,
    {
        for name in &descriptor.depends_on {
            let Some(prerequisite) = self.index.get(name) else {
                return Ok(Resolution::Blocked(TestError::MissingDependency { name: name.clone() }));
            };
            if !prerequisite.is_test() {
                return Ok(Resolution::Blocked(TestError::Configuration(format!(
                    "prerequisite '{name}' of {}() is a {} method, not a test",
                    descriptor.name, prerequisite.role
                ))));
            }

            match scheduler.state(name) {
                TestRunState::Pending => {
                    debug!(test = %descriptor.name, prerequisite = %name, "running prerequisite");
                    scheduler.execute(name)?;
                }
                TestRunState::Resolving => {
                    return Ok(Resolution::Blocked(TestError::Configuration(cycle(
                        scheduler.resolving_chain(),
                        name,
                    ))));
                }
                _ => {}
            }

            if !scheduler.state(name).successful() {
                return Ok(Resolution::Blocked(TestError::DependencyFailed { name: name.clone() }));
            }
        }

        Ok(Resolution::Ready)
    }
}

fn cycle(chain: &[String], repeated: &str) -> String {
    let start = chain.iter().position(|n| n == repeated).unwrap_or(0);
    let mut names: Vec<&str> = chain[start..].iter().map(String::as_str).collect();
    names.push(repeated);
    format!("dependency cycle: {}", names.join(" -> "))
}
