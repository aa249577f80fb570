//! Suite registration and discovery
//!
//! A suite type describes itself through [`TestSuite::methods`], a table of
//! descriptors bound to closures. The engine partitions that table by role
//! into a [`SuitePlan`] and runs every call against one shared instance held
//! in a [`SuiteHandle`].

use std::collections::HashMap;
use std::error::Error as StdError;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use crate::models::{ExceptionType, Outcome, Role, TestDescriptor, TimeUnit, Timeout};

use super::engine::{EngineError, RunContext, SuiteRun};

const RECLAIM_POLL: Duration = Duration::from_millis(5);

/// Body bound to a declared method
pub type TestBody<S> = Arc<dyn Fn(&mut S) -> Outcome + Send + Sync>;

/// A type grouping related tests plus their shared setup and teardown.
///
/// One instance is created per run and handed, by mutable reference, to
/// every lifecycle and test call of that run. State left behind by one
/// test is visible to the next unless a setup or teardown resets it.
pub trait TestSuite: Sized + Send + 'static {
    /// Name shown in reports
    fn name() -> &'static str;

    /// Build the shared instance for one run
    fn create() -> anyhow::Result<Self>;

    /// Declared methods, in declaration order
    fn methods() -> Vec<TestMethod<Self>>;
}

/// A descriptor bound to its body
pub struct TestMethod<S> {
    descriptor: TestDescriptor,
    body: TestBody<S>,
}

impl<S> Clone for TestMethod<S> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            body: Arc::clone(&self.body),
        }
    }
}

impl<S> TestMethod<S> {
    pub fn new<F>(name: impl Into<String>, role: Role, body: F) -> Self
    where
        F: Fn(&mut S) -> Outcome + Send + Sync + 'static,
    {
        Self {
            descriptor: TestDescriptor::new(name, role),
            body: Arc::new(body),
        }
    }

    pub fn suite_setup<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut S) -> Outcome + Send + Sync + 'static,
    {
        Self::new(name, Role::SuiteSetup, body)
    }

    pub fn case_setup<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut S) -> Outcome + Send + Sync + 'static,
    {
        Self::new(name, Role::CaseSetup, body)
    }

    pub fn test<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut S) -> Outcome + Send + Sync + 'static,
    {
        Self::new(name, Role::Test, body)
    }

    pub fn case_teardown<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut S) -> Outcome + Send + Sync + 'static,
    {
        Self::new(name, Role::CaseTeardown, body)
    }

    pub fn suite_teardown<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut S) -> Outcome + Send + Sync + 'static,
    {
        Self::new(name, Role::SuiteTeardown, body)
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.descriptor.display_name = Some(name.into());
        self
    }

    pub fn repeat(mut self, times: i64) -> Self {
        self.descriptor.repeat = times;
        self
    }

    pub fn timeout(mut self, value: u64, unit: TimeUnit) -> Self {
        self.descriptor.timeout = Some(Timeout::new(value, unit));
        self
    }

    /// Declare that the body is expected to raise exactly `E`
    pub fn expect<E: 'static>(mut self) -> Self {
        self.descriptor.expected = Some(ExceptionType::of::<E>());
        self
    }

    pub fn depends_on<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.descriptor
            .depends_on
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn descriptor(&self) -> &TestDescriptor {
        &self.descriptor
    }

    pub fn body(&self) -> TestBody<S> {
        Arc::clone(&self.body)
    }
}

/// Shared, exclusively owned suite instance
pub struct SuiteHandle<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SuiteHandle<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// The instance is still held by an abandoned worker.
#[derive(Debug, Clone, Copy)]
pub struct InstanceBusy;

impl<S> SuiteHandle<S> {
    pub fn new(instance: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(instance)),
        }
    }

    /// Run `f` with exclusive access, waiting at most `grace` for a worker
    /// abandoned by a timeout to release the instance.
    pub fn with<R>(&self, grace: Duration, f: impl FnOnce(&mut S) -> R) -> Result<R, InstanceBusy> {
        let mut guard = self.acquire(grace).ok_or(InstanceBusy)?;
        Ok(f(&mut guard))
    }

    /// Whether another thread, such as an abandoned worker, holds the instance
    pub fn is_held(&self) -> bool {
        matches!(self.inner.try_lock(), Err(TryLockError::WouldBlock))
    }

    fn acquire(&self, grace: Duration) -> Option<MutexGuard<'_, S>> {
        let deadline = Instant::now() + grace;
        loop {
            match self.inner.try_lock() {
                Ok(guard) => return Some(guard),
                Err(TryLockError::Poisoned(poisoned)) => return Some(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) if Instant::now() < deadline => {
                    thread::sleep(RECLAIM_POLL)
                }
                Err(TryLockError::WouldBlock) => return None,
            }
        }
    }
}

/// Declared methods partitioned by role
pub struct SuitePlan<S> {
    pub(crate) name: String,
    pub(crate) index: HashMap<String, TestDescriptor>,
    pub(crate) suite_setups: Vec<TestMethod<S>>,
    pub(crate) case_setups: Vec<TestMethod<S>>,
    pub(crate) tests: Vec<TestMethod<S>>,
    pub(crate) case_teardowns: Vec<TestMethod<S>>,
    pub(crate) suite_teardowns: Vec<TestMethod<S>>,
}

impl<S> SuitePlan<S> {
    pub fn discover(name: impl Into<String>, methods: Vec<TestMethod<S>>) -> Result<Self, EngineError> {
        let name = name.into();
        let mut plan = Self {
            name: name.clone(),
            index: HashMap::new(),
            suite_setups: Vec::new(),
            case_setups: Vec::new(),
            tests: Vec::new(),
            case_teardowns: Vec::new(),
            suite_teardowns: Vec::new(),
        };

        for method in methods {
            let descriptor = method.descriptor().clone();
            if plan.index.contains_key(&descriptor.name) {
                return Err(EngineError::InvalidSuite {
                    suite: name,
                    reason: format!("method name '{}' is declared twice", descriptor.name),
                });
            }

            match descriptor.role {
                Role::SuiteSetup => plan.suite_setups.push(method),
                Role::CaseSetup => plan.case_setups.push(method),
                Role::Test => plan.tests.push(method),
                Role::CaseTeardown => plan.case_teardowns.push(method),
                Role::SuiteTeardown => plan.suite_teardowns.push(method),
            }
            plan.index.insert(descriptor.name.clone(), descriptor);
        }

        Ok(plan)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every declared method by name
    pub fn index(&self) -> &HashMap<String, TestDescriptor> {
        &self.index
    }

    pub fn test(&self, name: &str) -> Option<&TestMethod<S>> {
        self.tests.iter().find(|m| m.descriptor().name == name)
    }

    pub fn tests(&self) -> &[TestMethod<S>] {
        &self.tests
    }

    pub fn case_setups(&self) -> &[TestMethod<S>] {
        &self.case_setups
    }

    pub fn case_teardowns(&self) -> &[TestMethod<S>] {
        &self.case_teardowns
    }
}

/// Type-erased suite the engine can run
pub trait RunnableSuite {
    fn name(&self) -> &str;

    /// Declared methods, in declaration order
    fn descriptors(&self) -> Vec<TestDescriptor>;

    fn run(&self, context: &mut RunContext<'_>) -> Result<(), EngineError>;
}

type Factory<S> = Box<dyn Fn() -> anyhow::Result<S> + Send + Sync>;

/// Runnable wrapper around a [`TestSuite`] type
pub struct Suite<S> {
    factory: Factory<S>,
    _suite: PhantomData<fn() -> S>,
}

impl<S: TestSuite> Suite<S> {
    pub fn new() -> Self {
        Self::with_factory(S::create)
    }

    /// Use `factory` instead of [`TestSuite::create`] to build the instance
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<S> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            _suite: PhantomData,
        }
    }
}

impl<S: TestSuite> Default for Suite<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TestSuite> RunnableSuite for Suite<S> {
    fn name(&self) -> &str {
        S::name()
    }

    fn descriptors(&self) -> Vec<TestDescriptor> {
        S::methods().iter().map(|m| m.descriptor().clone()).collect()
    }

    fn run(&self, context: &mut RunContext<'_>) -> Result<(), EngineError> {
        let instance = (self.factory)().map_err(|e| EngineError::Construction {
            suite: S::name().to_string(),
            source: Box::<dyn StdError + Send + Sync>::from(e),
        })?;
        let plan = SuitePlan::discover(S::name(), S::methods())?;

        SuiteRun::new(plan, SuiteHandle::new(instance), context).execute()
    }
}

/// Runnable suite for `S` built with [`TestSuite::create`]
pub fn suite<S: TestSuite>() -> Suite<S> {
    Suite::new()
}
