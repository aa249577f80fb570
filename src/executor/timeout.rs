//! Timeout enforcement
//!
//! Runs a unit of work either directly or preemptively under a deadline.
//! Preemptive runs hand the work to a blocking worker of a throwaway tokio
//! runtime and race it against `tokio::time::timeout`. On expiry the worker
//! is signalled and detached, never joined: it may keep running and its
//! later side effects are not prevented.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{TestDescriptor, TestError};

thread_local! {
    static CURRENT_SIGNAL: RefCell<Option<CancelSignal>> = const { RefCell::new(None) };
}

/// Advisory cancellation flag shared between a guard and its worker
#[derive(Clone, Debug, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Whether the preemptive guard running the current thread's work has
/// given up on it. Long-running bodies may poll this to stop early.
pub fn cancellation_requested() -> bool {
    CURRENT_SIGNAL.with(|current| {
        current
            .borrow()
            .as_ref()
            .is_some_and(CancelSignal::is_cancelled)
    })
}

/// Run `body`, converting an unwind into a failure.
pub fn run_caught<T, F>(body: F) -> Result<T, TestError>
where
    F: FnOnce() -> Result<T, TestError>,
{
    panic::catch_unwind(AssertUnwindSafe(body))
        .unwrap_or_else(|payload| Err(TestError::from_panic(payload)))
}

/// Applies an optional wait bound to a unit of work
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeoutGuard {
    limit: Option<Duration>,
}

impl TimeoutGuard {
    pub fn new(limit: Option<Duration>) -> Self {
        Self { limit }
    }

    /// Guard configured from a descriptor's declared timeout
    pub fn for_descriptor(descriptor: &TestDescriptor) -> Self {
        Self::new(descriptor.time_limit())
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    pub fn run<T, F>(&self, body: F) -> Result<T, TestError>
    where
        F: FnOnce() -> Result<T, TestError> + Send + 'static,
        T: Send + 'static,
    {
        match self.limit {
            Some(limit) => run_preemptively(limit, body),
            None => run_caught(body),
        }
    }
}

/// Run `body` on an isolated worker and wait at most `limit` for it.
pub fn run_preemptively<T, F>(limit: Duration, body: F) -> Result<T, TestError>
where
    F: FnOnce() -> Result<T, TestError> + Send + 'static,
    T: Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| TestError::Failed(format!("failed to start timeout worker: {e}")))?;

    let signal = CancelSignal::new();
    let worker_signal = signal.clone();
    let worker = runtime.spawn_blocking(move || {
        CURRENT_SIGNAL.with(|current| *current.borrow_mut() = Some(worker_signal));
        let outcome = run_caught(body);
        CURRENT_SIGNAL.with(|current| current.borrow_mut().take());
        outcome
    });

    let raced = runtime.block_on(async { tokio::time::timeout(limit, worker).await });

    let outcome = match raced {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) if join_error.is_panic() => {
            Err(TestError::from_panic(join_error.into_panic()))
        }
        Ok(Err(join_error)) => Err(TestError::Failed(format!(
            "timeout worker did not complete: {join_error}"
        ))),
        Err(_) => {
            signal.cancel();
            warn!(
                limit_ms = limit.as_millis() as u64,
                "deadline expired, abandoning worker"
            );
            Err(TestError::TimeoutExceeded {
                limit,
                overshoot: None,
                message: None,
            })
        }
    };

    // Never wait for an abandoned worker.
    runtime.shutdown_background();
    debug!("timeout worker released");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread::sleep;
    use std::time::Instant;

    #[test]
    fn test_direct_run_without_limit() {
        let guard = TimeoutGuard::new(None);
        assert_eq!(guard.run(|| Ok(7)).unwrap(), 7);
    }

    #[test]
    fn test_direct_run_catches_panic() {
        let err = run_caught::<(), _>(|| panic!("boom")).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_preemptive_returns_value_before_deadline() {
        let value = run_preemptively(Duration::from_secs(5), || Ok("done")).unwrap();
        assert_eq!(value, "done");
    }

    #[test]
    fn test_preemptive_times_out_promptly() {
        let start = Instant::now();
        let err = run_preemptively(Duration::from_millis(30), || {
            sleep(Duration::from_secs(2));
            Ok(())
        })
        .unwrap_err();

        assert!(matches!(
            err,
            TestError::TimeoutExceeded { overshoot: None, .. }
        ));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_preemptive_surfaces_body_error() {
        let err = run_preemptively::<(), _>(Duration::from_secs(5), || {
            Err(TestError::Failed("inner".into()))
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "inner");

        let err =
            run_preemptively::<(), _>(Duration::from_secs(5), || panic!("worker panic")).unwrap_err();
        assert_eq!(err.to_string(), "worker panic");
    }

    #[test]
    fn test_abandoned_worker_sees_cancellation() {
        let observed = Arc::new(AtomicUsize::new(0));
        let flag = observed.clone();

        let result = run_preemptively(Duration::from_millis(20), move || {
            let start = Instant::now();
            while start.elapsed() < Duration::from_secs(2) {
                if cancellation_requested() {
                    flag.store(1, Ordering::SeqCst);
                    break;
                }
                sleep(Duration::from_millis(2));
            }
            Ok(())
        });
        assert!(result.is_err());

        let deadline = Instant::now() + Duration::from_secs(1);
        while observed.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            sleep(Duration::from_millis(5));
        }
        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_signal_not_visible_outside_worker() {
        assert!(!cancellation_requested());
    }
}
