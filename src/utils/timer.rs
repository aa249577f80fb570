//! Timer utilities
//!
//! Wall-clock measurement for timeouts and run durations.

use std::time::{Duration, Instant};

/// Simple timer for measuring elapsed time
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    label: String,
}

impl Timer {
    /// Create and start a new timer
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            label: label.into(),
        }
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time spent beyond `limit`, if any
    pub fn overshoot(&self, limit: Duration) -> Option<Duration> {
        self.elapsed().checked_sub(limit).filter(|d| !d.is_zero())
    }

    /// Stop timer and return elapsed time
    pub fn stop(self) -> Duration {
        let elapsed = self.elapsed();
        tracing::debug!("{}: {}ms", self.label, elapsed.as_millis());
        elapsed
    }
}

/// Stopwatch with lap timing
#[derive(Debug)]
pub struct Stopwatch {
    start: Instant,
    laps: Vec<(String, Duration)>,
}

impl Stopwatch {
    /// Create a new stopwatch
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            laps: Vec::new(),
        }
    }

    /// Record a lap
    pub fn lap(&mut self, label: impl Into<String>) {
        let elapsed = self.start.elapsed();
        self.laps.push((label.into(), elapsed));
    }

    /// Get total elapsed time
    pub fn total(&self) -> Duration {
        self.start.elapsed()
    }

    /// Format laps as string
    pub fn format(&self) -> String {
        let mut output = String::new();
        let mut prev = Duration::ZERO;
        for (label, cumulative) in &self.laps {
            output.push_str(&format!("{}: {}ms\n", label, (*cumulative - prev).as_millis()));
            prev = *cumulative;
        }
        output.push_str(&format!("Total: {}ms", self.total().as_millis()));
        output
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_timer() {
        let timer = Timer::start("test");
        sleep(Duration::from_millis(10));
        assert!(timer.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_timer_overshoot() {
        let timer = Timer::start("overshoot");
        assert!(timer.overshoot(Duration::from_secs(60)).is_none());
        sleep(Duration::from_millis(5));
        assert!(timer.overshoot(Duration::from_millis(1)).is_some());
    }

    #[test]
    fn test_stopwatch() {
        let mut sw = Stopwatch::new();
        sleep(Duration::from_millis(10));
        sw.lap("first");
        sleep(Duration::from_millis(10));
        sw.lap("second");

        let report = sw.format();
        assert!(report.contains("first: "));
        assert!(report.contains("second: "));
        assert!(report.ends_with("ms"));
        assert!(sw.total() >= Duration::from_millis(20));
    }
}
