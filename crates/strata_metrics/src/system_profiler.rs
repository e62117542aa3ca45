//! Per-system wall-time profiler for the tick scheduler

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Accumulated wall time and call count for one named system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemTiming {
    pub total: Duration,
    pub calls: u64,
}

impl SystemTiming {
    /// Mean wall time per call, zero when the system never ran.
    pub fn average(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total / self.calls as u32
        }
    }
}

/// Accumulates wall time per named system across ticks. Keys are the static
/// names systems report, so profiling a tick allocates nothing.
pub struct SystemProfiler {
    systems: HashMap<&'static str, SystemTiming>,
}

impl SystemProfiler {
    pub fn new() -> Self {
        Self {
            systems: HashMap::new(),
        }
    }

    pub fn time_system<F, R>(&mut self, name: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        let timing = self.systems.entry(name).or_default();
        timing.total += elapsed;
        timing.calls += 1;
        result
    }

    /// Total accumulated wall time for `name`, zero when never run.
    pub fn get_timing(&self, name: &str) -> Duration {
        self.timing(name).total
    }

    pub fn timing(&self, name: &str) -> SystemTiming {
        self.systems.get(name).copied().unwrap_or_default()
    }

    pub fn reset(&mut self) {
        self.systems.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, SystemTiming)> + '_ {
        self.systems.iter().map(|(&name, &timing)| (name, timing))
    }
}

impl Default for SystemProfiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timings_accumulate_per_name() {
        let mut profiler = SystemProfiler::new();
        let value = profiler.time_system("movement", || 42);
        assert_eq!(value, 42);
        profiler.time_system("movement", || {});

        let timing = profiler.timing("movement");
        assert_eq!(timing.calls, 2);
        assert!(profiler.get_timing("movement") >= Duration::ZERO);
        assert_eq!(profiler.timing("unseen"), SystemTiming::default());
    }

    #[test]
    fn average_is_total_over_calls() {
        let timing = SystemTiming {
            total: Duration::from_millis(30),
            calls: 3,
        };
        assert_eq!(timing.average(), Duration::from_millis(10));
        assert_eq!(SystemTiming::default().average(), Duration::ZERO);
    }
}
