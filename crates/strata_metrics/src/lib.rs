//! Strata Metrics - performance instrumentation for the tick engine
//!
//! Provides zero-cost abstractions for metrics collection that completely
//! vanish in production builds via feature flags.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use strata_metrics::TickTimer;
//!
//! let mut timer = TickTimer::new(60); // Track last 60 ticks
//! timer.begin();
//! // ... run a tick ...
//! timer.end();
//! println!("tick: {:.2}ms", timer.tick_time_ms());
//! ```
//!
//! In production builds (without `metrics` feature), all instrumentation
//! is compiled out to zero overhead.

#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod ring_buffer;
#[cfg(feature = "metrics")]
mod system_profiler;
#[cfg(feature = "metrics")]
mod tick_timer;

#[cfg(feature = "metrics")]
pub use counter::Counter;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use system_profiler::{SystemProfiler, SystemTiming};
#[cfg(feature = "metrics")]
pub use tick_timer::TickTimer;

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
pub struct TickTimer;

#[cfg(not(feature = "metrics"))]
impl TickTimer {
    pub fn new(_window: usize) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn ticks_per_second(&self) -> f64 { 0.0 }
    pub fn tick_time_ms(&self) -> f64 { 0.0 }
    pub fn tick_time_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
}

#[cfg(not(feature = "metrics"))]
pub struct RingBuffer<T>(std::marker::PhantomData<T>);

#[cfg(not(feature = "metrics"))]
impl<T> RingBuffer<T> {
    pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
    pub fn push(&mut self, _value: T) {}
    pub fn len(&self) -> usize { 0 }
    pub fn is_empty(&self) -> bool { true }
}

#[cfg(not(feature = "metrics"))]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn increment(&mut self, _name: &'static str, _value: u64) {}
    pub fn get(&self, _name: &str) -> u64 { 0 }
    pub fn reset_all(&mut self) {}
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> { Vec::new() }
}

#[cfg(not(feature = "metrics"))]
impl Default for Counter {
    fn default() -> Self { Self::new() }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemTiming {
    pub total: std::time::Duration,
    pub calls: u64,
}

#[cfg(not(feature = "metrics"))]
impl SystemTiming {
    pub fn average(&self) -> std::time::Duration { std::time::Duration::ZERO }
}

#[cfg(not(feature = "metrics"))]
pub struct SystemProfiler;

#[cfg(not(feature = "metrics"))]
impl SystemProfiler {
    pub fn new() -> Self { Self }
    pub fn time_system<F, R>(&mut self, _name: &'static str, f: F) -> R where F: FnOnce() -> R { f() }
    pub fn get_timing(&self, _name: &str) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn timing(&self, _name: &str) -> SystemTiming { SystemTiming::default() }
    pub fn reset(&mut self) {}
}

#[cfg(not(feature = "metrics"))]
impl Default for SystemProfiler {
    fn default() -> Self { Self::new() }
}
