//! Tick timing utilities

use super::ring_buffer::RingBuffer;
use std::time::{Duration, Instant};

/// Tracks how long simulation ticks take over a rolling window.
pub struct TickTimer {
    tick_start: Instant,
    tick_times: RingBuffer<Duration>,
}

impl TickTimer {
    pub fn new(window: usize) -> Self {
        Self {
            tick_start: Instant::now(),
            tick_times: RingBuffer::new(window),
        }
    }

    pub fn begin(&mut self) {
        self.tick_start = Instant::now();
    }

    pub fn end(&mut self) {
        let elapsed = self.tick_start.elapsed();
        self.tick_times.push(elapsed);
    }

    /// Average ticks per second over the window.
    pub fn ticks_per_second(&self) -> f64 {
        let avg = self.tick_times.average();
        if avg.as_secs_f64() > 0.0 {
            1.0 / avg.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn tick_time_ms(&self) -> f64 {
        self.tick_times.average().as_secs_f64() * 1000.0
    }

    pub fn tick_time_range_ms(&self) -> (f64, f64) {
        let (min, max) = self.tick_times.min_max();
        (min.as_secs_f64() * 1000.0, max.as_secs_f64() * 1000.0)
    }
}
