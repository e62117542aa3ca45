//! Deterministic time system
//!
//! Fixed-step simulation clock driven by variable frame time via the
//! accumulator pattern.

/// Default fixed simulation rate (60 Hz ~= 16.666ms per tick)
pub const DEFAULT_SIMULATION_HZ: u32 = 60;

/// Converts variable frame deltas into whole simulation ticks.
///
/// Frame time is fed in through [`FixedTickClock::accumulate`]; each call to
/// [`FixedTickClock::try_consume_tick`] then pays out at most one fixed step,
/// firing repeatedly on consecutive calls to catch up after a stall. The
/// fractional remainder is preserved between calls.
pub struct FixedTickClock {
    step_secs: f64,
    accumulator: f64,
    tick: u64,
}

impl FixedTickClock {
    /// Create a clock at `hz` ticks per second (floored to 1).
    pub fn new(hz: u32) -> Self {
        Self {
            step_secs: 1.0 / f64::from(hz.max(1)),
            accumulator: 0.0,
            tick: 0,
        }
    }

    /// Seconds per fixed step.
    #[inline]
    pub fn step_secs(&self) -> f64 {
        self.step_secs
    }

    /// Number of the most recently consumed tick.
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Add frame time to the accumulator. Non-positive deltas are ignored.
    pub fn accumulate(&mut self, delta_secs: f64) {
        if delta_secs > 0.0 {
            self.accumulator += delta_secs;
        }
    }

    /// Consume one fixed step if enough time has accumulated, returning the
    /// new tick number.
    pub fn try_consume_tick(&mut self) -> Option<u64> {
        if self.accumulator >= self.step_secs {
            self.accumulator -= self.step_secs;
            self.tick += 1;
            Some(self.tick)
        } else {
            None
        }
    }

    /// Clear the accumulator and re-base the tick counter (rewind/resync).
    pub fn reset(&mut self, tick: u64) {
        self.accumulator = 0.0;
        self.tick = tick;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catches_up_after_stall() {
        let mut clock = FixedTickClock::new(60);
        clock.accumulate(0.05);

        assert_eq!(clock.try_consume_tick(), Some(1));
        assert_eq!(clock.try_consume_tick(), Some(2));
        assert_eq!(clock.try_consume_tick(), Some(3));
        assert_eq!(clock.try_consume_tick(), None);

        clock.accumulate(clock.step_secs());
        assert_eq!(clock.try_consume_tick(), Some(4));
    }

    #[test]
    fn remainder_is_preserved_across_calls() {
        // 4 Hz keeps the step exactly representable in binary.
        let mut clock = FixedTickClock::new(4);
        clock.accumulate(0.875);
        assert_eq!(clock.try_consume_tick(), Some(1));
        assert_eq!(clock.try_consume_tick(), Some(2));
        assert_eq!(clock.try_consume_tick(), Some(3));
        assert_eq!(clock.try_consume_tick(), None);

        // 0.125 remainder + 0.125 tops up to one full 0.25 step.
        clock.accumulate(0.125);
        assert_eq!(clock.try_consume_tick(), Some(4));
        assert_eq!(clock.try_consume_tick(), None);
    }

    #[test]
    fn ignores_non_positive_deltas() {
        let mut clock = FixedTickClock::new(60);
        clock.accumulate(-1.0);
        clock.accumulate(0.0);
        assert_eq!(clock.try_consume_tick(), None);
    }

    #[test]
    fn reset_rebases_tick_counter() {
        let mut clock = FixedTickClock::new(30);
        clock.accumulate(1.0);
        while clock.try_consume_tick().is_some() {}
        clock.reset(100);
        assert_eq!(clock.tick(), 100);
        assert_eq!(clock.try_consume_tick(), None);
        clock.accumulate(clock.step_secs());
        assert_eq!(clock.try_consume_tick(), Some(101));
    }

    #[test]
    fn zero_hz_is_floored() {
        let clock = FixedTickClock::new(0);
        assert_eq!(clock.step_secs(), 1.0);
    }
}
