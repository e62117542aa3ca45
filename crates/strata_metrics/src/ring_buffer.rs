//! Ring buffer for rolling sample windows

use std::time::Duration;

pub struct RingBuffer<T> {
    samples: Vec<T>,
    capacity: usize,
    cursor: usize,
}

impl<T: Clone> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            capacity: capacity.max(1),
            cursor: 0,
        }
    }

    pub fn push(&mut self, sample: T) {
        if self.samples.len() < self.capacity {
            self.samples.push(sample);
        } else {
            self.samples[self.cursor] = sample;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// Specialize for Duration (tick timings)
impl RingBuffer<Duration> {
    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.samples.iter().sum();
        sum / self.samples.len() as u32
    }

    pub fn min_max(&self) -> (Duration, Duration) {
        let mut iter = self.samples.iter();
        let Some(first) = iter.next() else {
            return (Duration::ZERO, Duration::ZERO);
        };
        iter.fold((*first, *first), |(lo, hi), &d| (lo.min(d), hi.max(d)))
    }
}

// Specialize for f64 (command counts, entity counts per tick)
impl RingBuffer<f64> {
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().sum();
        sum / self.samples.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_average_wraps() {
        let mut buffer = RingBuffer::new(3);

        buffer.push(Duration::from_millis(10));
        assert_eq!(buffer.average(), Duration::from_millis(10));

        buffer.push(Duration::from_millis(20));
        assert_eq!(buffer.average(), Duration::from_millis(15));

        buffer.push(Duration::from_millis(30));
        assert_eq!(buffer.average(), Duration::from_millis(20));

        // Oldest sample (10ms) is overwritten
        buffer.push(Duration::from_millis(40));
        assert_eq!(buffer.average(), Duration::from_millis(30));
    }

    #[test]
    fn min_max_on_empty_is_zero() {
        let buffer: RingBuffer<Duration> = RingBuffer::new(4);
        assert_eq!(buffer.min_max(), (Duration::ZERO, Duration::ZERO));
    }
}
