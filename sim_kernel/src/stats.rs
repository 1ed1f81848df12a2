//! # Kernel Statistics
//!
//! Monotonic tick counter used to correlate diagnostic events.
//!
//! The scheduler stamps every audit event with the tick at which it
//! happened; nothing else in the core reads time. The counter only
//! advances when the external timer driver says so, which keeps test
//! runs fully reproducible.

use hal::TimerDevice;

/// Monotonically increasing tick statistics
#[derive(Debug, Clone)]
pub struct Statistics {
    total_ticks: u64,
}

impl Statistics {
    /// Creates statistics starting at tick 0
    pub fn new() -> Self {
        Self { total_ticks: 0 }
    }

    /// Returns the total ticks elapsed since boot
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Advances the counter by `delta` ticks
    ///
    /// # Panics
    ///
    /// Panics on u64 overflow; the counter must stay monotonic.
    pub fn advance(&mut self, delta: u64) {
        self.total_ticks = self
            .total_ticks
            .checked_add(delta)
            .expect("statistics tick overflow");
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerDevice for Statistics {
    fn poll_ticks(&mut self) -> u64 {
        self.total_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        let stats = Statistics::new();
        assert_eq!(stats.total_ticks(), 0);
    }

    #[test]
    fn test_advance_accumulates() {
        let mut stats = Statistics::new();
        stats.advance(10);
        stats.advance(5);
        assert_eq!(stats.total_ticks(), 15);
        assert_eq!(stats.poll_ticks(), 15);
    }

    #[test]
    #[should_panic(expected = "statistics tick overflow")]
    fn test_overflow_is_fatal() {
        let mut stats = Statistics::new();
        stats.advance(u64::MAX);
        stats.advance(1);
    }
}
