//! Absolute presentation deadlines.

use std::time::{Duration, Instant};

/// Above this much remaining time the clock sleeps instead of spinning.
pub const COARSE_SLEEP_THRESHOLD: Duration = Duration::from_millis(2);

/// Time left for the spin tail after a coarse sleep.
pub const SPIN_TAIL: Duration = Duration::from_millis(1);

/// Fixed-cadence deadline clock.
///
/// Deadlines are absolute (`start + n * interval`), so late ticks do not
/// accumulate drift.
#[derive(Debug, Clone)]
pub struct PresentClock {
    interval: Duration,
    next_deadline: Instant,
    ticks: u64,
}

impl PresentClock {
    /// Clock whose first deadline is one interval after `start`.
    #[must_use]
    pub fn starting_at(start: Instant, interval: Duration) -> Self {
        let interval = interval.max(Duration::from_nanos(1));
        Self {
            interval,
            next_deadline: start + interval,
            ticks: 0,
        }
    }

    /// Interval between deadlines.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The upcoming deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    /// Deadlines passed so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Change the interval; applies from the deadline after the next one.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(Duration::from_nanos(1));
    }

    /// Block until the upcoming deadline and return it.
    ///
    /// Sleeps while more than [`COARSE_SLEEP_THRESHOLD`] remains, then spins.
    /// Returns at once if the deadline already passed.
    pub fn wait(&self) -> Instant {
        let deadline = self.next_deadline;
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let remaining = deadline.saturating_duration_since(now);
            if remaining > COARSE_SLEEP_THRESHOLD {
                std::thread::sleep(remaining.saturating_sub(SPIN_TAIL));
            } else {
                std::hint::spin_loop();
            }
        }
        deadline
    }

    /// Move to the next deadline: exactly one interval later.
    pub fn advance(&mut self) -> Instant {
        self.next_deadline += self.interval;
        self.ticks += 1;
        self.next_deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_is_exactly_one_interval() {
        let start = Instant::now();
        let mut clock = PresentClock::starting_at(start, Duration::from_millis(10));
        let first = clock.next_deadline();
        let second = clock.advance();
        assert_eq!(second.saturating_duration_since(first), Duration::from_millis(10));
        assert_eq!(clock.ticks(), 1);
    }

    #[test]
    fn test_wait_returns_after_deadline() {
        let start = Instant::now();
        let clock = PresentClock::starting_at(start, Duration::from_millis(5));
        let deadline = clock.wait();
        assert!(Instant::now() >= deadline);
        assert_eq!(deadline, start + Duration::from_millis(5));
    }

    #[test]
    fn test_past_deadline_does_not_block() {
        let start = Instant::now();
        let clock = PresentClock::starting_at(start, Duration::from_nanos(1));
        std::thread::sleep(Duration::from_millis(1));
        let before = Instant::now();
        let _deadline = clock.wait();
        assert!(before.elapsed() < Duration::from_millis(5));
    }
}
