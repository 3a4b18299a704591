//! Monotonic time source for the busy-wait loop
//!
//! All timestamps in a run are offsets from one shared epoch so that
//! arrivals, releases and iteration boundaries of different workers can be
//! compared directly.

use std::time::{Duration, Instant};

/// Anything that can report monotonic time elapsed since some fixed epoch
pub trait TimeSource {
    fn elapsed(&self) -> Duration;
}

/// Monotonic clock anchored at the start of a run
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    epoch: Instant,
}

impl RunClock {
    /// Anchor a new clock at the current instant
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl TimeSource for RunClock {
    fn elapsed(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Spin on `clock` until `wait` has passed, returning the time actually spent
///
/// Never sleeps or yields: the calling thread stays runnable for the whole
/// interval so that the scheduler has to decide who gets the CPU.
pub fn spin_for<C: TimeSource>(clock: &C, wait: Duration) -> Duration {
    let start = clock.elapsed();
    loop {
        let spent = clock.elapsed().saturating_sub(start);
        if spent >= wait {
            return spent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Clock that advances a fixed step on every sample
    struct SteppingClock {
        now: Cell<Duration>,
        step: Duration,
        samples: Cell<u32>,
    }

    impl TimeSource for SteppingClock {
        fn elapsed(&self) -> Duration {
            let now = self.now.get();
            self.now.set(now + self.step);
            self.samples.set(self.samples.get() + 1);
            now
        }
    }

    #[test]
    fn test_spin_for_stops_once_wait_elapsed() {
        let clock = SteppingClock {
            now: Cell::new(Duration::ZERO),
            step: Duration::from_millis(10),
            samples: Cell::new(0),
        };
        let spent = spin_for(&clock, Duration::from_millis(35));
        assert_eq!(spent, Duration::from_millis(40));
        // one sample for the start, four until 40ms >= 35ms
        assert_eq!(clock.samples.get(), 5);
    }

    #[test]
    fn test_spin_for_zero_wait_returns_after_one_sample() {
        let clock = SteppingClock {
            now: Cell::new(Duration::from_secs(3)),
            step: Duration::from_millis(1),
            samples: Cell::new(0),
        };
        assert_eq!(spin_for(&clock, Duration::ZERO), Duration::from_millis(1));
        assert_eq!(clock.samples.get(), 2);
    }

    #[test]
    fn test_run_clock_is_monotonic() {
        let clock = RunClock::start();
        let a = clock.elapsed();
        let b = clock.elapsed();
        assert!(b >= a);
    }

    #[test]
    fn test_spin_for_real_clock_waits_at_least_requested() {
        let clock = RunClock::start();
        let wait = Duration::from_millis(5);
        let spent = spin_for(&clock, wait);
        assert!(spent >= wait);
        assert!(clock.elapsed() >= wait);
    }
}
