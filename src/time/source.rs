//! Clock abstraction for real and injected time.
//!
//! The schedule engine never reads the system clock directly. It asks a
//! [`Clock`] for the current civil date-time (with its UTC offset) and for a
//! monotonic instant used to measure smoothing progress. Tests and the
//! `simulate` command use [`ManualClock`] to step through a day
//! deterministically.

use chrono::{DateTime, FixedOffset, Local};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of wall-clock and monotonic time.
pub trait Clock {
    /// Current local date-time, carrying its UTC offset.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current monotonic instant.
    fn instant(&self) -> Instant;
}

/// Clock backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// hand another to the engine.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<FixedOffset>>>,
    instant: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
            instant: Rc::new(Cell::new(Instant::now())),
        }
    }

    /// Jump the wall clock. The monotonic clock is left alone.
    pub fn set(&self, now: DateTime<FixedOffset>) {
        self.now.set(now);
    }

    /// Move both the wall clock and the monotonic clock forward.
    pub fn advance(&self, by: Duration) {
        if let Ok(delta) = chrono::Duration::from_std(by) {
            self.now.set(self.now.get() + delta);
        }
        self.instant.set(self.instant.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now.get()
    }

    fn instant(&self) -> Instant {
        self.instant.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(utc(2017, 2, 8, 20, 0));
        let handle = clock.clone();
        let start = clock.instant();

        handle.advance(Duration::from_secs(90));
        assert_eq!(clock.now(), utc(2017, 2, 8, 20, 1) + chrono::Duration::seconds(30));
        assert_eq!(clock.instant() - start, Duration::from_secs(90));

        handle.set(utc(2017, 2, 9, 1, 0));
        assert_eq!(clock.now(), utc(2017, 2, 9, 1, 0));
        assert_eq!(clock.instant() - start, Duration::from_secs(90));
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock;
        let first = clock.instant();
        let second = clock.instant();
        assert!(second >= first);
    }
}
