//! One-shot timers for the engine.
//!
//! The engine never sleeps or spawns threads. It asks a [`Scheduler`] to fire
//! a [`Timer`] after a delay and gets called back through
//! `NightLight::on_timer` once the owner of the scheduler decides the timer
//! is due. [`TimerQueue`] is the implementation the daemon loop and the
//! `simulate` command drain.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use crate::time::{Clock, SystemClock};

/// Kinds of timers the engine arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    /// Periodic schedule recheck
    Poll,
    /// Temperature smoothing tick
    Smooth,
    /// End of a forced preview
    PreviewEnd,
}

/// Handle to an armed timer, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Arms and cancels one-shot timers.
#[cfg_attr(test, mockall::automock)]
pub trait Scheduler {
    /// Fire `timer` once after `delay`.
    fn schedule_once(&mut self, delay: Duration, timer: Timer) -> TimerId;

    /// Cancel a pending timer. Unknown or already fired ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

/// Deadline-ordered queue of pending timers.
///
/// Deadlines are measured against the queue's [`Clock`], so a manual clock
/// makes the queue fully deterministic.
pub struct TimerQueue {
    clock: Box<dyn Clock>,
    next_id: u64,
    by_deadline: BTreeMap<(Instant, u64), Timer>,
    deadlines: HashMap<u64, Instant>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock))
    }

    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            next_id: 0,
            by_deadline: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.by_deadline.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Time left until the earliest deadline, zero if already due.
    pub fn time_until_next(&self) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_duration_since(self.clock.instant()))
    }

    /// Remove and return the earliest timer whose deadline has passed.
    ///
    /// Timers are handed out one at a time so that a callback cancelling
    /// another due timer takes effect before that timer is returned.
    pub fn pop_due(&mut self) -> Option<(TimerId, Timer)> {
        let now = self.clock.instant();
        let (&(deadline, id), _) = self.by_deadline.iter().next()?;
        if deadline > now {
            return None;
        }
        let timer = self.by_deadline.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        Some((TimerId(id), timer))
    }

    pub fn len(&self) -> usize {
        self.by_deadline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_deadline.is_empty()
    }

    /// Whether a timer of the given kind is pending.
    pub fn contains(&self, timer: Timer) -> bool {
        self.by_deadline.values().any(|pending| *pending == timer)
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TimerQueue {
    fn schedule_once(&mut self, delay: Duration, timer: Timer) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        let deadline = self.clock.instant() + delay;
        self.by_deadline.insert((deadline, id), timer);
        self.deadlines.insert(id, deadline);
        TimerId(id)
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(deadline) = self.deadlines.remove(&id.0) {
            self.by_deadline.remove(&(deadline, id.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;
    use chrono::{FixedOffset, TimeZone};

    fn manual_queue() -> (ManualClock, TimerQueue) {
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2017, 2, 8, 20, 0, 0)
            .unwrap();
        let clock = ManualClock::new(now);
        let queue = TimerQueue::with_clock(Box::new(clock.clone()));
        (clock, queue)
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let (clock, mut queue) = manual_queue();
        queue.schedule_once(Duration::from_secs(60), Timer::Poll);
        queue.schedule_once(Duration::from_millis(50), Timer::Smooth);
        assert_eq!(queue.len(), 2);
        assert!(queue.pop_due().is_none());

        clock.advance(Duration::from_millis(50));
        assert_eq!(queue.pop_due().map(|(_, timer)| timer), Some(Timer::Smooth));
        assert!(queue.pop_due().is_none());

        clock.advance(Duration::from_secs(60));
        assert_eq!(queue.pop_due().map(|(_, timer)| timer), Some(Timer::Poll));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_equal_deadlines_keep_insertion_order() {
        let (clock, mut queue) = manual_queue();
        let first = queue.schedule_once(Duration::from_secs(1), Timer::PreviewEnd);
        let second = queue.schedule_once(Duration::from_secs(1), Timer::Poll);

        clock.advance(Duration::from_secs(1));
        assert_eq!(queue.pop_due(), Some((first, Timer::PreviewEnd)));
        assert_eq!(queue.pop_due(), Some((second, Timer::Poll)));
    }

    #[test]
    fn test_cancel_removes_timer() {
        let (clock, mut queue) = manual_queue();
        let id = queue.schedule_once(Duration::from_millis(50), Timer::Smooth);
        assert!(queue.contains(Timer::Smooth));

        queue.cancel(id);
        assert!(!queue.contains(Timer::Smooth));
        assert!(queue.is_empty());

        // Cancelling twice is harmless
        queue.cancel(id);

        clock.advance(Duration::from_secs(1));
        assert!(queue.pop_due().is_none());
    }

    #[test]
    fn test_time_until_next() {
        let (clock, mut queue) = manual_queue();
        assert_eq!(queue.time_until_next(), None);

        queue.schedule_once(Duration::from_secs(60), Timer::Poll);
        assert_eq!(queue.time_until_next(), Some(Duration::from_secs(60)));

        clock.advance(Duration::from_secs(90));
        assert_eq!(queue.time_until_next(), Some(Duration::ZERO));
    }
}
