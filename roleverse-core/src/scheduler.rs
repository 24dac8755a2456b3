//! Timer scheduling for cooperative animation steps.
//!
//! The renderer never sleeps. It asks a [`Scheduler`] for a timer, and the
//! front end later reports which timers fired. [`TimerQueue`] keeps its own
//! virtual clock, so the same code runs against wall time in the terminal and
//! against a hand-advanced clock in tests.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

/// Identifies one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Source of one-shot timers.
pub trait Scheduler {
    /// Current position of the scheduler's clock.
    fn now(&self) -> Duration;

    /// Schedule a timer `delay` from now.
    fn schedule(&mut self, delay: Duration) -> TimerId;

    /// Cancel a pending timer. Unknown or already fired ids are ignored.
    fn cancel(&mut self, id: TimerId);

    /// Due time of the earliest pending timer.
    fn next_due(&self) -> Option<Duration>;

    /// Remove the earliest timer due at or before `deadline` and move the
    /// clock to its due time. When nothing is due the clock moves to
    /// `deadline` and `None` is returned.
    fn pop_due(&mut self, deadline: Duration) -> Option<TimerId>;
}

/// Virtual-clock timer queue. Timers due at the same instant fire in the
/// order they were scheduled.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    queue: BTreeSet<(Duration, TimerId)>,
    due_times: HashMap<TimerId, Duration>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Scheduler for TimerQueue {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due = self.now + delay;
        self.queue.insert((due, id));
        self.due_times.insert(id, due);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(due) = self.due_times.remove(&id) {
            self.queue.remove(&(due, id));
        }
    }

    fn next_due(&self) -> Option<Duration> {
        self.queue.first().map(|(due, _)| *due)
    }

    fn pop_due(&mut self, deadline: Duration) -> Option<TimerId> {
        match self.queue.first().copied() {
            Some((due, id)) if due <= deadline => {
                self.queue.remove(&(due, id));
                self.due_times.remove(&id);
                self.now = self.now.max(due);
                Some(id)
            }
            _ => {
                self.now = self.now.max(deadline);
                None
            }
        }
    }
}
