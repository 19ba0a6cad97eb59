use std::time::Instant;

/// Source of the current time. The UI uses [`SystemClock`]; tests drive a
/// manual clock so that timer behavior is deterministic.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Handle to a scheduled one-shot timer. Tokens are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    token: TimerToken,
    deadline: Instant,
}

/// One-shot timers pumped from a single cooperative context.
///
/// Nothing fires on its own: the owner calls [`TimerQueue::pop_due`] with the
/// current time and handles each expired token in deadline order. Timers
/// sharing a deadline fire in scheduling order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    pending: Vec<PendingTimer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Instant) -> TimerToken {
        let token = TimerToken(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        // Kept sorted by deadline; insert after any equal deadlines.
        let index = self
            .pending
            .partition_point(|timer| timer.deadline <= deadline);
        self.pending
            .insert(index, PendingTimer { token, deadline });
        token
    }

    /// Returns `false` when the timer already fired or was cancelled.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        match self.pending.iter().position(|timer| timer.token == token) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn pop_due(&mut self, now: Instant) -> Option<TimerToken> {
        match self.pending.first() {
            Some(timer) if timer.deadline <= now => Some(self.pending.remove(0).token),
            _ => None,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.first().map(|timer| timer.deadline)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
pub use manual::ManualClock;

#[cfg(test)]
mod manual {
    use std::{
        cell::Cell,
        rc::Rc,
        time::{Duration, Instant},
    };

    use super::Clock;

    /// Clock that only moves when told to. Clones share the same time.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        now: Rc<Cell<Instant>>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                now: Rc::new(Cell::new(Instant::now())),
            }
        }

        pub fn advance(&self, by: Duration) {
            self.now.set(self.now.get() + by);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.now.get()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn pops_in_deadline_order() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        let late = queue.schedule(start + Duration::from_millis(300));
        let early = queue.schedule(start + Duration::from_millis(100));
        let middle = queue.schedule(start + Duration::from_millis(200));

        let now = start + Duration::from_secs(1);
        assert_eq!(queue.pop_due(now), Some(early));
        assert_eq!(queue.pop_due(now), Some(middle));
        assert_eq!(queue.pop_due(now), Some(late));
        assert_eq!(queue.pop_due(now), None);
    }

    #[test]
    fn equal_deadlines_fire_in_scheduling_order() {
        let deadline = Instant::now();
        let mut queue = TimerQueue::new();
        let first = queue.schedule(deadline);
        let second = queue.schedule(deadline);
        assert_eq!(queue.pop_due(deadline), Some(first));
        assert_eq!(queue.pop_due(deadline), Some(second));
    }

    #[test]
    fn nothing_fires_before_its_deadline() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        queue.schedule(start + Duration::from_secs(1));
        assert_eq!(queue.pop_due(start), None);
        assert_eq!(queue.pop_due(start + Duration::from_millis(999)), None);
        assert!(queue.pop_due(start + Duration::from_secs(1)).is_some());
        assert!(queue.is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        let cancelled = queue.schedule(start + Duration::from_millis(10));
        let kept = queue.schedule(start + Duration::from_millis(20));

        assert!(queue.cancel(cancelled));
        assert!(!queue.cancel(cancelled));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_deadline(), Some(start + Duration::from_millis(20)));
        assert_eq!(queue.pop_due(start + Duration::from_secs(1)), Some(kept));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        let before = clock.now();
        other.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - before, Duration::from_millis(250));
    }
}
