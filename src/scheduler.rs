//! Time source and cancellable timers.
//!
//! Nothing here sleeps or spawns: a [`TimerQueue`] only records deadlines
//! against an injected [`Clock`], and the driver drains due tasks with
//! [`TimerQueue::due`]. Tests advance a [`ManualClock`] to simulate time.

use std::{cell::Cell, rc::Rc, time::Duration};

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

/// Clock abstracts access to the current timestamp so behaviour stays
/// deterministic in tests.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Current UTC date. Defaults to `now().date_naive()`.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Real-time clock backed by the system UTC time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Shared, manually advanced clock. Clones observe the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(offset(self.now.get(), by));
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.now.set(instant);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// `instant + by`, saturating at the latest representable instant.
pub fn offset(instant: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(by)
        .ok()
        .and_then(|delta| instant.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Deferred execution of `T` after a delay, with cancellation.
pub trait Scheduler<T> {
    fn after(&mut self, delay: Duration, task: T) -> TimerId;

    /// Returns `true` if the timer was still pending.
    fn cancel(&mut self, id: TimerId) -> bool;
}

#[derive(Debug)]
struct Timer<T> {
    id: TimerId,
    deadline: DateTime<Utc>,
    task: T,
}

/// Pending timers keyed by id, ordered by deadline when drained.
#[derive(Debug)]
pub struct TimerQueue<T, C: Clock> {
    clock: C,
    next_id: u64,
    pending: Vec<Timer<T>>,
}

impl<T, C: Clock> TimerQueue<T, C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            next_id: 1,
            pending: Vec::new(),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Removes and returns every timer whose deadline has passed, earliest
    /// first. Timers with equal deadlines keep scheduling order.
    pub fn due(&mut self) -> Vec<(TimerId, T)> {
        let now = self.clock.now();
        let (mut ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|timer| timer.deadline <= now);
        self.pending = waiting;
        ready.sort_by_key(|timer| (timer.deadline, timer.id));
        ready
            .into_iter()
            .map(|timer| (timer.id, timer.task))
            .collect()
    }

    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.pending.iter().map(|timer| timer.deadline).min()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|timer| timer.id == id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T, C: Clock> Scheduler<T> for TimerQueue<T, C> {
    fn after(&mut self, delay: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let deadline = offset(self.clock.now(), delay);
        self.pending.push(Timer { id, deadline, task });
        id
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.id != id);
        self.pending.len() != before
    }
}

/// Trailing-edge debounce: each trigger cancels the pending timer and arms a
/// new one, so only a timer that survives the full quiet window fires.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    pending: Option<TimerId>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    pub fn trigger<T, S: Scheduler<T> + ?Sized>(
        &mut self,
        scheduler: &mut S,
        task: T,
    ) -> TimerId {
        self.cancel::<T, S>(scheduler);
        let id = scheduler.after(self.quiet, task);
        self.pending = Some(id);
        id
    }

    pub fn cancel<T, S: Scheduler<T> + ?Sized>(&mut self, scheduler: &mut S) -> bool {
        match self.pending.take() {
            Some(id) => scheduler.cancel(id),
            None => false,
        }
    }

    /// Acknowledges that timer `id` fired. Returns `true` when it is the
    /// debounced timer.
    pub fn fired(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap())
    }

    #[test]
    fn timers_fire_only_after_their_deadline() {
        let clock = clock();
        let mut queue = TimerQueue::new(clock.clone());
        queue.after(Duration::from_millis(500), "late");
        queue.after(Duration::from_millis(100), "early");

        clock.advance(Duration::from_millis(99));
        assert!(queue.due().is_empty());

        clock.advance(Duration::from_millis(1));
        let fired: Vec<_> = queue.due().into_iter().map(|(_, task)| task).collect();
        assert_eq!(fired, vec!["early"]);

        clock.advance(Duration::from_secs(1));
        let fired: Vec<_> = queue.due().into_iter().map(|(_, task)| task).collect();
        assert_eq!(fired, vec!["late"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let clock = clock();
        let mut queue = TimerQueue::new(clock.clone());
        let id = queue.after(Duration::from_millis(10), ());

        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        clock.advance(Duration::from_secs(1));
        assert!(queue.due().is_empty());
    }

    #[test]
    fn debounce_collapses_bursts_into_one_firing() {
        let clock = clock();
        let mut queue = TimerQueue::new(clock.clone());
        let mut debounce = Debouncer::new(Duration::from_millis(1000));

        for _ in 0..5 {
            debounce.trigger(&mut queue, "save");
            clock.advance(Duration::from_millis(400));
            assert!(queue.due().is_empty());
        }
        assert_eq!(queue.len(), 1);

        clock.advance(Duration::from_millis(600));
        let fired = queue.due();
        assert_eq!(fired.len(), 1);
        assert!(debounce.fired(fired[0].0));
        assert!(!debounce.is_pending());
    }

    #[test]
    fn next_deadline_tracks_earliest_timer() {
        let clock = clock();
        let start = clock.now();
        let mut queue = TimerQueue::new(clock);
        assert_eq!(queue.next_deadline(), None);

        queue.after(Duration::from_secs(5), ());
        queue.after(Duration::from_secs(2), ());

        assert_eq!(
            queue.next_deadline(),
            Some(offset(start, Duration::from_secs(2)))
        );
    }
}
