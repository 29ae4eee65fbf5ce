//! Single-timeline scheduler for a table of delayed effects.
//!
//! A run is armed from a list of `(delay, effect)` entries measured from the
//! arm time. The scheduler never fires anything on its own: the owner asks
//! for due effects with [`Scheduler::pop_due`] whenever its clock advances,
//! which keeps every mutation on the owner's logical thread.
//!
//! # Ordering
//!
//! Effects come out in non-decreasing due time. Entries with the same delay
//! keep their source order.
//!
//! # Re-arming
//!
//! Arming while a run is pending cancels that run first (cancel-and-replace).
//! Each arm or cancel bumps [`Scheduler::generation`], so a caller holding an
//! older generation can tell its run is gone.

use std::collections::VecDeque;

/// One row of a schedule table.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEntry<E> {
    /// Delay from the moment the run is armed
    pub delay_ms: u64,
    pub effect: E,
}

impl<E> ScheduledEntry<E> {
    pub fn new(delay_ms: u64, effect: E) -> Self {
        Self { delay_ms, effect }
    }
}

/// An effect handed back to the owner once its due time has passed.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<E> {
    pub due_ms: u64,
    pub effect: E,
}

#[derive(Debug, Clone)]
struct Pending<E> {
    due_ms: u64,
    effect: E,
}

#[derive(Debug, Clone)]
pub struct Scheduler<E> {
    /// Sorted by due time, ties in source order
    pending: VecDeque<Pending<E>>,
    /// Arm time of the current run, cleared on cancel
    armed_at_ms: Option<u64>,
    generation: u64,
    total_fired: u64,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            armed_at_ms: None,
            generation: 0,
            total_fired: 0,
        }
    }

    /// Arm a new run at `now_ms`. Returns the number of effects cancelled
    /// from a run that was still pending.
    pub fn arm<I>(&mut self, entries: I, now_ms: u64) -> usize
    where
        I: IntoIterator<Item = ScheduledEntry<E>>,
    {
        let cancelled = self.cancel_all();

        let mut pending: Vec<Pending<E>> = entries
            .into_iter()
            .map(|entry| Pending {
                due_ms: now_ms.saturating_add(entry.delay_ms),
                effect: entry.effect,
            })
            .collect();
        // Stable sort: equal delays keep their table order
        pending.sort_by_key(|p| p.due_ms);

        self.pending = pending.into();
        self.armed_at_ms = Some(now_ms);
        self.generation += 1;
        cancelled
    }

    /// Drop every pending effect. Already-fired effects are not undone.
    /// Returns how many effects were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        if self.armed_at_ms.take().is_some() || dropped > 0 {
            self.generation += 1;
        }
        dropped
    }

    /// Take the next effect whose due time is at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Fired<E>> {
        if self.pending.front()?.due_ms > now_ms {
            return None;
        }
        let next = self.pending.pop_front()?;
        self.total_fired += 1;
        Some(Fired {
            due_ms: next.due_ms,
            effect: next.effect,
        })
    }

    /// Take every effect due at or before `now_ms`, in firing order.
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<Fired<E>> {
        let mut fired = Vec::new();
        while let Some(next) = self.pop_due(now_ms) {
            fired.push(next);
        }
        fired
    }

    /// Due time of the next pending effect, if any.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.pending.front().map(|p| p.due_ms)
    }

    /// True while the current run still has effects to fire.
    pub fn is_armed(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn armed_at_ms(&self) -> Option<u64> {
        self.armed_at_ms
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn total_fired(&self) -> u64 {
        self.total_fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(u64, &'static str)]) -> Vec<ScheduledEntry<&'static str>> {
        rows.iter()
            .map(|&(delay, tag)| ScheduledEntry::new(delay, tag))
            .collect()
    }

    #[test]
    fn test_fires_in_delay_order() {
        let mut sched = Scheduler::new();
        sched.arm(table(&[(300, "c"), (100, "a"), (200, "b")]), 1_000);

        assert_eq!(sched.next_deadline_ms(), Some(1_100));
        assert!(sched.pop_due(1_099).is_none());

        let fired: Vec<_> = sched.drain_due(1_300).into_iter().map(|f| f.effect).collect();
        assert_eq!(fired, vec!["a", "b", "c"]);
        assert!(!sched.is_armed());
        assert_eq!(sched.total_fired(), 3);
    }

    #[test]
    fn test_ties_keep_source_order() {
        let mut sched = Scheduler::new();
        sched.arm(table(&[(50, "first"), (10, "early"), (50, "second"), (50, "third")]), 0);

        let fired: Vec<_> = sched.drain_due(50).into_iter().map(|f| f.effect).collect();
        assert_eq!(fired, vec!["early", "first", "second", "third"]);
    }

    #[test]
    fn test_partial_drain() {
        let mut sched = Scheduler::new();
        sched.arm(table(&[(500, "a"), (1_000, "b"), (1_500, "c")]), 0);

        let fired = sched.drain_due(1_200);
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[1].due_ms, 1_000);
        assert_eq!(sched.pending_count(), 1);
        assert_eq!(sched.next_deadline_ms(), Some(1_500));
    }

    #[test]
    fn test_rearm_cancels_pending_run() {
        let mut sched = Scheduler::new();
        sched.arm(table(&[(500, "old-a"), (1_000, "old-b")]), 0);
        sched.drain_due(600);
        let gen_before = sched.generation();

        let cancelled = sched.arm(table(&[(500, "new")]), 700);
        assert_eq!(cancelled, 1);
        assert!(sched.generation() > gen_before);

        let fired: Vec<_> = sched.drain_due(10_000).into_iter().map(|f| f.effect).collect();
        assert_eq!(fired, vec!["new"]);
    }

    #[test]
    fn test_cancel_all_stops_everything() {
        let mut sched = Scheduler::new();
        sched.arm(table(&[(1, "a"), (2, "b")]), 0);
        assert_eq!(sched.cancel_all(), 2);
        assert!(sched.drain_due(u64::MAX).is_empty());
        assert_eq!(sched.armed_at_ms(), None);
        assert_eq!(sched.next_deadline_ms(), None);
    }

    #[test]
    fn test_cancel_idle_scheduler_keeps_generation() {
        let mut sched: Scheduler<()> = Scheduler::new();
        assert_eq!(sched.cancel_all(), 0);
        assert_eq!(sched.generation(), 0);
    }

    #[test]
    fn test_due_time_saturates() {
        let mut sched = Scheduler::new();
        sched.arm(table(&[(10, "late")]), u64::MAX - 1);
        assert_eq!(sched.next_deadline_ms(), Some(u64::MAX));
    }
}
