//! Virtual-clock scheduler for staged transitions
//!
//! Staged transitions (dribble stages, shot suspense, celebrations, keeper
//! restarts, opponent thinking) are queued here as plain [`Continuation`]
//! values instead of nested timer callbacks. Each entry is stamped with the
//! match epoch at scheduling time; the engine drops entries whose epoch no
//! longer matches, so a reset match can never be touched by leftovers.
//!
//! Entries fire in due-time order, ties in scheduling order.

use crate::core::{FieldSlot, PlayerRef, Side};
use std::collections::BTreeMap;

/// Deferred state transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Dribble stage one: exchange slots with the beaten player
    DribbleSwap { dribbler: PlayerRef, target: FieldSlot },
    /// Dribble stage two: settle everyone else's stance
    DribbleSettle { dribbler: PlayerRef },
    /// Suspense over: roll the shot
    ResolveShot { shooter: PlayerRef },
    /// Keeper save window over: hand the ball to the saving side
    SaveRestart { saving: Side },
    /// Celebration window over: kick off again
    CelebrationEnd { scoring: Side },
    /// Home keeper distributes to a midfielder
    KeeperDistribution { side: Side },
    /// Opponent decision point; stale when the token was superseded
    OpponentTurn { token: u64 },
    /// Clear a transient message if it is still the current one
    ClearMessage { message_id: u64 },
}

impl Continuation {
    /// Continuations that only touch presentation state
    pub fn is_cosmetic(&self) -> bool {
        matches!(self, Continuation::ClearMessage { .. })
    }
}

/// A queued continuation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    pub due_ms: u64,
    pub epoch: u64,
    pub task: Continuation,
}

/// Ordered queue of continuations over a virtual millisecond clock
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now_ms: u64,
    epoch: u64,
    next_seq: u64,
    queue: BTreeMap<(u64, u64), Scheduled>,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler::default()
    }

    /// Current virtual time
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Identity of the match currently owning the scheduler
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Start a new match identity; everything queued so far becomes stale
    pub fn bump_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    /// Queue a continuation `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: u64, task: Continuation) {
        let due_ms = self.now_ms + delay_ms;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert(
            (due_ms, seq),
            Scheduled {
                due_ms,
                epoch: self.epoch,
                task,
            },
        );
    }

    /// Due time of the earliest queued entry
    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|&(due, _)| due)
    }

    /// Pop the earliest entry due at or before `until_ms`, moving the clock to it
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Scheduled> {
        let (&key, _) = self.queue.iter().next()?;
        if key.0 > until_ms {
            return None;
        }
        let entry = self.queue.remove(&key)?;
        self.now_ms = self.now_ms.max(entry.due_ms);
        Some(entry)
    }

    /// Pop the earliest entry regardless of due time
    pub fn pop_next(&mut self) -> Option<Scheduled> {
        self.pop_due(u64::MAX)
    }

    /// Move the clock forward without running anything
    pub fn advance_clock_to(&mut self, time_ms: u64) {
        self.now_ms = self.now_ms.max(time_ms);
    }

    /// Entries belonging to the current epoch
    pub fn live(&self) -> impl Iterator<Item = &Scheduled> {
        let epoch = self.epoch;
        self.queue.values().filter(move |s| s.epoch == epoch)
    }

    /// No live entry left that changes match state
    pub fn is_idle(&self) -> bool {
        self.live().all(|s| s.task.is_cosmetic())
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_due_then_schedule_order() {
        let mut sched = Scheduler::new();
        sched.schedule(100, Continuation::OpponentTurn { token: 1 });
        sched.schedule(50, Continuation::OpponentTurn { token: 2 });
        sched.schedule(100, Continuation::OpponentTurn { token: 3 });

        let order: Vec<_> = std::iter::from_fn(|| sched.pop_next())
            .map(|s| s.task)
            .collect();
        assert_eq!(
            order,
            vec![
                Continuation::OpponentTurn { token: 2 },
                Continuation::OpponentTurn { token: 1 },
                Continuation::OpponentTurn { token: 3 },
            ]
        );
        assert_eq!(sched.now(), 100);
    }

    #[test]
    fn test_pop_due_respects_deadline() {
        let mut sched = Scheduler::new();
        sched.schedule(1000, Continuation::ClearMessage { message_id: 1 });
        assert!(sched.pop_due(999).is_none());
        assert_eq!(sched.now(), 0);
        assert!(sched.pop_due(1000).is_some());
        assert_eq!(sched.now(), 1000);
    }

    #[test]
    fn test_epoch_makes_entries_stale() {
        let mut sched = Scheduler::new();
        sched.schedule(10, Continuation::SaveRestart { saving: Side::Home });
        assert!(!sched.is_idle());

        let old = sched.epoch();
        sched.bump_epoch();
        assert!(sched.is_idle());
        let entry = sched.pop_next().unwrap();
        assert_eq!(entry.epoch, old);
        assert_ne!(entry.epoch, sched.epoch());
    }

    #[test]
    fn test_cosmetic_entries_do_not_block_idle() {
        let mut sched = Scheduler::new();
        sched.schedule(3000, Continuation::ClearMessage { message_id: 4 });
        assert!(sched.is_idle());
        assert_eq!(sched.len(), 1);
    }
}
