//! Deferred actions on the tick clock
//!
//! Actions fire on the first tick at or after their due tick. The queue only
//! stores them; whoever drains it must re-check live state before acting,
//! since anything may have happened in between.

use serde::{Deserialize, Serialize};

/// Work postponed by a number of ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeferredAction {
    /// Serve a new ball once all normal balls are gone
    RespawnBall,
    /// Bar-invincible duration is over
    EndInvincibility,
    /// Re-show the draft after a reroll
    ReopenDraft { draft_index: u32 },
}

/// Queued action plus the session it was scheduled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheduled {
    pub due: u64,
    /// Session epoch at scheduling time
    pub epoch: u32,
    pub action: DeferredAction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    queue: Vec<Scheduled>,
}

impl Scheduler {
    /// Queue `action` to fire `delay` ticks after `now`
    pub fn schedule(&mut self, action: DeferredAction, now: u64, delay: u64, epoch: u32) {
        log::debug!("Scheduled {:?} in {} ticks", action, delay);
        self.queue.push(Scheduled {
            due: now + delay,
            epoch,
            action,
        });
    }

    /// Remove and return every action due at `now`, oldest first
    pub fn take_due(&mut self, now: u64) -> Vec<Scheduled> {
        let mut due = Vec::new();
        self.queue.retain(|s| {
            if s.due <= now {
                due.push(*s);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|s| s.due);
        due
    }

    /// Whether an action of this kind is waiting
    pub fn is_pending(&self, action: DeferredAction) -> bool {
        self.queue.iter().any(|s| s.action == action)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_at_due_tick() {
        let mut s = Scheduler::default();
        s.schedule(DeferredAction::RespawnBall, 10, 30, 1);

        assert!(s.take_due(39).is_empty());
        let due = s.take_due(40);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].action, DeferredAction::RespawnBall);
        assert_eq!(due[0].epoch, 1);
        assert!(s.is_empty());
    }

    #[test]
    fn test_late_drain_returns_in_due_order() {
        let mut s = Scheduler::default();
        s.schedule(DeferredAction::EndInvincibility, 0, 20, 1);
        s.schedule(DeferredAction::RespawnBall, 0, 5, 1);
        s.schedule(DeferredAction::ReopenDraft { draft_index: 2 }, 0, 100, 1);

        let due = s.take_due(50);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].action, DeferredAction::RespawnBall);
        assert_eq!(due[1].action, DeferredAction::EndInvincibility);
        assert_eq!(s.len(), 1);
        assert!(s.is_pending(DeferredAction::ReopenDraft { draft_index: 2 }));
    }
}
