//! Polling deadlines for one-shot automation, one slot per resource kind.
//!
//! A slot is pending while it stores a deadline. Completion is detected by
//! comparing the simulation clock against the stored deadline every tick; no
//! callback is ever scheduled.

use std::time::Duration;

use cooking_trial_core::ResourceKind;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct OneShots {
    deadlines: [Option<Duration>; 2],
}

impl OneShots {
    pub(crate) fn deadline(&self, kind: ResourceKind) -> Option<Duration> {
        self.deadlines[kind.index()]
    }

    pub(crate) fn is_pending(&self, kind: ResourceKind) -> bool {
        self.deadline(kind).is_some()
    }

    /// Stores the deadline unless the slot is already pending.
    pub(crate) fn schedule(&mut self, kind: ResourceKind, ends_at: Duration) -> bool {
        let slot = &mut self.deadlines[kind.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(ends_at);
        true
    }

    /// Clears the slot, returning whether it was pending.
    pub(crate) fn release(&mut self, kind: ResourceKind) -> bool {
        self.deadlines[kind.index()].take().is_some()
    }

    pub(crate) fn is_due(&self, kind: ResourceKind, now: Duration) -> bool {
        self.deadline(kind).is_some_and(|ends_at| now >= ends_at)
    }
}
