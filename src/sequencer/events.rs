//! Transitions reported by the sequencer for the host to observe.

use glam::Vec3;
use log::warn;
use serde::Serialize;

use crate::tasks::TaskId;
use crate::EVENT_INBOX_CAPACITY;

/// What a call to [`crate::ActionSequencer::trigger_attack`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttackOutcome {
    /// The attack animation was requested and the lunge scheduled.
    Started,
    /// An attack was already in flight; nothing happened.
    AlreadyAttacking,
    /// A manual attack arrived while the hold loop ran; the loop was stopped
    /// instead of attacking.
    LoopInterrupted,
}

/// A transition of the sequencer, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SequencerEvent {
    /// The pointer went down on the action surface.
    PressStarted,
    /// A held press escalated into the hold loop.
    LoopActivated {
        /// The spawned loop task.
        task: TaskId,
    },
    /// The loop is running and waits for a release to stop it.
    LoopAwaitingStop,
    /// A release stopped the hold loop.
    LoopStopped,
    /// A manual attack request stopped the hold loop.
    LoopInterrupted,
    /// A release before the hold threshold fired a single attack.
    ShortPress,
    /// An attack was requested.
    AttackTriggered {
        /// Whether the hold loop issued the request.
        from_loop: bool,
        /// What the request did.
        outcome: AttackOutcome,
    },
    /// A cooldown reset was scheduled.
    CooldownScheduled {
        /// Delay until the reset, in seconds.
        seconds: f32,
    },
    /// A cooldown reset fired; input is accepted again.
    CooldownFinished,
    /// The actor was sent forward.
    LungeCommanded {
        /// Lunge destination.
        destination: Vec3,
    },
    /// The actor reached its lunge destination and the return timer started.
    ReturnTimerStarted,
    /// The actor was sent back to its start position.
    ReturnCommanded {
        /// The stored start position.
        destination: Vec3,
    },
}

/// Events buffered until the host drains them.
///
/// At most [`EVENT_INBOX_CAPACITY`] events are kept. A host that never
/// drains loses the oldest ones, and the loss is counted.
#[derive(Debug, Default)]
pub struct EventInbox {
    events: Vec<SequencerEvent>,
    dropped: usize,
}

impl EventInbox {
    /// Records an event, discarding the oldest one when full.
    pub fn push(&mut self, event: SequencerEvent) {
        if self.events.len() >= EVENT_INBOX_CAPACITY {
            if self.dropped == 0 {
                warn!("sequencer events are not being drained; discarding the oldest");
            }
            self.events.remove(0);
            self.dropped += 1;
        }
        self.events.push(event);
    }

    /// Removes and yields every buffered event and resets the drop count.
    pub fn drain(&mut self) -> std::vec::Drain<'_, SequencerEvent> {
        self.dropped = 0;
        self.events.drain(..)
    }

    /// Buffered events, oldest first.
    #[must_use]
    pub fn as_slice(&self) -> &[SequencerEvent] {
        &self.events
    }

    /// Number of buffered events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events discarded since the last drain.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn drain_empties_the_inbox_in_order() {
        let mut inbox = EventInbox::default();
        inbox.push(SequencerEvent::PressStarted);
        inbox.push(SequencerEvent::ShortPress);
        let drained: Vec<_> = inbox.drain().collect();
        assert_eq!(
            drained,
            vec![SequencerEvent::PressStarted, SequencerEvent::ShortPress]
        );
        assert!(inbox.is_empty());
    }

    #[rstest]
    #[expect(clippy::cast_precision_loss, reason = "Indices stay far below 2^24.")]
    fn undrained_inbox_keeps_the_newest_events() {
        let mut inbox = EventInbox::default();
        let overflow = 5;
        for second in 0..EVENT_INBOX_CAPACITY + overflow {
            inbox.push(SequencerEvent::CooldownScheduled {
                seconds: second as f32,
            });
        }

        assert_eq!(inbox.len(), EVENT_INBOX_CAPACITY);
        assert_eq!(inbox.dropped(), overflow);
        assert_eq!(
            inbox.as_slice().first(),
            Some(&SequencerEvent::CooldownScheduled {
                seconds: overflow as f32
            })
        );

        let _ = inbox.drain();
        assert_eq!(inbox.dropped(), 0);
        assert!(inbox.is_empty());
    }
}
