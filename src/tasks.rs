//! Frame-spanning tasks advanced one step per sequencer tick.
//!
//! Each task is a small state object holding its own phase and elapsed time.
//! [`TaskSlots`] keeps at most one live task per [`TaskRole`]: spawning into
//! an occupied slot cancels the previous instance first, and a cancelled task
//! is dropped, so it can never act again.

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::oracles::AnimationOracle;
use crate::TIMER_EPSILON;

/// The distinct background jobs the sequencer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskRole {
    /// Repeating hold-loop attacks.
    HoldLoop,
    /// Restores input and surface visuals after a cooldown.
    CooldownReset,
    /// Sends the actor forward some frames after an attack starts.
    DelayedLunge,
    /// Sends the actor home once the attack animation has played far enough.
    ReturnToStart,
}

/// Identifier of one spawned task instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Seconds left before something happens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    /// Starts a countdown of `seconds`.
    #[must_use]
    pub const fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }

    /// Seconds left.
    #[must_use]
    pub const fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Consumes `dt` and reports whether the countdown has run out.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= TIMER_EPSILON
    }
}

/// Fires a loop attack every `interval` seconds.
///
/// The first attack is issued by the sequencer when the loop activates; the
/// task only times the repeats.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldLoopTask {
    interval: f32,
    until_next: Countdown,
}

impl HoldLoopTask {
    /// Creates a loop whose next attack is `interval` seconds away.
    #[must_use]
    pub const fn new(interval: f32) -> Self {
        Self {
            interval,
            until_next: Countdown::new(interval),
        }
    }

    /// Advances the loop, returning `true` when an attack is due.
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.until_next.advance(dt) {
            let overshoot = self.until_next.remaining().min(0.0);
            self.until_next = Countdown::new(self.interval + overshoot);
            true
        } else {
            false
        }
    }
}

/// Waits a number of frames, regardless of their duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDelay {
    frames_left: u32,
}

impl FrameDelay {
    /// Waits `frames` ticks; zero fires on the next tick.
    #[must_use]
    pub const fn new(frames: u32) -> Self {
        Self {
            frames_left: frames,
        }
    }

    /// Counts one frame, returning `true` once the delay has elapsed.
    pub fn advance(&mut self) -> bool {
        self.frames_left = self.frames_left.saturating_sub(1);
        self.frames_left == 0
    }
}

/// Progress of the return-to-start timer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReturnPhase {
    /// Waiting for the attack state to become current.
    AwaitingState,
    /// Waiting for playback to pass the progress threshold or leave the state.
    AwaitingProgress,
    /// Waiting out the settle delay.
    Settling(Countdown),
}

/// Thresholds the return timer evaluates against.
#[derive(Debug, Clone, Copy)]
pub struct ReturnGate<'a> {
    /// Animation state that marks the attack.
    pub state: &'a str,
    /// Normalised playback time to wait for.
    pub progress: f32,
    /// Settle delay once the progress has been reached.
    pub settle: f32,
}

/// Couples the return leg to animation playback instead of a fixed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnTimerTask {
    phase: ReturnPhase,
}

impl Default for ReturnTimerTask {
    fn default() -> Self {
        Self {
            phase: ReturnPhase::AwaitingState,
        }
    }
}

impl ReturnTimerTask {
    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> ReturnPhase {
        self.phase
    }

    /// Advances the timer, returning `true` when the actor should return.
    ///
    /// Several animation phases may pass within one tick; the settle delay
    /// starts counting on the tick after it is entered.
    pub fn advance(
        &mut self,
        dt: f32,
        animation: &dyn AnimationOracle,
        gate: ReturnGate<'_>,
    ) -> bool {
        if self.phase == ReturnPhase::AwaitingState {
            if !animation.is_in_state(gate.state) {
                return false;
            }
            self.phase = ReturnPhase::AwaitingProgress;
        }

        match self.phase {
            ReturnPhase::AwaitingState => false,
            ReturnPhase::AwaitingProgress => {
                let still_playing = animation.is_in_state(gate.state)
                    && animation.normalized_playback_time() < gate.progress;
                if !still_playing {
                    self.phase = ReturnPhase::Settling(Countdown::new(gate.settle));
                }
                false
            }
            ReturnPhase::Settling(ref mut countdown) => countdown.advance(dt),
        }
    }
}

/// A task together with the id it was spawned under.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheduled<T> {
    /// Instance identifier, unique per sequencer.
    pub id: TaskId,
    /// The task state.
    pub task: T,
}

/// One slot per [`TaskRole`].
#[derive(Debug, Default)]
pub struct TaskSlots {
    next_id: u64,
    /// Live hold loop, if any.
    pub hold_loop: Option<Scheduled<HoldLoopTask>>,
    /// Pending cooldown reset, if any.
    pub cooldown: Option<Scheduled<Countdown>>,
    /// Pending lunge, if any.
    pub lunge: Option<Scheduled<FrameDelay>>,
    /// Running return timer, if any.
    pub return_timer: Option<Scheduled<ReturnTimerTask>>,
}

impl TaskSlots {
    fn allocate(&mut self) -> TaskId {
        self.next_id += 1;
        TaskId(self.next_id)
    }

    fn replace<T>(
        slot: &mut Option<Scheduled<T>>,
        role: TaskRole,
        scheduled: Scheduled<T>,
    ) -> TaskId {
        let id = scheduled.id;
        if let Some(previous) = slot.replace(scheduled) {
            debug!("{role:?} task {} cancelled by {id}", previous.id);
        }
        id
    }

    /// Starts a hold loop, cancelling any live one.
    pub fn spawn_hold_loop(&mut self, interval: f32) -> TaskId {
        let scheduled = Scheduled {
            id: self.allocate(),
            task: HoldLoopTask::new(interval),
        };
        Self::replace(&mut self.hold_loop, TaskRole::HoldLoop, scheduled)
    }

    /// Schedules a cooldown reset, cancelling any pending one.
    pub fn spawn_cooldown(&mut self, seconds: f32) -> TaskId {
        let scheduled = Scheduled {
            id: self.allocate(),
            task: Countdown::new(seconds),
        };
        Self::replace(&mut self.cooldown, TaskRole::CooldownReset, scheduled)
    }

    /// Schedules a lunge, cancelling any pending one.
    pub fn spawn_lunge(&mut self, frames: u32) -> TaskId {
        let scheduled = Scheduled {
            id: self.allocate(),
            task: FrameDelay::new(frames),
        };
        Self::replace(&mut self.lunge, TaskRole::DelayedLunge, scheduled)
    }

    /// Starts a return timer, cancelling any running one.
    pub fn spawn_return_timer(&mut self) -> TaskId {
        let scheduled = Scheduled {
            id: self.allocate(),
            task: ReturnTimerTask::default(),
        };
        Self::replace(&mut self.return_timer, TaskRole::ReturnToStart, scheduled)
    }

    /// Cancels the live hold loop, returning its id.
    pub fn cancel_hold_loop(&mut self) -> Option<TaskId> {
        let id = self.hold_loop.take().map(|scheduled| scheduled.id);
        if let Some(id) = id {
            debug!("HoldLoop task {id} cancelled");
        }
        id
    }

    /// Whether a task with `role` is live.
    #[must_use]
    pub const fn is_live(&self, role: TaskRole) -> bool {
        match role {
            TaskRole::HoldLoop => self.hold_loop.is_some(),
            TaskRole::CooldownReset => self.cooldown.is_some(),
            TaskRole::DelayedLunge => self.lunge.is_some(),
            TaskRole::ReturnToStart => self.return_timer.is_some(),
        }
    }
}
