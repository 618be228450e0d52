//! Movement and timing constants shared by the movers and the sequencer.
//!
//! Tunable values live in [`crate::SequencerSettings`]; the constants here are
//! fixed properties of the controller.

/// Distance below which a mover considers its destination reached.
pub const ARRIVAL_EPSILON: f32 = 0.1;
/// Slack applied when comparing countdown timers against zero so that
/// accumulated `f32` frame deltas do not delay a timer by a whole frame.
pub const TIMER_EPSILON: f32 = 1e-4;
/// Fraction of the nominal duration a press must be held before the hold
/// loop activates.
pub const HOLD_THRESHOLD_FRACTION: f32 = 0.5;
/// Fraction of the nominal duration used for the cooldown after the hold
/// loop is stopped by a release.
pub const LOOP_STOP_COOLDOWN_FRACTION: f32 = 0.5;
/// Surface alpha applied while the action surface shows as pressed.
pub const PRESSED_SURFACE_ALPHA: f32 = 0.0;
/// Surface alpha restored when a cooldown completes.
pub const RESTED_SURFACE_ALPHA: f32 = 1.0;
/// Events an undrained [`crate::EventInbox`] keeps before discarding the
/// oldest.
pub const EVENT_INBOX_CAPACITY: usize = 1024;
