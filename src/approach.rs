//! Asymmetric-speed approach of a scalar level toward a target.
//!
//! Drives the charge indicator: the sequencer sets discrete targets, the
//! approacher integrates the current level toward them each tick.

use log::trace;

/// Moves `current` toward `target` by at most `max_delta` without passing it.
#[must_use]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let gap = target - current;
    if gap.abs() <= max_delta {
        target
    } else {
        current + gap.signum() * max_delta
    }
}

/// A level approaching a target at a rise speed or a fall speed.
///
/// # Examples
///
/// ```
/// use action_controller::approach::ValueApproacher;
///
/// let mut level = ValueApproacher::new(0.0, 4.0, 2.0);
/// level.set_target(0.4);
/// level.tick(0.05);
/// assert!((level.current() - 0.2).abs() < 1e-6);
/// level.tick(0.05);
/// assert!((level.current() - 0.4).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValueApproacher {
    current: f32,
    target: f32,
    rise_speed: f32,
    fall_speed: f32,
}

impl ValueApproacher {
    /// Creates an approacher resting at `initial`.
    #[must_use]
    pub const fn new(initial: f32, rise_speed: f32, fall_speed: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            rise_speed,
            fall_speed,
        }
    }

    /// Current level.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Level being approached.
    #[must_use]
    pub const fn target(&self) -> f32 {
        self.target
    }

    /// Sets a new target; the current level is untouched until the next tick.
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Advances the level by `dt` seconds and returns the new value.
    pub fn tick(&mut self, dt: f32) -> f32 {
        let speed = if self.target > self.current {
            self.rise_speed
        } else {
            self.fall_speed
        };
        let previous = self.current;
        self.current = move_towards(self.current, self.target, (speed * dt).max(0.0));
        if (self.current - previous).abs() > f32::EPSILON {
            trace!(
                "charge level {:.3} -> target {:.3} (speed {speed})",
                self.current,
                self.target
            );
        }
        self.current
    }
}
