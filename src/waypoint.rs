//! Straight-line movement toward a single pending destination.
//!
//! A [`WaypointMover`] holds at most one destination. Setting a new one
//! overwrites the old; nothing queues. Arrival is observable only as the
//! destination becoming absent, which [`WaypointMover::tick`] also reports as
//! [`MoveOutcome::Arrived`] for the tick on which it happens.

use bevy::prelude::Component;
use glam::Vec3;
use log::trace;

use crate::ARRIVAL_EPSILON;

/// Result of advancing a mover by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// No destination was pending; the position was left untouched.
    Idle,
    /// The position moved and the destination is still pending.
    Moving,
    /// The destination was reached on this tick and has been cleared.
    Arrived,
}

/// Moves an owned position toward one destination at constant speed.
///
/// The position itself belongs to the host (a `Transform`, or the actor
/// position handed to the sequencer); the mover only mutates it while
/// ticking.
///
/// # Examples
///
/// ```
/// use glam::Vec3;
/// use action_controller::waypoint::{MoveOutcome, WaypointMover};
///
/// let mut mover = WaypointMover::new(5.0);
/// let mut position = Vec3::ZERO;
/// mover.set_destination(Vec3::new(1.0, 0.0, 0.0));
/// let mut outcome = MoveOutcome::Moving;
/// while outcome == MoveOutcome::Moving {
///     outcome = mover.tick(&mut position, 0.05);
/// }
/// assert_eq!(outcome, MoveOutcome::Arrived);
/// assert!(mover.destination().is_none());
/// ```
#[derive(Component, Debug, Clone, PartialEq)]
pub struct WaypointMover {
    speed: f32,
    destination: Option<Vec3>,
    startup_offset: Option<Vec3>,
}

impl WaypointMover {
    /// Creates an idle mover travelling at `speed` units per second.
    #[must_use]
    pub const fn new(speed: f32) -> Self {
        Self {
            speed,
            destination: None,
            startup_offset: None,
        }
    }

    /// Seeds the first destination at `position + offset` once the mover is
    /// attached to an entity.
    #[must_use]
    pub fn with_startup_offset(mut self, offset: Vec3) -> Self {
        self.startup_offset = Some(offset);
        self
    }

    /// Speed in units per second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// The pending destination, if any.
    #[must_use]
    pub const fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    /// Records `destination`, replacing any pending one.
    pub fn set_destination(&mut self, destination: Vec3) {
        trace!("mover destination set to {destination:?}");
        self.destination = Some(destination);
    }

    /// Drops any pending destination without moving.
    pub fn clear_destination(&mut self) {
        self.destination = None;
    }

    /// Consumes the startup offset, returning the destination it implies for
    /// an entity at `position`.
    pub fn take_startup_destination(&mut self, position: Vec3) -> Option<Vec3> {
        self.startup_offset.take().map(|offset| position + offset)
    }

    /// Moves `position` toward the pending destination by at most
    /// `speed * dt`.
    ///
    /// The step never passes the destination. A destination that coincides
    /// with `position` has no direction and counts as reached.
    pub fn tick(&mut self, position: &mut Vec3, dt: f32) -> MoveOutcome {
        let Some(destination) = self.destination else {
            return MoveOutcome::Idle;
        };

        let offset = destination - *position;
        let Some(direction) = offset.try_normalize() else {
            self.destination = None;
            return MoveOutcome::Arrived;
        };

        let step = (self.speed * dt).max(0.0).min(offset.length());
        *position += direction * step;

        if position.distance(destination) < ARRIVAL_EPSILON {
            self.destination = None;
            MoveOutcome::Arrived
        } else {
            MoveOutcome::Moving
        }
    }
}
