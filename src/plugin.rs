//! Bevy plugin wiring the sequencer and the pursuit movers into the schedule.

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use log::{debug, error};
use thiserror::Error;

use crate::sequencer::{ActionSequencer, SequencerEvent};
use crate::waypoint::WaypointMover;

/// The sequencer driving the [`ControlledActor`].
///
/// Insert it before adding [`ActionControllerPlugin`]; the plugin only
/// schedules the controller system when the resource is already present.
#[derive(Resource)]
pub struct ActionController(pub ActionSequencer);

/// Marks the entity whose `Transform` the sequencer moves.
///
/// Exactly one entity should carry it. The sequencer owns that entity's
/// movement, so it should not also carry a [`WaypointMover`].
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct ControlledActor;

/// A sequencer transition republished to observers.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct SequencerNotice(pub SequencerEvent);

/// Context carried by [`ControllerSetupError`] events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerSetupContext {
    /// The plugin was added without an [`ActionController`] resource.
    MissingController,
    /// The controller system could not find a single [`ControlledActor`].
    ControlledActor,
}

/// Event raised when the controller cannot be driven.
#[derive(Event, Debug, Clone, Error)]
#[error("{context:?}: {detail}")]
pub struct ControllerSetupError {
    /// Where the failure occurred.
    pub context: ControllerSetupContext,
    /// Description of the underlying error.
    pub detail: String,
}

impl ControllerSetupError {
    /// Convenience constructor used by the plugin and its systems.
    pub fn new(context: ControllerSetupContext, detail: impl Into<String>) -> Self {
        Self {
            context,
            detail: detail.into(),
        }
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn log_setup_error(event: On<ControllerSetupError>) {
    let ControllerSetupError { context, detail } = event.event();
    error!("action controller setup error during {context:?}: {detail}");
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn log_sequencer_notice(event: On<SequencerNotice>) {
    debug!("sequencer: {:?}", event.event().0);
}

/// Seeds the first destination of newly added movers from their startup
/// offset.
pub fn apply_startup_offsets(
    mut query: Query<(&mut WaypointMover, &Transform), Added<WaypointMover>>,
) {
    for (mut mover, transform) in &mut query {
        if let Some(destination) = mover.take_startup_destination(transform.translation) {
            mover.set_destination(destination);
        }
    }
}

/// Advances every free-standing [`WaypointMover`] toward its destination.
pub fn pursuit_system(
    time: Res<Time>,
    mut query: Query<(&mut WaypointMover, &mut Transform), Without<ControlledActor>>,
) {
    let dt = time.delta_secs();
    for (mut mover, mut transform) in &mut query {
        mover.tick(&mut transform.translation, dt);
    }
}

/// Ticks the sequencer against the controlled actor and republishes its
/// events as [`SequencerNotice`]s.
///
/// A missing or duplicated [`ControlledActor`] is reported once per outage
/// and the frame is skipped.
pub fn action_controller_system(
    mut commands: Commands,
    time: Res<Time>,
    mut controller: ResMut<ActionController>,
    mut actors: Query<&mut Transform, With<ControlledActor>>,
    mut reported: Local<bool>,
) {
    let mut transform = match actors.single_mut() {
        Ok(transform) => transform,
        Err(err) => {
            if !*reported {
                *reported = true;
                commands.trigger(ControllerSetupError::new(
                    ControllerSetupContext::ControlledActor,
                    err.to_string(),
                ));
            }
            return;
        }
    };
    *reported = false;

    let sequencer = &mut controller.0;
    sequencer.tick(time.delta_secs(), &mut transform.translation);
    for event in sequencer.drain_events() {
        commands.trigger(SequencerNotice(event));
    }
}

/// Bevy plugin installing the pursuit movers and, when an
/// [`ActionController`] resource exists, the controller system.
#[derive(Default)]
pub struct ActionControllerPlugin;

impl Plugin for ActionControllerPlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(log_setup_error);
        app.add_systems(Update, (apply_startup_offsets, pursuit_system).chain());

        if !app.world().contains_resource::<ActionController>() {
            app.world_mut().trigger(ControllerSetupError::new(
                ControllerSetupContext::MissingController,
                "insert an ActionController resource before adding the plugin",
            ));
            return;
        }

        app.add_observer(log_sequencer_notice);
        app.add_systems(Update, action_controller_system.after(pursuit_system));
    }
}
