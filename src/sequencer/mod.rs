//! The press/hold/loop/cooldown state machine.
//!
//! [`ActionSequencer::tick`] is the single per-frame entry point. Each tick
//! runs four steps in a fixed order:
//!
//! 1. advance the scheduled tasks (cooldown reset, hold loop, delayed lunge,
//!    return timer);
//! 2. apply pointer transitions, unless input is gated by a cooldown;
//! 3. integrate the actor's waypoint mover;
//! 4. integrate the charge level and push it to the surface.
//!
//! Tasks scheduled during a tick first receive elapsed time on the next one,
//! and every input-derived transition is applied before the host reads the
//! actor position or charge level for the frame.

mod builder;
mod events;

#[cfg(test)]
mod tests;

use glam::Vec3;
use log::{debug, warn};
use serde::Serialize;

use crate::approach::ValueApproacher;
use crate::config::SequencerSettings;
use crate::oracles::{AnimationOracle, EffectsHost, PointerOracle, SurfacePresentation};
use crate::tasks::{ReturnGate, TaskSlots};
use crate::waypoint::{MoveOutcome, WaypointMover};
use crate::{PRESSED_SURFACE_ALPHA, RESTED_SURFACE_ALPHA};

pub use builder::{SequencerBuilder, SetupError};
pub use events::{AttackOutcome, EventInbox, SequencerEvent};

/// Where the press cycle stands.
///
/// Each variant is one reachable combination of "holding", "loop active"
/// and "ready to stop the loop"; the input gate and the attack-in-flight
/// guard are tracked beside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PressPhase {
    /// Nothing held, no loop.
    #[default]
    Idle,
    /// Held below the hold threshold; the charge level is rising.
    Charging,
    /// Held past the threshold; the hold loop is attacking.
    Looping,
    /// Released once while looping; the loop runs until the next release.
    AwaitingStopTap,
    /// Held again while the loop awaits its stop; releasing ends the loop.
    StoppingLoop,
}

impl PressPhase {
    /// Whether a press is being held.
    #[must_use]
    pub const fn is_holding(self) -> bool {
        matches!(self, Self::Charging | Self::Looping | Self::StoppingLoop)
    }

    /// Whether the hold loop is running.
    #[must_use]
    pub const fn loop_active(self) -> bool {
        matches!(
            self,
            Self::Looping | Self::AwaitingStopTap | Self::StoppingLoop
        )
    }

    /// Whether the next release stops the loop.
    #[must_use]
    pub const fn ready_to_stop_loop(self) -> bool {
        matches!(self, Self::AwaitingStopTap | Self::StoppingLoop)
    }
}

/// Which movement the actor's mover is carrying out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    Lunge,
    Return,
}

struct Collaborators {
    pointer: Box<dyn PointerOracle>,
    animation: Box<dyn AnimationOracle>,
    effects: Box<dyn EffectsHost>,
    surface: Box<dyn SurfacePresentation>,
}

/// Turns per-frame pointer input into attacks, movement, and charge visuals.
///
/// Build one with [`ActionSequencer::builder`].
pub struct ActionSequencer {
    settings: SequencerSettings,
    pointer: Box<dyn PointerOracle>,
    animation: Box<dyn AnimationOracle>,
    effects: Box<dyn EffectsHost>,
    surface: Box<dyn SurfacePresentation>,
    mover: WaypointMover,
    leg: Option<Leg>,
    charge: ValueApproacher,
    phase: PressPhase,
    press_timer: f32,
    can_press: bool,
    attacking: bool,
    start_position: Option<Vec3>,
    tasks: TaskSlots,
    events: EventInbox,
}

impl ActionSequencer {
    /// Starts building a sequencer.
    pub fn builder() -> SequencerBuilder {
        SequencerBuilder::default()
    }

    fn assemble(
        settings: SequencerSettings,
        collaborators: Collaborators,
        start_position: Option<Vec3>,
    ) -> Self {
        let Collaborators {
            pointer,
            animation,
            effects,
            mut surface,
        } = collaborators;
        surface.set_charge_render_parameter(settings.bottom_level);
        Self {
            mover: WaypointMover::new(settings.move_speed),
            charge: ValueApproacher::new(
                settings.bottom_level,
                settings.rise_speed,
                settings.fall_speed,
            ),
            settings,
            pointer,
            animation,
            effects,
            surface,
            leg: None,
            phase: PressPhase::Idle,
            press_timer: 0.0,
            can_press: true,
            attacking: false,
            start_position,
            tasks: TaskSlots::default(),
            events: EventInbox::default(),
        }
    }

    /// Advances the sequencer by one frame of `dt` seconds.
    ///
    /// `actor` is the controlled actor's position; the sequencer's mover
    /// writes to it and nothing else does.
    ///
    /// Transitions are buffered in an [`EventInbox`]. Hosts that drive the
    /// sequencer directly should call [`Self::drain_events`] once per frame;
    /// an undrained inbox keeps only the newest
    /// [`EVENT_INBOX_CAPACITY`](crate::EVENT_INBOX_CAPACITY) events.
    pub fn tick(&mut self, dt: f32, actor: &mut Vec3) {
        let start = *self.start_position.get_or_insert(*actor);
        self.advance_tasks(dt, *actor, start);
        if self.can_press {
            self.handle_input(dt);
        }
        self.integrate_motion(dt, actor);
        let level = self.charge.tick(dt);
        self.surface.set_charge_render_parameter(level);
    }

    /// Requests an attack.
    ///
    /// A manual request (`from_loop == false`) while the hold loop runs stops
    /// the loop and schedules a full cooldown reset instead. Otherwise the
    /// request is ignored while an attack is already in flight.
    pub fn trigger_attack(&mut self, from_loop: bool) -> AttackOutcome {
        let outcome = if !from_loop && self.phase.loop_active() {
            debug!("manual attack during hold loop; stopping loop");
            self.tasks.cancel_hold_loop();
            self.events.push(SequencerEvent::LoopInterrupted);
            self.phase = if self.phase.is_holding() {
                PressPhase::Charging
            } else {
                PressPhase::Idle
            };
            self.schedule_cooldown(self.settings.nominal_duration);
            AttackOutcome::LoopInterrupted
        } else if self.attacking {
            AttackOutcome::AlreadyAttacking
        } else {
            debug!("attack started (from loop: {from_loop})");
            self.attacking = true;
            self.animation.play_trigger(&self.settings.attack_trigger);
            self.tasks.spawn_lunge(self.settings.lunge_delay_frames);
            AttackOutcome::Started
        };
        self.events
            .push(SequencerEvent::AttackTriggered { from_loop, outcome });
        outcome
    }

    /// Sends the actor toward `destination`, replacing any pending movement.
    ///
    /// Redirecting the actor while an attack is in flight does not cancel the
    /// attack: arrival still starts the return timer once the lunge has been
    /// commanded.
    pub fn set_destination(&mut self, destination: Vec3) {
        debug!("destination set to {destination:?}");
        self.leg = None;
        self.mover.set_destination(destination);
    }

    /// The actor's pending destination.
    #[must_use]
    pub const fn destination(&self) -> Option<Vec3> {
        self.mover.destination()
    }

    /// Current charge level.
    #[must_use]
    pub const fn charge_level(&self) -> f32 {
        self.charge.current()
    }

    /// Charge level being approached.
    #[must_use]
    pub const fn charge_target(&self) -> f32 {
        self.charge.target()
    }

    /// Where the press cycle stands.
    #[must_use]
    pub const fn phase(&self) -> PressPhase {
        self.phase
    }

    /// Seconds the current press has been held.
    #[must_use]
    pub const fn press_timer(&self) -> f32 {
        self.press_timer
    }

    /// Whether input is accepted.
    #[must_use]
    pub const fn can_press(&self) -> bool {
        self.can_press
    }

    /// Whether an attack is in flight.
    #[must_use]
    pub const fn is_attacking(&self) -> bool {
        self.attacking
    }

    /// Position the actor returns to after an attack, once known.
    #[must_use]
    pub const fn start_position(&self) -> Option<Vec3> {
        self.start_position
    }

    /// Active settings.
    #[must_use]
    pub const fn settings(&self) -> &SequencerSettings {
        &self.settings
    }

    /// Live background tasks.
    #[must_use]
    pub const fn tasks(&self) -> &TaskSlots {
        &self.tasks
    }

    /// Events recorded since the last drain.
    #[must_use]
    pub fn events(&self) -> &[SequencerEvent] {
        self.events.as_slice()
    }

    /// Events discarded because the inbox was not drained in time.
    #[must_use]
    pub const fn dropped_events(&self) -> usize {
        self.events.dropped()
    }

    /// Removes and yields the recorded events.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, SequencerEvent> {
        self.events.drain()
    }

    fn advance_tasks(&mut self, dt: f32, actor: Vec3, start: Vec3) {
        if self
            .tasks
            .cooldown
            .as_mut()
            .is_some_and(|scheduled| scheduled.task.advance(dt))
        {
            self.tasks.cooldown = None;
            self.finish_cooldown();
        }

        if self
            .tasks
            .hold_loop
            .as_mut()
            .is_some_and(|scheduled| scheduled.task.advance(dt))
        {
            debug!("hold loop attack");
            self.trigger_attack(true);
        }

        if self
            .tasks
            .lunge
            .as_mut()
            .is_some_and(|scheduled| scheduled.task.advance())
        {
            self.tasks.lunge = None;
            let destination = actor + self.settings.lunge_offset;
            self.command_move(destination, Leg::Lunge);
            self.events
                .push(SequencerEvent::LungeCommanded { destination });
        }

        let gate = ReturnGate {
            state: &self.settings.attack_state,
            progress: self.settings.return_progress,
            settle: self.settings.return_settle,
        };
        let animation = self.animation.as_ref();
        if self
            .tasks
            .return_timer
            .as_mut()
            .is_some_and(|scheduled| scheduled.task.advance(dt, animation, gate))
        {
            self.tasks.return_timer = None;
            self.command_move(start, Leg::Return);
            self.attacking = false;
            self.events
                .push(SequencerEvent::ReturnCommanded { destination: start });
        }
    }

    fn handle_input(&mut self, dt: f32) {
        let over_surface = self
            .pointer
            .is_over_action_surface(&self.settings.action_surface);
        let held_over = self.pointer.is_pressed() && over_surface;

        if self.pointer.pressed_this_frame() && over_surface && !self.phase.is_holding() {
            debug!("pointer down on action surface; charging");
            self.charge.set_target(self.settings.top_level);
            let at = self.pointer.pointer_world_projection();
            self.spawn_click_effects(at);
        }

        if held_over {
            self.continue_press(dt);
        } else if self.phase.is_holding() {
            self.release();
        }
    }

    fn continue_press(&mut self, dt: f32) {
        self.show_pressed();

        if !self.phase.is_holding() {
            self.phase = if self.phase == PressPhase::AwaitingStopTap {
                PressPhase::StoppingLoop
            } else {
                PressPhase::Charging
            };
            self.press_timer = 0.0;
            debug!("press started ({:?})", self.phase);
            self.events.push(SequencerEvent::PressStarted);
        }

        self.press_timer += dt;

        if self.press_timer >= self.settings.hold_threshold() && !self.phase.loop_active() {
            self.activate_hold_loop();
        }
    }

    fn activate_hold_loop(&mut self) {
        self.phase = PressPhase::Looping;
        let task = self.tasks.spawn_hold_loop(self.settings.loop_interval);
        debug!("hold threshold passed; hold loop {task} activated");
        self.events.push(SequencerEvent::LoopActivated { task });
        self.trigger_attack(true);
    }

    fn release(&mut self) {
        match self.phase {
            PressPhase::StoppingLoop => {
                debug!("release stops the hold loop");
                self.tasks.cancel_hold_loop();
                self.phase = PressPhase::Idle;
                self.charge.set_target(self.settings.bottom_level);
                self.events.push(SequencerEvent::LoopStopped);
                self.schedule_cooldown(self.settings.loop_stop_cooldown());
            }
            PressPhase::Charging => {
                debug!("short press; single attack");
                self.phase = PressPhase::Idle;
                self.can_press = false;
                self.events.push(SequencerEvent::ShortPress);
                self.trigger_attack(false);
                self.show_pressed();
                self.charge.set_target(self.settings.bottom_level);
                self.schedule_cooldown(self.settings.nominal_duration);
            }
            PressPhase::Looping => {
                debug!("hold released; loop keeps running until the next release");
                self.phase = PressPhase::AwaitingStopTap;
                self.events.push(SequencerEvent::LoopAwaitingStop);
            }
            PressPhase::Idle | PressPhase::AwaitingStopTap => {}
        }
        self.press_timer = 0.0;
    }

    fn integrate_motion(&mut self, dt: f32, actor: &mut Vec3) {
        if self.mover.tick(actor, dt) != MoveOutcome::Arrived {
            return;
        }
        match self.leg.take() {
            Some(Leg::Return) => debug!("actor back at start position"),
            Some(Leg::Lunge) => self.start_return_timer("lunge complete"),
            None if self.awaits_return() => {
                self.start_return_timer("redirected attack arrived");
            }
            None => debug!("actor reached commanded destination"),
        }
    }

    /// An attack whose lunge already fired and whose return timer has not
    /// started yet.
    const fn awaits_return(&self) -> bool {
        self.attacking && self.tasks.lunge.is_none() && self.tasks.return_timer.is_none()
    }

    fn start_return_timer(&mut self, reason: &str) {
        let task = self.tasks.spawn_return_timer();
        debug!("{reason}; return timer {task} started");
        self.events.push(SequencerEvent::ReturnTimerStarted);
    }

    fn command_move(&mut self, destination: Vec3, leg: Leg) {
        debug!("{leg:?} toward {destination:?}");
        self.leg = Some(leg);
        self.mover.set_destination(destination);
    }

    fn schedule_cooldown(&mut self, seconds: f32) {
        let task = self.tasks.spawn_cooldown(seconds);
        debug!("cooldown reset {task} in {seconds}s");
        self.events
            .push(SequencerEvent::CooldownScheduled { seconds });
    }

    fn finish_cooldown(&mut self) {
        self.surface.set_surface_alpha(RESTED_SURFACE_ALPHA);
        self.surface.set_pressed_visual_active(false);
        self.can_press = true;
        debug!("cooldown finished; surface clickable again");
        self.events.push(SequencerEvent::CooldownFinished);
    }

    fn show_pressed(&mut self) {
        self.surface.set_surface_alpha(PRESSED_SURFACE_ALPHA);
        self.surface.set_pressed_visual_active(true);
    }

    fn spawn_click_effects(&mut self, at: Vec3) {
        if let Err(err) = self.effects.spawn_click_marker(at) {
            warn!("click marker skipped: {err}");
        }
        if let Err(err) = self.effects.spawn_and_auto_destroy_particles(at) {
            warn!("click particles skipped: {err}");
        }
    }
}
