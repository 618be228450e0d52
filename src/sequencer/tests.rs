//! Unit tests for the sequencer's phase transitions and setup checks.

use std::sync::{Arc, Mutex, MutexGuard};

use glam::Vec3;
use rstest::{fixture, rstest};

use super::*;
use crate::oracles::{EffectError, SurfaceId};
use crate::tasks::TaskRole;

#[derive(Default)]
struct HostState {
    pressed: bool,
    down_edge: bool,
    over: bool,
    triggers: Vec<String>,
    alpha_writes: Vec<f32>,
    charge_writes: Vec<f32>,
    effects_spawned: usize,
    fail_effects: bool,
}

#[derive(Clone, Default)]
struct FakeHost(Arc<Mutex<HostState>>);

impl FakeHost {
    fn state(&self) -> MutexGuard<'_, HostState> {
        self.0.lock().expect("host state lock")
    }

    /// Sets the pointer for the coming tick, deriving the down edge.
    fn pointer(&self, pressed: bool) {
        let mut state = self.state();
        state.down_edge = pressed && !state.pressed;
        state.pressed = pressed;
        state.over = pressed;
    }
}

impl PointerOracle for FakeHost {
    fn is_pressed(&self) -> bool {
        self.state().pressed
    }

    fn pressed_this_frame(&self) -> bool {
        self.state().down_edge
    }

    fn pointer_world_projection(&self) -> Vec3 {
        Vec3::new(2.0, 1.0, 0.0)
    }

    fn is_over_action_surface(&self, _surface: &SurfaceId) -> bool {
        self.state().over
    }
}

impl AnimationOracle for FakeHost {
    fn play_trigger(&mut self, name: &str) {
        self.state().triggers.push(name.into());
    }

    fn current_state_name(&self) -> String {
        "Idle".into()
    }

    fn normalized_playback_time(&self) -> f32 {
        0.0
    }
}

impl EffectsHost for FakeHost {
    fn spawn_click_marker(&mut self, _at: Vec3) -> Result<(), EffectError> {
        let mut state = self.state();
        if state.fail_effects {
            return Err(EffectError::MissingTemplate("click marker"));
        }
        state.effects_spawned += 1;
        Ok(())
    }

    fn spawn_and_auto_destroy_particles(&mut self, _at: Vec3) -> Result<(), EffectError> {
        let mut state = self.state();
        if state.fail_effects {
            return Err(EffectError::SpawnFailed("no particle budget".into()));
        }
        state.effects_spawned += 1;
        Ok(())
    }
}

impl SurfacePresentation for FakeHost {
    fn set_surface_alpha(&mut self, alpha: f32) {
        self.state().alpha_writes.push(alpha);
    }

    fn set_pressed_visual_active(&mut self, _active: bool) {}

    fn set_charge_render_parameter(&mut self, value: f32) {
        self.state().charge_writes.push(value);
    }
}

const DT: f32 = 0.05;

struct Rig {
    host: FakeHost,
    sequencer: ActionSequencer,
    actor: Vec3,
}

impl Rig {
    fn step(&mut self, pressed: bool) {
        self.host.pointer(pressed);
        self.sequencer.tick(DT, &mut self.actor);
    }

    fn hold_for(&mut self, seconds: f32) {
        for _ in 0..ticks(seconds) {
            self.step(true);
        }
    }

    fn idle_for(&mut self, seconds: f32) {
        for _ in 0..ticks(seconds) {
            self.step(false);
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Test durations are small positive multiples of DT."
)]
fn ticks(seconds: f32) -> usize {
    (seconds / DT).round() as usize
}

#[fixture]
fn rig() -> Rig {
    let host = FakeHost::default();
    let sequencer = ActionSequencer::builder()
        .pointer(host.clone())
        .animation(host.clone())
        .effects(host.clone())
        .surface(host.clone())
        .build()
        .expect("complete builder");
    Rig {
        host,
        sequencer,
        actor: Vec3::ZERO,
    }
}

#[rstest]
fn builder_names_the_missing_collaborator() {
    let host = FakeHost::default();
    let result = ActionSequencer::builder()
        .pointer(host.clone())
        .animation(host.clone())
        .surface(host)
        .build();
    assert!(matches!(
        result,
        Err(SetupError::MissingCollaborator("effects"))
    ));
}

#[rstest]
fn builder_rejects_invalid_settings() {
    let host = FakeHost::default();
    let result = ActionSequencer::builder()
        .settings(SequencerSettings {
            nominal_duration: 0.0,
            ..SequencerSettings::default()
        })
        .pointer(host.clone())
        .animation(host.clone())
        .effects(host.clone())
        .surface(host)
        .build();
    assert!(matches!(result, Err(SetupError::InvalidSettings(_))));
}

#[rstest]
fn build_pushes_the_bottom_level(rig: Rig) {
    assert_eq!(rig.host.state().charge_writes, vec![0.0]);
    assert_eq!(rig.sequencer.phase(), PressPhase::Idle);
    assert!(rig.sequencer.can_press());
}

#[rstest]
fn press_edge_raises_charge_target_and_spawns_effects(mut rig: Rig) {
    rig.step(true);
    assert_eq!(rig.sequencer.phase(), PressPhase::Charging);
    assert!((rig.sequencer.charge_target() - 0.4).abs() < f32::EPSILON);
    assert_eq!(rig.host.state().effects_spawned, 2);
    assert_eq!(rig.sequencer.start_position(), Some(Vec3::ZERO));
}

#[rstest]
fn short_press_attacks_once_and_closes_the_gate(mut rig: Rig) {
    rig.hold_for(0.1);
    rig.step(false);
    assert_eq!(rig.sequencer.phase(), PressPhase::Idle);
    assert!(!rig.sequencer.can_press());
    assert!(rig.sequencer.is_attacking());
    assert_eq!(rig.host.state().triggers, vec!["Attack".to_owned()]);
    assert!(rig.sequencer.events().contains(&SequencerEvent::ShortPress));
    assert!((rig.sequencer.charge_target() - 0.0).abs() < f32::EPSILON);
}

#[rstest]
fn gated_input_leaves_state_and_visuals_alone(mut rig: Rig) {
    rig.hold_for(0.1);
    rig.step(false);
    let writes_before = rig.host.state().alpha_writes.len();

    rig.hold_for(0.6);
    assert_eq!(rig.sequencer.phase(), PressPhase::Idle);
    assert!(!rig.sequencer.tasks().is_live(TaskRole::HoldLoop));
    assert_eq!(rig.host.state().alpha_writes.len(), writes_before);
}

#[rstest]
fn hold_loop_cycle_walks_every_loop_phase(mut rig: Rig) {
    rig.hold_for(0.6);
    assert_eq!(rig.sequencer.phase(), PressPhase::Looping);
    assert!(rig.sequencer.tasks().is_live(TaskRole::HoldLoop));

    rig.step(false);
    assert_eq!(rig.sequencer.phase(), PressPhase::AwaitingStopTap);
    assert!(rig.sequencer.tasks().is_live(TaskRole::HoldLoop));

    rig.step(true);
    assert_eq!(rig.sequencer.phase(), PressPhase::StoppingLoop);

    rig.step(false);
    assert_eq!(rig.sequencer.phase(), PressPhase::Idle);
    assert!(!rig.sequencer.tasks().is_live(TaskRole::HoldLoop));
    assert!(rig.sequencer.can_press());
    assert!(rig.sequencer.tasks().is_live(TaskRole::CooldownReset));
}

#[rstest]
fn manual_attack_during_loop_interrupts_it(mut rig: Rig) {
    rig.hold_for(0.6);
    rig.step(false);
    assert_eq!(
        rig.sequencer.trigger_attack(false),
        AttackOutcome::LoopInterrupted
    );
    assert_eq!(rig.sequencer.phase(), PressPhase::Idle);
    assert!(!rig.sequencer.tasks().is_live(TaskRole::HoldLoop));
    assert!(rig.sequencer.tasks().is_live(TaskRole::CooldownReset));
    assert!(rig.sequencer.events().ends_with(&[
        SequencerEvent::LoopInterrupted,
        SequencerEvent::CooldownScheduled { seconds: 1.0 },
        SequencerEvent::AttackTriggered {
            from_loop: false,
            outcome: AttackOutcome::LoopInterrupted,
        },
    ]));
}

#[rstest]
fn redirect_during_lunge_still_starts_the_return_timer(mut rig: Rig) {
    assert_eq!(rig.sequencer.trigger_attack(false), AttackOutcome::Started);
    let lunged = (0..200).any(|_| {
        rig.step(false);
        rig.sequencer
            .events()
            .iter()
            .any(|event| matches!(event, SequencerEvent::LungeCommanded { .. }))
    });
    assert!(lunged, "lunge never commanded");

    rig.sequencer.set_destination(Vec3::new(0.3, 0.0, 0.0));
    rig.idle_for(0.2);

    assert!(rig.sequencer.tasks().is_live(TaskRole::ReturnToStart));
    assert!(rig
        .sequencer
        .events()
        .contains(&SequencerEvent::ReturnTimerStarted));
}

#[rstest]
fn redirect_without_an_attack_starts_no_return_timer(mut rig: Rig) {
    rig.step(false);
    rig.sequencer.set_destination(Vec3::new(0.3, 0.0, 0.0));
    rig.idle_for(0.2);

    assert_eq!(rig.sequencer.destination(), None);
    assert!(!rig.sequencer.tasks().is_live(TaskRole::ReturnToStart));
}

#[rstest]
fn redirect_before_the_lunge_waits_for_the_lunge(mut rig: Rig) {
    assert_eq!(rig.sequencer.trigger_attack(false), AttackOutcome::Started);
    rig.sequencer.set_destination(Vec3::new(0.3, 0.0, 0.0));
    rig.idle_for(0.2);

    assert!(rig.sequencer.tasks().is_live(TaskRole::DelayedLunge));
    assert!(!rig.sequencer.tasks().is_live(TaskRole::ReturnToStart));
}

#[rstest]
fn attack_in_flight_ignores_further_requests(mut rig: Rig) {
    assert_eq!(rig.sequencer.trigger_attack(false), AttackOutcome::Started);
    assert_eq!(
        rig.sequencer.trigger_attack(false),
        AttackOutcome::AlreadyAttacking
    );
    assert_eq!(
        rig.sequencer.trigger_attack(true),
        AttackOutcome::AlreadyAttacking
    );
    assert_eq!(rig.host.state().triggers.len(), 1);
}

#[rstest]
fn failing_effects_do_not_block_the_press(mut rig: Rig) {
    rig.host.state().fail_effects = true;
    rig.hold_for(0.1);
    rig.step(false);
    assert_eq!(rig.host.state().effects_spawned, 0);
    assert_eq!(rig.host.state().triggers.len(), 1);
}

#[rstest]
fn cooldown_reopens_input_after_nominal_duration(mut rig: Rig) {
    rig.hold_for(0.1);
    rig.step(false);
    rig.idle_for(0.9);
    assert!(!rig.sequencer.can_press());
    rig.idle_for(0.15);
    assert!(rig.sequencer.can_press());
    assert_eq!(rig.host.state().alpha_writes.last(), Some(&1.0));
}
