//! Moving the actor through `set_destination` while an attack is in flight.

use action_controller::{AttackOutcome, SequencerEvent, SequencerSettings, ARRIVAL_EPSILON};
use glam::Vec3;
use rstest::{fixture, rstest};
use test_utils::Harness;

#[fixture]
fn harness() -> Harness {
    let settings = SequencerSettings {
        lunge_delay_frames: 2,
        ..SequencerSettings::default()
    };
    Harness::with_settings(settings, 0.05).expect("valid settings")
}

fn lunge_commanded(harness: &Harness) -> bool {
    harness
        .sequencer
        .events()
        .iter()
        .any(|event| matches!(event, SequencerEvent::LungeCommanded { .. }))
}

#[rstest]
fn redirect_mid_lunge_releases_the_attack_latch(mut harness: Harness) {
    harness.step(false);
    harness.animation.set_state("Attack_Light_01", 0.0);
    assert_eq!(harness.sequencer.trigger_attack(false), AttackOutcome::Started);
    assert!(harness.idle_until(20, lunge_commanded));

    harness.sequencer.set_destination(Vec3::new(0.3, 0.0, 0.0));
    harness.animation.set_progress(1.0);
    harness.idle_for(2.0);

    assert!(!harness.sequencer.is_attacking(), "attack latch never clears");
    assert!(harness
        .sequencer
        .events()
        .contains(&SequencerEvent::ReturnCommanded {
            destination: Vec3::ZERO
        }));
    assert!(harness.actor.length() < ARRIVAL_EPSILON);
    assert_eq!(harness.sequencer.trigger_attack(false), AttackOutcome::Started);
}

#[rstest]
fn redirect_after_the_return_leaves_the_sequencer_idle(mut harness: Harness) {
    harness.step(false);
    harness.animation.set_state("Attack_Light_01", 1.0);
    assert_eq!(harness.sequencer.trigger_attack(false), AttackOutcome::Started);
    harness.idle_for(2.0);
    assert!(!harness.sequencer.is_attacking());

    harness.sequencer.set_destination(Vec3::new(0.3, 0.0, 0.0));
    harness.idle_for(0.5);

    assert!(!harness.sequencer.is_attacking());
    let timers = harness
        .sequencer
        .events()
        .iter()
        .filter(|event| **event == SequencerEvent::ReturnTimerStarted)
        .count();
    assert_eq!(timers, 1);
}
