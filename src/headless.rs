//! A scripted, window-less host for running the sequencer from the command
//! line.
//!
//! Every collaborator reads a shared [`SimClock`]. The pointer follows a list
//! of [`PressWindow`]s, and the animation oracle stays in the last triggered
//! clip state while its normalised time keeps growing. Effects and surface
//! writes are only logged.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Vec3;
use log::{debug, trace};
use serde::Serialize;

use crate::config::SequencerSettings;
use crate::oracles::{
    AnimationOracle, EffectError, EffectsHost, PointerOracle, SurfaceId, SurfacePresentation,
};
use crate::sequencer::{ActionSequencer, SequencerEvent, SetupError};

#[derive(Debug, Default)]
struct ClockState {
    now: f32,
    previous: f32,
}

/// Simulation time shared by the scripted collaborators.
#[derive(Debug, Clone, Default)]
pub struct SimClock(Arc<Mutex<ClockState>>);

impl SimClock {
    fn state(&self) -> MutexGuard<'_, ClockState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves the clock forward by one frame of `dt` seconds.
    pub fn advance(&self, dt: f32) {
        let mut state = self.state();
        state.previous = state.now;
        state.now += dt;
    }

    /// Current simulation time in seconds.
    #[must_use]
    pub fn now(&self) -> f32 {
        self.state().now
    }

    /// Simulation time at the end of the previous frame.
    #[must_use]
    pub fn previous(&self) -> f32 {
        self.state().previous
    }
}

/// A half-open interval `[start, end)` of simulation time during which the
/// pointer is held.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PressWindow {
    /// Press time in seconds.
    pub start: f32,
    /// Release time in seconds.
    pub end: f32,
}

impl PressWindow {
    /// A window starting at `start` and lasting `duration` seconds.
    #[must_use]
    pub fn new(start: f32, duration: f32) -> Self {
        Self {
            start,
            end: start + duration,
        }
    }

    /// Whether `time` falls inside the window.
    #[must_use]
    pub fn contains(&self, time: f32) -> bool {
        (self.start..self.end).contains(&time)
    }
}

/// Pointer that presses the action surface during scripted windows.
#[derive(Debug, Clone)]
pub struct ScriptedPointer {
    clock: SimClock,
    windows: Vec<PressWindow>,
    projection: Vec3,
}

impl ScriptedPointer {
    /// A pointer resting over the action surface, held during `windows`.
    #[must_use]
    pub fn new(clock: SimClock, windows: Vec<PressWindow>) -> Self {
        Self {
            clock,
            windows,
            projection: Vec3::ZERO,
        }
    }

    /// Sets the world position reported for the pointer.
    #[must_use]
    pub fn with_projection(mut self, projection: Vec3) -> Self {
        self.projection = projection;
        self
    }

    fn held_at(&self, time: f32) -> bool {
        self.windows.iter().any(|window| window.contains(time))
    }
}

impl PointerOracle for ScriptedPointer {
    fn is_pressed(&self) -> bool {
        self.held_at(self.clock.now())
    }

    fn pressed_this_frame(&self) -> bool {
        self.held_at(self.clock.now()) && !self.held_at(self.clock.previous())
    }

    fn pointer_world_projection(&self) -> Vec3 {
        self.projection
    }

    fn is_over_action_surface(&self, _surface: &SurfaceId) -> bool {
        true
    }
}

#[derive(Debug)]
struct Playing {
    state: String,
    length: f32,
    started_at: f32,
}

/// Animation oracle that maps triggers to named clip states on the clock.
#[derive(Debug)]
pub struct ClipTimeline {
    clock: SimClock,
    idle_state: String,
    clips: HashMap<String, (String, f32)>,
    playing: Option<Playing>,
}

impl ClipTimeline {
    /// A timeline resting in `idle_state` with no clips registered.
    #[must_use]
    pub fn new(clock: SimClock, idle_state: impl Into<String>) -> Self {
        Self {
            clock,
            idle_state: idle_state.into(),
            clips: HashMap::new(),
            playing: None,
        }
    }

    /// Registers the state entered by `trigger` and its clip length in
    /// seconds.
    #[must_use]
    pub fn with_clip(
        mut self,
        trigger: impl Into<String>,
        state: impl Into<String>,
        length: f32,
    ) -> Self {
        self.clips
            .insert(trigger.into(), (state.into(), length.max(f32::EPSILON)));
        self
    }
}

impl AnimationOracle for ClipTimeline {
    fn play_trigger(&mut self, name: &str) {
        let Some((state, length)) = self.clips.get(name) else {
            debug!("animation trigger `{name}` has no clip; ignored");
            return;
        };
        trace!("animation entering `{state}`");
        self.playing = Some(Playing {
            state: state.clone(),
            length: *length,
            started_at: self.clock.now(),
        });
    }

    fn current_state_name(&self) -> String {
        self.playing
            .as_ref()
            .map_or_else(|| self.idle_state.clone(), |playing| playing.state.clone())
    }

    fn normalized_playback_time(&self) -> f32 {
        self.playing.as_ref().map_or(0.0, |playing| {
            (self.clock.now() - playing.started_at) / playing.length
        })
    }
}

/// Effects host that logs each spawn.
#[derive(Debug, Default)]
pub struct LoggingEffects;

impl EffectsHost for LoggingEffects {
    fn spawn_click_marker(&mut self, at: Vec3) -> Result<(), EffectError> {
        debug!("click marker at {at:?}");
        Ok(())
    }

    fn spawn_and_auto_destroy_particles(&mut self, at: Vec3) -> Result<(), EffectError> {
        debug!("click particles at {at:?}");
        Ok(())
    }
}

/// Surface presentation that logs visual changes.
///
/// Charge writes arrive every frame, so they are logged at trace level.
#[derive(Debug, Default)]
pub struct LoggingSurface;

impl SurfacePresentation for LoggingSurface {
    fn set_surface_alpha(&mut self, alpha: f32) {
        trace!("surface alpha {alpha}");
    }

    fn set_pressed_visual_active(&mut self, active: bool) {
        trace!("pressed visual {active}");
    }

    fn set_charge_render_parameter(&mut self, value: f32) {
        trace!("charge parameter {value}");
    }
}

/// A sequencer event stamped with when it was drained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedEvent {
    /// Frame on which the event happened, counted from 1.
    pub frame: u64,
    /// Simulation time of that frame.
    pub time: f32,
    /// The transition.
    pub event: SequencerEvent,
}

/// Length of the attack clip used by headless runs, in seconds.
pub const HEADLESS_ATTACK_CLIP_SECS: f32 = 1.0;

/// A sequencer wired to scripted collaborators and driven frame by frame.
pub struct HeadlessRun {
    clock: SimClock,
    sequencer: ActionSequencer,
    actor: Vec3,
    frame: u64,
    events: Vec<TimedEvent>,
}

impl HeadlessRun {
    /// Builds a run whose pointer is held during `windows`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::InvalidSettings`] when `settings` fail
    /// validation.
    pub fn new(settings: SequencerSettings, windows: Vec<PressWindow>) -> Result<Self, SetupError> {
        let clock = SimClock::default();
        let animation = ClipTimeline::new(clock.clone(), "Idle").with_clip(
            settings.attack_trigger.clone(),
            settings.attack_state.clone(),
            HEADLESS_ATTACK_CLIP_SECS,
        );
        let sequencer = ActionSequencer::builder()
            .settings(settings)
            .pointer(ScriptedPointer::new(clock.clone(), windows))
            .animation(animation)
            .effects(LoggingEffects)
            .surface(LoggingSurface)
            .start_position(Vec3::ZERO)
            .build()?;
        Ok(Self {
            clock,
            sequencer,
            actor: Vec3::ZERO,
            frame: 0,
            events: Vec::new(),
        })
    }

    /// Advances the clock and the sequencer by one frame.
    pub fn step(&mut self, dt: f32) {
        self.clock.advance(dt);
        self.frame += 1;
        self.sequencer.tick(dt, &mut self.actor);
        let (frame, time) = (self.frame, self.clock.now());
        self.events.extend(
            self.sequencer
                .drain_events()
                .map(|event| TimedEvent { frame, time, event }),
        );
    }

    /// Runs `frames` frames of `dt` seconds each.
    pub fn run(&mut self, frames: u64, dt: f32) {
        for _ in 0..frames {
            self.step(dt);
        }
    }

    /// The controlled actor's position.
    #[must_use]
    pub const fn actor(&self) -> Vec3 {
        self.actor
    }

    /// The driven sequencer.
    #[must_use]
    pub const fn sequencer(&self) -> &ActionSequencer {
        &self.sequencer
    }

    /// Every event recorded so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    /// Frames run so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Current simulation time.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.clock.now()
    }
}
