//! Recording collaborators and a frame-stepping harness for integration
//! tests.
//!
//! Each fake is a cheap handle over shared state: clone one into the
//! sequencer builder and keep the other to script inputs or inspect what the
//! sequencer wrote.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use action_controller::{
    ActionSequencer, AnimationOracle, EffectError, EffectsHost, PointerOracle, SequencerSettings,
    SetupError, SurfaceId, SurfacePresentation,
};
use glam::Vec3;

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct PointerState {
    pressed: bool,
    down_edge: bool,
    away: bool,
    projection: Vec3,
}

/// Pointer whose state the test sets before each tick.
#[derive(Debug, Clone, Default)]
pub struct PointerScript(Arc<Mutex<PointerState>>);

impl PointerScript {
    /// Sets whether the button is held for the coming tick.
    ///
    /// The down edge is reported when the button goes from released to
    /// held between two calls.
    pub fn set_pressed(&self, pressed: bool) {
        let mut state = lock(&self.0);
        state.down_edge = pressed && !state.pressed;
        state.pressed = pressed;
    }

    /// Moves the pointer off (or back onto) the action surface.
    pub fn set_away(&self, away: bool) {
        lock(&self.0).away = away;
    }

    /// Sets the pointer's world projection.
    pub fn set_projection(&self, projection: Vec3) {
        lock(&self.0).projection = projection;
    }
}

impl PointerOracle for PointerScript {
    fn is_pressed(&self) -> bool {
        lock(&self.0).pressed
    }

    fn pressed_this_frame(&self) -> bool {
        lock(&self.0).down_edge
    }

    fn pointer_world_projection(&self) -> Vec3 {
        lock(&self.0).projection
    }

    fn is_over_action_surface(&self, _surface: &SurfaceId) -> bool {
        !lock(&self.0).away
    }
}

#[derive(Debug)]
struct ClipState {
    state: String,
    progress: f32,
    triggers: Vec<String>,
}

/// Animation oracle whose state name and playback time the test sets.
#[derive(Debug, Clone)]
pub struct AnimationClip(Arc<Mutex<ClipState>>);

impl Default for AnimationClip {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(ClipState {
            state: "Idle".into(),
            progress: 0.0,
            triggers: Vec::new(),
        })))
    }
}

impl AnimationClip {
    /// Enters `state` at playback time `progress`.
    pub fn set_state(&self, state: &str, progress: f32) {
        let mut clip = lock(&self.0);
        state.clone_into(&mut clip.state);
        clip.progress = progress;
    }

    /// Moves playback within the current state.
    pub fn set_progress(&self, progress: f32) {
        lock(&self.0).progress = progress;
    }

    /// Triggers fired so far, oldest first.
    #[must_use]
    pub fn triggers(&self) -> Vec<String> {
        lock(&self.0).triggers.clone()
    }
}

impl AnimationOracle for AnimationClip {
    fn play_trigger(&mut self, name: &str) {
        lock(&self.0).triggers.push(name.to_owned());
    }

    fn current_state_name(&self) -> String {
        lock(&self.0).state.clone()
    }

    fn normalized_playback_time(&self) -> f32 {
        lock(&self.0).progress
    }
}

/// Which effect an [`EffectsRecorder`] was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// The click marker.
    Marker,
    /// The auto-destroying particle burst.
    Particles,
}

#[derive(Debug, Default)]
struct EffectsState {
    spawned: Vec<(EffectKind, Vec3)>,
    failing: bool,
}

/// Effects host that records spawns, optionally failing them.
#[derive(Debug, Clone, Default)]
pub struct EffectsRecorder(Arc<Mutex<EffectsState>>);

impl EffectsRecorder {
    /// Makes every later spawn fail.
    pub fn set_failing(&self, failing: bool) {
        lock(&self.0).failing = failing;
    }

    /// Successful spawns, oldest first.
    #[must_use]
    pub fn spawned(&self) -> Vec<(EffectKind, Vec3)> {
        lock(&self.0).spawned.clone()
    }

    fn record(&self, kind: EffectKind, at: Vec3) -> Result<(), EffectError> {
        let mut state = lock(&self.0);
        if state.failing {
            return Err(EffectError::SpawnFailed(format!("{kind:?} disabled")));
        }
        state.spawned.push((kind, at));
        Ok(())
    }
}

impl EffectsHost for EffectsRecorder {
    fn spawn_click_marker(&mut self, at: Vec3) -> Result<(), EffectError> {
        self.record(EffectKind::Marker, at)
    }

    fn spawn_and_auto_destroy_particles(&mut self, at: Vec3) -> Result<(), EffectError> {
        self.record(EffectKind::Particles, at)
    }
}

#[derive(Debug, Default)]
struct SurfaceState {
    alpha: Vec<f32>,
    pressed_visual: Vec<bool>,
    charge: Vec<f32>,
}

/// Surface presentation that records every write.
#[derive(Debug, Clone, Default)]
pub struct SurfaceRecorder(Arc<Mutex<SurfaceState>>);

impl SurfaceRecorder {
    /// Alpha writes, oldest first.
    #[must_use]
    pub fn alpha_writes(&self) -> Vec<f32> {
        lock(&self.0).alpha.clone()
    }

    /// Pressed-visual writes, oldest first.
    #[must_use]
    pub fn pressed_visual_writes(&self) -> Vec<bool> {
        lock(&self.0).pressed_visual.clone()
    }

    /// Charge render parameter writes, oldest first.
    #[must_use]
    pub fn charge_writes(&self) -> Vec<f32> {
        lock(&self.0).charge.clone()
    }

    /// The most recent charge render parameter.
    #[must_use]
    pub fn last_charge(&self) -> Option<f32> {
        lock(&self.0).charge.last().copied()
    }
}

impl SurfacePresentation for SurfaceRecorder {
    fn set_surface_alpha(&mut self, alpha: f32) {
        lock(&self.0).alpha.push(alpha);
    }

    fn set_pressed_visual_active(&mut self, active: bool) {
        lock(&self.0).pressed_visual.push(active);
    }

    fn set_charge_render_parameter(&mut self, value: f32) {
        lock(&self.0).charge.push(value);
    }
}

/// A sequencer wired to recording fakes, stepped at a fixed frame time.
pub struct Harness {
    /// Pointer script handle.
    pub pointer: PointerScript,
    /// Animation handle.
    pub animation: AnimationClip,
    /// Effects handle.
    pub effects: EffectsRecorder,
    /// Surface handle.
    pub surface: SurfaceRecorder,
    /// The sequencer under test.
    pub sequencer: ActionSequencer,
    /// Controlled actor position.
    pub actor: Vec3,
    /// Frame time in seconds.
    pub dt: f32,
    /// Simulated seconds since the harness was built.
    pub elapsed: f32,
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("phase", &self.sequencer.phase())
            .field("actor", &self.actor)
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}

impl Harness {
    /// Builds a harness with default settings and a 50 ms frame.
    ///
    /// # Panics
    ///
    /// Panics if the default settings fail validation.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(SequencerSettings::default(), 0.05)
            .unwrap_or_else(|err| panic!("default harness failed to build: {err}"))
    }

    /// Builds a harness with `settings` and frame time `dt`.
    ///
    /// # Errors
    ///
    /// Propagates [`SetupError`] from the sequencer builder.
    pub fn with_settings(settings: SequencerSettings, dt: f32) -> Result<Self, SetupError> {
        let pointer = PointerScript::default();
        let animation = AnimationClip::default();
        let effects = EffectsRecorder::default();
        let surface = SurfaceRecorder::default();
        let sequencer = ActionSequencer::builder()
            .settings(settings)
            .pointer(pointer.clone())
            .animation(animation.clone())
            .effects(effects.clone())
            .surface(surface.clone())
            .build()?;
        Ok(Self {
            pointer,
            animation,
            effects,
            surface,
            sequencer,
            actor: Vec3::ZERO,
            dt,
            elapsed: 0.0,
        })
    }

    /// Runs one tick with the button `pressed` or released.
    pub fn step(&mut self, pressed: bool) {
        self.pointer.set_pressed(pressed);
        self.sequencer.tick(self.dt, &mut self.actor);
        self.elapsed += self.dt;
    }

    /// Holds the button for `seconds`, rounded to whole frames.
    pub fn hold_for(&mut self, seconds: f32) {
        for _ in 0..self.frames(seconds) {
            self.step(true);
        }
    }

    /// Leaves the button released for `seconds`, rounded to whole frames.
    pub fn idle_for(&mut self, seconds: f32) {
        for _ in 0..self.frames(seconds) {
            self.step(false);
        }
    }

    /// Steps released until `done` holds or `limit` frames pass, returning
    /// whether `done` was reached.
    pub fn idle_until(&mut self, limit: usize, mut done: impl FnMut(&Self) -> bool) -> bool {
        for _ in 0..limit {
            if done(self) {
                return true;
            }
            self.step(false);
        }
        done(self)
    }

    /// Number of whole frames covering `seconds`.
    #[must_use]
    pub fn frames(&self, seconds: f32) -> usize {
        let frames = (seconds / self.dt).round();
        if frames.is_finite() && frames > 0.0 {
            frames as usize
        } else {
            0
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
