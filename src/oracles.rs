//! Interfaces to the host collaborators the sequencer drives.
//!
//! The sequencer never polls devices, plays clips, or renders anything
//! itself. Each frame it queries a [`PointerOracle`] and an
//! [`AnimationOracle`], and it pushes visual side effects into an
//! [`EffectsHost`] and a [`SurfacePresentation`]. All four are boxed into the
//! sequencer at build time, so they must be `Send + Sync` to live inside a
//! Bevy resource.

use std::fmt;

use glam::Vec3;
use serde::Deserialize;
use thiserror::Error;

/// Identifier of the on-screen surface that accepts presses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(pub String);

impl SurfaceId {
    /// Creates an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw pointer state for the current frame.
pub trait PointerOracle: Send + Sync {
    /// Whether the primary pointer button is held this frame.
    fn is_pressed(&self) -> bool;
    /// Whether the primary pointer button went down this frame.
    fn pressed_this_frame(&self) -> bool;
    /// The pointer position projected into world space.
    fn pointer_world_projection(&self) -> Vec3;
    /// Whether the pointer currently lies over `surface`.
    fn is_over_action_surface(&self, surface: &SurfaceId) -> bool;
}

/// The host's animation state machine for the controlled actor.
pub trait AnimationOracle: Send + Sync {
    /// Fires the named trigger parameter.
    fn play_trigger(&mut self, name: &str);
    /// Name of the state currently playing on the base layer.
    fn current_state_name(&self) -> String;
    /// Normalised playback time of the current state; `1.0` is one full loop.
    fn normalized_playback_time(&self) -> f32;

    /// Whether the current state is named `name`.
    fn is_in_state(&self, name: &str) -> bool {
        self.current_state_name() == name
    }
}

/// Failure reported by an [`EffectsHost`] while spawning a visual.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectError {
    /// The prefab or template for the effect is unavailable.
    #[error("effect template `{0}` is unavailable")]
    MissingTemplate(&'static str),
    /// The host refused or failed to spawn the effect.
    #[error("effect spawn failed: {0}")]
    SpawnFailed(String),
}

/// One-shot visual effects spawned at world positions.
pub trait EffectsHost: Send + Sync {
    /// Spawns the click marker at `at`.
    ///
    /// # Errors
    ///
    /// Returns an [`EffectError`] when the marker cannot be spawned.
    fn spawn_click_marker(&mut self, at: Vec3) -> Result<(), EffectError>;

    /// Spawns a particle burst at `at`; the host destroys it when it finishes.
    ///
    /// # Errors
    ///
    /// Returns an [`EffectError`] when the particles cannot be spawned.
    fn spawn_and_auto_destroy_particles(&mut self, at: Vec3) -> Result<(), EffectError>;
}

/// Presentation of the action surface and its charge indicator.
pub trait SurfacePresentation: Send + Sync {
    /// Sets the surface's alpha; `0.0` hides it behind the pressed visual.
    fn set_surface_alpha(&mut self, alpha: f32);
    /// Shows or hides the pressed visual.
    fn set_pressed_visual_active(&mut self, active: bool);
    /// Forwards the current charge level to the rendering parameter.
    fn set_charge_render_parameter(&mut self, value: f32);
}
