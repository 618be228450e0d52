//! Fail-fast construction of an [`ActionSequencer`].

use glam::Vec3;
use log::info;
use thiserror::Error;

use crate::config::{ConfigError, SequencerSettings};
use crate::oracles::{AnimationOracle, EffectsHost, PointerOracle, SurfacePresentation};

use super::{ActionSequencer, Collaborators};

/// Reasons a sequencer cannot be built.
#[derive(Debug, Error)]
pub enum SetupError {
    /// A required collaborator was never supplied.
    #[error("sequencer is missing its {0} collaborator")]
    MissingCollaborator(&'static str),
    /// The supplied settings failed validation.
    #[error(transparent)]
    InvalidSettings(#[from] ConfigError),
}

/// Collects collaborators and settings for an [`ActionSequencer`].
///
/// Every collaborator is mandatory. [`SequencerBuilder::build`] rejects a
/// builder with a gap instead of letting the sequencer skip effects later.
#[derive(Default)]
#[must_use]
pub struct SequencerBuilder {
    settings: SequencerSettings,
    pointer: Option<Box<dyn PointerOracle>>,
    animation: Option<Box<dyn AnimationOracle>>,
    effects: Option<Box<dyn EffectsHost>>,
    surface: Option<Box<dyn SurfacePresentation>>,
    start_position: Option<Vec3>,
}

impl SequencerBuilder {
    /// Replaces the default settings.
    pub fn settings(mut self, settings: SequencerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Supplies the pointer oracle.
    pub fn pointer(mut self, pointer: impl PointerOracle + 'static) -> Self {
        self.pointer = Some(Box::new(pointer));
        self
    }

    /// Supplies the animation oracle.
    pub fn animation(mut self, animation: impl AnimationOracle + 'static) -> Self {
        self.animation = Some(Box::new(animation));
        self
    }

    /// Supplies the visual effects host.
    pub fn effects(mut self, effects: impl EffectsHost + 'static) -> Self {
        self.effects = Some(Box::new(effects));
        self
    }

    /// Supplies the surface presentation.
    pub fn surface(mut self, surface: impl SurfacePresentation + 'static) -> Self {
        self.surface = Some(Box::new(surface));
        self
    }

    /// Fixes the position the actor returns to after each attack.
    ///
    /// Without it, the actor's position on the first tick is used.
    pub fn start_position(mut self, position: Vec3) -> Self {
        self.start_position = Some(position);
        self
    }

    /// Validates the settings and assembles the sequencer.
    ///
    /// The charge render parameter is initialised to the bottom level.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::InvalidSettings`] when validation fails and
    /// [`SetupError::MissingCollaborator`] naming the first absent
    /// collaborator.
    pub fn build(self) -> Result<ActionSequencer, SetupError> {
        self.settings.validate()?;
        let collaborators = Collaborators {
            pointer: self
                .pointer
                .ok_or(SetupError::MissingCollaborator("pointer"))?,
            animation: self
                .animation
                .ok_or(SetupError::MissingCollaborator("animation"))?,
            effects: self
                .effects
                .ok_or(SetupError::MissingCollaborator("effects"))?,
            surface: self
                .surface
                .ok_or(SetupError::MissingCollaborator("surface"))?,
        };

        info!(
            "action sequencer ready on surface `{}` (nominal duration {}s)",
            self.settings.action_surface, self.settings.nominal_duration
        );
        Ok(ActionSequencer::assemble(
            self.settings,
            collaborators,
            self.start_position,
        ))
    }
}
