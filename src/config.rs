//! Tunable settings for the action sequencer.
//!
//! Settings are plain data with defaults for every field, so a TOML file only
//! needs to name the values it overrides:
//!
//! ```
//! use action_controller::SequencerSettings;
//!
//! let settings = SequencerSettings::from_toml_str("nominal_duration = 2.0\n")?;
//! assert!((settings.nominal_duration - 2.0).abs() < f32::EPSILON);
//! assert!((settings.move_speed - 5.0).abs() < f32::EPSILON);
//! # Ok::<(), action_controller::ConfigError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::Deserialize;
use thiserror::Error;

use crate::oracles::SurfaceId;
use crate::{HOLD_THRESHOLD_FRACTION, LOOP_STOP_COOLDOWN_FRACTION};

/// Errors raised while loading or validating [`SequencerSettings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("failed to read settings from {path}: {source}")]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The settings text is not valid TOML for this schema.
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
    /// A numeric field must be strictly positive.
    #[error("`{field}` must be positive, got {value}")]
    NotPositive {
        /// Offending field.
        field: &'static str,
        /// Value supplied.
        value: f32,
    },
    /// The charge range is inverted.
    #[error("`bottom_level` ({bottom}) exceeds `top_level` ({top})")]
    InvertedLevels {
        /// Configured bottom level.
        bottom: f32,
        /// Configured top level.
        top: f32,
    },
    /// The return progress threshold lies outside one animation loop.
    #[error("`return_progress` must lie within [0, 1], got {0}")]
    ProgressOutOfRange(f32),
    /// The settle delay is negative.
    #[error("`return_settle` must not be negative, got {0}")]
    NegativeSettle(f32),
    /// A name used to address the animation state machine is empty.
    #[error("`{0}` must not be empty")]
    EmptyName(&'static str),
}

/// Settings driving the sequencer, its movers, and its timers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SequencerSettings {
    /// Speed of the controlled actor's waypoint mover, in units per second.
    pub move_speed: f32,
    /// Baseline time constant for the hold threshold and the cooldowns.
    pub nominal_duration: f32,
    /// Charge level rise speed, in levels per second.
    pub rise_speed: f32,
    /// Charge level fall speed, in levels per second.
    pub fall_speed: f32,
    /// Charge target while the surface is pressed.
    pub top_level: f32,
    /// Charge target at rest, and the initial level.
    pub bottom_level: f32,
    /// Seconds between hold-loop attacks.
    pub loop_interval: f32,
    /// Frames between an attack starting and the forward lunge.
    pub lunge_delay_frames: u32,
    /// Lunge destination relative to the actor's position.
    pub lunge_offset: Vec3,
    /// Animation trigger fired to start an attack.
    pub attack_trigger: String,
    /// Animation state the return timer waits on.
    pub attack_state: String,
    /// Normalised playback time after which the actor may return.
    pub return_progress: f32,
    /// Seconds to wait after `return_progress` before returning.
    pub return_settle: f32,
    /// Surface whose presses drive the sequencer.
    pub action_surface: SurfaceId,
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            nominal_duration: 1.0,
            rise_speed: 4.0,
            fall_speed: 2.0,
            top_level: 0.4,
            bottom_level: 0.0,
            loop_interval: 1.0,
            lunge_delay_frames: 120,
            lunge_offset: Vec3::new(0.6, 0.0, 0.0),
            attack_trigger: "Attack".into(),
            attack_state: "Attack_Light_01".into(),
            return_progress: 0.6,
            return_settle: 0.5,
            action_surface: SurfaceId::new("battle_button"),
        }
    }
}

impl SequencerSettings {
    /// Parses and validates settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys, and
    /// a validation variant when a value is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses, and validates settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// the errors of [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("move_speed", self.move_speed),
            ("nominal_duration", self.nominal_duration),
            ("rise_speed", self.rise_speed),
            ("fall_speed", self.fall_speed),
            ("loop_interval", self.loop_interval),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if self.bottom_level > self.top_level {
            return Err(ConfigError::InvertedLevels {
                bottom: self.bottom_level,
                top: self.top_level,
            });
        }
        if !(0.0..=1.0).contains(&self.return_progress) {
            return Err(ConfigError::ProgressOutOfRange(self.return_progress));
        }
        if self.return_settle < 0.0 {
            return Err(ConfigError::NegativeSettle(self.return_settle));
        }
        if self.attack_trigger.is_empty() {
            return Err(ConfigError::EmptyName("attack_trigger"));
        }
        if self.attack_state.is_empty() {
            return Err(ConfigError::EmptyName("attack_state"));
        }
        Ok(())
    }

    /// Hold time after which a press escalates into the hold loop.
    #[must_use]
    pub fn hold_threshold(&self) -> f32 {
        self.nominal_duration * HOLD_THRESHOLD_FRACTION
    }

    /// Cooldown scheduled when a release stops the hold loop.
    #[must_use]
    pub fn loop_stop_cooldown(&self) -> f32 {
        self.nominal_duration * LOOP_STOP_COOLDOWN_FRACTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_are_valid() {
        assert!(SequencerSettings::default().validate().is_ok());
    }

    #[rstest]
    fn parses_overrides_and_vectors() {
        let settings = SequencerSettings::from_toml_str(
            "lunge_offset = [1.0, 0.5, 0.0]\naction_surface = \"attack\"\n",
        )
        .expect("valid settings");
        assert_eq!(settings.lunge_offset, Vec3::new(1.0, 0.5, 0.0));
        assert_eq!(settings.action_surface, SurfaceId::new("attack"));
    }

    #[rstest]
    #[case::zero_speed("move_speed = 0.0", "move_speed")]
    #[case::negative_interval("loop_interval = -1.0", "loop_interval")]
    fn rejects_non_positive_values(#[case] text: &str, #[case] field: &str) {
        let err = SequencerSettings::from_toml_str(text).expect_err("must reject");
        assert!(
            matches!(&err, ConfigError::NotPositive { field: f, .. } if *f == field),
            "unexpected error: {err}"
        );
    }

    #[rstest]
    #[case::inverted("bottom_level = 1.0\ntop_level = 0.5")]
    #[case::progress("return_progress = 1.5")]
    #[case::settle("return_settle = -0.1")]
    #[case::empty_trigger("attack_trigger = \"\"")]
    #[case::unknown_key("wave_height = 3.0")]
    fn rejects_invalid_settings(#[case] text: &str) {
        assert!(SequencerSettings::from_toml_str(text).is_err());
    }

    #[rstest]
    fn derived_durations_follow_nominal_duration() {
        let settings = SequencerSettings {
            nominal_duration: 2.0,
            ..SequencerSettings::default()
        };
        assert!((settings.hold_threshold() - 1.0).abs() < f32::EPSILON);
        assert!((settings.loop_stop_cooldown() - 1.0).abs() < f32::EPSILON);
    }
}
