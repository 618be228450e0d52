#![cfg_attr(docsrs, feature(doc_cfg))]
//! Press-and-hold action controller for a single on-screen attack surface.
//!
//! The crate turns per-frame pointer input into attacks, a forward lunge and
//! return, a looping hold-attack, and a charge level pushed to the surface's
//! renderer. The core [`ActionSequencer`] is host-agnostic and talks to the
//! outside world through the traits in [`oracles`]; [`ActionControllerPlugin`]
//! wires it into a Bevy app.
pub mod approach;
pub mod config;
pub mod constants;
pub mod headless;
pub mod logging;
pub mod oracles;
pub mod plugin;
pub mod sequencer;
pub mod tasks;
pub mod waypoint;
pub use constants::*;

// Re-export commonly used items
pub use approach::{move_towards, ValueApproacher};
pub use config::{ConfigError, SequencerSettings};
pub use logging::init as init_logging;
pub use oracles::{
    AnimationOracle, EffectError, EffectsHost, PointerOracle, SurfaceId, SurfacePresentation,
};
pub use plugin::{
    ActionController, ActionControllerPlugin, ControlledActor, ControllerSetupError,
    SequencerNotice,
};
pub use sequencer::{
    ActionSequencer, AttackOutcome, EventInbox, PressPhase, SequencerBuilder, SequencerEvent,
    SetupError,
};
pub use tasks::{TaskId, TaskRole};
pub use waypoint::{MoveOutcome, WaypointMover};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use action_controller::prelude::*;
    //! ```

    pub use crate::oracles::{
        AnimationOracle, EffectsHost, PointerOracle, SurfaceId, SurfacePresentation,
    };
    pub use crate::ActionController;
    pub use crate::ActionControllerPlugin;
    pub use crate::ActionSequencer;
    pub use crate::ControlledActor;
    pub use crate::PressPhase;
    pub use crate::SequencerEvent;
    pub use crate::SequencerSettings;
    pub use crate::WaypointMover;
}
