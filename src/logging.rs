//! Logger setup shared by the binary and the tests.
//!
//! Sequencer transitions log at debug level under the `action_controller`
//! target. Other crates, Bevy in particular, are held at `warn` so a verbose
//! run shows the press cycle rather than engine start-up chatter.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Level applied to targets outside this crate.
const DEPENDENCY_LEVEL: LevelFilter = LevelFilter::Warn;

/// Default filter directive for a run with or without `--verbose`.
#[must_use]
pub fn default_filter(verbose: bool) -> String {
    let own = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    format!(
        "{},{}={}",
        DEPENDENCY_LEVEL.as_str().to_ascii_lowercase(),
        env!("CARGO_CRATE_NAME"),
        own.as_str().to_ascii_lowercase()
    )
}

/// Initializes the global logger with [`default_filter`].
///
/// `RUST_LOG` overrides the default.
pub fn init(verbose: bool) {
    if !init_with_filter(&default_filter(verbose)) {
        log::debug!("logger already installed");
    }
}

/// Initializes the global logger with an explicit default filter such as
/// `"action_controller::tasks=trace,info"`.
///
/// Returns whether this call installed the logger; later calls leave the
/// first logger in place.
#[must_use]
pub fn init_with_filter(filter: &str) -> bool {
    Builder::from_env(Env::default().default_filter_or(filter))
        .try_init()
        .is_ok()
}
