use std::path::PathBuf;

use action_controller::headless::{HeadlessRun, PressWindow};
use action_controller::{init_logging, SequencerSettings};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

/// Frame time used by scripted runs.
const FRAME_SECS: f32 = 1.0 / 60.0;

/// Scripted press patterns.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    /// A single short press.
    Tap,
    /// A long hold that starts the loop, then a tap that stops it.
    Hold,
}

impl Scenario {
    fn press_windows(self) -> Vec<PressWindow> {
        match self {
            Self::Tap => vec![PressWindow::new(0.1, 0.15)],
            Self::Hold => vec![PressWindow::new(0.1, 2.5), PressWindow::new(3.0, 0.15)],
        }
    }
}

/// Drive the action sequencer headlessly through a scripted scenario
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// TOML file overriding the default settings
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Press pattern to play
    #[arg(short, long, value_enum, default_value_t = Scenario::Tap)]
    scenario: Scenario,
    /// Number of frames to simulate at 60 frames per second
    #[arg(short, long, default_value_t = 300)]
    frames: u64,
    /// Print the recorded events as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let settings = match &args.config {
        Some(path) => SequencerSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => SequencerSettings::default(),
    };

    let mut run = HeadlessRun::new(settings, args.scenario.press_windows())
        .context("building the sequencer")?;
    run.run(args.frames, FRAME_SECS);

    let sequencer = run.sequencer();
    info!(
        "{:?} finished after {} frames ({:.2}s): {} events, phase {:?}, actor at {:?}, charge {:.2}",
        args.scenario,
        run.frame(),
        run.time(),
        run.events().len(),
        sequencer.phase(),
        run.actor(),
        sequencer.charge_level(),
    );

    if args.json {
        let json = serde_json::to_string_pretty(run.events()).context("serialising events")?;
        println!("{json}");
    }
    Ok(())
}
