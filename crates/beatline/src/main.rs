//! Beatline - headless round runner
//!
//! Plays one round either from the built-in song with simulated players, or
//! from a WAV file through live onset detection, and prints the result.

#![warn(missing_docs)]

mod autoplay;
mod logging_setup;
mod wav;

use anyhow::{Context, Result};
use autoplay::Autoplayer;
use beatline_control::{Key, KeyBindings, KeyMatch};
use beatline_core::{
    AnalyzerConfig, AudioFrame, BandAnalyzer, GameConfig, GameEvent, InputAction, LogConfig,
    PlayMode, Player, RoundController, RoundMode, RoundSummary, Timeline,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

/// Upper bound on round length, in ticks, for any input
const MAX_ROUND_TICKS: u64 = 60 * 60 * 10;

#[derive(Parser)]
#[command(name = "beatline", about = "Two-player one-dimensional drum game")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Also write logs to logs/beatline.log
    #[arg(long, global = true)]
    log_file: bool,

    /// Game configuration as JSON
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Key bindings as JSON
    #[arg(long, global = true)]
    bindings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Play a scripted song
    Scripted {
        /// Timeline JSON to play instead of the built-in song
        #[arg(long)]
        timeline: Option<PathBuf>,

        /// Fraction of beats the simulated players hit
        #[arg(long, default_value = "0.9")]
        accuracy: f64,

        /// Random seed for the simulated players
        #[arg(long, default_value = "1")]
        seed: u64,
    },
    /// Play along to a WAV file
    Live {
        /// Audio file
        file: PathBuf,

        /// Fraction of beats the simulated players hit
        #[arg(long, default_value = "0.9")]
        accuracy: f64,

        /// Random seed for the simulated players
        #[arg(long, default_value = "1")]
        seed: u64,
    },
}

/// Where live frames come from
struct LiveFeed {
    analyzer: BandAnalyzer,
    samples: Vec<f32>,
    samples_per_tick: usize,
    cursor: usize,
}

impl LiveFeed {
    fn next_frame(&mut self) -> AudioFrame {
        if self.cursor >= self.samples.len() {
            return AudioFrame::ended();
        }
        let end = (self.cursor + self.samples_per_tick).min(self.samples.len());
        let energies = self.analyzer.process(&self.samples[self.cursor..end]);
        self.cursor = end;
        AudioFrame::playing(energies)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_config = LogConfig {
        level: args.log_level.clone(),
        file_output: args.log_file,
        ..Default::default()
    };
    let _log_guard = logging_setup::init(&log_config)?;

    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {:?}", path))?;
            serde_json::from_str::<GameConfig>(&json)
                .with_context(|| format!("Invalid config: {:?}", path))?
        }
        None => GameConfig::default(),
    };

    let bindings = match &args.bindings {
        Some(path) => KeyBindings::load_from_file(path)
            .with_context(|| format!("Failed to load key bindings: {:?}", path))?,
        None => KeyBindings::new(),
    };

    let command = args.command.unwrap_or(Command::Scripted {
        timeline: None,
        accuracy: 0.9,
        seed: 1,
    });

    let tick_rate = config.tick_rate;
    let summary = match command {
        Command::Scripted {
            timeline,
            accuracy,
            seed,
        } => {
            let timeline = match timeline {
                Some(path) => {
                    let json = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read timeline: {:?}", path))?;
                    Timeline::from_json(&json)?
                }
                None => beatline_core::song::default_timeline(),
            };
            let controller = RoundController::with_timeline(config, timeline)?;
            run_round(
                controller,
                &bindings,
                PlayMode::Scripted,
                Autoplayer::new(accuracy, seed),
                None,
            )?
        }
        Command::Live {
            file,
            accuracy,
            seed,
        } => {
            let track = wav::load_mono(&file)?;
            let analyzer = BandAnalyzer::new(AnalyzerConfig {
                sample_rate: track.sample_rate,
                ..Default::default()
            })?;
            let samples_per_tick = ((track.sample_rate as f32 / config.tick_rate) as usize).max(1);
            let feed = LiveFeed {
                analyzer,
                samples: track.samples,
                samples_per_tick,
                cursor: 0,
            };

            let mut controller = RoundController::new(config)?;
            controller.set_live_available(true);
            run_round(
                controller,
                &bindings,
                PlayMode::Live,
                Autoplayer::new(accuracy, seed),
                Some(feed),
            )?
        }
    };

    print_summary(&summary, tick_rate);
    Ok(())
}

/// Send a key through the bindings, as a keyboard would
fn press(controller: &mut RoundController, bindings: &KeyBindings, key: Key) {
    match bindings.find_action(key, controller.mode()) {
        Some(action) => controller.handle_input(action),
        None => warn!("Key {} is not bound in {} state", key, controller.mode()),
    }
}

/// First enabled key producing `action`
fn key_for(bindings: &KeyBindings, action: InputAction) -> Result<Key> {
    bindings
        .find_bindings_for_action(action)
        .into_iter()
        .filter(|binding| binding.enabled)
        .find_map(|binding| match binding.key {
            KeyMatch::Exact(key) => Some(key),
            KeyMatch::AnyKey => None,
        })
        .with_context(|| format!("No key bound to {:?}", action))
}

fn run_round(
    mut controller: RoundController,
    bindings: &KeyBindings,
    mode: PlayMode,
    mut autoplay: Autoplayer,
    mut feed: Option<LiveFeed>,
) -> Result<RoundSummary> {
    let mode_key = key_for(bindings, InputAction::ChooseMode(mode))?;
    let hit_keys = [
        key_for(bindings, InputAction::Hit(Player::One))?,
        key_for(bindings, InputAction::Hit(Player::Two))?,
    ];

    // Title screen, then mode selection
    press(&mut controller, bindings, Key::Space);
    controller.tick(None);
    press(&mut controller, bindings, mode_key);
    controller.tick(None);
    if controller.mode() != RoundMode::Play {
        anyhow::bail!("Round did not start in {:?} mode", mode);
    }
    info!("Playing {:?} round", mode);

    while controller.mode() == RoundMode::Play {
        let tick = controller.round_tick();
        if tick >= MAX_ROUND_TICKS {
            anyhow::bail!("Round did not finish within {} ticks", MAX_ROUND_TICKS);
        }

        for player in autoplay.presses_for(tick) {
            press(&mut controller, bindings, hit_keys[player.index()]);
        }

        let audio = feed.as_mut().map(LiveFeed::next_frame);
        let events = controller.tick(audio);
        autoplay.observe(&events, tick, controller.config(), mode);

        for event in &events {
            if let GameEvent::RoundEnded(summary) = event {
                autoplay.clear();
                return Ok(*summary);
            }
        }
    }

    controller
        .last_summary()
        .copied()
        .context("Round ended without a summary")
}

fn print_summary(summary: &RoundSummary, tick_rate: f32) {
    println!(
        "Round over ({:?}, {:.1}s)",
        summary.play_mode,
        summary.ticks as f32 / tick_rate
    );
    for (player, stats) in Player::ALL.iter().zip(summary.players.iter()) {
        println!(
            "  {}: score {:>6}  perfect {:>3}  good {:>3}  miss {:>3}  max combo {:>3}",
            player, stats.score, stats.perfect, stats.good, stats.miss, stats.max_combo
        );
    }
    println!("  Together: {}", summary.total_score);
}
