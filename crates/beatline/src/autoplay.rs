//! Simulated players for headless rounds
//!
//! When a beat spawns the autoplayer decides (with probability `accuracy`)
//! whether it will be played, and if so schedules a press for the tick the
//! beat is halfway into the perfect window.

use beatline_core::{GameConfig, GameEvent, PlayMode, Player};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

/// Scheduled presses for both players
#[derive(Debug)]
pub struct Autoplayer {
    rng: StdRng,
    accuracy: f64,
    /// (round tick, player), in spawn order
    schedule: Vec<(u64, Player)>,
}

impl Autoplayer {
    /// Create an autoplayer hitting a fraction `accuracy` of the beats
    pub fn new(accuracy: f64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            accuracy: accuracy.clamp(0.0, 1.0),
            schedule: Vec::new(),
        }
    }

    /// Ticks a beat needs (counting the spawn tick) to get close to its zone
    fn ticks_to_zone(config: &GameConfig, mode: PlayMode, player: Player) -> u64 {
        let center = (config.track_length / 2) as f32;
        let travel = (player.target_zone(config.track_length) - center).abs();
        let aim = config.windows_for(mode).perfect / 2.0;
        ((travel - aim) / config.speed_for(mode)).ceil().max(1.0) as u64
    }

    /// Look at the events of the tick that ran as round tick `tick`
    pub fn observe(&mut self, events: &[GameEvent], tick: u64, config: &GameConfig, mode: PlayMode) {
        for event in events {
            if let GameEvent::BeatSpawned { player, .. } = event {
                if self.rng.random_bool(self.accuracy) {
                    let due = tick + Self::ticks_to_zone(config, mode, *player) - 1;
                    trace!("Autoplay: {} presses at tick {}", player, due);
                    self.schedule.push((due, *player));
                }
            }
        }
    }

    /// Presses to send before round tick `tick`
    pub fn presses_for(&mut self, tick: u64) -> Vec<Player> {
        let mut due = Vec::new();
        self.schedule.retain(|(at, player)| {
            if *at <= tick {
                due.push(*player);
                false
            } else {
                true
            }
        });
        due
    }

    /// Forget all scheduled presses
    pub fn clear(&mut self) {
        self.schedule.clear();
    }
}
