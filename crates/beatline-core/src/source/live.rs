//! Live beat source - spectral-flux onset detection on three bands
//!
//! Each tick the external audio collaborator supplies one energy reading per
//! band (low/mid/high, reference scale 0-255). For every band the positive
//! frame-to-frame energy change (flux) is compared against an adaptive
//! threshold derived from a short trailing window of recent flux values:
//!
//! ```text
//! peak = flux > max(min_flux, local_average * flux_multiplier)
//! ```
//!
//! Peaks map to beats: low → player one (`don`), high → player two (`ka`),
//! mid → whichever player has received fewer beats so far, cycling through
//! melodic notes. Each player has a cooldown so that busy passages cannot
//! flood one side of the track.

use super::{BeatSource, SpawnRequest, TickContext};
use crate::beat::{Player, SoundId};
use crate::config::OnsetConfig;
use crate::controller::PlayMode;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, trace};

/// Energy of the three analysis bands for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandEnergies {
    /// Bass energy
    pub low: f32,
    /// Mid energy
    pub mid: f32,
    /// Treble energy
    pub high: f32,
}

impl BandEnergies {
    /// Create a reading
    pub fn new(low: f32, mid: f32, high: f32) -> Self {
        Self { low, mid, high }
    }
}

/// What the audio collaborator reports each tick in live mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFrame {
    /// Band energies for this tick
    pub energies: BandEnergies,
    /// False once the track stopped or ended
    pub playing: bool,
}

impl AudioFrame {
    /// A frame from a track that is still playing
    pub fn playing(energies: BandEnergies) -> Self {
        Self {
            energies,
            playing: true,
        }
    }

    /// A frame signalling that the track has ended
    pub fn ended() -> Self {
        Self::default()
    }
}

/// Why the live source stopped producing beats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Hard analysis duration cap reached
    DurationCap,
    /// The audio collaborator reported the track is no longer playing
    TrackEnded,
    /// Stopped by the controller (mode switch or reset)
    Stopped,
}

/// Flux tracking for a single band
#[derive(Debug, Clone)]
struct BandDetector {
    previous: f32,
    history: VecDeque<f32>,
    capacity: usize,
}

impl BandDetector {
    fn new(capacity: usize) -> Self {
        Self {
            previous: 0.0,
            history: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Record a new energy reading and return its flux
    fn push(&mut self, energy: f32) -> f32 {
        let energy = if energy.is_finite() { energy } else { 0.0 };
        let flux = (energy - self.previous).max(0.0);
        self.previous = energy;

        self.history.push_back(flux);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
        flux
    }

    fn local_average(&self) -> f32 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().sum::<f32>() / self.history.len() as f32
    }

    fn threshold(&self, config: &OnsetConfig) -> f32 {
        config
            .min_flux
            .max(self.local_average() * config.flux_multiplier)
    }
}

/// Onset flags for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BandPeaks {
    /// Bass onset
    pub low: bool,
    /// Mid onset
    pub mid: bool,
    /// Treble onset
    pub high: bool,
}

/// Beat source driven by live band energies
#[derive(Debug, Clone)]
pub struct LiveSource {
    config: OnsetConfig,
    low: BandDetector,
    mid: BandDetector,
    high: BandDetector,
    cooldowns: [u32; 2],
    spawn_counts: [u32; 2],
    note_index: usize,
    ticks_analyzed: u64,
    last_peaks: BandPeaks,
    stop_reason: Option<StopReason>,
}

impl LiveSource {
    /// Create a running source
    pub fn new(config: OnsetConfig) -> Self {
        let capacity = config.history_length.max(1);
        info!(
            "Live source started: history={}, multiplier={}, floor={}, cooldown={} ticks, cap={}s",
            capacity,
            config.flux_multiplier,
            config.min_flux,
            config.cooldown_ticks,
            config.max_duration_secs
        );
        Self {
            low: BandDetector::new(capacity),
            mid: BandDetector::new(capacity),
            high: BandDetector::new(capacity),
            config,
            cooldowns: [0; 2],
            spawn_counts: [0; 2],
            note_index: 0,
            ticks_analyzed: 0,
            last_peaks: BandPeaks::default(),
            stop_reason: None,
        }
    }

    /// Run onset detection for one tick and return the beats to spawn
    pub fn analyze(&mut self, ctx: &TickContext) -> Vec<SpawnRequest> {
        if self.stop_reason.is_some() {
            return Vec::new();
        }

        if ctx.elapsed_secs >= self.config.max_duration_secs {
            info!(
                "Live source reached its {}s cap at {:.2}s",
                self.config.max_duration_secs, ctx.elapsed_secs
            );
            self.stop_with(StopReason::DurationCap);
            return Vec::new();
        }

        let Some(frame) = ctx.audio else {
            return Vec::new();
        };
        if !frame.playing {
            self.stop_with(StopReason::TrackEnded);
            return Vec::new();
        }

        self.ticks_analyzed += 1;
        let peaks = self.detect_peaks(frame.energies);
        self.last_peaks = peaks;

        for cooldown in &mut self.cooldowns {
            *cooldown = cooldown.saturating_sub(1);
        }

        let mut spawns = Vec::new();

        if peaks.low {
            if let Some(spawn) = self.try_spawn(Player::One, SoundId::Don) {
                spawns.push(spawn);
            }
        }

        if peaks.high {
            if let Some(spawn) = self.try_spawn(Player::Two, SoundId::Ka) {
                spawns.push(spawn);
            }
        }

        let notes = &self.config.melodic_notes;
        let next_note = notes.get(self.note_index % notes.len().max(1)).copied();
        if let (true, Some(sound)) = (peaks.mid, next_note) {
            let behind = if self.spawn_counts[0] <= self.spawn_counts[1] {
                Player::One
            } else {
                Player::Two
            };
            // The player who is behind gets the note; if they are cooling
            // down, player two may take it instead.
            let spawn = self
                .try_spawn(behind, sound)
                .or_else(|| match behind {
                    Player::One => self.try_spawn(Player::Two, sound),
                    Player::Two => None,
                });
            if let Some(spawn) = spawn {
                self.note_index += 1;
                spawns.push(spawn);
            }
        }

        if !spawns.is_empty() {
            debug!(
                "Live spawn at tick {}: {:?} (counts P1={} P2={})",
                ctx.tick, spawns, self.spawn_counts[0], self.spawn_counts[1]
            );
        }
        spawns
    }

    fn detect_peaks(&mut self, energies: BandEnergies) -> BandPeaks {
        let low_flux = self.low.push(energies.low);
        let mid_flux = self.mid.push(energies.mid);
        let high_flux = self.high.push(energies.high);

        let peaks = BandPeaks {
            low: low_flux > self.low.threshold(&self.config),
            mid: mid_flux > self.mid.threshold(&self.config),
            high: high_flux > self.high.threshold(&self.config),
        };

        trace!(
            "flux low={:.1} mid={:.1} high={:.1} peaks={:?}",
            low_flux,
            mid_flux,
            high_flux,
            peaks
        );
        peaks
    }

    fn try_spawn(&mut self, player: Player, sound: SoundId) -> Option<SpawnRequest> {
        let slot = player.index();
        if self.cooldowns[slot] > 0 {
            return None;
        }
        self.cooldowns[slot] = self.config.cooldown_ticks;
        self.spawn_counts[slot] += 1;
        Some(SpawnRequest::new(player, sound))
    }

    fn stop_with(&mut self, reason: StopReason) {
        if self.stop_reason.is_none() {
            debug!("Live source stopped: {:?}", reason);
            self.stop_reason = Some(reason);
        }
    }

    /// Ticks remaining before `player` may receive another beat
    pub fn cooldown(&self, player: Player) -> u32 {
        self.cooldowns[player.index()]
    }

    /// Beats spawned for `player` so far
    pub fn spawn_count(&self, player: Player) -> u32 {
        self.spawn_counts[player.index()]
    }

    /// Position in the melodic note cycle
    pub fn note_index(&self) -> usize {
        self.note_index
    }

    /// Number of audio frames analyzed
    pub fn ticks_analyzed(&self) -> u64 {
        self.ticks_analyzed
    }

    /// Onsets found in the last analyzed frame, whether or not they spawned
    pub fn last_peaks(&self) -> BandPeaks {
        self.last_peaks
    }

    /// Why the source stopped, if it did
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }
}

impl BeatSource for LiveSource {
    fn mode(&self) -> PlayMode {
        PlayMode::Live
    }

    fn spawnable_events(&mut self, ctx: &TickContext) -> Vec<SpawnRequest> {
        self.analyze(ctx)
    }

    fn is_finished(&self) -> bool {
        self.stop_reason.is_some()
    }

    fn stop(&mut self) {
        self.stop_with(StopReason::Stopped);
    }
}
