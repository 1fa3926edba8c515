//! Round configuration
//!
//! All tuning values live here. Configuration is in-process only; the outer
//! application decides where (if anywhere) it comes from.

use crate::beat::SoundId;
use crate::controller::PlayMode;
use crate::song;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Distance windows used by the judgment engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitWindows {
    /// Widest distance that still counts as a hit
    pub hit: f32,
    /// Distance at or below which a hit is perfect
    pub perfect: f32,
}

impl HitWindows {
    /// Windows for the slow scripted beats
    pub const SCRIPTED: HitWindows = HitWindows {
        hit: 2.5,
        perfect: 1.0,
    };

    /// Wider windows for the faster live-audio beats
    pub const LIVE: HitWindows = HitWindows {
        hit: 4.0,
        perfect: 2.0,
    };

    fn validate(&self, name: &str) -> Result<()> {
        if !(self.perfect >= 0.0 && self.hit > 0.0 && self.perfect <= self.hit) {
            return Err(CoreError::InvalidConfig(format!(
                "{} windows must satisfy 0 <= perfect <= hit, got perfect={} hit={}",
                name, self.perfect, self.hit
            )));
        }
        Ok(())
    }
}

/// Points awarded per hit grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreValues {
    /// Points for a perfect hit
    pub perfect: u32,
    /// Points for a good hit
    pub good: u32,
}

impl Default for ScoreValues {
    fn default() -> Self {
        Self {
            perfect: 300,
            good: 100,
        }
    }
}

/// Tuning of the live onset detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnsetConfig {
    /// Length of the per-band flux window (ticks)
    pub history_length: usize,
    /// How far flux must exceed the local average to count as a peak
    pub flux_multiplier: f32,
    /// Flux floor below which nothing triggers (reference 0-255 scale)
    pub min_flux: f32,
    /// Ticks a player waits between two detected beats
    pub cooldown_ticks: u32,
    /// Hard cap on analysis time, in seconds
    pub max_duration_secs: f32,
    /// Sounds cycled through by mid-band spawns
    pub melodic_notes: Vec<SoundId>,
}

impl Default for OnsetConfig {
    fn default() -> Self {
        Self {
            history_length: 30,
            flux_multiplier: 1.6,
            min_flux: 8.0,
            cooldown_ticks: 12,
            max_duration_secs: 30.0,
            melodic_notes: vec![SoundId::NoteC, SoundId::NoteE, SoundId::NoteG],
        }
    }
}

impl OnsetConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.history_length == 0 {
            return Err(CoreError::InvalidConfig(
                "onset history_length must be at least 1".to_string(),
            ));
        }
        if !(self.flux_multiplier.is_finite() && self.flux_multiplier >= 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "flux_multiplier must be finite and >= 0, got {}",
                self.flux_multiplier
            )));
        }
        if !(self.min_flux.is_finite() && self.min_flux >= 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "min_flux must be finite and >= 0, got {}",
                self.min_flux
            )));
        }
        if !(self.max_duration_secs > 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "max_duration_secs must be positive, got {}",
                self.max_duration_secs
            )));
        }
        if self.melodic_notes.is_empty() {
            return Err(CoreError::InvalidConfig(
                "melodic_notes must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Global round configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of pixels on the track
    pub track_length: usize,
    /// Ticks per second (one tick per rendered frame)
    pub tick_rate: f32,
    /// Seconds a scripted beat needs from center to hit zone
    pub travel_time_secs: f32,
    /// Scripted beat speed, pixels per tick
    pub scripted_speed: f32,
    /// Live beat speed, pixels per tick
    pub live_speed: f32,
    /// How far past its hit zone a beat may go before it expires
    pub expiry_tolerance: f32,
    /// Judgment windows in scripted mode
    pub scripted_windows: HitWindows,
    /// Judgment windows in live mode
    pub live_windows: HitWindows,
    /// Points per grade
    pub scores: ScoreValues,
    /// Lifetime of a hit/miss flash, in ticks
    pub flash_ticks: u32,
    /// Duration of the end-of-round fill, in ticks
    pub end_fill_ticks: u32,
    /// Phase advance of the idle pulse per tick
    pub idle_pulse_step: f32,
    /// Live onset detector tuning
    pub onset: OnsetConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            track_length: 60,
            tick_rate: 60.0,
            travel_time_secs: 1.43,
            scripted_speed: 0.35,
            live_speed: 1.5,
            expiry_tolerance: 1.0,
            scripted_windows: HitWindows::SCRIPTED,
            live_windows: HitWindows::LIVE,
            scores: ScoreValues::default(),
            flash_ticks: 15,
            end_fill_ticks: 45,
            idle_pulse_step: 0.05,
            onset: OnsetConfig::default(),
        }
    }
}

impl GameConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.track_length < 2 {
            return Err(CoreError::InvalidConfig(format!(
                "track_length must be at least 2, got {}",
                self.track_length
            )));
        }
        for (name, value) in [
            ("tick_rate", self.tick_rate),
            ("scripted_speed", self.scripted_speed),
            ("live_speed", self.live_speed),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CoreError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !(self.travel_time_secs.is_finite() && self.travel_time_secs >= 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "travel_time_secs must be >= 0, got {}",
                self.travel_time_secs
            )));
        }
        if !(self.expiry_tolerance.is_finite() && self.expiry_tolerance >= 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "expiry_tolerance must be >= 0, got {}",
                self.expiry_tolerance
            )));
        }
        if self.flash_ticks == 0 {
            return Err(CoreError::InvalidConfig(
                "flash_ticks must be at least 1".to_string(),
            ));
        }
        self.scripted_windows.validate("scripted")?;
        self.live_windows.validate("live")?;
        self.onset.validate()
    }

    /// Length of one tick in seconds
    pub fn tick_secs(&self) -> f32 {
        1.0 / self.tick_rate
    }

    /// Ticks the backing pad holds each chord
    pub fn backing_chord_ticks(&self) -> u32 {
        (song::BACKING_CHORD_SECS / self.tick_secs()).round().max(1.0) as u32
    }

    /// Beat speed for a play mode
    pub fn speed_for(&self, mode: PlayMode) -> f32 {
        match mode {
            PlayMode::Scripted => self.scripted_speed,
            PlayMode::Live => self.live_speed,
        }
    }

    /// Judgment windows for a play mode
    pub fn windows_for(&self, mode: PlayMode) -> HitWindows {
        match mode {
            PlayMode::Scripted => self.scripted_windows,
            PlayMode::Live => self.live_windows,
        }
    }
}
