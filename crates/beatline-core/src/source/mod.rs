//! Beat sources
//!
//! A beat source decides, once per tick, which beats should enter the track.
//! The controller holds exactly one active source and swaps it wholesale when
//! the play mode changes.

pub mod live;
pub mod scripted;

use crate::beat::{Player, SoundId};
use crate::controller::PlayMode;
use live::AudioFrame;

/// A request to put a new beat on the track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Owner of the new beat
    pub player: Player,
    /// Sound attached to it
    pub sound: SoundId,
}

impl SpawnRequest {
    /// Create a spawn request
    pub fn new(player: Player, sound: SoundId) -> Self {
        Self { player, sound }
    }
}

/// Per-tick input handed to a beat source
#[derive(Debug, Clone, Copy, Default)]
pub struct TickContext {
    /// Ticks since the round started (0 on the first play tick)
    pub tick: u64,
    /// Seconds since the round started
    pub elapsed_secs: f32,
    /// Band energies for this tick, when a live audio feed is attached
    pub audio: Option<AudioFrame>,
}

/// Capability shared by the scripted timeline and the live onset detector
pub trait BeatSource {
    /// Which play mode this source drives
    fn mode(&self) -> PlayMode;

    /// Beats that should spawn this tick, in spawn order
    fn spawnable_events(&mut self, ctx: &TickContext) -> Vec<SpawnRequest>;

    /// True once the source will never spawn again
    fn is_finished(&self) -> bool;

    /// Stop producing beats (idempotent)
    fn stop(&mut self);
}
