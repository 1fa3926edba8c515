//! Read-only per-tick view for the renderer
//!
//! The snapshot is plain data. It borrows nothing from the controller and can
//! be serialized for remote displays or debugging.

use crate::beat::{Player, SoundId};
use crate::color::Rgb;
use crate::controller::{PlayMode, RoundController, RoundMode, RoundSummary};
use crate::feedback::FeedbackKind;
use crate::judgment::PlayerStats;
use serde::Serialize;

/// One beat as the renderer sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeatView {
    /// Owner
    pub player: Player,
    /// Attached sound
    pub sound: SoundId,
    /// Exact position along the track
    pub position: f32,
    /// Rounded pixel, `None` when outside the strip
    pub pixel: Option<usize>,
    /// Owner color
    pub color: Rgb,
}

/// One feedback flash as the renderer sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlashView {
    /// Center pixel
    pub center: i32,
    /// Hit grade or miss
    pub kind: FeedbackKind,
    /// Base color
    pub color: Rgb,
    /// Blend strength, 0.0 - 0.8
    pub alpha: f32,
    /// Pixels lit on each side of the center
    pub spread: u32,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    /// Round state
    pub mode: RoundMode,
    /// Selected play mode
    pub play_mode: PlayMode,
    /// Number of pixels on the strip
    pub track_length: usize,
    /// Ticks played in the current round
    pub tick: u64,
    /// Ready/select glow, 0.0 - 1.0
    pub idle_pulse: f32,
    /// Whether live play can be selected
    pub live_available: bool,
    /// Beats on the track, in spawn order
    pub beats: Vec<BeatView>,
    /// Per-player stats, player one first
    pub players: [PlayerStats; 2],
    /// Pending flashes
    pub flashes: Vec<FlashView>,
    /// End fill progress (0.0 - 1.0) while in end
    pub end_fill: Option<f32>,
    /// Summary of the last finished round
    pub summary: Option<RoundSummary>,
    /// Sounding backing chord (index into the progression), if any
    pub backing_chord: Option<usize>,
}

impl FrameSnapshot {
    /// Capture the current state of `controller`
    pub fn capture(controller: &RoundController) -> Self {
        let track_length = controller.config().track_length;

        let beats = controller
            .live_beats()
            .iter()
            .filter(|beat| beat.is_active())
            .map(|beat| {
                let rounded = beat.display_position();
                BeatView {
                    player: beat.owner(),
                    sound: beat.sound(),
                    position: beat.position(),
                    pixel: usize::try_from(rounded)
                        .ok()
                        .filter(|pixel| *pixel < track_length),
                    color: beat.color(),
                }
            })
            .collect();

        let flashes = controller
            .feedback()
            .flashes()
            .iter()
            .map(|flash| FlashView {
                center: flash.center(),
                kind: flash.kind(),
                color: flash.kind().color(),
                alpha: flash.alpha(),
                spread: flash.spread(),
            })
            .collect();

        Self {
            mode: controller.mode(),
            play_mode: controller.play_mode(),
            track_length,
            tick: controller.round_tick(),
            idle_pulse: controller.idle_pulse(),
            live_available: controller.live_available(),
            beats,
            players: *controller.scores().players(),
            flashes,
            end_fill: controller.end_fill().map(|fill| fill.progress()),
            summary: controller.last_summary().copied(),
            backing_chord: controller.backing_chord(),
        }
    }

    /// Number of beats still on the strip
    pub fn visible_beats(&self) -> usize {
        self.beats.iter().filter(|beat| beat.pixel.is_some()).count()
    }

    /// Combined score of both players
    pub fn total_score(&self) -> u32 {
        self.players.iter().map(|p| p.score).sum()
    }
}
