//! Hit judgment and scoring
//!
//! A player input consumes at most one beat: the active beat of that player
//! closest to its hit zone. Ties go to the earliest-spawned beat. Inputs with
//! no beat inside the hit window are ignored; only expiry counts as a miss.

use crate::beat::{Beat, Player, SoundId};
use crate::config::{HitWindows, ScoreValues};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome class of a successful hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitGrade {
    /// Within the perfect window
    Perfect,
    /// Within the hit window only
    Good,
}

impl HitGrade {
    /// Classify a distance that is already known to be inside the hit window
    pub fn classify(distance: f32, windows: &HitWindows) -> Self {
        if distance <= windows.perfect {
            HitGrade::Perfect
        } else {
            HitGrade::Good
        }
    }

    /// Points awarded for this grade
    pub fn points(self, values: &ScoreValues) -> u32 {
        match self {
            HitGrade::Perfect => values.perfect,
            HitGrade::Good => values.good,
        }
    }

    /// Playback volume of the hit sound
    pub fn volume(self) -> f32 {
        match self {
            HitGrade::Perfect => 1.0,
            HitGrade::Good => 0.6,
        }
    }
}

/// Result of a successful judgment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    /// Player who hit
    pub player: Player,
    /// Index of the consumed beat in the slice passed to [`judge`]
    pub beat_index: usize,
    /// Perfect or good
    pub grade: HitGrade,
    /// Distance to the hit zone at the moment of the hit
    pub distance: f32,
    /// Hit-zone coordinate of the consumed beat
    pub target_zone: f32,
    /// Sound of the consumed beat
    pub sound: SoundId,
}

/// Judge an input from `player` against `beats`.
///
/// Marks the chosen beat as hit and returns the judgment, or returns `None`
/// without touching anything if no active beat of `player` is within
/// `windows.hit`.
pub fn judge(player: Player, beats: &mut [Beat], windows: &HitWindows) -> Option<Judgment> {
    let (beat_index, distance) = beats
        .iter()
        .enumerate()
        .filter(|(_, beat)| beat.owner() == player && beat.is_active())
        .map(|(index, beat)| (index, beat.distance_to_target()))
        .fold(None, |best: Option<(usize, f32)>, candidate| match best {
            Some(current) if current.1 <= candidate.1 => Some(current),
            _ => Some(candidate),
        })?;

    if distance > windows.hit {
        debug!(
            "{} pressed with nearest beat {:.2} away (window {:.2})",
            player, distance, windows.hit
        );
        return None;
    }

    let beat = &mut beats[beat_index];
    if !beat.mark_hit() {
        return None;
    }

    let judgment = Judgment {
        player,
        beat_index,
        grade: HitGrade::classify(distance, windows),
        distance,
        target_zone: beat.target_zone(),
        sound: beat.sound(),
    };
    debug!(
        "{} hit {} at distance {:.2}: {:?}",
        player, judgment.sound, distance, judgment.grade
    );
    Some(judgment)
}

/// Running totals for one player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Accumulated points
    pub score: u32,
    /// Consecutive hits since the last miss
    pub combo: u32,
    /// Longest combo this round
    pub max_combo: u32,
    /// Perfect hits
    pub perfect: u32,
    /// Good hits
    pub good: u32,
    /// Expired beats
    pub miss: u32,
}

impl PlayerStats {
    /// Apply a successful hit
    pub fn register_hit(&mut self, grade: HitGrade, values: &ScoreValues) {
        match grade {
            HitGrade::Perfect => self.perfect += 1,
            HitGrade::Good => self.good += 1,
        }
        self.score += grade.points(values);
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
    }

    /// Apply an expired beat
    pub fn register_miss(&mut self) {
        self.miss += 1;
        self.combo = 0;
    }

    /// Total beats judged or expired
    pub fn beats_seen(&self) -> u32 {
        self.perfect + self.good + self.miss
    }
}

/// Stats for both players
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    players: [PlayerStats; 2],
}

impl Scoreboard {
    /// Fresh scoreboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Stats of one player
    pub fn get(&self, player: Player) -> &PlayerStats {
        &self.players[player.index()]
    }

    /// Mutable stats of one player
    pub fn get_mut(&mut self, player: Player) -> &mut PlayerStats {
        &mut self.players[player.index()]
    }

    /// Apply a judgment to its player
    pub fn apply(&mut self, judgment: &Judgment, values: &ScoreValues) {
        self.get_mut(judgment.player)
            .register_hit(judgment.grade, values);
    }

    /// Combined score of both players
    pub fn total_score(&self) -> u32 {
        self.players.iter().map(|p| p.score).sum()
    }

    /// Both players' stats in player order
    pub fn players(&self) -> &[PlayerStats; 2] {
        &self.players
    }

    /// Clear all counters
    pub fn reset(&mut self) {
        self.players = Default::default();
    }
}
