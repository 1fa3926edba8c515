//! Beat entity and the identifiers it carries
//!
//! A beat is spawned at the center of the track and travels at a fixed speed
//! toward its owner's hit zone: player one toward the low end (pixel 0),
//! player two toward the high end (the last pixel).

use crate::color::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two players sharing the track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Player {
    /// Left side, travels toward pixel 0
    One,
    /// Right side, travels toward the last pixel
    Two,
}

impl Player {
    /// Both players, in index order
    pub const ALL: [Player; 2] = [Player::One, Player::Two];

    /// Zero-based index for per-player arrays
    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    /// Direction of travel along the track
    pub fn direction(self) -> f32 {
        match self {
            Player::One => -1.0,
            Player::Two => 1.0,
        }
    }

    /// Hit-zone coordinate on a track of `track_length` pixels
    pub fn target_zone(self, track_length: usize) -> f32 {
        match self {
            Player::One => 0.0,
            Player::Two => track_length.saturating_sub(1) as f32,
        }
    }

    /// Beat and hit-zone color
    pub fn color(self) -> Rgb {
        match self {
            Player::One => Rgb::PLAYER_ONE,
            Player::Two => Rgb::PLAYER_TWO,
        }
    }
}

impl TryFrom<u8> for Player {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Player::One),
            2 => Ok(Player::Two),
            other => Err(format!("player must be 1 or 2, got {}", other)),
        }
    }
}

impl From<Player> for u8 {
    fn from(player: Player) -> u8 {
        match player {
            Player::One => 1,
            Player::Two => 2,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", u8::from(*self))
    }
}

/// How the external synth voices a sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Voice {
    /// Low sine drum
    Drum,
    /// Short noise tap
    Tap,
    /// Pentatonic melody note
    Melodic,
}

/// Symbolic sound attached to a beat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundId {
    /// Warm bass drum
    #[serde(rename = "don")]
    Don,
    /// Soft rim tap
    #[serde(rename = "ka")]
    Ka,
    /// C4
    #[serde(rename = "note_C")]
    NoteC,
    /// D4
    #[serde(rename = "note_D")]
    NoteD,
    /// E4
    #[serde(rename = "note_E")]
    NoteE,
    /// G4
    #[serde(rename = "note_G")]
    NoteG,
    /// A4
    #[serde(rename = "note_A")]
    NoteA,
    /// C5
    #[serde(rename = "note_C5")]
    NoteC5,
}

impl SoundId {
    /// Identifier as written in timelines
    pub fn as_str(self) -> &'static str {
        match self {
            SoundId::Don => "don",
            SoundId::Ka => "ka",
            SoundId::NoteC => "note_C",
            SoundId::NoteD => "note_D",
            SoundId::NoteE => "note_E",
            SoundId::NoteG => "note_G",
            SoundId::NoteA => "note_A",
            SoundId::NoteC5 => "note_C5",
        }
    }

    /// Voice used by the synth
    pub fn voice(self) -> Voice {
        match self {
            SoundId::Don => Voice::Drum,
            SoundId::Ka => Voice::Tap,
            _ => Voice::Melodic,
        }
    }

    /// Nominal pitch in Hz (`None` for the noise tap)
    pub fn frequency_hz(self) -> Option<f32> {
        match self {
            SoundId::Don => Some(120.0),
            SoundId::Ka => None,
            SoundId::NoteC => Some(262.0),
            SoundId::NoteD => Some(294.0),
            SoundId::NoteE => Some(330.0),
            SoundId::NoteG => Some(392.0),
            SoundId::NoteA => Some(440.0),
            SoundId::NoteC5 => Some(523.0),
        }
    }

    /// How long the synth keeps the voice alive, in milliseconds
    pub fn duration_ms(self) -> u32 {
        match self {
            SoundId::Don => 450,
            SoundId::Ka => 150,
            SoundId::NoteC5 => 900,
            _ => 800,
        }
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a beat. `Hit` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeatState {
    /// Travelling and judgeable
    Active,
    /// Consumed by a successful judgment
    Hit,
    /// Passed its hit zone unjudged
    Expired,
}

/// A single timing target travelling along the track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    owner: Player,
    sound: SoundId,
    position: f32,
    direction: f32,
    speed: f32,
    target_zone: f32,
    state: BeatState,
}

impl Beat {
    /// Spawn a beat at the center of a track of `track_length` pixels
    pub fn new(owner: Player, sound: SoundId, track_length: usize, speed: f32) -> Self {
        Self {
            owner,
            sound,
            position: (track_length / 2) as f32,
            direction: owner.direction(),
            speed,
            target_zone: owner.target_zone(track_length),
            state: BeatState::Active,
        }
    }

    /// Advance one tick. No-op once the beat left the active state.
    pub fn update(&mut self) {
        if self.state != BeatState::Active {
            return;
        }
        self.position += self.speed * self.direction;
    }

    /// Absolute distance between the beat and its hit zone
    pub fn distance_to_target(&self) -> f32 {
        (self.position - self.target_zone).abs()
    }

    /// Whether the beat has moved strictly beyond its hit zone by more than `tolerance`
    pub fn is_past_target(&self, tolerance: f32) -> bool {
        (self.position - self.target_zone) * self.direction > tolerance
    }

    /// Transition to `Hit`. Returns false if the beat was not active.
    pub fn mark_hit(&mut self) -> bool {
        self.leave_active(BeatState::Hit)
    }

    /// Transition to `Expired`. Returns false if the beat was not active.
    pub fn mark_expired(&mut self) -> bool {
        self.leave_active(BeatState::Expired)
    }

    fn leave_active(&mut self, next: BeatState) -> bool {
        if self.state != BeatState::Active {
            return false;
        }
        self.state = next;
        true
    }

    /// Rounded pixel the renderer should light
    pub fn display_position(&self) -> i32 {
        self.position.round() as i32
    }

    /// Owning player
    pub fn owner(&self) -> Player {
        self.owner
    }

    /// Sound played when the beat is hit
    pub fn sound(&self) -> SoundId {
        self.sound
    }

    /// Current coordinate along the track
    pub fn position(&self) -> f32 {
        self.position
    }

    /// -1.0 or +1.0
    pub fn direction(&self) -> f32 {
        self.direction
    }

    /// Pixels per tick
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Hit-zone coordinate
    pub fn target_zone(&self) -> f32 {
        self.target_zone
    }

    /// Current lifecycle state
    pub fn state(&self) -> BeatState {
        self.state
    }

    /// Shorthand for `state() == BeatState::Active`
    pub fn is_active(&self) -> bool {
        self.state == BeatState::Active
    }

    /// Beat color (the owner's color)
    pub fn color(&self) -> Rgb {
        self.owner.color()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_at_center() {
        let p1 = Beat::new(Player::One, SoundId::Don, 60, 0.35);
        let p2 = Beat::new(Player::Two, SoundId::NoteE, 60, 0.35);

        assert_eq!(p1.position(), 30.0);
        assert_eq!(p1.target_zone(), 0.0);
        assert_eq!(p1.direction(), -1.0);

        assert_eq!(p2.position(), 30.0);
        assert_eq!(p2.target_zone(), 59.0);
        assert_eq!(p2.direction(), 1.0);
    }

    #[test]
    fn test_sound_catalog() {
        assert_eq!(SoundId::Don.voice(), Voice::Drum);
        assert_eq!(SoundId::Ka.voice(), Voice::Tap);
        assert_eq!(SoundId::Ka.frequency_hz(), None);
        assert_eq!(SoundId::NoteA.frequency_hz(), Some(440.0));

        // Drums are short, melodic notes ring
        assert!(SoundId::Ka.duration_ms() < SoundId::Don.duration_ms());
        assert_eq!(SoundId::NoteE.duration_ms(), 800);
        assert_eq!(SoundId::NoteC5.duration_ms(), 900);
    }

    #[test]
    fn test_update_moves_toward_target() {
        let mut beat = Beat::new(Player::Two, SoundId::Ka, 60, 1.5);
        beat.update();
        assert_eq!(beat.position(), 31.5);
        assert_eq!(beat.distance_to_target(), 27.5);
    }

    #[test]
    fn test_terminal_state_is_final() {
        let mut beat = Beat::new(Player::One, SoundId::Don, 60, 1.0);
        assert!(beat.mark_hit());
        assert!(!beat.mark_expired());
        assert!(!beat.mark_hit());
        assert_eq!(beat.state(), BeatState::Hit);

        let before = beat.position();
        beat.update();
        assert_eq!(beat.position(), before, "inactive beats must not move");
    }

    #[test]
    fn test_past_target_is_strict() {
        let mut beat = Beat::new(Player::One, SoundId::Don, 4, 1.0);
        // 2.0 -> 1.0 -> 0.0 -> -1.0 -> -2.0
        for _ in 0..3 {
            beat.update();
        }
        assert_eq!(beat.position(), -1.0);
        assert!(!beat.is_past_target(1.0));
        beat.update();
        assert!(beat.is_past_target(1.0));
    }

    #[test]
    fn test_player_serde_as_number() {
        assert_eq!(serde_json::to_string(&Player::Two).unwrap(), "2");
        let parsed: Player = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, Player::One);
        assert!(serde_json::from_str::<Player>("3").is_err());
    }

    #[test]
    fn test_sound_ids() {
        let parsed: SoundId = serde_json::from_str("\"note_C5\"").unwrap();
        assert_eq!(parsed, SoundId::NoteC5);
        assert_eq!(parsed.to_string(), "note_C5");
        assert_eq!(SoundId::Don.voice(), Voice::Drum);
        assert_eq!(SoundId::Ka.frequency_hz(), None);
        assert_eq!(SoundId::NoteA.frequency_hz(), Some(440.0));
    }
}
