//! Built-in scripted song
//!
//! A collaborative piece at 100 BPM (0.6 s per quarter note): player one
//! keeps the drums (`don`/`ka`), player two carries a pentatonic melody.
//! Scripted rounds also carry a quiet backing pad cycling through
//! [`BACKING_CHORDS`], one chord every six quarter notes.

use crate::beat::{Player, SoundId};
use crate::source::scripted::{Timeline, TimelineEvent};

/// Tempo of the built-in song
pub const TEMPO_BPM: f32 = 100.0;

/// Length of one quarter note in seconds
pub const BEAT_DURATION_SECS: f32 = 60.0 / TEMPO_BPM;

/// How long the backing pad holds each chord
pub const BACKING_CHORD_SECS: f32 = 6.0 * BEAT_DURATION_SECS;

/// Backing pad volume, relative to a full-volume hit sound
pub const BACKING_VOLUME: f32 = 0.035;

/// Backing progression in the low octave: C, Am, C, G5 (no B, so it stays
/// pentatonic)
pub const BACKING_CHORDS: [[f32; 3]; 4] = [
    [130.81, 164.81, 196.00],
    [110.00, 130.81, 164.81],
    [130.81, 164.81, 196.00],
    [98.00, 146.83, 196.00],
];

const DEFAULT_SONG: &[(f32, Player, SoundId)] = &[
    (0.6, Player::One, SoundId::Don),
    (1.2, Player::One, SoundId::Don),
    (1.8, Player::One, SoundId::Ka),
    (2.4, Player::One, SoundId::Don),
    (3.0, Player::One, SoundId::Don),
    (3.0, Player::Two, SoundId::NoteE),
    (3.6, Player::One, SoundId::Ka),
    (3.6, Player::Two, SoundId::NoteG),
    (4.2, Player::One, SoundId::Don),
    (4.2, Player::Two, SoundId::NoteA),
    (4.8, Player::One, SoundId::Don),
    (4.8, Player::Two, SoundId::NoteG),
    (5.4, Player::One, SoundId::Ka),
    (5.4, Player::Two, SoundId::NoteE),
    (6.0, Player::One, SoundId::Don),
    (6.0, Player::Two, SoundId::NoteG),
    (6.6, Player::One, SoundId::Don),
    (6.6, Player::Two, SoundId::NoteA),
    (7.2, Player::One, SoundId::Ka),
    (7.2, Player::Two, SoundId::NoteG),
    (7.8, Player::One, SoundId::Don),
    (7.8, Player::Two, SoundId::NoteE),
    (8.4, Player::One, SoundId::Don),
    (8.4, Player::Two, SoundId::NoteD),
    (9.0, Player::One, SoundId::Ka),
    (9.0, Player::Two, SoundId::NoteC),
    (9.6, Player::One, SoundId::Don),
    (10.2, Player::One, SoundId::Ka),
    (10.8, Player::One, SoundId::Don),
    (10.8, Player::Two, SoundId::NoteC),
    (11.4, Player::One, SoundId::Don),
    (11.4, Player::Two, SoundId::NoteE),
    (12.0, Player::One, SoundId::Ka),
    (12.0, Player::Two, SoundId::NoteG),
    (12.6, Player::One, SoundId::Don),
    (12.6, Player::Two, SoundId::NoteA),
    (13.2, Player::One, SoundId::Don),
    (13.2, Player::Two, SoundId::NoteC5),
    (13.8, Player::One, SoundId::Ka),
    (13.8, Player::Two, SoundId::NoteA),
    (14.4, Player::One, SoundId::Don),
    (14.4, Player::Two, SoundId::NoteG),
    (15.0, Player::One, SoundId::Don),
    (15.0, Player::Two, SoundId::NoteE),
    (15.6, Player::One, SoundId::Ka),
    (15.6, Player::Two, SoundId::NoteD),
    (16.2, Player::One, SoundId::Don),
    (16.2, Player::Two, SoundId::NoteC),
    (16.8, Player::One, SoundId::Don),
    (17.4, Player::One, SoundId::Ka),
    (17.4, Player::Two, SoundId::NoteE),
    (17.7, Player::Two, SoundId::NoteG),
    (18.0, Player::One, SoundId::Don),
    (18.0, Player::Two, SoundId::NoteA),
    (18.3, Player::Two, SoundId::NoteG),
    (18.6, Player::One, SoundId::Don),
    (18.6, Player::Two, SoundId::NoteE),
    (19.2, Player::One, SoundId::Ka),
    (19.2, Player::Two, SoundId::NoteD),
    (19.8, Player::One, SoundId::Don),
    (19.8, Player::Two, SoundId::NoteC),
    (20.1, Player::Two, SoundId::NoteG),
    (20.4, Player::One, SoundId::Don),
    (20.4, Player::Two, SoundId::NoteA),
    (20.7, Player::Two, SoundId::NoteC5),
    (21.0, Player::One, SoundId::Ka),
    (21.0, Player::Two, SoundId::NoteA),
    (21.6, Player::One, SoundId::Don),
    (21.6, Player::Two, SoundId::NoteG),
    (22.2, Player::One, SoundId::Don),
    (22.2, Player::Two, SoundId::NoteE),
    (22.5, Player::One, SoundId::Ka),
    (22.8, Player::One, SoundId::Don),
    (22.8, Player::Two, SoundId::NoteD),
    (23.4, Player::One, SoundId::Don),
    (23.4, Player::Two, SoundId::NoteE),
    (24.0, Player::One, SoundId::Don),
    (24.0, Player::Two, SoundId::NoteG),
    (24.6, Player::One, SoundId::Ka),
    (24.6, Player::Two, SoundId::NoteA),
    (25.2, Player::One, SoundId::Don),
    (25.2, Player::Two, SoundId::NoteG),
    (25.8, Player::One, SoundId::Don),
    (25.8, Player::Two, SoundId::NoteA),
    (26.4, Player::One, SoundId::Ka),
    (26.4, Player::Two, SoundId::NoteC5),
    (27.0, Player::One, SoundId::Don),
    (27.0, Player::Two, SoundId::NoteC),
];

/// The built-in song as a timeline
pub fn default_timeline() -> Timeline {
    Timeline::new(
        DEFAULT_SONG
            .iter()
            .map(|&(time, player, sound)| TimelineEvent::new(time, player, sound))
            .collect(),
    )
}

/// Tick-counted position in the backing progression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackingPad {
    chord: usize,
    ticks_in_chord: u32,
    chord_ticks: u32,
}

impl BackingPad {
    /// Start on the first chord, changing every `chord_ticks` ticks
    pub fn new(chord_ticks: u32) -> Self {
        Self {
            chord: 0,
            ticks_in_chord: 0,
            chord_ticks: chord_ticks.max(1),
        }
    }

    /// Index into [`BACKING_CHORDS`] of the sounding chord
    pub fn chord(&self) -> usize {
        self.chord
    }

    /// Pitches of the sounding chord
    pub fn frequencies_hz(&self) -> [f32; 3] {
        BACKING_CHORDS[self.chord]
    }

    /// Count one tick. Returns the new chord index when the chord changes.
    pub fn advance(&mut self) -> Option<usize> {
        self.ticks_in_chord += 1;
        if self.ticks_in_chord < self.chord_ticks {
            return None;
        }
        self.ticks_in_chord = 0;
        self.chord = (self.chord + 1) % BACKING_CHORDS.len();
        Some(self.chord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_song_is_sorted() {
        let timeline = default_timeline();
        assert!(timeline.validate().is_ok());
        assert_eq!(timeline.len(), 88);
        assert_eq!(timeline.duration_secs(), Some(27.0));
    }

    #[test]
    fn test_players_split_drums_and_melody() {
        let timeline = default_timeline();
        for event in timeline.events() {
            match event.player {
                Player::Two => assert!(
                    !matches!(event.sound_id, SoundId::Don | SoundId::Ka),
                    "melody player got a drum at {}s",
                    event.event_time
                ),
                Player::One => assert!(matches!(event.sound_id, SoundId::Don | SoundId::Ka)),
            }
        }
    }

    #[test]
    fn test_backing_chord_lasts_six_beats() {
        assert!((BACKING_CHORD_SECS - 3.6).abs() < 1e-5);
        assert!((BEAT_DURATION_SECS - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_backing_pad_cycles_progression() {
        let mut pad = BackingPad::new(3);
        assert_eq!(pad.chord(), 0);
        assert_eq!(pad.frequencies_hz(), BACKING_CHORDS[0]);

        for expected in [1, 2, 3, 0] {
            assert_eq!(pad.advance(), None);
            assert_eq!(pad.advance(), None);
            assert_eq!(pad.advance(), Some(expected));
        }
        assert_eq!(pad.frequencies_hz(), [130.81, 164.81, 196.00]);
    }

    #[test]
    fn test_backing_pad_zero_length_chord_changes_every_tick() {
        let mut pad = BackingPad::new(0);
        assert_eq!(pad.advance(), Some(1));
        assert_eq!(pad.advance(), Some(2));
    }
}
