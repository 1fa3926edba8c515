//! Scripted beat source
//!
//! Plays back a fixed timeline. An event at `event_time` is released as soon
//! as `elapsed >= event_time - travel_time`, so that the beat reaches its hit
//! zone right on time.

use super::{BeatSource, SpawnRequest, TickContext};
use crate::beat::{Player, SoundId};
use crate::controller::PlayMode;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One scripted event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Moment the beat should reach the hit zone, seconds from round start
    #[serde(rename = "eventTime", alias = "time")]
    pub event_time: f32,
    /// Owner of the beat
    pub player: Player,
    /// Sound of the beat
    #[serde(rename = "soundId", alias = "sound")]
    pub sound_id: SoundId,
}

impl TimelineEvent {
    /// Create an event
    pub fn new(event_time: f32, player: Player, sound_id: SoundId) -> Self {
        Self {
            event_time,
            player,
            sound_id,
        }
    }
}

/// Ordered list of scripted events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeline {
    events: Vec<TimelineEvent>,
}

impl Timeline {
    /// Wrap events without checking their order.
    ///
    /// Out-of-order events are still played back without panicking, but a
    /// late event holds back every event behind it.
    pub fn new(events: Vec<TimelineEvent>) -> Self {
        Self { events }
    }

    /// Wrap events, rejecting negative, non-finite or decreasing times
    pub fn validated(events: Vec<TimelineEvent>) -> Result<Self> {
        let timeline = Self::new(events);
        timeline.validate()?;
        Ok(timeline)
    }

    /// Parse a JSON array of `{eventTime, player, soundId}` objects
    pub fn from_json(json: &str) -> Result<Self> {
        let timeline: Timeline = serde_json::from_str(json)?;
        timeline.validate()?;
        debug!("Loaded timeline with {} events", timeline.len());
        Ok(timeline)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the ordering contract
    pub fn validate(&self) -> Result<()> {
        let mut previous = 0.0f32;
        for (index, event) in self.events.iter().enumerate() {
            if !event.event_time.is_finite() || event.event_time < 0.0 {
                return Err(CoreError::InvalidTimeline(format!(
                    "event #{} has invalid time {}",
                    index, event.event_time
                )));
            }
            if event.event_time < previous {
                return Err(CoreError::InvalidTimeline(format!(
                    "event #{} at {}s comes before the previous event at {}s",
                    index, event.event_time, previous
                )));
            }
            previous = event.event_time;
        }
        Ok(())
    }

    /// Events in playback order
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if there are no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Time of the last event, if any
    pub fn duration_secs(&self) -> Option<f32> {
        self.events.last().map(|e| e.event_time)
    }
}

/// Beat source replaying a [`Timeline`]
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    timeline: Timeline,
    travel_time_secs: f32,
    cursor: usize,
    stopped: bool,
}

impl ScriptedSource {
    /// Create a source for `timeline`; beats need `travel_time_secs` to reach their zone
    pub fn new(timeline: Timeline, travel_time_secs: f32) -> Self {
        if let Err(e) = timeline.validate() {
            warn!("Scripted timeline breaks its ordering contract: {}", e);
        }
        Self {
            timeline,
            travel_time_secs,
            cursor: 0,
            stopped: false,
        }
    }

    /// Index of the next event that has not been emitted
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Events not yet emitted
    pub fn remaining(&self) -> usize {
        self.timeline.len() - self.cursor
    }

    /// The timeline being replayed
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }
}

impl BeatSource for ScriptedSource {
    fn mode(&self) -> PlayMode {
        PlayMode::Scripted
    }

    fn spawnable_events(&mut self, ctx: &TickContext) -> Vec<SpawnRequest> {
        let mut spawns = Vec::new();
        if self.stopped {
            return spawns;
        }

        while let Some(event) = self.timeline.events.get(self.cursor) {
            if ctx.elapsed_secs < event.event_time - self.travel_time_secs {
                break;
            }
            spawns.push(SpawnRequest::new(event.player, event.sound_id));
            self.cursor += 1;
        }

        if !spawns.is_empty() {
            debug!(
                "Scripted spawn: {} beat(s) at {:.3}s, cursor {}/{}",
                spawns.len(),
                ctx.elapsed_secs,
                self.cursor,
                self.timeline.len()
            );
        }
        spawns
    }

    fn is_finished(&self) -> bool {
        self.stopped || self.cursor >= self.timeline.len()
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(elapsed_secs: f32) -> TickContext {
        TickContext {
            elapsed_secs,
            ..Default::default()
        }
    }

    #[test]
    fn test_event_released_travel_time_early() {
        let timeline = Timeline::new(vec![TimelineEvent::new(2.0, Player::One, SoundId::Don)]);
        let mut source = ScriptedSource::new(timeline, 1.5);

        assert!(source.spawnable_events(&ctx(0.4)).is_empty());
        let spawns = source.spawnable_events(&ctx(0.5));
        assert_eq!(spawns, vec![SpawnRequest::new(Player::One, SoundId::Don)]);
        assert!(source.is_finished());
        assert!(source.spawnable_events(&ctx(10.0)).is_empty());
    }

    #[test]
    fn test_simultaneous_events_keep_order() {
        let timeline = Timeline::new(vec![
            TimelineEvent::new(3.0, Player::One, SoundId::Don),
            TimelineEvent::new(3.0, Player::Two, SoundId::NoteE),
            TimelineEvent::new(3.6, Player::One, SoundId::Ka),
        ]);
        let mut source = ScriptedSource::new(timeline, 1.43);

        let spawns = source.spawnable_events(&ctx(1.6));
        assert_eq!(
            spawns,
            vec![
                SpawnRequest::new(Player::One, SoundId::Don),
                SpawnRequest::new(Player::Two, SoundId::NoteE),
            ]
        );
        assert_eq!(source.cursor(), 2);
        assert_eq!(source.remaining(), 1);
    }

    #[test]
    fn test_unsorted_timeline_does_not_panic() {
        let timeline = Timeline::new(vec![
            TimelineEvent::new(5.0, Player::One, SoundId::Don),
            TimelineEvent::new(1.0, Player::Two, SoundId::Ka),
        ]);
        assert!(timeline.validate().is_err());

        let mut source = ScriptedSource::new(timeline, 1.0);
        assert!(source.spawnable_events(&ctx(0.5)).is_empty());
        assert_eq!(source.spawnable_events(&ctx(4.0)).len(), 2);
        assert!(source.is_finished());
    }

    #[test]
    fn test_stop_finishes_source() {
        let timeline = Timeline::new(vec![TimelineEvent::new(1.0, Player::One, SoundId::Don)]);
        let mut source = ScriptedSource::new(timeline, 0.0);
        source.stop();
        assert!(source.is_finished());
        assert!(source.spawnable_events(&ctx(5.0)).is_empty());
    }

    #[test]
    fn test_json_accepts_both_field_spellings() {
        let json = r#"[
            { "eventTime": 0.6, "player": 1, "soundId": "don" },
            { "time": 1.2, "player": 2, "sound": "note_G" }
        ]"#;
        let timeline = Timeline::from_json(json).unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.events()[1].sound_id, SoundId::NoteG);
        assert_eq!(timeline.duration_secs(), Some(1.2));
    }

    #[test]
    fn test_json_rejects_decreasing_times() {
        let json = r#"[
            { "eventTime": 2.0, "player": 1, "soundId": "don" },
            { "eventTime": 1.0, "player": 1, "soundId": "ka" }
        ]"#;
        assert!(matches!(
            Timeline::from_json(json),
            Err(CoreError::InvalidTimeline(_))
        ));
    }
}
