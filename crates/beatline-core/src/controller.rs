//! Round controller - state machine and per-tick orchestration
//!
//! States: `Ready → Select → Play → End`, with `End → Ready` on reset.
//!
//! Inputs are buffered by [`RoundController::handle_input`] and consumed by
//! the next [`RoundController::tick`], so every input is processed exactly
//! once. While playing, each tick runs in a fixed order:
//!
//! 1. spawn beats from the active source
//! 2. advance every live beat
//! 3. expire beats that passed their hit zone (miss, combo reset, flash)
//! 4. judge buffered hit inputs
//! 5. compact the live set, dropping every beat that left the active state
//! 6. advance feedback flashes and the backing pad
//! 7. end the round once the source is finished and nothing is pending
//!
//! Scripted rounds also drive a backing pad: it starts with the round, steps
//! through [`song::BACKING_CHORDS`] and stops when the round ends or is reset.
//! Live rounds have no pad because the track is the soundtrack.

use crate::beat::{Beat, Player, SoundId};
use crate::config::GameConfig;
use crate::feedback::{EndFill, FeedbackFlash, FeedbackKind, FeedbackQueue};
use crate::judgment::{judge, HitGrade, PlayerStats, Scoreboard};
use crate::snapshot::FrameSnapshot;
use crate::song::{self, BackingPad};
use crate::source::live::{AudioFrame, LiveSource};
use crate::source::scripted::{ScriptedSource, Timeline};
use crate::source::{BeatSource, TickContext};
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, info, trace, warn};

/// Top-level round state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundMode {
    /// Attract screen, waiting for any input
    Ready,
    /// Choosing between scripted and live play
    Select,
    /// Round in progress
    Play,
    /// Round finished, waiting for reset
    End,
}

impl fmt::Display for RoundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoundMode::Ready => "ready",
            RoundMode::Select => "select",
            RoundMode::Play => "play",
            RoundMode::End => "end",
        };
        f.write_str(name)
    }
}

/// Which beat source drives the round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayMode {
    /// Built-in (or supplied) timeline
    #[default]
    Scripted,
    /// Onset detection on a live audio feed
    Live,
}

/// Logical input actions; physical keys are mapped elsewhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAction {
    /// A player pressed their drum
    Hit(Player),
    /// Ready → select, or select → play with the current play mode
    AdvanceMode,
    /// Pick a play mode on the select screen and start the round
    ChooseMode(PlayMode),
    /// End → ready
    Reset,
}

/// Final numbers of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    /// Mode the round was played in
    pub play_mode: PlayMode,
    /// Per-player stats, player one first
    pub players: [PlayerStats; 2],
    /// Combined score
    pub total_score: u32,
    /// Ticks the round lasted
    pub ticks: u64,
}

/// Discrete events for the render and audio collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Round state changed
    ModeChanged {
        /// Previous state
        from: RoundMode,
        /// New state
        to: RoundMode,
    },
    /// A beat entered the track
    BeatSpawned {
        /// Owner
        player: Player,
        /// Sound
        sound: SoundId,
    },
    /// A player hit a beat
    Hit {
        /// Player who hit
        player: Player,
        /// Perfect or good
        grade: HitGrade,
        /// Hit-zone coordinate where feedback should show
        position: f32,
        /// Sound to play
        sound: SoundId,
        /// Playback volume
        volume: f32,
        /// False in live mode, where the track itself is the soundtrack
        play_sound: bool,
    },
    /// A beat passed its hit zone unjudged
    Miss {
        /// Owner of the expired beat
        player: Player,
        /// Hit-zone coordinate
        position: f32,
    },
    /// The backing pad started on its first chord
    BackingStarted {
        /// Pitches of the chord
        frequencies_hz: [f32; 3],
        /// Pad volume
        volume: f32,
    },
    /// The backing pad moved on to another chord
    BackingChordChanged {
        /// Index into the progression
        chord: usize,
        /// Pitches of the new chord
        frequencies_hz: [f32; 3],
    },
    /// The backing pad went silent
    BackingStopped,
    /// The round is over
    RoundEnded(RoundSummary),
}

/// Mutable state of the round in progress
#[derive(Debug, Default)]
struct RoundState {
    live_beats: Vec<Beat>,
    scores: Scoreboard,
    tick: u64,
}

/// Owns the round state and drives it tick by tick
pub struct RoundController {
    config: GameConfig,
    timeline: Timeline,
    mode: RoundMode,
    play_mode: PlayMode,
    live_available: bool,
    round: RoundState,
    source: Option<Box<dyn BeatSource>>,
    feedback: FeedbackQueue,
    end_fill: Option<EndFill>,
    backing: Option<BackingPad>,
    pending: VecDeque<InputAction>,
    events: Vec<GameEvent>,
    idle_phase: f32,
    last_summary: Option<RoundSummary>,
}

impl RoundController {
    /// Create a controller playing the built-in song in scripted mode
    pub fn new(config: GameConfig) -> Result<Self> {
        Self::with_timeline(config, song::default_timeline())
    }

    /// Create a controller playing `timeline` in scripted mode
    pub fn with_timeline(config: GameConfig, timeline: Timeline) -> Result<Self> {
        config.validate()?;
        debug!(
            "RoundController created: track={}, tick_rate={}, timeline={} events",
            config.track_length,
            config.tick_rate,
            timeline.len()
        );
        Ok(Self {
            config,
            timeline,
            mode: RoundMode::Ready,
            play_mode: PlayMode::Scripted,
            live_available: false,
            round: RoundState::default(),
            source: None,
            feedback: FeedbackQueue::new(),
            end_fill: None,
            backing: None,
            pending: VecDeque::new(),
            events: Vec::new(),
            idle_phase: 0.0,
            last_summary: None,
        })
    }

    /// Tell the controller whether a live audio source is loaded
    pub fn set_live_available(&mut self, available: bool) {
        self.live_available = available;
    }

    /// Buffer an input for the next tick
    pub fn handle_input(&mut self, action: InputAction) {
        trace!("Input buffered: {:?}", action);
        self.pending.push_back(action);
    }

    /// Run one tick. `audio` is the live feed reading for this tick, if any.
    ///
    /// Returns the events produced since the previous tick.
    pub fn tick(&mut self, audio: Option<AudioFrame>) -> Vec<GameEvent> {
        let inputs: Vec<InputAction> = self.pending.drain(..).collect();

        match self.mode {
            RoundMode::Play => self.play_tick(audio, &inputs),
            RoundMode::Ready | RoundMode::Select => {
                self.idle_phase += self.config.idle_pulse_step;
                for action in inputs {
                    self.apply_menu_input(action);
                }
            }
            RoundMode::End => {
                if let Some(fill) = &mut self.end_fill {
                    fill.update();
                }
                for action in inputs {
                    self.apply_menu_input(action);
                }
            }
        }

        std::mem::take(&mut self.events)
    }

    /// Move from select to play with `play_mode`.
    ///
    /// Fails without any state change if the controller is not on the select
    /// screen, or if live play is requested without a live source.
    pub fn start_round(&mut self, play_mode: PlayMode) -> Result<()> {
        if self.mode != RoundMode::Select {
            return Err(CoreError::InvalidTransition(format!(
                "cannot start a round from {}",
                self.mode
            )));
        }
        if play_mode == PlayMode::Live && !self.live_available {
            return Err(CoreError::SourceUnavailable(
                "no live audio source loaded".to_string(),
            ));
        }

        if let Some(previous) = &mut self.source {
            previous.stop();
        }
        let source: Box<dyn BeatSource> = match play_mode {
            PlayMode::Scripted => Box::new(ScriptedSource::new(
                self.timeline.clone(),
                self.config.travel_time_secs,
            )),
            PlayMode::Live => Box::new(LiveSource::new(self.config.onset.clone())),
        };
        self.source = Some(source);
        self.play_mode = play_mode;
        self.round = RoundState::default();
        self.feedback.clear();
        self.end_fill = None;
        self.last_summary = None;

        info!("Round started in {:?} mode", play_mode);
        self.set_mode(RoundMode::Play);
        if play_mode == PlayMode::Scripted {
            self.start_backing();
        }
        Ok(())
    }

    /// Return from end to ready. Returns false (and does nothing) in any other state.
    pub fn reset(&mut self) -> bool {
        if self.mode != RoundMode::End {
            debug!("Reset ignored in {} state", self.mode);
            return false;
        }
        if let Some(mut source) = self.source.take() {
            source.stop();
        }
        self.stop_backing();
        self.round = RoundState::default();
        self.feedback.clear();
        self.end_fill = None;
        self.pending.clear();
        self.play_mode = PlayMode::Scripted;
        self.idle_phase = 0.0;
        self.set_mode(RoundMode::Ready);
        true
    }

    fn apply_menu_input(&mut self, action: InputAction) {
        match (self.mode, action) {
            (RoundMode::Ready, InputAction::AdvanceMode) => self.set_mode(RoundMode::Select),
            (RoundMode::Select, InputAction::AdvanceMode) => self.try_start(self.play_mode),
            (RoundMode::Select, InputAction::ChooseMode(mode)) => self.try_start(mode),
            (RoundMode::End, InputAction::Reset) => {
                self.reset();
            }
            (mode, action) => trace!("Input {:?} ignored in {} state", action, mode),
        }
    }

    fn try_start(&mut self, play_mode: PlayMode) {
        if let Err(e) = self.start_round(play_mode) {
            warn!("Round not started: {}", e);
        }
    }

    fn play_tick(&mut self, audio: Option<AudioFrame>, inputs: &[InputAction]) {
        let ctx = TickContext {
            tick: self.round.tick,
            elapsed_secs: self.round.tick as f32 / self.config.tick_rate,
            audio,
        };

        // 1. Spawn
        if let Some(source) = &mut self.source {
            let speed = self.config.speed_for(source.mode());
            for request in source.spawnable_events(&ctx) {
                self.round.live_beats.push(Beat::new(
                    request.player,
                    request.sound,
                    self.config.track_length,
                    speed,
                ));
                self.events.push(GameEvent::BeatSpawned {
                    player: request.player,
                    sound: request.sound,
                });
            }
        }

        // 2. Advance
        for beat in &mut self.round.live_beats {
            beat.update();
        }

        // 3. Expire
        let tolerance = self.config.expiry_tolerance;
        let expired: Vec<(Player, f32)> = self
            .round
            .live_beats
            .iter_mut()
            .filter(|beat| beat.is_active() && beat.is_past_target(tolerance))
            .filter_map(|beat| {
                beat.mark_expired()
                    .then(|| (beat.owner(), beat.target_zone()))
            })
            .collect();
        for (player, position) in expired {
            self.register_miss(player, position);
        }

        // 4. Judge
        for action in inputs {
            match action {
                InputAction::Hit(player) => self.try_hit(*player),
                other => trace!("Input {:?} ignored while playing", other),
            }
        }

        // 5. Compact
        self.round.live_beats.retain(Beat::is_active);

        // 6. Feedback
        self.feedback.update();
        if let Some(chord) = self.backing.as_mut().and_then(BackingPad::advance) {
            trace!("Backing chord {}", chord);
            self.events.push(GameEvent::BackingChordChanged {
                chord,
                frequencies_hz: song::BACKING_CHORDS[chord],
            });
        }

        self.round.tick += 1;

        // 7. Completion
        let source_done = self.source.as_ref().map_or(true, |s| s.is_finished());
        if source_done && self.round.live_beats.is_empty() && self.feedback.is_empty() {
            self.finish_round();
        }
    }

    fn register_miss(&mut self, player: Player, position: f32) {
        debug!("{} missed a beat", player);
        self.round.scores.get_mut(player).register_miss();
        self.feedback.push(FeedbackFlash::new(
            position.round() as i32,
            FeedbackKind::Miss,
            self.config.flash_ticks,
        ));
        self.events.push(GameEvent::Miss { player, position });
    }

    fn try_hit(&mut self, player: Player) {
        let windows = self.config.windows_for(self.play_mode);
        let Some(judgment) = judge(player, &mut self.round.live_beats, &windows) else {
            return;
        };

        self.round
            .scores
            .apply(&judgment, &self.config.scores);
        self.feedback.push(FeedbackFlash::new(
            judgment.target_zone.round() as i32,
            judgment.grade.into(),
            self.config.flash_ticks,
        ));
        self.events.push(GameEvent::Hit {
            player,
            grade: judgment.grade,
            position: judgment.target_zone,
            sound: judgment.sound,
            volume: judgment.grade.volume(),
            play_sound: self.play_mode == PlayMode::Scripted,
        });
    }

    fn finish_round(&mut self) {
        if let Some(source) = &mut self.source {
            source.stop();
        }
        let summary = RoundSummary {
            play_mode: self.play_mode,
            players: *self.round.scores.players(),
            total_score: self.round.scores.total_score(),
            ticks: self.round.tick,
        };
        info!(
            "Round finished after {} ticks: P1={} P2={} total={}",
            summary.ticks, summary.players[0].score, summary.players[1].score, summary.total_score
        );
        self.end_fill = Some(EndFill::new(
            self.config.track_length,
            self.config.end_fill_ticks,
        ));
        self.last_summary = Some(summary);
        self.stop_backing();
        self.set_mode(RoundMode::End);
        self.events.push(GameEvent::RoundEnded(summary));
    }

    fn start_backing(&mut self) {
        let pad = BackingPad::new(self.config.backing_chord_ticks());
        debug!(
            "Backing pad started, {} ticks per chord",
            self.config.backing_chord_ticks()
        );
        self.events.push(GameEvent::BackingStarted {
            frequencies_hz: pad.frequencies_hz(),
            volume: song::BACKING_VOLUME,
        });
        self.backing = Some(pad);
    }

    fn stop_backing(&mut self) {
        if self.backing.take().is_some() {
            debug!("Backing pad stopped");
            self.events.push(GameEvent::BackingStopped);
        }
    }

    fn set_mode(&mut self, to: RoundMode) {
        let from = self.mode;
        if from == to {
            return;
        }
        info!("Round mode {} -> {}", from, to);
        self.mode = to;
        self.events.push(GameEvent::ModeChanged { from, to });
    }

    /// Read-only view for the renderer
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::capture(self)
    }

    /// Current round state
    pub fn mode(&self) -> RoundMode {
        self.mode
    }

    /// Current (or last selected) play mode
    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    /// Whether live play can be selected
    pub fn live_available(&self) -> bool {
        self.live_available
    }

    /// Beats currently on the track, in spawn order
    pub fn live_beats(&self) -> &[Beat] {
        &self.round.live_beats
    }

    /// Scores of the round in progress (or the last round while in end)
    pub fn scores(&self) -> &Scoreboard {
        &self.round.scores
    }

    /// Ticks played in the current round
    pub fn round_tick(&self) -> u64 {
        self.round.tick
    }

    /// Pending feedback flashes
    pub fn feedback(&self) -> &FeedbackQueue {
        &self.feedback
    }

    /// End-of-round fill, while in end
    pub fn end_fill(&self) -> Option<&EndFill> {
        self.end_fill.as_ref()
    }

    /// Idle pulse in 0.0 - 1.0 for the ready/select glow
    pub fn idle_pulse(&self) -> f32 {
        (self.idle_phase.sin() + 1.0) / 2.0
    }

    /// Summary of the last finished round
    pub fn last_summary(&self) -> Option<&RoundSummary> {
        self.last_summary.as_ref()
    }

    /// Active configuration
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Index of the sounding backing chord, while the pad plays
    pub fn backing_chord(&self) -> Option<usize> {
        self.backing.as_ref().map(BackingPad::chord)
    }

    /// True once the active source will spawn no more beats
    pub fn source_finished(&self) -> bool {
        self.source.as_ref().map_or(true, |s| s.is_finished())
    }
}
