//! Beatline Core - Rhythm Round Model
//!
//! This crate contains the tick-driven core of the two-player, one-dimensional
//! drum game, including:
//! - Beats travelling from the center of the track toward each player's hit zone
//! - Beat sources: a scripted timeline and live onset detection on band energies
//! - Hit judgment against distance windows, scoring and combos
//! - The round state machine (ready → select → play → end)
//! - Band-energy analysis of raw PCM for feeding the live source
//!
//! The core never draws, plays sound or reads files. Each tick it produces a
//! [`FrameSnapshot`] and a list of [`GameEvent`]s for the outer collaborators.

#![warn(missing_docs)]

use thiserror::Error;

pub mod audio;
pub mod beat;
pub mod color;
pub mod config;
pub mod controller;
pub mod feedback;
pub mod judgment;
pub mod logging;
pub mod snapshot;
pub mod song;
pub mod source;

// --- Re-exports grouped by category ---

// Beats & sounds
pub use beat::{Beat, BeatState, Player, SoundId, Voice};
pub use color::Rgb;

// Beat sources
pub use source::live::{AudioFrame, BandEnergies, BandPeaks, LiveSource, StopReason};
pub use source::scripted::{ScriptedSource, Timeline, TimelineEvent};
pub use source::{BeatSource, SpawnRequest, TickContext};

// Judgment & scoring
pub use judgment::{judge, HitGrade, Judgment, PlayerStats, Scoreboard};

// Round orchestration
pub use controller::{GameEvent, InputAction, PlayMode, RoundController, RoundMode, RoundSummary};
pub use feedback::{EndFill, FeedbackFlash, FeedbackKind, FeedbackQueue};
pub use snapshot::{BeatView, FlashView, FrameSnapshot};

// Configuration & logging
pub use audio::analyzer::{AnalyzerConfig, BandAnalyzer, FrequencyBand};
pub use config::{GameConfig, HitWindows, OnsetConfig, ScoreValues};
pub use logging::LogConfig;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// Scripted timeline violates its ordering or value contract
    #[error("Invalid timeline: {0}")]
    InvalidTimeline(String),

    /// A live round was requested but no audio source is available
    #[error("Beat source unavailable: {0}")]
    SourceUnavailable(String),

    /// Requested round transition is not allowed from the current mode
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
