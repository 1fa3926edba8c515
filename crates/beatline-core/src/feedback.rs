//! Tick-counted feedback effects
//!
//! Every effect owns its remaining lifetime and is dropped from its queue the
//! tick it runs out. A round cannot end while any flash is still pending.

use crate::beat::Player;
use crate::color::Rgb;
use crate::judgment::HitGrade;
use serde::{Deserialize, Serialize};

/// Kind of flash shown at a hit zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackKind {
    /// Perfect hit
    Perfect,
    /// Good hit
    Good,
    /// Beat expired
    Miss,
}

impl FeedbackKind {
    /// Flash color
    pub fn color(self) -> Rgb {
        match self {
            FeedbackKind::Perfect => Rgb::PERFECT,
            FeedbackKind::Good => Rgb::GOOD,
            FeedbackKind::Miss => Rgb::MISS,
        }
    }

    /// Maximum spread in pixels on each side of the center
    pub fn radius(self) -> u32 {
        match self {
            FeedbackKind::Perfect => 3,
            FeedbackKind::Good => 2,
            FeedbackKind::Miss => 1,
        }
    }
}

impl From<HitGrade> for FeedbackKind {
    fn from(grade: HitGrade) -> Self {
        match grade {
            HitGrade::Perfect => FeedbackKind::Perfect,
            HitGrade::Good => FeedbackKind::Good,
        }
    }
}

/// A fading, spreading flash around a hit zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackFlash {
    center: i32,
    kind: FeedbackKind,
    frame: u32,
    max_frames: u32,
}

impl FeedbackFlash {
    /// Create a flash lasting `max_frames` ticks
    pub fn new(center: i32, kind: FeedbackKind, max_frames: u32) -> Self {
        Self {
            center,
            kind,
            frame: 0,
            max_frames: max_frames.max(1),
        }
    }

    /// Advance one tick
    pub fn update(&mut self) {
        if self.is_active() {
            self.frame += 1;
        }
    }

    /// Still visible
    pub fn is_active(&self) -> bool {
        self.frame < self.max_frames
    }

    /// 0.0 at creation, 1.0 when finished
    pub fn progress(&self) -> f32 {
        self.frame as f32 / self.max_frames as f32
    }

    /// Blend strength for the renderer
    pub fn alpha(&self) -> f32 {
        (1.0 - self.progress()) * 0.8
    }

    /// Pixels lit on each side of the center
    pub fn spread(&self) -> u32 {
        (self.kind.radius() as f32 * self.progress()).floor() as u32
    }

    /// Center pixel
    pub fn center(&self) -> i32 {
        self.center
    }

    /// Flash kind
    pub fn kind(&self) -> FeedbackKind {
        self.kind
    }
}

/// Pending flashes
#[derive(Debug, Clone, Default)]
pub struct FeedbackQueue {
    flashes: Vec<FeedbackFlash>,
}

impl FeedbackQueue {
    /// Empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a flash
    pub fn push(&mut self, flash: FeedbackFlash) {
        self.flashes.push(flash);
    }

    /// Advance every flash and drop finished ones
    pub fn update(&mut self) {
        for flash in &mut self.flashes {
            flash.update();
        }
        self.flashes.retain(FeedbackFlash::is_active);
    }

    /// Flashes still running
    pub fn flashes(&self) -> &[FeedbackFlash] {
        &self.flashes
    }

    /// True if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.flashes.is_empty()
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.flashes.clear();
    }
}

/// Center-outward split fill played when a round ends
///
/// The low half fills in player one's color and the high half in player
/// two's: the game is collaborative, so both colors always share the finale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndFill {
    track_length: usize,
    frame: u32,
    max_frames: u32,
}

impl EndFill {
    /// Create a fill lasting `max_frames` ticks
    pub fn new(track_length: usize, max_frames: u32) -> Self {
        Self {
            track_length,
            frame: 0,
            max_frames: max_frames.max(1),
        }
    }

    /// Advance one tick (holds at the final frame)
    pub fn update(&mut self) {
        if self.frame < self.max_frames {
            self.frame += 1;
        }
    }

    /// 0.0 - 1.0
    pub fn progress(&self) -> f32 {
        (self.frame as f32 / self.max_frames as f32).min(1.0)
    }

    /// True once fully filled
    pub fn is_done(&self) -> bool {
        self.frame >= self.max_frames
    }

    /// Pixels filled on each side of the center
    pub fn reach(&self) -> usize {
        ((self.track_length / 2) as f32 * self.progress()).floor() as usize
    }

    /// Color of pixel `index`, or `None` if not yet filled
    pub fn pixel(&self, index: usize) -> Option<Rgb> {
        let center = self.track_length / 2;
        let reach = self.reach();
        if index < self.track_length && index + reach >= center && index <= center + reach {
            if index <= center {
                Some(Player::One.color())
            } else {
                Some(Player::Two.color())
            }
        } else {
            None
        }
    }
}
