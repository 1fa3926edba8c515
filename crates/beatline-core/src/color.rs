//! Display colors handed to the renderer.

use serde::{Deserialize, Serialize};

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// Player one beats and hit zone (pink)
    pub const PLAYER_ONE: Rgb = Rgb::new(255, 80, 150);
    /// Player two beats and hit zone (blue)
    pub const PLAYER_TWO: Rgb = Rgb::new(80, 150, 255);
    /// Perfect hit flash (yellow)
    pub const PERFECT: Rgb = Rgb::new(255, 255, 0);
    /// Good hit flash (green)
    pub const GOOD: Rgb = Rgb::new(0, 255, 100);
    /// Miss flash (dim red)
    pub const MISS: Rgb = Rgb::new(255, 40, 40);

    /// Create a color from its channels
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel by `factor` (clamped to 0.0 - 1.0)
    pub fn scaled(self, factor: f32) -> Self {
        let factor = if factor.is_finite() {
            factor.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let scale = |c: u8| (c as f32 * factor).round() as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }
}
