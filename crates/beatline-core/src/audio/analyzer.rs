//! Band Analyzer - FFT band energies on the reference 0-255 scale
//!
//! Samples are pushed into a ring buffer; every call to
//! [`BandAnalyzer::process`] windows the most recent `fft_size` samples,
//! transforms them and returns the average level of three frequency bands.
//!
//! Per bin the level is derived like a browser analyser node does it:
//! smoothed linear magnitude, converted to decibels and mapped linearly from
//! `min_db..max_db` onto `0..255`. The onset thresholds of the live source are
//! tuned for that scale.

use crate::source::live::BandEnergies;
use crate::{CoreError, Result};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// A frequency range in Hz, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    /// Lower edge
    pub low_hz: f32,
    /// Upper edge
    pub high_hz: f32,
}

impl FrequencyBand {
    /// Create a band
    pub const fn new(low_hz: f32, high_hz: f32) -> Self {
        Self { low_hz, high_hz }
    }
}

/// Configuration for [`BandAnalyzer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Sample rate of the incoming PCM
    pub sample_rate: u32,
    /// FFT size (power of 2)
    pub fft_size: usize,
    /// Smoothing factor for bin magnitudes (0.0 - <1.0)
    pub smoothing: f32,
    /// Level mapped to 0
    pub min_db: f32,
    /// Level mapped to 255
    pub max_db: f32,
    /// Bass band
    pub low_band: FrequencyBand,
    /// Mid band
    pub mid_band: FrequencyBand,
    /// Treble band
    pub high_band: FrequencyBand,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            fft_size: 1024,
            smoothing: 0.6,
            min_db: -100.0,
            max_db: -30.0,
            low_band: FrequencyBand::new(20.0, 140.0),
            mid_band: FrequencyBand::new(400.0, 2600.0),
            high_band: FrequencyBand::new(5200.0, 14000.0),
        }
    }
}

impl AnalyzerConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(CoreError::InvalidConfig(
                "sample_rate must be positive".to_string(),
            ));
        }
        if self.fft_size < 32 || !self.fft_size.is_power_of_two() {
            return Err(CoreError::InvalidConfig(format!(
                "fft_size must be a power of two >= 32, got {}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(CoreError::InvalidConfig(format!(
                "smoothing must be in [0, 1), got {}",
                self.smoothing
            )));
        }
        if !(self.min_db < self.max_db) {
            return Err(CoreError::InvalidConfig(format!(
                "min_db must be below max_db, got {} / {}",
                self.min_db, self.max_db
            )));
        }
        for (name, band) in [
            ("low", self.low_band),
            ("mid", self.mid_band),
            ("high", self.high_band),
        ] {
            if !(band.low_hz >= 0.0 && band.low_hz <= band.high_hz) {
                return Err(CoreError::InvalidConfig(format!(
                    "{} band edges out of order: {} - {} Hz",
                    name, band.low_hz, band.high_hz
                )));
            }
        }
        Ok(())
    }
}

/// Three-band energy analyzer
pub struct BandAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    config: AnalyzerConfig,
    /// Ring buffer of the latest `fft_size` samples
    input_buffer: Vec<f32>,
    buffer_write_pos: usize,
    fft_buffer: Vec<Complex<f32>>,
    scratch_buffer: Vec<Complex<f32>>,
    /// Hann window coefficients
    window: Vec<f32>,
    smoothed_magnitudes: Vec<f32>,
    /// Per-bin level on the 0-255 scale
    byte_levels: Vec<f32>,
    total_samples: u64,
    fft_count: u64,
}

impl fmt::Debug for BandAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BandAnalyzer")
            .field("config", &self.config)
            .field("total_samples", &self.total_samples)
            .field("fft_count", &self.fft_count)
            .finish()
    }
}

impl BandAnalyzer {
    /// Create an analyzer, rejecting invalid configuration
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        let fft_size = config.fft_size;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();

        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                let t = i as f32 / (fft_size - 1) as f32;
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * t).cos())
            })
            .collect();

        debug!(
            "BandAnalyzer created: sample_rate={}, fft_size={}, smoothing={}",
            config.sample_rate, fft_size, config.smoothing
        );

        let half_size = fft_size / 2;
        Ok(Self {
            fft,
            config,
            input_buffer: vec![0.0; fft_size],
            buffer_write_pos: 0,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch_buffer: vec![Complex::new(0.0, 0.0); scratch_len],
            window,
            smoothed_magnitudes: vec![0.0; half_size],
            byte_levels: vec![0.0; half_size],
            total_samples: 0,
            fft_count: 0,
        })
    }

    /// Push one tick's worth of mono samples and return the band energies.
    ///
    /// Non-finite samples are treated as silence. An empty slice re-analyzes
    /// the current buffer.
    pub fn process(&mut self, samples: &[f32]) -> BandEnergies {
        let size = self.config.fft_size;
        for &sample in samples {
            self.input_buffer[self.buffer_write_pos] = if sample.is_finite() { sample } else { 0.0 };
            self.buffer_write_pos = (self.buffer_write_pos + 1) % size;
        }
        self.total_samples += samples.len() as u64;

        self.perform_fft();

        let energies = BandEnergies::new(
            self.band_energy(self.config.low_band),
            self.band_energy(self.config.mid_band),
            self.band_energy(self.config.high_band),
        );
        if self.fft_count % 60 == 0 {
            trace!(
                "FFT #{}: low={:.1} mid={:.1} high={:.1}",
                self.fft_count,
                energies.low,
                energies.mid,
                energies.high
            );
        }
        energies
    }

    fn perform_fft(&mut self) {
        self.fft_count += 1;
        let size = self.config.fft_size;

        // Oldest sample sits at the write position
        for i in 0..size {
            let src_idx = (self.buffer_write_pos + i) % size;
            self.fft_buffer[i] = Complex::new(self.input_buffer[src_idx] * self.window[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch_buffer);

        let norm_factor = 1.0 / size as f32;
        let smoothing = self.config.smoothing;
        let db_range = self.config.max_db - self.config.min_db;

        for i in 0..self.smoothed_magnitudes.len() {
            let magnitude = self.fft_buffer[i].norm() * norm_factor;
            let smoothed = self.smoothed_magnitudes[i] * smoothing + magnitude * (1.0 - smoothing);
            self.smoothed_magnitudes[i] = smoothed;

            let db = 20.0 * smoothed.max(1e-12).log10();
            self.byte_levels[i] = ((db - self.config.min_db) / db_range * 255.0).clamp(0.0, 255.0);
        }
    }

    /// Average level of the bins covering `band`
    fn band_energy(&self, band: FrequencyBand) -> f32 {
        let bins = self.byte_levels.len();
        let nyquist = self.config.sample_rate as f32 / 2.0;
        let to_index = |hz: f32| ((hz / nyquist * bins as f32).round() as usize).min(bins - 1);

        let low = to_index(band.low_hz);
        let high = to_index(band.high_hz).max(low);
        let slice = &self.byte_levels[low..=high];
        slice.iter().sum::<f32>() / slice.len() as f32
    }

    /// Active configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Samples consumed since creation
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Number of FFT frames computed
    pub fn fft_count(&self) -> u64 {
        self.fft_count
    }

    /// Clear the buffers, as if no audio had been seen
    pub fn reset(&mut self) {
        self.input_buffer.fill(0.0);
        self.smoothed_magnitudes.fill(0.0);
        self.byte_levels.fill(0.0);
        self.buffer_write_pos = 0;
        self.total_samples = 0;
        self.fft_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_silence_is_zero() {
        let mut analyzer = BandAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let energies = analyzer.process(&[0.0; 735]);
        assert_eq!(energies, BandEnergies::default());
    }

    #[test]
    fn test_bass_tone_lands_in_low_band() {
        let mut analyzer = BandAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let tone = sine(80.0, 44100, 4096);
        let mut energies = BandEnergies::default();
        for chunk in tone.chunks(735) {
            energies = analyzer.process(chunk);
        }
        assert!(energies.low > 150.0, "low={}", energies.low);
        assert!(energies.low > energies.high * 2.0, "{:?}", energies);
        assert!(energies.low <= 255.0);
    }

    #[test]
    fn test_non_finite_samples_are_silence() {
        let mut analyzer = BandAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let energies = analyzer.process(&[f32::NAN, f32::INFINITY, f32::NEG_INFINITY]);
        assert!(energies.low.is_finite() && energies.mid.is_finite() && energies.high.is_finite());
        assert_eq!(energies, BandEnergies::default());
    }

    #[test]
    fn test_rejects_bad_fft_size() {
        let config = AnalyzerConfig {
            fft_size: 1000,
            ..Default::default()
        };
        assert!(matches!(
            BandAnalyzer::new(config),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut analyzer = BandAnalyzer::new(AnalyzerConfig::default()).unwrap();
        analyzer.process(&sine(80.0, 44100, 2048));
        analyzer.reset();
        assert_eq!(analyzer.total_samples(), 0);
        assert_eq!(analyzer.process(&[]), BandEnergies::default());
    }
}
