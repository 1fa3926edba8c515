//! Audio analysis
//!
//! Turns raw PCM into the per-tick band energies consumed by the live beat
//! source. Decoding and playback stay outside the core.

pub mod analyzer;

pub use analyzer::{AnalyzerConfig, BandAnalyzer, FrequencyBand};
