//! WAV decoding for live rounds

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader};
use std::path::Path;
use tracing::info;

/// Decoded mono track
#[derive(Debug, Clone)]
pub struct Track {
    /// Mono samples in -1.0..1.0
    pub samples: Vec<f32>,
    /// Samples per second
    pub sample_rate: u32,
}

impl Track {
    /// Length in seconds
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Read a WAV file and mix it down to mono f32
pub fn load_mono<P: AsRef<Path>>(path: P) -> Result<Track> {
    let path = path.as_ref();
    let mut reader =
        WavReader::open(path).with_context(|| format!("Failed to open WAV file: {:?}", path))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        bail!("WAV file {:?} has no channels", path);
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .context("Failed to decode float samples")?,
        SampleFormat::Int => {
            let scale = (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .context("Failed to decode integer samples")?
        }
    };

    let channels = spec.channels as usize;
    let samples: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    let track = Track {
        samples,
        sample_rate: spec.sample_rate,
    };
    info!(
        "Loaded {:?}: {} Hz, {} channel(s), {:.1}s",
        path,
        spec.sample_rate,
        spec.channels,
        track.duration_secs()
    );
    Ok(track)
}
