//! Audio Test File Generation Utilities
//!
//! Deterministic 48 kHz 16-bit WAV files for exercising the symphonia-backed
//! source end to end.

use hound::{WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::Path;

/// Fixed playback rate
pub const TEST_SAMPLE_RATE: u32 = 48_000;

/// Sample value of the generated sine at `frame`
pub fn sine_sample(frame: u64, frequency: f32, amplitude: f32) -> i16 {
    let t = frame as f32 / TEST_SAMPLE_RATE as f32;
    ((2.0 * PI * frequency * t).sin() * amplitude * i16::MAX as f32) as i16
}

/// Generate a WAV file with a sine on every channel.
///
/// # Arguments
/// * `path` - Output file path
/// * `channels` - 1 or 2
/// * `duration_ms` - Duration in milliseconds
/// * `frequency` - Sine frequency in Hz
///
/// # Returns
/// The samples written, interleaved
pub fn generate_sine_wav<P: AsRef<Path>>(
    path: P,
    channels: u16,
    duration_ms: u64,
    frequency: f32,
) -> Result<Vec<i16>, hound::Error> {
    let spec = WavSpec {
        channels,
        sample_rate: TEST_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    let total_frames = (TEST_SAMPLE_RATE as u64 * duration_ms) / 1000;
    let mut written = Vec::with_capacity((total_frames * channels as u64) as usize);

    for frame in 0..total_frames {
        let sample = sine_sample(frame, frequency, 0.8);
        for _ in 0..channels {
            writer.write_sample(sample)?;
            written.push(sample);
        }
    }

    writer.finalize()?;
    Ok(written)
}

/// Generate a mono WAV at a rate other than the playback rate.
pub fn generate_wav_at_rate<P: AsRef<Path>>(path: P, sample_rate: u32) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for _ in 0..sample_rate / 10 {
        writer.write_sample(0i16)?;
    }
    writer.finalize()?;
    Ok(())
}
