//! Core audio data types
//!
//! Output format constants, channel layout and volume level shared by the
//! decoder, the stream mixer and the audio output.
//!
//! **Output format:** 48000 Hz, signed 16-bit, stereo interleaved `[L, R, L, R, ...]`.

use std::fmt;
use std::time::Duration;

/// Fixed output sample rate. Sources at any other rate are rejected.
pub const SAMPLE_RATE: u32 = 48_000;

/// Output channel count (always stereo)
pub const OUTPUT_CHANNELS: usize = 2;

/// Bytes per 16-bit sample
pub const BYTES_PER_SAMPLE: usize = 2;

/// Bytes per stereo 16-bit frame
pub const BYTES_PER_FRAME: usize = OUTPUT_CHANNELS * BYTES_PER_SAMPLE;

/// Largest single decoder yield in frames: 120 ms at 48 kHz.
pub const MAX_DECODE_FRAMES: usize = 5_760;

/// Frames per device callback requested at open
pub const DEFAULT_REQUEST_FRAMES: u32 = 4_096;

/// Top of the device mixing scale
pub const MIX_MAX_VOLUME: u8 = 128;

/// Channel layout of a source stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    Mono,
    Stereo,
}

impl Channels {
    /// Map a raw channel count; anything other than 1 or 2 is unsupported.
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(Channels::Mono),
            2 => Some(Channels::Stereo),
            _ => None,
        }
    }

    /// Samples per frame
    pub fn count(self) -> usize {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
        }
    }
}

impl fmt::Display for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channels::Mono => write!(f, "Mono"),
            Channels::Stereo => write!(f, "Stereo"),
        }
    }
}

/// Output volume, fixed for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeLevel {
    /// Samples are copied untouched
    Passthrough,

    /// Samples are scaled by `level / MIX_MAX_VOLUME` with saturation.
    /// `level` is always within `1..=MIX_MAX_VOLUME`.
    Scaled(u8),
}

impl VolumeLevel {
    /// Map a user percentage onto the mixing scale.
    ///
    /// `percent * 1.28`, truncated, then clamped to `1..=128`. Out-of-range
    /// input is clamped rather than rejected, so `0` and negatives land on
    /// the quietest level and anything above 100 on full scale.
    pub fn from_percent(percent: i64) -> Self {
        let scaled = (percent as f64 * 1.28) as i64;
        let level = scaled.clamp(1, MIX_MAX_VOLUME as i64) as u8;
        VolumeLevel::Scaled(level)
    }
}

impl fmt::Display for VolumeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeLevel::Passthrough => write!(f, "passthrough"),
            VolumeLevel::Scaled(level) => write!(f, "{}/{}", level, MIX_MAX_VOLUME),
        }
    }
}

/// Properties of an opened stream, logged once before playback starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub channels: Channels,
    pub sample_rate: u32,
    pub total_frames: u64,
    /// Average bitrate in bits per second (None for zero-length streams)
    pub bitrate_bps: Option<u64>,
}

impl StreamInfo {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.total_frames / self.sample_rate.max(1) as u64)
    }
}

impl fmt::Display for StreamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.duration().as_secs();
        write!(
            f,
            "Duration: {:02}:{:02}, Mode: {}, Bitrate: {} kbps",
            secs / 60,
            secs % 60,
            self.channels,
            self.bitrate_bps.unwrap_or(0) / 1000
        )
    }
}
