//! Deterministic decoder source
//!
//! Frame `f` carries `ramp_sample(f, channel)`, which is never zero, so
//! delivered audio can be told apart from padding silence.

use oplay::audio::types::Channels;
use oplay::audio::DecoderSource;
use oplay::{Error, Result};

/// Sample value for `frame` on `channel` (right channel is negated)
pub fn ramp_sample(frame: u64, channel: usize) -> i16 {
    let value = 1 + (frame % 16_000) as i16;
    if channel == 0 {
        value
    } else {
        -value
    }
}

/// Interleaved stereo the mixer should emit for `frames` source frames at
/// passthrough volume.
pub fn expected_stereo(channels: Channels, frames: u64) -> Vec<i16> {
    (0..frames)
        .flat_map(|f| match channels {
            Channels::Mono => [ramp_sample(f, 0), ramp_sample(f, 0)],
            Channels::Stereo => [ramp_sample(f, 0), ramp_sample(f, 1)],
        })
        .collect()
}

pub struct ScriptedSource {
    channels: Channels,
    total: u64,
    position: u64,
    /// Chunk sizes in frames, cycled
    chunks: Vec<usize>,
    next_chunk: usize,
    fault_at: Option<u64>,
    calls: usize,
}

impl ScriptedSource {
    pub fn new(channels: Channels, total: u64, chunk: usize) -> Self {
        Self {
            channels,
            total,
            position: 0,
            chunks: vec![chunk],
            next_chunk: 0,
            fault_at: None,
            calls: 0,
        }
    }

    /// Cycle through several chunk sizes
    pub fn with_chunks(mut self, chunks: &[usize]) -> Self {
        self.chunks = chunks.to_vec();
        self
    }

    /// Fail every decode once `position` is reached
    pub fn with_fault_at(mut self, position: u64) -> Self {
        self.fault_at = Some(position);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl DecoderSource for ScriptedSource {
    fn channels(&self) -> Channels {
        self.channels
    }

    fn total_frames(&self) -> u64 {
        self.total
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn decode_next(&mut self, out: &mut [i16]) -> Result<usize> {
        self.calls += 1;

        if let Some(at) = self.fault_at {
            if self.position >= at {
                return Err(Error::Decode("corrupt packet"));
            }
        }

        let ch = self.channels.count();
        let chunk = self.chunks[self.next_chunk % self.chunks.len()];
        self.next_chunk += 1;

        let frames = chunk
            .min(out.len() / ch)
            .min((self.total - self.position) as usize);

        for f in 0..frames {
            for c in 0..ch {
                out[f * ch + c] = ramp_sample(self.position + f as u64, c);
            }
        }
        self.position += frames as u64;
        Ok(frames)
    }
}
