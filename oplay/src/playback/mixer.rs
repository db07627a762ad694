//! Stream buffer mixer
//!
//! Bridges a decoder that yields chunks of arbitrary size and an audio device
//! that demands fixed-size blocks on a real-time callback.
//!
//! # Per-callback flow
//!
//! 1. Zero the whole output region.
//! 2. Stop early (silence) if the session is terminating, or finish the
//!    drain if the previous callback delivered the last audio.
//! 3. Starting from the carried-over frames, pull decoder chunks into the
//!    working buffer (mono is expanded to stereo) until one request is
//!    covered or the stream ends.
//! 4. Copy or volume-mix the covered part into the output.
//! 5. Keep the surplus as carry for the next callback.
//!
//! Nothing here allocates, locks or logs once the mixer is constructed.

use crate::audio::decoder::DecoderSource;
use crate::audio::types::{
    Channels, VolumeLevel, BYTES_PER_SAMPLE, DEFAULT_REQUEST_FRAMES, MAX_DECODE_FRAMES,
    OUTPUT_CHANNELS,
};
use crate::error::{Error, Result};
use crate::playback::carry_buffer::CarryBuffer;
use crate::playback::events::EventProducer;
use crate::playback::state::{PlaybackSession, PlaybackStatus};
use crate::playback::volume;
use std::sync::Arc;

/// Construction parameters for [`StreamMixer`]
#[derive(Debug, Clone, Copy)]
pub struct MixerOptions {
    pub volume: VolumeLevel,
    /// Frames the device asks for per callback (as negotiated)
    pub request_frames: usize,
    /// Largest chunk requested from the decoder, in frames
    pub max_decode_frames: usize,
}

impl Default for MixerOptions {
    fn default() -> Self {
        Self {
            volume: VolumeLevel::Passthrough,
            request_frames: DEFAULT_REQUEST_FRAMES as usize,
            max_decode_frames: MAX_DECODE_FRAMES,
        }
    }
}

/// Pulls from a [`DecoderSource`] and fills device buffers.
///
/// Owned by the audio callback. The lifecycle loop only sees the shared
/// [`PlaybackStatus`] and the event channel.
pub struct StreamMixer<S: DecoderSource> {
    source: S,
    session: PlaybackSession,
    carry: CarryBuffer,
    /// Decoder output at the source's channel count
    decode_scratch: Vec<i16>,
    request_samples: usize,
}

impl<S: DecoderSource> StreamMixer<S> {
    /// Create a mixer and allocate its buffers.
    ///
    /// # Errors
    /// - [`Error::Config`] for a zero request or decode size
    /// - [`Error::Resource`] if the buffers cannot be allocated
    pub fn new(
        source: S,
        options: MixerOptions,
        status: Arc<PlaybackStatus>,
        events: EventProducer,
    ) -> Result<Self> {
        if options.request_frames == 0 || options.max_decode_frames == 0 {
            return Err(Error::Config(format!(
                "Invalid mixer sizes: request_frames={}, max_decode_frames={}",
                options.request_frames, options.max_decode_frames
            )));
        }

        let channels = source.channels();
        let carry = CarryBuffer::new(options.request_frames, options.max_decode_frames)?;

        let scratch_len = options.max_decode_frames * channels.count();
        let mut decode_scratch = Vec::new();
        decode_scratch.try_reserve_exact(scratch_len).map_err(|e| {
            Error::Resource(format!("Failed to allocate {} sample decode buffer: {}", scratch_len, e))
        })?;
        decode_scratch.resize(scratch_len, 0);

        let session = PlaybackSession::new(
            channels,
            source.total_frames(),
            options.volume,
            status,
            events,
        );

        Ok(Self {
            source,
            session,
            carry,
            decode_scratch,
            request_samples: options.request_frames * OUTPUT_CHANNELS,
        })
    }

    /// Fill one device buffer of interleaved stereo samples.
    ///
    /// The whole region is always written: decoded audio first, silence for
    /// whatever could not be covered. Regions longer than the negotiated
    /// request are served in request-sized pieces. A callback that hits a
    /// decode fault is entirely silent, including pieces mixed before it.
    pub fn fill(&mut self, output: &mut [i16]) {
        output.fill(0);

        if self.session.is_terminating() {
            return;
        }
        if self.session.drain_pending() {
            self.session.complete_drain();
            return;
        }

        let mut faulted = false;
        for piece in output.chunks_mut(self.request_samples) {
            if !self.fill_piece(piece) {
                faulted = true;
                break;
            }
        }
        if faulted {
            output.fill(0);
            return;
        }

        self.session.finish_fill(self.carry.is_empty());
    }

    /// Byte-oriented entry point for sinks that hand out raw native-endian
    /// s16 buffers. `output.len()` must be a multiple of 2.
    pub fn fill_bytes(&mut self, output: &mut [u8], scratch: &mut [i16]) {
        let samples = (output.len() / BYTES_PER_SAMPLE).min(scratch.len());
        self.fill(&mut scratch[..samples]);
        output.fill(0);
        for (bytes, sample) in output.chunks_exact_mut(BYTES_PER_SAMPLE).zip(&scratch[..samples]) {
            bytes.copy_from_slice(&sample.to_ne_bytes());
        }
    }

    /// Returns false if the session faulted.
    fn fill_piece(&mut self, out: &mut [i16]) -> bool {
        // Whole frames only
        let needed = out.len() - out.len() % OUTPUT_CHANNELS;

        while self.carry.len() < needed && !self.session.end_reached() {
            if let Err(error) = self.pull_chunk() {
                self.session.fault(error);
                return false;
            }
        }

        let available = self.carry.len().min(needed);
        volume::write_scaled(out, &self.carry.as_slice()[..available], self.session.volume());
        self.carry.retain_tail(available);
        self.session.record_delivered(available / OUTPUT_CHANNELS);
        true
    }

    /// Decode one chunk into the working buffer and check for end of stream.
    fn pull_chunk(&mut self) -> Result<()> {
        let frames = self.source.decode_next(&mut self.decode_scratch)?;
        let channels = self.session.channels();

        let decoded = self
            .decode_scratch
            .get(..frames * channels.count())
            .ok_or(Error::DecodeOverrun {
                frames,
                capacity: self.decode_scratch.len() / channels.count(),
            })?;

        match channels {
            Channels::Mono => self.carry.push_mono(decoded)?,
            Channels::Stereo => self.carry.push_stereo(decoded)?,
        }

        let reached_end = self.session.update_position(self.source.position());
        if frames == 0 && !reached_end {
            return Err(Error::DecodeStalled {
                position: self.source.position(),
                total: self.session.total_frames(),
            });
        }
        Ok(())
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Bytes carried over to the next callback
    pub fn carry_bytes(&self) -> usize {
        self.carry.bytes()
    }

    /// Working buffer capacity in samples
    pub fn working_capacity(&self) -> usize {
        self.carry.capacity()
    }
}
