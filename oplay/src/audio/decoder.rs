//! Streaming decoder source using symphonia
//!
//! Decodes a seekable stream (Ogg Opus through the libopus adapter, plus the
//! formats symphonia handles natively) chunk by chunk into interleaved i16
//! samples at the source's own channel count.
//!
//! The stream mixer pulls from a [`DecoderSource`] on the audio callback
//! thread, so `decode_next` only allocates when a packet is larger than any
//! packet seen before.

use crate::audio::types::{Channels, StreamInfo, SAMPLE_RATE};
use crate::error::{Error, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::{MetadataOptions, MetadataRevision};
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

// Import Opus adapter to register codec with symphonia
use std::sync::OnceLock;
use symphonia::core::codecs::CodecRegistry;
use symphonia_adapter_libopus::OpusDecoder;

/// Get codec registry with Opus support
fn get_codec_registry() -> &'static CodecRegistry {
    static CODEC_REGISTRY: OnceLock<CodecRegistry> = OnceLock::new();
    CODEC_REGISTRY.get_or_init(|| {
        let mut registry = CodecRegistry::new();
        // Register Opus decoder first
        registry.register_all::<OpusDecoder>();
        // Register default codecs (MP3, FLAC, Vorbis, etc.)
        registry.register_all::<symphonia::default::codecs::MpaDecoder>();
        registry.register_all::<symphonia::default::codecs::PcmDecoder>();
        registry.register_all::<symphonia::default::codecs::VorbisDecoder>();
        registry.register_all::<symphonia::default::codecs::FlacDecoder>();
        registry.register_all::<symphonia::default::codecs::AdpcmDecoder>();
        registry.register_all::<symphonia::default::codecs::AacDecoder>();
        registry
    })
}

/// Pull-based source of decoded audio.
///
/// Positions and lengths are counted in source frames. Once `position()`
/// equals `total_frames()` the stream is exhausted and `decode_next` yields 0.
pub trait DecoderSource: Send {
    /// Channel layout of the decoded samples (fixed for the stream)
    fn channels(&self) -> Channels;

    /// Total stream length in frames
    fn total_frames(&self) -> u64;

    /// Frames decoded so far
    fn position(&self) -> u64;

    /// Decode the next chunk into `out`.
    ///
    /// At most `out.len() / channels` frames are written, interleaved.
    ///
    /// # Returns
    /// Number of frames written (0 only at end of stream)
    ///
    /// # Errors
    /// Any decode failure. The caller treats it as fatal for the session.
    fn decode_next(&mut self, out: &mut [i16]) -> Result<usize>;
}

/// Symphonia-backed decoder source for a file on disk.
pub struct SymphoniaSource {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    info: StreamInfo,
    position: u64,

    /// Interleaved samples of the last decoded packet
    pending: Option<SampleBuffer<i16>>,
    /// Frame capacity of `pending`
    pending_capacity: usize,
    /// Samples of `pending` already handed out
    pending_offset: usize,

    /// Raw `(key, value)` comment tags found while probing
    tags: Vec<(String, String)>,
}

impl SymphoniaSource {
    /// Open a stream for decoding.
    ///
    /// # Errors
    /// All failures are [`Error::Stream`]:
    /// - file cannot be opened or is not seekable
    /// - format not recognised, no audio track
    /// - total length unknown
    /// - channel count other than 1 or 2, sample rate other than 48 kHz
    pub fn open(path: &Path) -> Result<Self> {
        debug!("Opening stream: {}", path.display());

        let file = File::open(path)
            .map_err(|e| Error::Stream(format!("Failed to open file {}: {}", path.display(), e)))?;

        if !file.is_seekable() {
            return Err(Error::Stream(format!("{} is not a seekable stream", path.display())));
        }
        let byte_len = file.byte_len();

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Create a hint to help the format registry guess the format
        let mut hint = Hint::new();
        if let Some(ext_str) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext_str);
        }

        let format_opts = FormatOptions {
            enable_gapless: true,
            ..Default::default()
        };
        let metadata_opts = MetadataOptions::default();

        let mut probed = symphonia::default::get_probe()
            .format(&hint, mss, &format_opts, &metadata_opts)
            .map_err(|e| Error::Stream(format!("Failed to probe format: {}", e)))?;

        let mut tags = Vec::new();
        if let Some(metadata) = probed.metadata.get() {
            if let Some(revision) = metadata.current() {
                collect_tags(revision, &mut tags);
            }
        }

        let mut format = probed.format;
        if let Some(revision) = format.metadata().current() {
            collect_tags(revision, &mut tags);
        }

        let audio_tracks = format
            .tracks()
            .iter()
            .filter(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .count();
        if audio_tracks > 1 {
            warn!("Stream has {} audio tracks, playing the first one only", audio_tracks);
        }

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Stream("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = &track.codec_params;

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| Error::Stream("Sample rate not found".to_string()))?;
        if sample_rate != SAMPLE_RATE {
            return Err(Error::Stream(format!(
                "Unsupported sample rate {} Hz (only {} Hz is played)",
                sample_rate, SAMPLE_RATE
            )));
        }

        let channel_count = codec_params
            .channels
            .map(|c| c.count())
            .ok_or_else(|| Error::Stream("Channel count not found".to_string()))?;
        let channels = Channels::from_count(channel_count)
            .ok_or_else(|| Error::Stream(format!("Unsupported channel count: {}", channel_count)))?;

        let total_frames = codec_params
            .n_frames
            .ok_or_else(|| Error::Stream("Total stream length unknown".to_string()))?;

        let bitrate_bps = match byte_len {
            Some(bytes) if total_frames > 0 => Some(bytes * 8 * sample_rate as u64 / total_frames),
            _ => None,
        };

        let decoder = get_codec_registry()
            .make(codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Stream(format!("Failed to create decoder: {}", e)))?;

        debug!(
            "Stream opened: sample_rate={}, channels={}, total_frames={}",
            sample_rate, channel_count, total_frames
        );

        Ok(Self {
            format,
            decoder,
            track_id,
            info: StreamInfo {
                channels,
                sample_rate,
                total_frames,
                bitrate_bps,
            },
            position: 0,
            pending: None,
            pending_capacity: 0,
            pending_offset: 0,
            tags,
        })
    }

    /// Stream properties read at open
    pub fn info(&self) -> StreamInfo {
        self.info
    }

    /// Comment tags as `(key, value)` pairs, in stream order
    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    fn pending_frames(&self) -> usize {
        let len = self.pending.as_ref().map_or(0, |b| b.samples().len());
        len.saturating_sub(self.pending_offset) / self.info.channels.count()
    }

    /// Decode the next packet of our track into `pending`.
    ///
    /// Returns false at end of stream.
    fn read_packet(&mut self) -> Result<bool> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(false);
                }
                Err(e) => return Err(Error::Codec(e)),
            };

            // Skip packets for other tracks
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = self
                .decoder
                .decode(&packet)
                .map_err(Error::Codec)?;

            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            if spec.channels.count() != self.info.channels.count() {
                return Err(Error::ChannelsChanged {
                    expected: self.info.channels.count(),
                    found: spec.channels.count(),
                });
            }

            let capacity = decoded.capacity();
            if self.pending.is_none() || self.pending_capacity < capacity {
                self.pending = Some(SampleBuffer::new(capacity as u64, spec));
                self.pending_capacity = capacity;
            }
            if let Some(buffer) = self.pending.as_mut() {
                buffer.copy_interleaved_ref(decoded);
            }
            self.pending_offset = 0;
            return Ok(true);
        }
    }
}

impl DecoderSource for SymphoniaSource {
    fn channels(&self) -> Channels {
        self.info.channels
    }

    fn total_frames(&self) -> u64 {
        self.info.total_frames
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn decode_next(&mut self, out: &mut [i16]) -> Result<usize> {
        let channels = self.info.channels.count();
        let max_frames = out.len() / channels;
        let remaining = self.info.total_frames.saturating_sub(self.position);
        if max_frames == 0 || remaining == 0 {
            return Ok(0);
        }

        if self.pending_frames() == 0 && !self.read_packet()? {
            // Container ended before the advertised length
            self.position = self.info.total_frames;
            return Ok(0);
        }

        let frames = self
            .pending_frames()
            .min(max_frames)
            .min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let samples = frames * channels;

        if let Some(buffer) = self.pending.as_ref() {
            let start = self.pending_offset;
            out[..samples].copy_from_slice(&buffer.samples()[start..start + samples]);
        }
        self.pending_offset += samples;
        self.position += frames as u64;

        Ok(frames)
    }
}

fn collect_tags(revision: &MetadataRevision, out: &mut Vec<(String, String)>) {
    for tag in revision.tags() {
        out.push((tag.key.clone(), tag.value.to_string()));
    }
}
