//! Playback state machine
//!
//! `Playing → Draining → Terminating → Stopped`
//!
//! [`PlaybackSession`] lives inside the stream mixer and is only touched from
//! the audio callback. It publishes every transition into [`PlaybackStatus`],
//! a block of atomics the lifecycle loop reads. The lifecycle loop writes
//! exactly two transitions itself (external quit and the final stop), both
//! via compare-and-swap, so no field ever has two unsynchronised writers.

use crate::audio::types::{Channels, VolumeLevel};
use crate::error::Error;
use crate::playback::events::{EventProducer, PlaybackEvent};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum PlaybackState {
    /// Audio is being decoded and delivered
    Playing = 0,
    /// Stream exhausted, final audio still being delivered
    Draining = 1,
    /// Session is over, waiting for the sink to be paused
    Terminating = 2,
    /// Sink paused, resources may be released
    Stopped = 3,
}

impl PlaybackState {
    fn from_bits(bits: u8) -> Self {
        match bits & STATE_MASK {
            0 => PlaybackState::Playing,
            1 => PlaybackState::Draining,
            2 => PlaybackState::Terminating,
            _ => PlaybackState::Stopped,
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Draining => write!(f, "draining"),
            PlaybackState::Terminating => write!(f, "terminating"),
            PlaybackState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Why the session left `Playing`/`Draining`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TerminationCause {
    /// Stream played to the end
    Completed = 1,
    /// Decoder failed mid-stream
    DecodeFault = 2,
    /// External quit signal
    Quit = 3,
}

impl TerminationCause {
    fn from_bits(bits: u8) -> Option<Self> {
        match bits >> CAUSE_SHIFT {
            1 => Some(TerminationCause::Completed),
            2 => Some(TerminationCause::DecodeFault),
            3 => Some(TerminationCause::Quit),
            _ => None,
        }
    }
}

const STATE_MASK: u8 = 0x0f;
const CAUSE_SHIFT: u8 = 4;

/// Cross-thread view of the session.
///
/// State and termination cause share one atomic byte so a reader never
/// sees `Terminating` without its cause.
#[derive(Debug)]
pub struct PlaybackStatus {
    bits: AtomicU8,
    frames_delivered: AtomicU64,
}

impl PlaybackStatus {
    pub fn new() -> Self {
        Self {
            bits: AtomicU8::new(PlaybackState::Playing as u8),
            frames_delivered: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub fn cause(&self) -> Option<TerminationCause> {
        TerminationCause::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// True once the session is `Terminating` or `Stopped`
    pub fn should_terminate(&self) -> bool {
        self.state() >= PlaybackState::Terminating
    }

    /// Stereo frames handed to the sink so far
    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered.load(Ordering::Relaxed)
    }

    /// External quit: short-circuit from any live state to `Terminating`.
    ///
    /// Returns false if the session was already terminating.
    pub fn request_quit(&self) -> bool {
        self.terminate(TerminationCause::Quit)
    }

    /// Final transition, after the sink has been paused.
    pub fn mark_stopped(&self) {
        let _ = self.bits.fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
            let cause = bits & !STATE_MASK;
            Some(cause | PlaybackState::Stopped as u8)
        });
    }

    fn begin_draining(&self) -> bool {
        self.bits
            .compare_exchange(
                PlaybackState::Playing as u8,
                PlaybackState::Draining as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    fn terminate(&self, cause: TerminationCause) -> bool {
        self.bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                if PlaybackState::from_bits(bits) >= PlaybackState::Terminating {
                    None
                } else {
                    Some(((cause as u8) << CAUSE_SHIFT) | PlaybackState::Terminating as u8)
                }
            })
            .is_ok()
    }

    fn add_delivered(&self, frames: u64) {
        self.frames_delivered.fetch_add(frames, Ordering::Relaxed);
    }
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback-side session state, owned by the stream mixer.
pub struct PlaybackSession {
    channels: Channels,
    total_frames: u64,
    current_frames: u64,
    volume: VolumeLevel,
    end_reached: bool,
    drain_pending: bool,
    frames_delivered: u64,
    status: Arc<PlaybackStatus>,
    events: EventProducer,
}

impl PlaybackSession {
    pub fn new(
        channels: Channels,
        total_frames: u64,
        volume: VolumeLevel,
        status: Arc<PlaybackStatus>,
        events: EventProducer,
    ) -> Self {
        Self {
            channels,
            total_frames,
            current_frames: 0,
            volume,
            end_reached: false,
            drain_pending: false,
            frames_delivered: 0,
            status,
            events,
        }
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn volume(&self) -> VolumeLevel {
        self.volume
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn current_frames(&self) -> u64 {
        self.current_frames
    }

    pub fn end_reached(&self) -> bool {
        self.end_reached
    }

    pub fn drain_pending(&self) -> bool {
        self.drain_pending
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered
    }

    pub fn is_terminating(&self) -> bool {
        self.status.should_terminate()
    }

    /// Record the decoder position after a chunk.
    ///
    /// Returns true once the position has reached the stream length.
    pub fn update_position(&mut self, position: u64) -> bool {
        let position = position.min(self.total_frames);
        if position > self.current_frames {
            self.current_frames = position;
        }

        if self.current_frames == self.total_frames && !self.end_reached {
            self.end_reached = true;
            self.status.begin_draining();
            self.events.push(PlaybackEvent::EndOfStream {
                total_frames: self.total_frames,
            });
        }
        self.end_reached
    }

    pub fn record_delivered(&mut self, frames: usize) {
        self.frames_delivered += frames as u64;
        self.status.add_delivered(frames as u64);
    }

    /// Close out one callback. Once the stream has ended and nothing is
    /// carried over, the next callback stops playback.
    pub fn finish_fill(&mut self, carry_empty: bool) {
        if self.end_reached && carry_empty {
            self.drain_pending = true;
        }
    }

    /// The silent callback after draining: hand over to the lifecycle loop.
    pub fn complete_drain(&mut self) {
        if self.status.terminate(TerminationCause::Completed) {
            self.events.push(PlaybackEvent::Drained {
                frames_delivered: self.frames_delivered,
            });
        }
    }

    /// Decoder failure: no retry, terminate immediately.
    pub fn fault(&mut self, error: Error) {
        if self.status.terminate(TerminationCause::DecodeFault) {
            self.events.push(PlaybackEvent::DecodeFault {
                position: self.current_frames,
                error,
            });
        }
    }
}
