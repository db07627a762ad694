//! Error types for oplay
//!
//! Defines crate error types using thiserror for clear error propagation.
//! Every error maps onto one process exit status, see [`ExitStatus`].
//!
//! Variants raised on the audio callback (the decode family) carry only
//! static text, numbers or the codec error itself, so building one never
//! allocates.

use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

/// Main error type for oplay
#[derive(Error, Debug)]
pub enum Error {
    /// Bad arguments or configuration file contents
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio output device errors (no device, unsupported format, stream failure)
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Stream could not be opened or its properties could not be read
    #[error("Stream error: {0}")]
    Stream(String),

    /// Decoder failed while playing
    #[error("Audio decode error: {0}")]
    Decode(&'static str),

    /// Packet could not be read or decoded while playing
    #[error("Audio decode error: {0}")]
    Codec(#[source] SymphoniaError),

    /// Decoder returned more frames than fit the buffer it was given
    #[error("Audio decode error: {frames} frames reported for a {capacity} frame buffer")]
    DecodeOverrun { frames: usize, capacity: usize },

    /// Decoder produced nothing before the end of the stream
    #[error("Audio decode error: no audio at frame {position} of {total}")]
    DecodeStalled { position: u64, total: u64 },

    /// Channel count changed mid-stream
    #[error("Audio decode error: channel count changed from {expected} to {found}")]
    ChannelsChanged { expected: usize, found: usize },

    /// Buffer allocation failed
    #[error("Resource allocation error: {0}")]
    Resource(String),

    /// Decoded audio did not fit into the working buffer
    #[error("Carry buffer overflow: {needed} samples needed, {capacity} available")]
    BufferOverflow { needed: usize, capacity: usize },
}

impl Error {
    /// Exit status the process reports when this error ends it.
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Error::Config(_) | Error::AudioOutput(_) => ExitStatus::Usage,
            Error::Stream(_)
            | Error::Decode(_)
            | Error::Codec(_)
            | Error::DecodeOverrun { .. }
            | Error::DecodeStalled { .. }
            | Error::ChannelsChanged { .. } => ExitStatus::Stream,
            Error::Resource(_) | Error::BufferOverflow { .. } => ExitStatus::Resource,
        }
    }
}

/// Process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Normal completion (end of stream or user quit)
    Success,
    /// Argument or initialization error
    Usage,
    /// Stream open/property error or runtime decode fault
    Stream,
    /// Resource allocation error
    Resource,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Usage => 1,
            ExitStatus::Stream => 2,
            ExitStatus::Resource => 3,
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}

/// Convenience Result type using oplay Error
pub type Result<T> = std::result::Result<T, Error>;
