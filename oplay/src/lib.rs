//! # oplay
//!
//! Command-line player for seekable Opus streams.
//!
//! **Purpose:** Decode a local Opus file, feed it to the audio device through
//! a carry-buffer mixer with optional volume scaling, and exit cleanly once
//! the stream has drained or the user quits.
//!
//! **Architecture:** symphonia (libopus adapter) decoder, cpal output at
//! 48000 Hz stereo i16, atomics and a lock-free event ring between the
//! real-time callback and a tokio polling loop.

pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod playback;

pub use error::{Error, ExitStatus, Result};
