//! Test helper modules for oplay integration tests
//!
//! Provides reusable test infrastructure components:
//! - ScriptedSource: deterministic decoder with configurable chunk sizes and faults
//! - SimulatedSink: drives the mixer the way an audio device would
//! - audio_generator: WAV fixtures for the symphonia-backed source

#![allow(dead_code)]

pub mod audio_generator;
pub mod scripted_source;
pub mod simulated_sink;

pub use scripted_source::{expected_stereo, ramp_sample, ScriptedSource};
pub use simulated_sink::{drive_until_terminating, CallbackRecord, SimulatedSink, SinkRun};
