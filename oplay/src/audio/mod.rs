//! Audio decoding, device output and stream metadata

pub mod decoder;
pub mod output;
pub mod tags;
pub mod types;

pub use decoder::{DecoderSource, SymphoniaSource};
pub use output::AudioOutput;
pub use tags::NowPlaying;
pub use types::{Channels, StreamInfo, VolumeLevel};
