//! Real-time stream mixing and playback lifecycle

pub mod carry_buffer;
pub mod events;
pub mod lifecycle;
pub mod mixer;
pub mod state;
pub mod volume;

pub use events::{event_channel, EventConsumer, EventProducer, PlaybackEvent};
pub use lifecycle::{run_until_stopped, StopReason};
pub use mixer::{MixerOptions, StreamMixer};
pub use state::{PlaybackSession, PlaybackState, PlaybackStatus, TerminationCause};
