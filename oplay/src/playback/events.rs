//! Lock-free event channel from the audio callback to the lifecycle loop
//!
//! The callback must not log or block, so everything worth reporting is
//! pushed into a single-producer single-consumer ring buffer and logged by
//! the polling loop on its next tick.

use crate::error::Error;
use ringbuf::{traits::*, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default ring capacity. A session produces at most three events.
pub const DEFAULT_EVENT_CAPACITY: usize = 16;

/// Something the callback wants reported.
#[derive(Debug)]
pub enum PlaybackEvent {
    /// Decoder position reached the stream length
    EndOfStream { total_frames: u64 },

    /// Last audio has been handed to the device
    Drained { frames_delivered: u64 },

    /// Decoder failed; the session is terminating
    DecodeFault { position: u64, error: Error },
}

/// Create a connected producer/consumer pair.
pub fn event_channel(capacity: usize) -> (EventProducer, EventConsumer) {
    let (producer, consumer) = HeapRb::new(capacity.max(1)).split();
    let dropped = Arc::new(AtomicU64::new(0));
    (
        EventProducer {
            producer,
            dropped: Arc::clone(&dropped),
        },
        EventConsumer { consumer, dropped },
    )
}

/// Producer half (audio callback)
pub struct EventProducer {
    producer: ringbuf::HeapProd<PlaybackEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventProducer {
    /// Push an event without blocking.
    ///
    /// Returns false if the ring was full; the event is dropped and counted.
    pub fn push(&mut self, event: PlaybackEvent) -> bool {
        match self.producer.try_push(event) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }
}

/// Consumer half (lifecycle loop)
pub struct EventConsumer {
    consumer: ringbuf::HeapCons<PlaybackEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventConsumer {
    pub fn pop(&mut self) -> Option<PlaybackEvent> {
        self.consumer.try_pop()
    }

    /// Events lost to a full ring
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
