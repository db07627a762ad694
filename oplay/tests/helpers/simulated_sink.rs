//! Simulated audio sink
//!
//! Calls `StreamMixer::fill` with device-sized regions, either inline
//! (deterministic) or from a background thread at a fixed period (timed).

use oplay::audio::DecoderSource;
use oplay::playback::{PlaybackState, PlaybackStatus, StreamMixer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// One simulated device callback
#[derive(Debug, Clone, Copy)]
pub struct CallbackRecord {
    pub samples: usize,
    /// Samples that were not silence
    pub audio_samples: usize,
    pub state_after: PlaybackState,
}

impl CallbackRecord {
    pub fn is_silent(&self) -> bool {
        self.audio_samples == 0
    }
}

#[derive(Debug, Default)]
pub struct SinkRun {
    /// Everything written to the device, concatenated
    pub output: Vec<i16>,
    pub callbacks: Vec<CallbackRecord>,
}

/// Fill regions of `request_frames` (cycled) until a callback leaves the
/// session terminating, or `max_callbacks` is hit.
pub fn drive_until_terminating<S: DecoderSource>(
    mixer: &mut StreamMixer<S>,
    status: &PlaybackStatus,
    request_frames: &[usize],
    max_callbacks: usize,
) -> SinkRun {
    let mut run = SinkRun::default();

    for i in 0..max_callbacks {
        let mut region = vec![0x5A5Ai16; request_frames[i % request_frames.len()] * 2];
        mixer.fill(&mut region);

        let record = CallbackRecord {
            samples: region.len(),
            audio_samples: region.iter().filter(|&&s| s != 0).count(),
            state_after: status.state(),
        };
        run.output.extend_from_slice(&region);
        run.callbacks.push(record);

        if status.should_terminate() {
            break;
        }
    }

    run
}

/// Background thread standing in for the device callback.
pub struct SimulatedSink {
    paused: Arc<AtomicBool>,
    terminated_at: Arc<Mutex<Option<Instant>>>,
    handle: Option<JoinHandle<Vec<i16>>>,
}

impl SimulatedSink {
    /// Start calling `fill` every `period` with `request_frames`-frame regions.
    pub fn start<S>(
        mut mixer: StreamMixer<S>,
        status: Arc<PlaybackStatus>,
        request_frames: usize,
        period: Duration,
    ) -> Self
    where
        S: DecoderSource + 'static,
    {
        let paused = Arc::new(AtomicBool::new(false));
        let terminated_at = Arc::new(Mutex::new(None));

        let thread_paused = Arc::clone(&paused);
        let thread_terminated_at = Arc::clone(&terminated_at);
        let handle = std::thread::spawn(move || {
            let mut output = Vec::new();
            let mut region = vec![0i16; request_frames * 2];
            while !thread_paused.load(Ordering::Acquire) {
                mixer.fill(&mut region);
                output.extend_from_slice(&region);

                if status.should_terminate() {
                    let mut slot = thread_terminated_at.lock().unwrap();
                    if slot.is_none() {
                        *slot = Some(Instant::now());
                    }
                }
                std::thread::sleep(period);
            }
            output
        });

        Self {
            paused,
            terminated_at,
            handle: Some(handle),
        }
    }

    /// When the sink first saw the session terminating
    pub fn terminated_at(&self) -> Option<Instant> {
        *self.terminated_at.lock().unwrap()
    }

    /// Wait up to `timeout` for the sink to record termination.
    pub fn wait_terminated(&self, timeout: Duration) -> Option<Instant> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(at) = self.terminated_at() {
                return Some(at);
            }
            if Instant::now() >= deadline {
                return None;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Stop calling back and return everything written.
    pub fn pause(mut self) -> Vec<i16> {
        self.paused.store(true, Ordering::Release);
        self.handle
            .take()
            .map(|h| h.join().unwrap())
            .unwrap_or_default()
    }
}

impl Drop for SimulatedSink {
    fn drop(&mut self) {
        self.paused.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
