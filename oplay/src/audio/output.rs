//! Audio output using cpal
//!
//! Opens the device at the single supported configuration (48000 Hz, i16,
//! stereo, fixed buffer size) and drives a fill callback from the device's
//! real-time thread.

use crate::audio::types::{OUTPUT_CHANNELS, SAMPLE_RATE};
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig, SupportedBufferSize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Audio output manager using cpal.
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
    /// Frames per callback after clamping to the device's supported range
    buffer_frames: u32,
    stream: Option<Stream>,
    /// Stream errors reported by the device error callback
    error_count: Arc<AtomicU32>,
}

impl AudioOutput {
    /// List available audio output devices.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    /// Open an audio device for output.
    ///
    /// # Arguments
    /// - `device_name`: Optional device name (None = default device)
    /// - `requested_frames`: Frames per callback to ask for
    ///
    /// # Fallback Behavior
    /// If the named device is not found, the default device is used.
    ///
    /// # Errors
    /// - No device available
    /// - Device cannot play 48000 Hz stereo i16
    pub fn open(device_name: Option<&str>, requested_frames: u32) -> Result<Self> {
        let host = cpal::default_host();

        let device = if let Some(name) = device_name {
            let mut devices = host
                .output_devices()
                .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?;

            match devices.find(|d| d.name().ok().as_deref() == Some(name)) {
                Some(dev) => {
                    info!("Found requested audio device: {}", name);
                    dev
                }
                None => {
                    warn!("Requested device '{}' not found, falling back to default device", name);
                    if let Ok(available) = Self::list_devices() {
                        debug!("Available devices: {}", available.join(", "));
                    }
                    host.default_output_device().ok_or_else(|| {
                        Error::AudioOutput(format!(
                            "Device '{}' not found and no default device available",
                            name
                        ))
                    })?
                }
            }
        } else {
            host.default_output_device()
                .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?
        };

        let device_label = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Using audio device: {}", device_label);

        let (config, buffer_frames) = Self::fixed_config(&device, requested_frames)?;

        debug!(
            "Audio config: sample_rate={}, channels={}, format=i16, buffer_size={} (requested {})",
            config.sample_rate.0, config.channels, buffer_frames, requested_frames
        );

        Ok(Self {
            device,
            config,
            buffer_frames,
            stream: None,
            error_count: Arc::new(AtomicU32::new(0)),
        })
    }

    /// Find the 48 kHz stereo i16 configuration and settle the buffer size.
    fn fixed_config(device: &Device, requested_frames: u32) -> Result<(StreamConfig, u32)> {
        let supported = device
            .supported_output_configs()
            .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?
            .find(|config| {
                config.channels() as usize == OUTPUT_CHANNELS
                    && config.sample_format() == SampleFormat::I16
                    && config.min_sample_rate().0 <= SAMPLE_RATE
                    && config.max_sample_rate().0 >= SAMPLE_RATE
            })
            .ok_or_else(|| {
                Error::AudioOutput(format!(
                    "Device does not support {} Hz stereo 16-bit output",
                    SAMPLE_RATE
                ))
            })?;

        let buffer_frames = settle_buffer_frames(requested_frames, supported.buffer_size());

        let mut config = supported.with_sample_rate(cpal::SampleRate(SAMPLE_RATE)).config();
        config.buffer_size = cpal::BufferSize::Fixed(buffer_frames);

        Ok((config, buffer_frames))
    }

    /// Start audio playback with callback.
    ///
    /// `callback` receives every device buffer (interleaved stereo i16) and
    /// must fill all of it. It runs on the real-time audio thread.
    pub fn start<F>(&mut self, mut callback: F) -> Result<()>
    where
        F: FnMut(&mut [i16]) + Send + 'static,
    {
        info!("Starting audio stream");

        let error_count = Arc::clone(&self.error_count);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    callback(data);
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    error_count.fetch_add(1, Ordering::Relaxed);
                },
                None, // No timeout
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);

        info!("Audio stream started successfully");
        Ok(())
    }

    /// Pause the stream. No callback runs after this returns.
    pub fn pause(&self) -> Result<()> {
        if let Some(stream) = &self.stream {
            stream
                .pause()
                .map_err(|e| Error::AudioOutput(format!("Failed to pause stream: {}", e)))?;
        }
        Ok(())
    }

    /// Pause and drop the stream (and with it the callback).
    pub fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            info!("Stopping audio stream");
            stream
                .pause()
                .map_err(|e| Error::AudioOutput(format!("Failed to pause stream: {}", e)))?;
            drop(stream);
        }
        Ok(())
    }

    /// Get device name.
    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown".to_string())
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Frames per callback actually configured
    pub fn buffer_frames(&self) -> u32 {
        self.buffer_frames
    }

    /// Stream errors reported since start
    pub fn error_count(&self) -> u32 {
        self.error_count.load(Ordering::Relaxed)
    }
}

/// Clamp the requested callback size to what the device accepts.
/// A device that does not report a range gets the request unchanged.
fn settle_buffer_frames(requested: u32, supported: &SupportedBufferSize) -> u32 {
    match supported {
        SupportedBufferSize::Range { min, max } => requested.clamp(*min, *max),
        SupportedBufferSize::Unknown => requested,
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        // Ensure stream is stopped on drop
        let _ = self.stop();
    }
}
