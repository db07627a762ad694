//! Working buffer that stages decoded stereo samples between callbacks
//!
//! The buffer is allocated once, sized for one device request plus the
//! largest single decoder yield. Appending never reallocates; it fails with
//! [`Error::BufferOverflow`] instead.

use crate::audio::types::{BYTES_PER_SAMPLE, OUTPUT_CHANNELS};
use crate::error::{Error, Result};

/// Fixed-capacity staging area for interleaved stereo i16 samples.
///
/// The first `len` samples are valid. After a callback has taken what it
/// needs, [`retain_tail`](Self::retain_tail) moves the surplus to the front;
/// that surplus is the carry for the next callback.
pub struct CarryBuffer {
    samples: Vec<i16>,
    len: usize,
}

impl CarryBuffer {
    /// Allocate room for `request_frames + max_decode_frames` stereo frames.
    ///
    /// # Errors
    /// [`Error::Resource`] if the allocation fails.
    pub fn new(request_frames: usize, max_decode_frames: usize) -> Result<Self> {
        let capacity = request_frames
            .checked_add(max_decode_frames)
            .and_then(|frames| frames.checked_mul(OUTPUT_CHANNELS))
            .ok_or_else(|| Error::Resource("Working buffer size overflows".to_string()))?;

        let mut samples = Vec::new();
        samples.try_reserve_exact(capacity).map_err(|e| {
            Error::Resource(format!("Failed to allocate {} sample working buffer: {}", capacity, e))
        })?;
        samples.resize(capacity, 0);

        Ok(Self { samples, len: 0 })
    }

    /// Capacity in samples
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Valid samples currently staged
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Staged audio in stereo frames
    pub fn frames(&self) -> usize {
        self.len / OUTPUT_CHANNELS
    }

    /// Staged audio in bytes
    pub fn bytes(&self) -> usize {
        self.len * BYTES_PER_SAMPLE
    }

    /// Valid staged samples
    pub fn as_slice(&self) -> &[i16] {
        &self.samples[..self.len]
    }

    /// Append interleaved stereo samples.
    pub fn push_stereo(&mut self, src: &[i16]) -> Result<()> {
        let end = self.reserve(src.len())?;
        self.samples[self.len..end].copy_from_slice(src);
        self.len = end;
        Ok(())
    }

    /// Append mono samples, writing each one to both channels.
    pub fn push_mono(&mut self, src: &[i16]) -> Result<()> {
        let end = self.reserve(src.len() * OUTPUT_CHANNELS)?;
        for (frame, &sample) in self.samples[self.len..end]
            .chunks_exact_mut(OUTPUT_CHANNELS)
            .zip(src)
        {
            frame[0] = sample;
            frame[1] = sample;
        }
        self.len = end;
        Ok(())
    }

    /// Drop the first `consumed` samples and move the rest to the front.
    ///
    /// `consumed` larger than the staged length clears the buffer.
    pub fn retain_tail(&mut self, consumed: usize) {
        let consumed = consumed.min(self.len);
        self.samples.copy_within(consumed..self.len, 0);
        self.len -= consumed;
    }

    fn reserve(&self, additional: usize) -> Result<usize> {
        let end = self.len + additional;
        if end > self.samples.len() {
            return Err(Error::BufferOverflow {
                needed: end,
                capacity: self.samples.len(),
            });
        }
        Ok(end)
    }
}
