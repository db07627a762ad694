//! Volume mixing for signed 16-bit output
//!
//! Scaled mixing adds `sample * level / 128` into the destination with
//! saturation at the i16 range, so it never wraps. Passthrough is a plain copy.

use crate::audio::types::{VolumeLevel, MIX_MAX_VOLUME};

/// Write `src` into `dst` at the given volume.
///
/// Only `src.len()` samples of `dst` are touched.
///
/// # Panics
/// If `dst` is shorter than `src`.
#[inline]
pub fn write_scaled(dst: &mut [i16], src: &[i16], volume: VolumeLevel) {
    match volume {
        VolumeLevel::Passthrough => dst[..src.len()].copy_from_slice(src),
        VolumeLevel::Scaled(level) => mix_scaled(&mut dst[..src.len()], src, level),
    }
}

/// Mix `src` scaled by `level / 128` into `dst`, saturating.
#[inline]
pub fn mix_scaled(dst: &mut [i16], src: &[i16], level: u8) {
    let level = level.min(MIX_MAX_VOLUME) as i32;
    for (out, &sample) in dst.iter_mut().zip(src) {
        let scaled = (sample as i32 * level) / MIX_MAX_VOLUME as i32;
        let mixed = *out as i32 + scaled;
        *out = mixed.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
    }
}
