//! # PCM Sample Conversions
//!
//! The pipeline works on normalized single-precision samples. This module
//! converts the representations callers usually have at hand into that form:
//!
//! - `i16` PCM → `f32` in [-1, 1), dividing by 32768 (not 32767, to stay
//!   bit-compatible with existing fingerprints)
//! - raw little-endian `s16le` bytes → `i16` PCM
//!
//! ```rust
//! use echoprint::conversions::{pcm_from_le_bytes, pcm_to_float};
//!
//! let pcm = pcm_from_le_bytes(&[0x00, 0x40, 0x00, 0xc0]).unwrap();
//! assert_eq!(pcm, vec![16384, -16384]);
//! assert_eq!(pcm_to_float(&pcm), vec![0.5, -0.5]);
//! ```

use crate::{EchoprintError, EchoprintResult};

/// Scale between `i16` PCM and normalized floats.
pub const PCM_SCALE: f32 = 32768.0;

/// Converts a single `i16` PCM sample to a normalized float.
#[inline(always)]
pub fn sample_to_float(sample: i16) -> f32 {
    f32::from(sample) / PCM_SCALE
}

/// Converts `i16` PCM samples to normalized floats.
pub fn pcm_to_float(pcm: &[i16]) -> Vec<f32> {
    pcm.iter().copied().map(sample_to_float).collect()
}

/// Converts normalized floats back to `i16` PCM, clamping to the integer range.
pub fn float_to_pcm(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s * PCM_SCALE).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}

/// Parses raw signed 16-bit little-endian mono PCM.
///
/// # Errors
/// Returns [`EchoprintError::InvalidParameter`] when the buffer length is odd.
pub fn pcm_from_le_bytes(bytes: &[u8]) -> EchoprintResult<Vec<i16>> {
    if bytes.len() % 2 != 0 {
        return Err(EchoprintError::invalid_parameter(
            "bytes",
            format!("length {} is not a whole number of 16-bit samples", bytes.len()),
        ));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}
