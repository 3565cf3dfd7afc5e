//! Module for bringing PCM into the fingerprinter's operating format.
//!
//! Fingerprints are only comparable when every producer feeds the pipeline the
//! same samples, so this is deliberately not a high-quality resampler. It
//! mixes all channels down to mono and picks the nearest previous source frame
//! for every output sample, emulating
//! `ffmpeg -i file.wav -f s16le -ac 1 -ar 11025`.

use crate::{EchoprintError, EchoprintResult, SAMPLE_RATE};
use tracing::{debug, warn};

/// Describes the layout of an interleaved PCM buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    /// Bits per sample. Only 16 is supported.
    pub bits_per_sample: u16,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Source sample rate in Hz.
    pub sample_rate: u32,
}

impl PcmFormat {
    /// Mono 16-bit PCM at the operating rate.
    pub const OPERATING: Self = Self {
        bits_per_sample: 16,
        channels: 1,
        sample_rate: SAMPLE_RATE,
    };

    /// Create a new format description.
    pub const fn new(bits_per_sample: u16, channels: u16, sample_rate: u32) -> Self {
        Self {
            bits_per_sample,
            channels,
            sample_rate,
        }
    }

    /// Returns true if no conversion is needed.
    pub const fn is_operating_format(&self) -> bool {
        self.bits_per_sample == 16 && self.channels == 1 && self.sample_rate == SAMPLE_RATE
    }

    /// Number of output samples produced for `source_len` interleaved input samples.
    pub const fn output_len(&self, source_len: usize) -> usize {
        (source_len as u64 * SAMPLE_RATE as u64 / (self.channels as u64 * self.sample_rate as u64))
            as usize
    }

    fn validate(&self) -> EchoprintResult<()> {
        if self.bits_per_sample != 16 {
            return Err(EchoprintError::UnsupportedBitDepth(self.bits_per_sample));
        }
        if self.channels == 0 {
            return Err(EchoprintError::invalid_parameter("channels", "must be > 0"));
        }
        if self.sample_rate == 0 {
            return Err(EchoprintError::invalid_parameter("sample_rate", "must be > 0"));
        }
        Ok(())
    }
}

/// Resamples interleaved PCM to mono 16-bit PCM at the operating rate.
///
/// Output sample `i` is the truncating integer average of the channels of the
/// source frame starting at `i * channels * sample_rate / 11025`. There is no
/// interpolation or anti-alias filtering.
///
/// # Arguments
/// * `pcm` - Interleaved source samples
/// * `format` - Layout of `pcm`
///
/// # Returns
/// `floor(len * 11025 / (channels * sample_rate))` samples. Input that is
/// already in the operating format is returned unchanged.
///
/// # Errors
/// Returns an error if:
/// - the bit depth is not 16
/// - the channel count or sample rate is zero
///
/// # Example
/// ```rust
/// use echoprint::resampling::{resample, PcmFormat};
///
/// // 22050 Hz stereo: every fourth interleaved value starts an output frame.
/// let pcm = [100i16, 300, 7, 7, -50, -51, 9, 9];
/// let mono = resample(&pcm, PcmFormat::new(16, 2, 22050)).unwrap();
/// assert_eq!(mono, vec![200, -50]);
/// ```
pub fn resample(pcm: &[i16], format: PcmFormat) -> EchoprintResult<Vec<i16>> {
    format.validate()?;

    if format.is_operating_format() {
        return Ok(pcm.to_vec());
    }

    let channels = usize::from(format.channels);
    let target_len = format.output_len(pcm.len());
    let mut target = vec![0i16; target_len];

    let mut source_index = 0usize;
    for (target_index, out) in target.iter_mut().enumerate() {
        // The index mapping is not aligned to frame boundaries for every rate,
        // so the last frame can be cut short.
        let Some(frame) = pcm.get(source_index..source_index + channels) else {
            warn!(
                target_index,
                source_index, "Incomplete trailing source frame, remaining output left silent"
            );
            break;
        };
        let mixed: i32 = frame.iter().map(|&s| i32::from(s)).sum::<i32>() / channels as i32;
        *out = mixed as i16;
        source_index = ((target_index as u64 + 1) * channels as u64 * u64::from(format.sample_rate)
            / u64::from(SAMPLE_RATE)) as usize;
    }

    debug!(
        source_len = pcm.len(),
        target_len,
        channels,
        sample_rate = format.sample_rate,
        "Resampled PCM to operating format"
    );
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_resampling_needed() {
        let pcm: Vec<i16> = (0..1000).map(|i| (i * 31 % 2000 - 1000) as i16).collect();
        let result = resample(&pcm, PcmFormat::OPERATING).unwrap();
        assert_eq!(result, pcm);
    }

    #[test]
    fn test_identity_mapping_without_shortcut() {
        // A mono 11025 Hz mapping is the identity even when computed.
        let format = PcmFormat::new(16, 1, 11025);
        assert_eq!(format.output_len(500), 500);
    }

    #[test]
    fn test_stereo_downmix() {
        let pcm = [10i16, 20, 1, 1, 1, 1, 1, 1, -10, -21, 0, 0, 0, 0, 0, 0];
        let result = resample(&pcm, PcmFormat::new(16, 2, 44100)).unwrap();
        // 16 * 11025 / (2 * 44100) = 2 samples, from frames 0 and 8.
        assert_eq!(result, vec![15, -15]);
    }

    #[test]
    fn test_output_length() {
        let pcm = vec![0i16; 48000 * 2];
        let result = resample(&pcm, PcmFormat::new(16, 2, 48000)).unwrap();
        assert_eq!(result.len(), 11025);
    }

    #[test]
    fn test_upsampling_repeats_samples() {
        let pcm = [1i16, 2, 3];
        let result = resample(&pcm, PcmFormat::new(16, 1, 5512)).unwrap();
        // 3 * 11025 / 5512 = 6, source index floor(i * 5512 / 11025)
        assert_eq!(result, vec![1, 1, 1, 2, 2, 3]);
    }

    #[test]
    fn test_unsupported_bit_depth() {
        let err = resample(&[0i16; 16], PcmFormat::new(24, 1, 44100)).unwrap_err();
        assert!(matches!(err, EchoprintError::UnsupportedBitDepth(24)));
    }

    #[test]
    fn test_zero_channels_rejected() {
        assert!(resample(&[0i16; 16], PcmFormat::new(16, 0, 44100)).is_err());
        assert!(resample(&[0i16; 16], PcmFormat::new(16, 1, 0)).is_err());
    }

    #[test]
    fn test_empty_input() {
        let result = resample(&[], PcmFormat::new(16, 2, 44100)).unwrap();
        assert!(result.is_empty());
    }
}
