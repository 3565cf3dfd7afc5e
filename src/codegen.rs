//! Fingerprint code generation.
//!
//! [`Codegen`] runs the whole pipeline:
//!
//! ```text
//! PCM ─► resample ─► normalize ─► whiten ─► subband energies ─► onsets/codes ─► code string
//! ```
//!
//! Every call starts from fresh filter state, so one `Codegen` can be shared
//! between threads and reused for any number of inputs.

use crate::conversions::{pcm_from_le_bytes, pcm_to_float};
use crate::encoder::encode_codes;
use crate::fingerprint::{FpCode, fingerprint};
use crate::resampling::{PcmFormat, resample};
use crate::subband::subband_energies;
use crate::whitening::whiten;
use crate::{CodegenConfig, EchoprintError, EchoprintResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Version of the code format produced by this crate.
pub const ECHOPRINT_VERSION: f64 = 4.12;

/// Result of a code generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodegenOutput {
    /// Compressed code string; empty when too few codes were found.
    pub code_string: String,
    /// The codes in emission order.
    pub codes: Vec<FpCode>,
    /// Code format version.
    pub version: f64,
}

impl CodegenOutput {
    /// Number of codes.
    pub fn num_codes(&self) -> usize {
        self.codes.len()
    }

    /// Returns true if the input produced too few codes for a code string.
    pub fn is_empty(&self) -> bool {
        self.code_string.is_empty()
    }
}

/// Fingerprint code generator.
///
/// Input is truncated to the configured maximum duration and to the end of
/// the encodable timeline ([`MAX_TIMELINE_SECS`](crate::MAX_TIMELINE_SECS)).
///
/// # Example
/// ```rust
/// use echoprint::Codegen;
///
/// let codegen = Codegen::default();
/// // One second of silence has no onsets.
/// let output = codegen.generate(&vec![0i16; 11025]).unwrap();
/// assert_eq!(output.code_string, "");
/// assert_eq!(output.num_codes(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Codegen {
    config: CodegenConfig,
}

impl Codegen {
    /// Create a generator with the given configuration.
    ///
    /// # Errors
    /// Returns [`EchoprintError::InvalidParameter`] if the configuration is invalid.
    pub fn new(config: CodegenConfig) -> EchoprintResult<Self> {
        config.validate().map_err(EchoprintError::InvalidParameter)?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub const fn config(&self) -> &CodegenConfig {
        &self.config
    }

    /// Generates codes for mono 16-bit PCM at 11025 Hz.
    ///
    /// # Errors
    /// Only if compressing the code text fails.
    pub fn generate(&self, pcm: &[i16]) -> EchoprintResult<CodegenOutput> {
        let pcm = &pcm[..self.limit(pcm.len())];
        self.run(&pcm_to_float(pcm))
    }

    /// Generates codes for normalized mono samples at 11025 Hz.
    ///
    /// # Errors
    /// Only if compressing the code text fails.
    pub fn generate_from_float(&self, samples: &[f32]) -> EchoprintResult<CodegenOutput> {
        self.run(&samples[..self.limit(samples.len())])
    }

    /// Generates codes for interleaved PCM in any supported layout.
    ///
    /// Input that is not mono 11025 Hz goes through the resampler first.
    ///
    /// # Errors
    /// Returns an error if the format cannot be resampled (see [`resample`]).
    pub fn generate_with_format(&self, pcm: &[i16], format: PcmFormat) -> EchoprintResult<CodegenOutput> {
        if format.is_operating_format() {
            return self.generate(pcm);
        }
        let mono = resample(pcm, format)?;
        self.generate(&mono)
    }

    /// Generates codes for raw little-endian 16-bit PCM bytes.
    ///
    /// # Errors
    /// Returns an error if the byte count is odd or the format cannot be
    /// resampled.
    pub fn generate_from_le_bytes(&self, bytes: &[u8], format: PcmFormat) -> EchoprintResult<CodegenOutput> {
        let pcm = pcm_from_le_bytes(bytes)?;
        self.generate_with_format(&pcm, format)
    }

    /// Computes the codes of normalized samples without encoding them.
    pub fn codes(&self, samples: &[f32]) -> Vec<FpCode> {
        let whitened = whiten(samples);
        let energies = subband_energies(&whitened);
        fingerprint(&energies, &self.config)
    }

    fn limit(&self, len: usize) -> usize {
        let len = self.config.max_samples().map_or(len, |max| len.min(max));
        let timeline = self.config.timeline_samples();
        if len > timeline {
            warn!(
                samples = len,
                kept = timeline,
                "Input runs past the last encodable code time, truncating"
            );
            return timeline;
        }
        len
    }

    fn run(&self, samples: &[f32]) -> EchoprintResult<CodegenOutput> {
        let codes = self.codes(samples);
        let code_string = encode_codes(&codes)?;
        debug!(
            samples = samples.len(),
            codes = codes.len(),
            code_string_len = code_string.len(),
            "Generated fingerprint"
        );
        Ok(CodegenOutput {
            code_string,
            codes,
            version: ECHOPRINT_VERSION,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::decode_code_string;
    use crate::utils::generation::{pluck_train, to_pcm};
    use crate::{MAX_TIMELINE_SECS, PairEmission};
    use std::time::Duration;

    fn clicks(len: usize, every: usize) -> Vec<i16> {
        (0..len)
            .map(|n| match n % every {
                0..=3 => 20_000,
                4..=7 => -20_000,
                _ => ((n * 7_919) % 61) as i16 - 30,
            })
            .collect()
    }

    /// Plucks every 500 ms, starting at 250 ms.
    fn plucks(secs: u64) -> Vec<i16> {
        let onsets: Vec<Duration> = (0..2 * secs).map(|i| Duration::from_millis(250 + 500 * i)).collect();
        to_pcm(&pluck_train(&onsets, Duration::from_secs(secs), 0.8))
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CodegenConfig::new().with_max_duration(0);
        assert!(matches!(
            Codegen::new(config),
            Err(EchoprintError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_offset_past_timeline_rejected() {
        let config = CodegenConfig::new().with_start_offset(30_000);
        assert!(matches!(
            Codegen::new(config),
            Err(EchoprintError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_late_segment_round_trips() {
        let pcm = plucks(4);
        let config = CodegenConfig::new().with_start_offset(MAX_TIMELINE_SECS - 10);
        let output = Codegen::new(config).unwrap().generate(&pcm).unwrap();

        assert!(output.num_codes() >= 3);
        assert!(output.codes.iter().all(|c| c.time <= 0xf_ffff));
        assert_eq!(decode_code_string(&output.code_string).unwrap(), output.codes);
    }

    #[test]
    fn test_input_past_timeline_is_truncated() {
        let pcm = plucks(4);
        let codegen = Codegen::new(CodegenConfig::new().with_start_offset(MAX_TIMELINE_SECS - 2)).unwrap();
        let output = codegen.generate(&pcm).unwrap();
        assert!(!output.is_empty());
        assert_eq!(output, codegen.generate(&pcm[..22_050]).unwrap());

        let at_end = Codegen::new(CodegenConfig::new().with_start_offset(MAX_TIMELINE_SECS)).unwrap();
        assert!(at_end.generate(&pcm).unwrap().is_empty());
    }

    #[test]
    fn test_empty_input() {
        let output = Codegen::default().generate(&[]).unwrap();
        assert!(output.is_empty());
        assert_eq!(output.num_codes(), 0);
        assert_eq!(output.version, ECHOPRINT_VERSION);
    }

    #[test]
    fn test_short_input_is_empty() {
        for len in [1usize, 100, 127, 128, 500] {
            let output = Codegen::default().generate(&clicks(len, 50)).unwrap();
            assert!(output.is_empty(), "{len} samples");
        }
    }

    #[test]
    fn test_float_and_pcm_entry_points_agree() {
        let pcm = plucks(4);
        let codegen = Codegen::default();
        let from_pcm = codegen.generate(&pcm).unwrap();
        let from_float = codegen.generate_from_float(&pcm_to_float(&pcm)).unwrap();
        assert!(!from_pcm.is_empty());
        assert_eq!(from_pcm, from_float);
    }

    #[test]
    fn test_operating_format_passes_through() {
        let pcm = plucks(4);
        let codegen = Codegen::default();
        let direct = codegen.generate(&pcm).unwrap();
        let with_format = codegen.generate_with_format(&pcm, PcmFormat::OPERATING).unwrap();
        assert_eq!(direct, with_format);
    }

    #[test]
    fn test_stereo_duplicate_matches_mono() {
        let mono = plucks(4);
        let stereo: Vec<i16> = mono.iter().flat_map(|&s| [s, s]).collect();
        let codegen = Codegen::default();
        let expected = codegen.generate(&mono).unwrap();
        let actual = codegen
            .generate_with_format(&stereo, PcmFormat::new(16, 2, 11025))
            .unwrap();
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_le_bytes_entry_point() {
        let pcm = plucks(4);
        let bytes: Vec<u8> = pcm.iter().flat_map(|s| s.to_le_bytes()).collect();
        let codegen = Codegen::default();
        assert_eq!(
            codegen.generate(&pcm).unwrap(),
            codegen.generate_from_le_bytes(&bytes, PcmFormat::OPERATING).unwrap()
        );
        assert!(codegen.generate_from_le_bytes(&bytes[1..], PcmFormat::OPERATING).is_err());
    }

    #[test]
    fn test_unsupported_format() {
        let err = Codegen::default()
            .generate_with_format(&[0; 100], PcmFormat::new(8, 1, 11025))
            .unwrap_err();
        assert!(matches!(err, EchoprintError::UnsupportedBitDepth(8)));
    }

    #[test]
    fn test_max_duration_truncates_input() {
        let pcm = plucks(6);
        let limited = Codegen::new(CodegenConfig::new().with_max_duration(2)).unwrap();
        let expected = Codegen::default().generate(&pcm[..22_050]).unwrap();
        assert!(!expected.is_empty());
        assert_eq!(limited.generate(&pcm).unwrap(), expected);
    }

    #[test]
    fn test_legacy_emits_multiples_of_six() {
        let pcm = plucks(8);
        let codegen = Codegen::new(CodegenConfig::new().with_pair_emission(PairEmission::Legacy)).unwrap();
        let output = codegen.generate(&pcm).unwrap();
        assert!(output.num_codes() > 0);
        assert_eq!(output.num_codes() % 6, 0);
    }
}
