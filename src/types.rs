//! Configuration types for fingerprint code generation.
//!
//! Everything that has to match Echoprint codegen bit for bit is a
//! constant (see the crate root). What remains configurable here only affects
//! which part of the input is fingerprinted and how codes are laid out.

use serde::{Deserialize, Serialize};

/// Longest timeline, in seconds, whose code times fit five hex digits.
///
/// Code times advance by about 43.5 per second, so the last time in a
/// timeline this long is still below `0x100000`. The start offset plus the
/// fingerprinted duration may not exceed it.
pub const MAX_TIMELINE_SECS: u32 = 24_000;

/// How many codes are emitted for onsets close to the end of a band.
///
/// Each onset can form up to six pairs with the onsets that follow it. The
/// fourth-from-last onset of a band only has three complete pairs and the
/// third-from-last only one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairEmission {
    /// Emit one code per complete pair (6, 3 or 1 per onset).
    #[default]
    ActiveOnly,
    /// Always emit six codes per onset, hashing zero deltas for the missing
    /// pairs. This matches code sets produced by the legacy codegen.
    Legacy,
}

/// Configuration for a [`Codegen`](crate::Codegen) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodegenConfig {
    /// Offset in seconds added to every onset time.
    /// Used when the samples are a segment taken from further into a stream.
    /// At most [`MAX_TIMELINE_SECS`].
    pub start_offset_secs: u32,
    /// Only fingerprint the first `n` seconds of the input (None = everything).
    pub max_duration_secs: Option<u32>,
    /// Code layout for onsets near the end of a band.
    pub pair_emission: PairEmission,
}

impl CodegenConfig {
    /// Create a configuration that fingerprints the whole input from time zero.
    pub const fn new() -> Self {
        Self {
            start_offset_secs: 0,
            max_duration_secs: None,
            pair_emission: PairEmission::ActiveOnly,
        }
    }

    /// Configuration matching the legacy command line front end: the first
    /// 30 seconds, six codes per onset.
    pub const fn legacy() -> Self {
        Self {
            start_offset_secs: 0,
            max_duration_secs: Some(30),
            pair_emission: PairEmission::Legacy,
        }
    }

    /// Set the start offset in seconds.
    pub const fn with_start_offset(mut self, secs: u32) -> Self {
        self.start_offset_secs = secs;
        self
    }

    /// Limit the fingerprinted duration.
    pub const fn with_max_duration(mut self, secs: u32) -> Self {
        self.max_duration_secs = Some(secs);
        self
    }

    /// Set the pair emission mode.
    pub const fn with_pair_emission(mut self, pair_emission: PairEmission) -> Self {
        self.pair_emission = pair_emission;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_duration_secs == Some(0) {
            return Err("max_duration_secs must be greater than 0".to_string());
        }
        let end = u64::from(self.start_offset_secs) + u64::from(self.max_duration_secs.unwrap_or(0));
        if end > u64::from(MAX_TIMELINE_SECS) {
            return Err(format!(
                "start_offset_secs + max_duration_secs must be at most {MAX_TIMELINE_SECS}, got {end}"
            ));
        }
        Ok(())
    }

    /// Number of samples at the operating rate the input is truncated to, if any.
    pub fn max_samples(&self) -> Option<usize> {
        self.max_duration_secs
            .map(|secs| secs as usize * crate::SAMPLE_RATE as usize)
    }

    /// Number of samples at the operating rate left on the timeline after the
    /// start offset.
    pub const fn timeline_samples(&self) -> usize {
        MAX_TIMELINE_SECS.saturating_sub(self.start_offset_secs) as usize * crate::SAMPLE_RATE as usize
    }
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CodegenConfig::default();
        assert_eq!(config.start_offset_secs, 0);
        assert_eq!(config.max_samples(), None);
        assert_eq!(config.pair_emission, PairEmission::ActiveOnly);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_legacy_config() {
        let config = CodegenConfig::legacy();
        assert_eq!(config.max_samples(), Some(330_750));
        assert_eq!(config.pair_emission, PairEmission::Legacy);
    }

    #[test]
    fn test_zero_duration_rejected() {
        let config = CodegenConfig::new().with_max_duration(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeline_bound() {
        assert!(CodegenConfig::new().with_start_offset(MAX_TIMELINE_SECS).validate().is_ok());
        assert!(CodegenConfig::new().with_start_offset(30_000).validate().is_err());
        assert!(CodegenConfig::new().with_start_offset(u32::MAX).validate().is_err());

        let segment = CodegenConfig::new().with_start_offset(MAX_TIMELINE_SECS - 30);
        assert!(segment.with_max_duration(30).validate().is_ok());
        assert!(segment.with_max_duration(31).validate().is_err());
        assert!(CodegenConfig::new().with_max_duration(u32::MAX).validate().is_err());
    }

    #[test]
    fn test_timeline_samples() {
        assert_eq!(CodegenConfig::new().timeline_samples(), 24_000 * 11_025);
        assert_eq!(CodegenConfig::new().with_start_offset(23_990).timeline_samples(), 110_250);
        assert_eq!(CodegenConfig::new().with_start_offset(MAX_TIMELINE_SECS).timeline_samples(), 0);
    }

    #[test]
    fn test_builder_methods() {
        let config = CodegenConfig::new()
            .with_start_offset(12)
            .with_max_duration(20)
            .with_pair_emission(PairEmission::Legacy);
        assert_eq!(config.start_offset_secs, 12);
        assert_eq!(config.max_duration_secs, Some(20));
        assert_eq!(config.pair_emission, PairEmission::Legacy);
    }
}
