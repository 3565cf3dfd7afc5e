//! Error types and result utilities for fingerprint code generation.

use thiserror::Error;

/// Convenience type alias for results that may contain an [`EchoprintError`].
pub type EchoprintResult<T> = Result<T, EchoprintError>;

/// Error types that can occur around the fingerprint pipeline.
///
/// The numeric pipeline itself never fails: degenerate audio produces an empty
/// fingerprint. Errors come from the edges, i.e. input formats the resampler
/// cannot handle, invalid configuration and malformed code strings handed to
/// the decoder.
#[derive(Error, Debug)]
pub enum EchoprintError {
    /// PCM input with a sample width other than 16 bits.
    #[error("Unsupported bit depth: {0} bits per sample (only 16-bit PCM is supported)")]
    UnsupportedBitDepth(u16),

    /// Error that occurs when invalid parameters are provided to an operation.
    ///
    /// This includes zero channel counts, zero sample rates, odd-length byte
    /// buffers and configurations that fail validation.
    #[error("Invalid parameter error: {0}")]
    InvalidParameter(String),

    /// The decompressed code text does not have the expected layout.
    #[error("Invalid code string: {0}")]
    InvalidCodeString(String),

    /// The code string is not valid URL-safe base64.
    #[error("Base64 decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Compression or decompression of the code text failed.
    #[error("Compression stream error: {0}")]
    Io(#[from] std::io::Error),
}

impl EchoprintError {
    /// Creates an [`EchoprintError::InvalidParameter`] naming the offending parameter.
    pub fn invalid_parameter(name: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidParameter(format!("{name}: {reason}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message() {
        let err = EchoprintError::invalid_parameter("channels", "must be > 0");
        assert_eq!(
            err.to_string(),
            "Invalid parameter error: channels: must be > 0"
        );
    }

    #[test]
    fn test_bit_depth_message() {
        let err = EchoprintError::UnsupportedBitDepth(24);
        assert!(err.to_string().contains("24 bits"));
    }
}
