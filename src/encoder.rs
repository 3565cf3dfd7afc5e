//! Code string encoding.
//!
//! A code string is the zlib-compressed, URL-safe base64 form of a hex text:
//! all code times followed by all code values, each as lowercase hex with at
//! least five digits. Fingerprints with fewer than [`MIN_CODES`] codes encode
//! to the empty string.

use crate::fingerprint::FpCode;
use crate::{EchoprintError, EchoprintResult};
use base64::{Engine, engine::general_purpose::URL_SAFE as BASE64};
use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};
use std::fmt::Write as _;
use std::io::{Read, Write};
use tracing::debug;

/// Minimum number of codes for a non-empty code string.
pub const MIN_CODES: usize = 3;
/// Hex digits per field in the code text.
pub const FIELD_WIDTH: usize = 5;

/// Renders the uncompressed hex text of `codes`.
///
/// Values wider than five hex digits are written in full.
pub fn code_text(codes: &[FpCode]) -> String {
    let mut text = String::with_capacity(codes.len() * 2 * FIELD_WIDTH);
    for code in codes {
        // Writing into a String cannot fail.
        let _ = write!(text, "{:05x}", code.time);
    }
    for code in codes {
        let _ = write!(text, "{:05x}", code.code);
    }
    text
}

/// Encodes `codes` into a code string.
///
/// # Returns
/// The empty string if there are fewer than [`MIN_CODES`] codes.
///
/// # Errors
/// Only if the compressor fails, which does not happen for in-memory buffers.
///
/// # Example
/// ```rust
/// use echoprint::encoder::{decode_code_string, encode_codes};
/// use echoprint::FpCode;
///
/// let codes = vec![FpCode::new(0, 0x1_2345), FpCode::new(7, 42), FpCode::new(12, 0xf_ffff)];
/// let encoded = encode_codes(&codes).unwrap();
/// assert!(!encoded.is_empty());
/// assert_eq!(decode_code_string(&encoded).unwrap(), codes);
///
/// assert_eq!(encode_codes(&codes[..2]).unwrap(), "");
/// ```
pub fn encode_codes(codes: &[FpCode]) -> EchoprintResult<String> {
    if codes.len() < MIN_CODES {
        debug!(codes = codes.len(), "Too few codes, returning empty code string");
        return Ok(String::new());
    }

    let text = code_text(codes);
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    let compressed = encoder.finish()?;

    let encoded = BASE64.encode(&compressed);
    debug!(
        codes = codes.len(),
        text_len = text.len(),
        compressed_len = compressed.len(),
        "Encoded code string"
    );
    Ok(encoded)
}

/// Decodes a code string back into codes.
///
/// The inverse of [`encode_codes`] as long as every field fit in five hex
/// digits, which holds for all codes from [`Codegen`](crate::Codegen) (see
/// [`MAX_TIMELINE_SECS`](crate::MAX_TIMELINE_SECS)). The empty string decodes
/// to no codes.
///
/// # Errors
/// Returns an error if:
/// - the string is not URL-safe base64
/// - the payload is not a zlib stream of ASCII text
/// - the text is not a whole number of time/code field pairs
/// - a field is not hexadecimal
pub fn decode_code_string(encoded: &str) -> EchoprintResult<Vec<FpCode>> {
    if encoded.is_empty() {
        return Ok(Vec::new());
    }

    let compressed = BASE64.decode(encoded)?;
    let mut text = String::new();
    ZlibDecoder::new(compressed.as_slice()).read_to_string(&mut text)?;

    if !text.is_ascii() || text.len() % (2 * FIELD_WIDTH) != 0 {
        return Err(EchoprintError::InvalidCodeString(format!(
            "expected pairs of {FIELD_WIDTH}-digit hex fields, got {} characters",
            text.len()
        )));
    }

    let (times, values) = text.split_at(text.len() / 2);
    let codes = fields(times)
        .zip(fields(values))
        .map(|(time, code)| -> EchoprintResult<FpCode> { Ok(FpCode::new(time?, code?)) })
        .collect::<EchoprintResult<Vec<_>>>()?;

    debug!(codes = codes.len(), "Decoded code string");
    Ok(codes)
}

fn fields(text: &str) -> impl Iterator<Item = EchoprintResult<u32>> + '_ {
    text.as_bytes().chunks(FIELD_WIDTH).map(|chunk| {
        // Chunks of an ASCII string are valid UTF-8.
        let field = std::str::from_utf8(chunk).unwrap_or_default();
        u32::from_str_radix(field, 16)
            .map_err(|_| EchoprintError::InvalidCodeString(format!("invalid hex field {field:?}")))
    })
}
