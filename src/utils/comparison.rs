//! Fingerprint comparison utilities.
//!
//! Code strings are compressed, so they are compared through their decoded
//! hex text. These measures are meant for smoke testing (does a slightly
//! altered recording still produce a similar fingerprint?), not for search.

use crate::EchoprintResult;
use crate::encoder::{code_text, decode_code_string};

/// Computes the Levenshtein edit distance between two byte strings.
///
/// # Arguments
/// * `a` - First string
/// * `b` - Second string
///
/// # Returns
/// The minimum number of single-byte insertions, deletions and substitutions
/// turning `a` into `b`.
pub fn levenshtein(a: &[u8], b: &[u8]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    let mut row: Vec<usize> = (0..=a.len()).collect();
    for (j, &cb) in b.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = j + 1;
        for (i, &ca) in a.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != cb);
            diagonal = row[i + 1];
            row[i + 1] = substitution.min(row[i] + 1).min(diagonal + 1);
        }
    }
    row[a.len()]
}

/// Normalized edit distance between the code texts of two code strings.
///
/// # Returns
/// A value in `[0, 1]`: 0 for identical fingerprints, 1 when nothing is
/// shared. Two empty fingerprints are identical.
///
/// # Errors
/// Returns an error if either code string cannot be decoded.
pub fn code_text_distance(a: &str, b: &str) -> EchoprintResult<f64> {
    let text_a = code_text(&decode_code_string(a)?);
    let text_b = code_text(&decode_code_string(b)?);
    let longest = text_a.len().max(text_b.len());
    if longest == 0 {
        return Ok(0.0);
    }
    Ok(levenshtein(text_a.as_bytes(), text_b.as_bytes()) as f64 / longest as f64)
}
