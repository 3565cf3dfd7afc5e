//! Onset-pair fingerprinting.
//!
//! Turns the subband energy matrix into a list of [`FpCode`]s:
//!
//! 1. the energies are smoothed into a per-band amplitude envelope and run
//!    through an adaptive onset detector ([`onsets`])
//! 2. every onset is paired with the onsets that follow it in its band; each
//!    pair of inter-onset intervals is quantized to ~23 ms and hashed together
//!    with the band index ([`hashing`])
//! 3. codes are tagged with the quantized absolute time of the onset
//!
//! Codes are emitted band by band, onset by onset, pair by pair.

pub mod hashing;
pub mod onsets;

use crate::{CodegenConfig, PairEmission, SAMPLE_RATE};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use hashing::hash_code;
pub use onsets::{detect_onsets, smooth_envelope};

/// Envelope frames per second.
pub const FRAME_RATE: f64 = SAMPLE_RATE as f64 / 32.0;
/// Time quantum of code times and deltas, in seconds.
pub const QUANTUM_SECS: f64 = 256.0 / SAMPLE_RATE as f64;

/// Onset index offsets `(b, c)` of the six pairs formed from onset `o`.
/// A pair hashes the intervals `o_b - o` and `o_c - o_b`.
const PAIRS: [(usize, usize); 6] = [(1, 2), (1, 3), (2, 3), (1, 4), (2, 4), (3, 4)];

/// A single fingerprint code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FpCode {
    /// Quantized onset time (units of ~23.2 ms, start offset included).
    pub time: u32,
    /// 20-bit hash of the onset pair and band.
    pub code: u32,
}

impl FpCode {
    /// Create a new code.
    pub const fn new(time: u32, code: u32) -> Self {
        Self { time, code }
    }
}

/// Quantum rounded to single precision, as Echoprint codegen divides by it.
fn quantum_single() -> f64 {
    f64::from(QUANTUM_SECS as f32)
}

/// Quantizes an interval of `frames` envelope frames.
pub fn quantize_delta(frames: u32) -> u32 {
    let q = quantum_single();
    let t = f64::from(frames) / FRAME_RATE;
    ((t * 1000.0 / q).floor() * q / (QUANTUM_SECS * 1000.0).floor()) as u32
}

/// Quantizes the absolute time of envelope frame `frame`, shifted by
/// `offset_secs`.
///
/// Times stay below `0x100000` up to
/// [`MAX_TIMELINE_SECS`](crate::MAX_TIMELINE_SECS), which
/// [`CodegenConfig::validate`] enforces for pipeline runs.
pub fn quantize_absolute(frame: u32, offset_secs: u32) -> u32 {
    let t = f64::from(offset_secs) + f64::from(frame) / FRAME_RATE;
    ((t * 1000.0 / quantum_single()).round_ties_even() * QUANTUM_SECS
        / (QUANTUM_SECS * 1000.0).floor()) as u32
}

/// Number of complete pairs for onset `index` of a band with `count` onsets.
const fn active_pairs(index: usize, count: usize) -> usize {
    match count - index {
        3 => 1,
        4 => 3,
        _ => PAIRS.len(),
    }
}

/// Hashes the onsets of every band into codes.
///
/// # Arguments
/// * `band_onsets` - Strictly increasing onset frames, one list per band
/// * `offset_secs` - Added to every code time
/// * `emission` - Whether incomplete pairs near the end of a band are padded
pub fn emit_codes(band_onsets: &[Vec<usize>], offset_secs: u32, emission: PairEmission) -> Vec<FpCode> {
    let mut codes = Vec::new();

    for (band, onsets) in band_onsets.iter().enumerate() {
        let count = onsets.len();
        if count <= 2 {
            continue;
        }
        let band = band as u8;

        for index in 0..count - 2 {
            let onset = onsets[index];
            let time = quantize_absolute(onset as u32, offset_secs);
            let active = active_pairs(index, count);

            for &(b, c) in &PAIRS[..active] {
                let delta0 = (onsets[index + b] - onset) as u32;
                let delta1 = (onsets[index + c] - onsets[index + b]) as u32;
                let code = hash_code(quantize_delta(delta0), quantize_delta(delta1), band);
                codes.push(FpCode::new(time, code));
            }

            if emission == PairEmission::Legacy {
                let padding = FpCode::new(time, hash_code(0, 0, band));
                codes.extend(std::iter::repeat_n(padding, PAIRS.len() - active));
            }
        }
    }
    codes
}

/// Computes the fingerprint codes of a subband energy matrix.
pub fn fingerprint(energies: &Array2<f32>, config: &CodegenConfig) -> Vec<FpCode> {
    let envelope = smooth_envelope(energies);
    let band_onsets = detect_onsets(&envelope);
    let codes = emit_codes(&band_onsets, config.start_offset_secs, config.pair_emission);

    debug!(
        envelope_frames = envelope.ncols(),
        onsets = band_onsets.iter().map(Vec::len).sum::<usize>(),
        codes = codes.len(),
        "Computed fingerprint"
    );
    codes
}
