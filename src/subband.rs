//! Pseudo-QMF subband analysis.
//!
//! The whitened signal is split into [`SUBBANDS`] equally wide bands by a
//! 128-tap polyphase filter bank and decimated by 8. For every output frame
//! the complex band output is reduced to its energy `|D|²`.
//!
//! ## Mathematical Foundation
//!
//! For frame `t` with window `x[8t .. 8t + 128]`:
//!
//! ```text
//! Z[n]  = x[8t + n] · C[n]                      n = 0..128
//! Y[k]  = Σ_{j=0}^{7} Z[k + 16j]                k = 0..16
//! D_i   = Σ_k (Mr[i][k] − j·Mi[i][k]) · Y[k]    i = 0..8
//! E[i,t] = |D_i|²
//! ```
//!
//! with `Mr[i][k] = cos((2i+1)(k−4)π/16)` and `Mi[i][k] = sin(...)`.
//! Frames share no state, so they can be computed in any order (and in
//! parallel with the `parallel-processing` feature) with identical results.

use ndarray::Array2;
use num_complex::Complex32;
use std::sync::LazyLock;
use tracing::debug;

/// Number of subbands.
pub const SUBBANDS: usize = 8;
/// Prototype filter length.
pub const FILTER_LEN: usize = 128;
/// Columns of the modulation matrices (polyphase components).
const MOD_COLS: usize = 16;
/// Decimation factor between samples and frames.
pub const HOP: usize = SUBBANDS;

/// Prototype low-pass filter of the analysis bank.
#[rustfmt::skip]
static PROTOTYPE: [f32; FILTER_LEN] = [
     0.000000477,  0.000000954,  0.000001431,  0.000002384,  0.000003815,  0.000006199,  0.000009060,  0.000013828,
     0.000019550,  0.000027657,  0.000037670,  0.000049591,  0.000062943,  0.000076771,  0.000090599,  0.000101566,
    -0.000108242, -0.000106812, -0.000095367, -0.000069618, -0.000027180,  0.000034332,  0.000116348,  0.000218868,
     0.000339031,  0.000472546,  0.000611782,  0.000747204,  0.000866413,  0.000954151,  0.000994205,  0.000971317,
    -0.000868797, -0.000674248, -0.000378609,  0.000021458,  0.000522137,  0.001111031,  0.001766682,  0.002457142,
     0.003141880,  0.003771782,  0.004290581,  0.004638195,  0.004752159,  0.004573822,  0.004049301,  0.003134727,
    -0.001800537, -0.000033379,  0.002161503,  0.004756451,  0.007703304,  0.010933399,  0.014358521,  0.017876148,
     0.021372318,  0.024725437,  0.027815342,  0.030526638,  0.032754898,  0.034412861,  0.035435200,  0.035780907,
    -0.035435200, -0.034412861, -0.032754898, -0.030526638, -0.027815342, -0.024725437, -0.021372318, -0.017876148,
    -0.014358521, -0.010933399, -0.007703304, -0.004756451, -0.002161503,  0.000033379,  0.001800537,  0.003134727,
    -0.004049301, -0.004573822, -0.004752159, -0.004638195, -0.004290581, -0.003771782, -0.003141880, -0.002457142,
    -0.001766682, -0.001111031, -0.000522137, -0.000021458,  0.000378609,  0.000674248,  0.000868797,  0.000971317,
    -0.000994205, -0.000954151, -0.000866413, -0.000747204, -0.000611782, -0.000472546, -0.000339031, -0.000218868,
    -0.000116348, -0.000034332,  0.000027180,  0.000069618,  0.000095367,  0.000106812,  0.000108242,  0.000101566,
    -0.000090599, -0.000076771, -0.000062943, -0.000049591, -0.000037670, -0.000027657, -0.000019550, -0.000013828,
    -0.000009060, -0.000006199, -0.000003815, -0.000002384, -0.000001431, -0.000000954, -0.000000477,  0.0,
];

/// Cosine and sine modulation matrices `(Mr, Mi)`.
type ModulationTables = ([[f32; MOD_COLS]; SUBBANDS], [[f32; MOD_COLS]; SUBBANDS]);

static MODULATION: LazyLock<ModulationTables> = LazyLock::new(|| {
    // The angle step is rounded to single precision before widening.
    let step = f64::from(std::f32::consts::PI / 16.0);
    let mut mr = [[0.0f32; MOD_COLS]; SUBBANDS];
    let mut mi = [[0.0f32; MOD_COLS]; SUBBANDS];
    for i in 0..SUBBANDS {
        for k in 0..MOD_COLS {
            let angle = (2 * i + 1) as f64 * (k as f64 - 4.0) * step;
            mr[i][k] = angle.cos() as f32;
            mi[i][k] = angle.sin() as f32;
        }
    }
    (mr, mi)
});

/// Prototype filter coefficients.
pub fn prototype_filter() -> &'static [f32; FILTER_LEN] {
    &PROTOTYPE
}

/// Cosine and sine modulation matrices, `SUBBANDS × 16` each.
pub fn modulation_matrices() -> &'static ModulationTables {
    &MODULATION
}

/// Number of analysis frames produced for `num_samples` input samples.
pub const fn num_frames(num_samples: usize) -> usize {
    if num_samples + 1 < FILTER_LEN {
        0
    } else {
        (num_samples + 1 - FILTER_LEN) / HOP
    }
}

/// Complex output of every band for one 128-sample window.
pub fn analyze_window(window: &[f32]) -> [Complex32; SUBBANDS] {
    debug_assert!(window.len() >= FILTER_LEN);
    let (mr, mi) = &*MODULATION;

    let mut z = [0.0f32; FILTER_LEN];
    for ((zn, &x), &c) in z.iter_mut().zip(window).zip(PROTOTYPE.iter()) {
        *zn = x * c;
    }

    let mut y = [0.0f32; MOD_COLS];
    for (k, y) in y.iter_mut().enumerate() {
        let mut acc = z[k];
        for j in 1..FILTER_LEN / MOD_COLS {
            acc += z[k + MOD_COLS * j];
        }
        *y = acc;
    }

    let mut out = [Complex32::new(0.0, 0.0); SUBBANDS];
    for (i, d) in out.iter_mut().enumerate() {
        let mut re = 0.0f32;
        let mut im = 0.0f32;
        for k in 0..MOD_COLS {
            re += mr[i][k] * y[k];
            im -= mi[i][k] * y[k];
        }
        *d = Complex32::new(re, im);
    }
    out
}

fn frame_energies(samples: &[f32], frame: usize) -> [f32; SUBBANDS] {
    let start = frame * HOP;
    analyze_window(&samples[start..start + FILTER_LEN]).map(|d| d.norm_sqr())
}

/// Computes the subband energy matrix (`SUBBANDS × frames`).
///
/// # Arguments
/// * `samples` - Whitened signal
///
/// # Returns
/// An array with one row per band and `num_frames(samples.len())` columns.
/// Inputs shorter than one filter length give an empty `8 × 0` array.
pub fn subband_energies(samples: &[f32]) -> Array2<f32> {
    let frames = num_frames(samples.len());

    #[cfg(feature = "parallel-processing")]
    let columns: Vec<[f32; SUBBANDS]> = {
        use rayon::prelude::*;
        (0..frames)
            .into_par_iter()
            .map(|t| frame_energies(samples, t))
            .collect()
    };
    #[cfg(not(feature = "parallel-processing"))]
    let columns: Vec<[f32; SUBBANDS]> = (0..frames).map(|t| frame_energies(samples, t)).collect();

    let mut energies = Array2::<f32>::zeros((SUBBANDS, frames));
    for (t, column) in columns.iter().enumerate() {
        for (band, &e) in column.iter().enumerate() {
            energies[[band, t]] = e;
        }
    }

    debug!(samples = samples.len(), frames, "Computed subband energies");
    energies
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|n| ((n * 37 % 101) as f32 / 50.0) - 1.0).collect()
    }

    #[test]
    fn test_num_frames() {
        assert_eq!(num_frames(0), 0);
        assert_eq!(num_frames(100), 0);
        assert_eq!(num_frames(127), 0);
        assert_eq!(num_frames(128), 0);
        assert_eq!(num_frames(135), 1);
        assert_eq!(num_frames(1_000), (1_000 - 127) / 8);
        assert_eq!(num_frames(330_750), 41_327);
    }

    #[test]
    fn test_matrix_shape() {
        for len in [0usize, 50, 127, 128, 135, 1_000, 4_321] {
            let energies = subband_energies(&ramp(len));
            assert_eq!(energies.dim(), (SUBBANDS, num_frames(len)));
        }
    }

    #[test]
    fn test_energies_are_nonnegative() {
        let energies = subband_energies(&ramp(5_000));
        assert!(energies.iter().all(|&e| e >= 0.0 && e.is_finite()));
        assert!(energies.iter().any(|&e| e > 0.0));
    }

    #[test]
    fn test_silence_has_no_energy() {
        let energies = subband_energies(&vec![0.0; 2_000]);
        assert!(energies.iter().all(|&e| e == 0.0));
    }

    #[test]
    fn test_modulation_tables() {
        let (mr, mi) = modulation_matrices();
        // k = 4 is the zero-phase column.
        for i in 0..SUBBANDS {
            assert_eq!(mr[i][4], 1.0);
            assert_eq!(mi[i][4], 0.0);
        }
        assert_approx_eq!(f64::from(mr[0][0]), (std::f64::consts::PI / 4.0).cos(), 1e-6);
        assert_approx_eq!(f64::from(mi[1][5]), (3.0 * std::f64::consts::PI / 16.0).sin(), 1e-6);
    }

    #[test]
    fn test_prototype_magnitude_is_symmetric_about_peak() {
        let c = prototype_filter();
        assert_eq!(c[127], 0.0);
        let peak = (0..FILTER_LEN)
            .max_by(|&a, &b| c[a].abs().total_cmp(&c[b].abs()))
            .unwrap();
        assert_eq!(peak, 63);
        for m in 0..63 {
            assert_eq!(c[64 + m].abs(), c[62 - m].abs());
        }
    }

    #[test]
    fn test_frames_are_independent() {
        let signal = ramp(3_000);
        let full = subband_energies(&signal);
        // Frame 10 only depends on samples 80..208.
        let window = analyze_window(&signal[80..208]);
        for band in 0..SUBBANDS {
            assert_eq!(full[[band, 10]], window[band].norm_sqr());
        }
    }

    #[test]
    fn test_tones_land_in_their_bands() {
        // Band i is centred on (2i + 1) · 11025 / 32 Hz.
        for (band, freq) in [300.0f32, 1000.0, 1700.0, 2400.0, 3100.0, 3800.0, 4500.0, 5200.0]
            .into_iter()
            .enumerate()
        {
            let signal: Vec<f32> = (0..4_000)
                .map(|n| (2.0 * std::f32::consts::PI * freq * n as f32 / 11025.0).sin())
                .collect();
            let energies = subband_energies(&signal);
            let totals: Vec<f32> = (0..SUBBANDS).map(|b| energies.row(b).sum()).collect();
            let loudest = totals
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(b, _)| b);
            assert_eq!(loudest, Some(band), "{freq} Hz");
        }
    }
}
