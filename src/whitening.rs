//! Adaptive spectral whitening.
//!
//! A short-term linear predictor is fitted to the running autocorrelation of
//! the signal and the prediction residual is kept. This flattens the slowly
//! varying spectral envelope (room, mastering, codec colouration) and leaves
//! transients, which is what the onset detector downstream keys on.
//!
//! ## Algorithm
//!
//! The input is processed in blocks of [`BLOCK_LEN`] samples. For each block:
//!
//! 1. the block autocorrelation `r[0..=p]` is merged into the running
//!    estimate: `R[i] += (r[i] - R[i]) / T`
//! 2. the predictor `a[1..=p]` is solved from `R` with the Levinson-Durbin
//!    recursion (Rabiner & Schafer 1978, p. 411)
//! 3. each sample is replaced by `x[n] - Σ a[j]·x[n-j]`, where lags reaching
//!    before the block read the saved tail of the previous block
//!
//! Every operation is single precision and accumulates in index order, which
//! is what keeps codes identical to those of other implementations.

use tracing::{debug, trace};

/// Linear prediction order.
pub const LPC_ORDER: usize = 40;
/// Whitening block length in samples.
pub const BLOCK_LEN: usize = 10_000;
/// Time constant (in blocks) of the autocorrelation smoothing.
const SMOOTHING_BLOCKS: f32 = 8.0;
/// Initial zero-lag autocorrelation, keeps the first recursion well defined.
const INITIAL_ENERGY: f32 = 0.001;

/// Whitening filter state.
///
/// One instance carries the smoothed autocorrelation, the current predictor
/// and the look-back samples from one block to the next. It must see the
/// blocks of a signal in order; create a fresh instance per signal.
#[derive(Debug, Clone)]
pub struct Whitening {
    autocorr: [f32; LPC_ORDER + 1],
    coeffs: [f32; LPC_ORDER + 1],
    history: [f32; LPC_ORDER + 1],
}

impl Whitening {
    /// Create a filter with empty history.
    pub const fn new() -> Self {
        let mut autocorr = [0.0; LPC_ORDER + 1];
        autocorr[0] = INITIAL_ENERGY;
        Self {
            autocorr,
            coeffs: [0.0; LPC_ORDER + 1],
            history: [0.0; LPC_ORDER + 1],
        }
    }

    /// Whitens a complete signal.
    ///
    /// The output has the same length as the input. The final block is one
    /// sample shorter than the remainder, so the last output sample is always 0.
    pub fn process(&mut self, samples: &[f32]) -> Vec<f32> {
        let n = samples.len();
        let mut whitened = vec![0.0f32; n];

        let mut blocks = 0usize;
        for start in (0..n).step_by(BLOCK_LEN) {
            let len = if start + BLOCK_LEN >= n {
                n - start - 1
            } else {
                BLOCK_LEN
            };
            self.process_block(samples, start, len, &mut whitened);
            blocks += 1;
        }

        debug!(samples = n, blocks, "Whitened signal");
        whitened
    }

    /// Current predictor coefficients `a[1..=p]`.
    pub fn coefficients(&self) -> &[f32] {
        &self.coeffs[1..]
    }

    fn process_block(&mut self, samples: &[f32], start: usize, len: usize, out: &mut [f32]) {
        let block = &samples[start..start + len];

        self.update_autocorrelation(block);
        let energy = self.solve_predictor();

        let p = LPC_ORDER;
        for (i, (&x, y)) in block.iter().zip(&mut out[start..start + len]).enumerate() {
            let mut acc = x;
            for j in (i + 1)..=p {
                acc -= self.coeffs[j] * self.history[p + i - j];
            }
            for j in 1..=i.min(p) {
                acc -= self.coeffs[j] * block[i - j];
            }
            *y = acc;
        }

        // Keep the last p + 1 inputs; anything before the signal start is silence.
        let tail_start = (start + len) as isize - 1 - p as isize;
        for (i, slot) in self.history.iter_mut().enumerate() {
            let idx = tail_start + i as isize;
            *slot = if idx >= 0 { samples[idx as usize] } else { 0.0 };
        }

        trace!(start, len, residual_energy = energy, "Whitened block");
    }

    fn update_autocorrelation(&mut self, block: &[f32]) {
        let alpha = 1.0 / SMOOTHING_BLOCKS;
        for (lag, r) in self.autocorr.iter_mut().enumerate() {
            let acc = block
                .iter()
                .skip(lag)
                .zip(block)
                .fold(0.0f32, |acc, (&a, &b)| acc + a * b);
            *r += alpha * (acc - *r);
        }
    }

    /// Levinson-Durbin recursion on the smoothed autocorrelation.
    /// Returns the final prediction error energy.
    fn solve_predictor(&mut self) -> f32 {
        let r = &self.autocorr;
        let a = &mut self.coeffs;

        let mut energy = r[0];
        for i in 1..=LPC_ORDER {
            let mut sum = 0.0f32;
            for j in 1..i {
                sum += a[j] * r[i - j];
            }
            let k = (r[i] - sum) / energy;
            a[i] = k;
            for j in 1..=i / 2 {
                let aj = a[j];
                let aimj = a[i - j];
                a[j] = aj - k * aimj;
                a[i - j] = aimj - k * aj;
            }
            energy *= 1.0 - k * k;
        }
        energy
    }
}

impl Default for Whitening {
    fn default() -> Self {
        Self::new()
    }
}

/// Whitens `samples` with a fresh filter.
pub fn whiten(samples: &[f32]) -> Vec<f32> {
    Whitening::new().process(samples)
}
