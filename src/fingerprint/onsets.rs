//! Adaptive per-band onset detection.
//!
//! The subband energies are first smoothed into an amplitude envelope (8-frame
//! Hann window, hop 4, square root). Each band's envelope then runs through a
//! pre-emphasis filter and a threshold follower:
//!
//! - while the filtered level exceeds the threshold ("contact") the threshold
//!   is ratcheted to 110% of the level
//! - otherwise it decays exponentially, with a time constant that grows while
//!   onsets are frequent and shrinks once none has been seen for
//!   [`TARGET_SPACING`] frames
//! - the frame at which contact is lost is an onset; an onset less than
//!   [`DEAD_TIME`] frames after the previous one replaces it
//!
//! The result is one strictly increasing list of envelope frame indices per band.

use ndarray::{Array2, ArrayView1};
use tracing::debug;

/// Length of the Hann window used to smooth subband energies.
pub const SMOOTHING_TAPS: usize = 8;
/// Hop between smoothing windows, in subband frames.
pub const SMOOTHING_HOP: usize = 4;
/// Minimum spacing between two onsets of one band, in envelope frames.
pub const DEAD_TIME: usize = 128;
/// Onset spacing the threshold decay adapts towards, in envelope frames.
pub const TARGET_SPACING: u32 = 345;
/// Threshold relative to the level while in contact.
const OVERSHOOT: f64 = 1.1;
/// FIR taps of the pre-emphasis filter.
const PREEMPHASIS_TAPS: [f64; 3] = [0.1883, 0.4230, 0.3392];
/// One-pole leak of the pre-emphasis filter.
const PREEMPHASIS_LEAK: f64 = 0.98;
/// Truncated pi of the Echoprint window. Codes depend on the exact value.
#[allow(clippy::approx_constant)]
const WINDOW_PI: f64 = 3.141_592_653_6;

/// Hann window applied to each group of [`SMOOTHING_TAPS`] subband frames.
pub fn smoothing_window() -> [f32; SMOOTHING_TAPS] {
    let step = 2.0 * WINDOW_PI / (SMOOTHING_TAPS - 1) as f64;
    std::array::from_fn(|k| (0.5 - 0.5 * (step * k as f64).cos()) as f32)
}

/// Number of envelope frames for `subband_frames` subband frames.
pub const fn envelope_len(subband_frames: usize) -> usize {
    (subband_frames / SMOOTHING_HOP).saturating_sub(SMOOTHING_TAPS / SMOOTHING_HOP - 1)
}

/// Smooths subband energies (`bands × frames`) into an amplitude envelope
/// (`bands × envelope_len(frames)`).
pub fn smooth_envelope(energies: &Array2<f32>) -> Array2<f32> {
    let (bands, frames) = energies.dim();
    let window = smoothing_window();

    Array2::from_shape_fn((bands, envelope_len(frames)), |(band, i)| {
        let start = i * SMOOTHING_HOP;
        let mut acc = 0.0f32;
        for (k, &w) in window.iter().enumerate() {
            acc += energies[[band, start + k]] * w;
        }
        acc.sqrt()
    })
}

/// Threshold follower for one band.
#[derive(Debug, Clone)]
pub struct OnsetDetector {
    threshold: f64,
    attach_threshold: f64,
    tau: f64,
    since_onset: u32,
    contact: bool,
    onsets: Vec<usize>,
}

impl OnsetDetector {
    /// Create a detector whose threshold starts at `initial_level`.
    pub fn new(initial_level: f32) -> Self {
        Self {
            threshold: f64::from(initial_level),
            attach_threshold: 0.0,
            tau: 1.0,
            since_onset: 0,
            contact: false,
            onsets: Vec::new(),
        }
    }

    /// Feeds the filtered level of envelope frame `frame`.
    pub fn step(&mut self, frame: usize, level: f64) {
        let contact = level > self.threshold;

        if contact && !self.contact && self.attach_threshold == 0.0 {
            self.attach_threshold = self.threshold;
        }

        if contact {
            self.threshold = level * OVERSHOOT;
        } else {
            self.threshold *= (-1.0 / self.tau).exp();
        }

        if !contact && self.contact {
            self.record_onset(frame);
            self.since_onset = 0;
        }

        self.since_onset += 1;
        if self.since_onset > TARGET_SPACING {
            self.tau = (self.tau - 1.0).max(1.0);
        } else {
            self.tau += 1.0;
        }

        if !contact && self.since_onset as usize > DEAD_TIME {
            self.attach_threshold = 0.0;
        }
        self.contact = contact;
    }

    fn record_onset(&mut self, frame: usize) {
        match self.onsets.last_mut() {
            Some(last) if *last + DEAD_TIME > frame => *last = frame,
            _ => self.onsets.push(frame),
        }
    }

    /// Current threshold.
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Threshold recorded at the last attach, 0 once forgotten.
    pub const fn attach_threshold(&self) -> f64 {
        self.attach_threshold
    }

    /// Onsets detected so far.
    pub fn onsets(&self) -> &[usize] {
        &self.onsets
    }

    /// Consumes the detector, returning its onsets.
    pub fn into_onsets(self) -> Vec<usize> {
        self.onsets
    }
}

/// Runs the pre-emphasis filter and detector over one band's envelope.
pub fn band_onsets(envelope: ArrayView1<'_, f32>) -> Vec<usize> {
    let Some(&first) = envelope.get(0) else {
        return Vec::new();
    };
    let mut detector = OnsetDetector::new(first);
    let span = 2 * PREEMPHASIS_TAPS.len();

    let mut previous = 0.0f64;
    for i in 0..envelope.len() {
        let mut level = 0.0f64;
        if i >= span {
            for (k, &b) in PREEMPHASIS_TAPS.iter().enumerate() {
                level += b * f64::from(envelope[i - k] - envelope[i - span + k]);
            }
        }
        level += PREEMPHASIS_LEAK * previous;
        previous = level;
        detector.step(i, level);
    }
    detector.into_onsets()
}

/// Detects onsets in every band of an envelope (`bands × frames`).
pub fn detect_onsets(envelope: &Array2<f32>) -> Vec<Vec<usize>> {
    let onsets: Vec<Vec<usize>> = envelope.rows().into_iter().map(band_onsets).collect();
    debug!(
        frames = envelope.ncols(),
        per_band = ?onsets.iter().map(Vec::len).collect::<Vec<_>>(),
        "Detected onsets"
    );
    onsets
}
