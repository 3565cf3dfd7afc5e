//! Test signal generation utilities.
//!
//! All generators produce normalized mono samples at the operating rate
//! ([`SAMPLE_RATE`](crate::SAMPLE_RATE)). The noise generator requires
//! `feature = "random-generation"`.

use std::f32::consts::PI;
use std::time::Duration;

use crate::SAMPLE_RATE;
use crate::conversions::float_to_pcm;
use crate::subband::SUBBANDS;

/// Decay time constant of a pluck, in seconds.
const PLUCK_DECAY_SECS: f32 = 0.03;
/// A pluck is cut off after this many time constants.
const PLUCK_DECAY_SPAN: f32 = 10.0;

fn num_samples(duration: Duration) -> usize {
    (duration.as_secs_f64() * f64::from(SAMPLE_RATE)) as usize
}

/// Generates a sine wave.
///
/// # Arguments
/// * `frequency` - Frequency of the sine wave in Hz
/// * `duration` - Duration of the signal
/// * `amplitude` - Peak amplitude (0.0 to 1.0)
pub fn sine_wave(frequency: f32, duration: Duration, amplitude: f32) -> Vec<f32> {
    let step = 2.0 * PI * frequency / SAMPLE_RATE as f32;
    (0..num_samples(duration))
        .map(|n| amplitude * (step * n as f32).sin())
        .collect()
}

/// Generates silence.
pub fn silence(duration: Duration) -> Vec<f32> {
    vec![0.0; num_samples(duration)]
}

/// Centre frequency of subband `band` in Hz.
pub fn band_centre(band: usize) -> f32 {
    (2 * band + 1) as f32 * SAMPLE_RATE as f32 / (4 * SUBBANDS) as f32
}

/// Generates a train of broadband plucks.
///
/// Each pluck is a sum of sinusoids at the centre frequency of every subband
/// with a 30 ms exponential decay, so it produces an onset in all bands at
/// once. Plucks starting at or after `duration` are ignored; overlapping
/// plucks add up.
///
/// # Arguments
/// * `onset_times` - Start time of each pluck
/// * `duration` - Duration of the whole signal
/// * `amplitude` - Peak amplitude of a single pluck
pub fn pluck_train(onset_times: &[Duration], duration: Duration, amplitude: f32) -> Vec<f32> {
    let mut samples = silence(duration);
    let rate = SAMPLE_RATE as f32;
    let decay_len = (PLUCK_DECAY_SPAN * PLUCK_DECAY_SECS * rate) as usize;
    let steps: Vec<f32> = (0..SUBBANDS).map(|b| 2.0 * PI * band_centre(b) / rate).collect();
    let gain = amplitude / SUBBANDS as f32;

    for &onset in onset_times {
        let start = num_samples(onset);
        let end = (start + decay_len).min(samples.len());
        for (n, sample) in samples.iter_mut().enumerate().take(end).skip(start) {
            let t = (n - start) as f32;
            let envelope = (-t / (PLUCK_DECAY_SECS * rate)).exp();
            let partials: f32 = steps
                .iter()
                .enumerate()
                .map(|(b, &step)| (step * t + b as f32).sin())
                .sum();
            *sample += gain * envelope * partials;
        }
    }
    samples
}

/// Converts generated samples to 16-bit PCM.
pub fn to_pcm(samples: &[f32]) -> Vec<i16> {
    float_to_pcm(samples)
}

/// Generates uniform white noise in `[-amplitude, amplitude)`.
///
/// # Arguments
/// * `duration` - Duration of the signal
/// * `amplitude` - Peak amplitude
/// * `seed` - Seed for reproducible noise; `None` draws from the thread RNG
#[cfg(feature = "random-generation")]
pub fn white_noise(duration: Duration, amplitude: f32, seed: Option<u64>) -> Vec<f32> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let len = num_samples(duration);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    (0..len)
        .map(|_| amplitude * (rng.random::<f32>() - 0.5) * 2.0)
        .collect()
}
