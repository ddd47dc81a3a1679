//! Harmonic-percussive source separation via median filtering
//!
//! Harmonic content is continuous in time, so a median across frames keeps
//! it; percussive content is broadband, so a median across bins keeps it.
//! The two filtered magnitudes become soft masks (power 2) on the complex
//! STFT, which is then inverted to the input length.

use crate::signal::is_silent;
use crate::spectral::{FEATURE_HOP, FEATURE_N_FFT};
use mixcheck_dsp::{Spectrogram, Stft, StftConfig};

/// Median filter length in frames (harmonic) and bins (percussive)
pub const KERNEL_SIZE: usize = 31;

/// Soft-mask exponent
const MASK_POWER: i32 = 2;

/// Harmonic and percussive components of a band signal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Separation {
    pub harmonic: Vec<f32>,
    pub percussive: Vec<f32>,
}

impl Separation {
    /// True when separation was skipped for silent input
    pub fn is_empty(&self) -> bool {
        self.harmonic.is_empty() && self.percussive.is_empty()
    }
}

/// Separate `samples` into harmonic and percussive parts
///
/// Silent input yields an empty separation.
pub fn separate(samples: &[f32]) -> Separation {
    if is_silent(samples) {
        return Separation::default();
    }

    let stft = Stft::new(StftConfig::analysis(FEATURE_N_FFT, FEATURE_HOP));
    let spectrum = stft.forward(samples);
    let magnitudes = spectrum.magnitudes();

    let harmonic_mag = median_filter_time(&magnitudes, KERNEL_SIZE);
    let percussive_mag = median_filter_frequency(&magnitudes, KERNEL_SIZE);

    let mut harmonic_spec = Spectrogram::zeros(spectrum.num_bins(), spectrum.num_frames());
    let mut percussive_spec = harmonic_spec.clone();

    for (t, frame) in spectrum.frames().enumerate() {
        let h_out = harmonic_spec.frame_mut(t);
        for (k, &c) in frame.iter().enumerate() {
            h_out[k] = c * soft_mask(harmonic_mag[t][k], percussive_mag[t][k]);
        }
        let p_out = percussive_spec.frame_mut(t);
        for (k, &c) in frame.iter().enumerate() {
            p_out[k] = c * soft_mask(percussive_mag[t][k], harmonic_mag[t][k]);
        }
    }

    // Shapes come from the same transform, so inversion cannot fail
    let harmonic = stft
        .inverse(&harmonic_spec, samples.len())
        .unwrap_or_default();
    let percussive = stft
        .inverse(&percussive_spec, samples.len())
        .unwrap_or_default();

    tracing::trace!(
        frames = spectrum.num_frames(),
        samples = samples.len(),
        "Harmonic-percussive separation complete"
    );

    Separation {
        harmonic,
        percussive,
    }
}

/// `x^p / (x^p + reference^p)`, zero where both inputs vanish
fn soft_mask(x: f64, reference: f64) -> f64 {
    let z = x.max(reference);
    if z < f64::MIN_POSITIVE {
        return 0.0;
    }
    let mask = (x / z).powi(MASK_POWER);
    let ref_mask = (reference / z).powi(MASK_POWER);
    mask / (mask + ref_mask)
}

/// Map an out-of-range index back inside `0..n` by mirror reflection,
/// repeating the edge sample (`d c b a | a b c d | d c b a`)
fn reflect(index: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    let m = index.rem_euclid(period);
    (if m < n { m } else { period - 1 - m }) as usize
}

fn median_in_place(scratch: &mut [f64]) -> f64 {
    let mid = scratch.len() / 2;
    let (_, median, _) = scratch.select_nth_unstable_by(mid, f64::total_cmp);
    *median
}

/// Median across frames for every bin
fn median_filter_time(mags: &[Vec<f64>], width: usize) -> Vec<Vec<f64>> {
    let num_frames = mags.len();
    let half = (width / 2) as isize;
    let mut scratch = vec![0.0; width];

    (0..num_frames)
        .map(|t| {
            let num_bins = mags[t].len();
            (0..num_bins)
                .map(|k| {
                    for (slot, offset) in scratch.iter_mut().zip(-half..=half) {
                        *slot = mags[reflect(t as isize + offset, num_frames)][k];
                    }
                    median_in_place(&mut scratch)
                })
                .collect()
        })
        .collect()
}

/// Median across bins for every frame
fn median_filter_frequency(mags: &[Vec<f64>], width: usize) -> Vec<Vec<f64>> {
    let half = (width / 2) as isize;
    let mut scratch = vec![0.0; width];

    mags.iter()
        .map(|frame| {
            let num_bins = frame.len();
            (0..num_bins)
                .map(|k| {
                    for (slot, offset) in scratch.iter_mut().zip(-half..=half) {
                        *slot = frame[reflect(k as isize + offset, num_bins)];
                    }
                    median_in_place(&mut scratch)
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::sum_of_squares;
    use std::f32::consts::PI;

    #[test]
    fn reflect_mirrors_edges() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(2, 4), 2);
        // Kernel wider than the data keeps reflecting
        assert_eq!(reflect(-9, 4), 0);
        assert_eq!(reflect(0, 1), 0);
        assert_eq!(reflect(7, 1), 0);
    }

    #[test]
    fn soft_mask_is_complementary() {
        let m = soft_mask(3.0, 4.0);
        let r = soft_mask(4.0, 3.0);
        assert!((m + r - 1.0).abs() < 1e-12);
        assert!((m - 9.0 / 25.0).abs() < 1e-12);
        assert_eq!(soft_mask(0.0, 0.0), 0.0);
    }

    #[test]
    fn sustained_tone_is_harmonic() {
        let tone: Vec<f32> = (0..48_000)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / 48_000.0).sin())
            .collect();
        let sep = separate(&tone);
        assert_eq!(sep.harmonic.len(), tone.len());
        assert_eq!(sep.percussive.len(), tone.len());
        let h = sum_of_squares(&sep.harmonic);
        let p = sum_of_squares(&sep.percussive);
        assert!(h / (h + p) > 0.9, "harmonic share {}", h / (h + p));
    }

    #[test]
    fn click_train_is_percussive() {
        let mut clicks = vec![0.0f32; 48_000];
        for i in (0..48_000).step_by(6000) {
            clicks[i] = 1.0;
        }
        let sep = separate(&clicks);
        let h = sum_of_squares(&sep.harmonic);
        let p = sum_of_squares(&sep.percussive);
        assert!(p / (h + p) > 0.7, "percussive share {}", p / (h + p));
    }

    #[test]
    fn silence_skips_separation() {
        assert!(separate(&[0.0; 4096]).is_empty());
        assert!(separate(&[]).is_empty());
    }
}
