//! Spectral shape metrics: centroid, roll-off, flatness and band energy
//!
//! Centroid, roll-off and flatness are frame averages over a centred
//! 2048/512 STFT of the band signal. Callers report 0 for silent bands
//! without computing the spectrum; flatness of an all-floor spectrum is 1.
//! Energy is derived from the band's integrated STFT energy instead of the
//! time signal.

use crate::signal::finite_or;
use mixcheck_core::{DB_FLOOR, EPSILON};
use mixcheck_dsp::{Stft, StftConfig};

/// FFT size for feature extraction
pub const FEATURE_N_FFT: usize = 2048;

/// Hop size for feature extraction
pub const FEATURE_HOP: usize = 512;

/// Fraction of spectral magnitude below the roll-off frequency
pub const ROLLOFF_PERCENT: f64 = 0.85;

/// Floor applied to power values before the flatness logarithm
const FLATNESS_AMIN: f64 = 1e-10;

/// Magnitude spectrogram used by the spectral shape metrics
#[derive(Debug, Clone)]
pub struct FeatureSpectrum {
    /// Magnitudes, frame-major
    pub magnitudes: Vec<Vec<f64>>,
    /// Centre frequency of each bin in Hz
    pub frequencies: Vec<f64>,
}

impl FeatureSpectrum {
    /// Compute the 2048/512 magnitude spectrogram of `samples`
    pub fn compute(samples: &[f32], sample_rate: u32) -> Self {
        let stft = Stft::new(StftConfig::analysis(FEATURE_N_FFT, FEATURE_HOP));
        Self {
            magnitudes: stft.forward(samples).magnitudes(),
            frequencies: stft.frequencies(sample_rate),
        }
    }

    pub fn num_frames(&self) -> usize {
        self.magnitudes.len()
    }

    /// Mean over frames of the magnitude-weighted mean frequency
    pub fn centroid_hz(&self) -> f64 {
        let per_frame: Vec<f64> = self
            .magnitudes
            .iter()
            .map(|frame| {
                let total: f64 = frame.iter().sum();
                if total < f64::MIN_POSITIVE {
                    return 0.0;
                }
                frame
                    .iter()
                    .zip(&self.frequencies)
                    .map(|(m, f)| m * f)
                    .sum::<f64>()
                    / total
            })
            .collect();
        finite_or(crate::signal::mean(&per_frame), 0.0)
    }

    /// Mean over non-silent frames of the frequency below which
    /// `roll_percent` of the magnitude lies
    pub fn rolloff_hz(&self, roll_percent: f64) -> f64 {
        let per_frame: Vec<f64> = self
            .magnitudes
            .iter()
            .filter_map(|frame| {
                let total: f64 = frame.iter().sum();
                if total < EPSILON {
                    return None;
                }
                let threshold = roll_percent * total;
                let mut cumulative = 0.0;
                frame
                    .iter()
                    .zip(&self.frequencies)
                    .find(|(m, _)| {
                        cumulative += *m;
                        cumulative >= threshold
                    })
                    .map(|(_, &f)| f)
            })
            .collect();
        if per_frame.is_empty() {
            return 0.0;
        }
        finite_or(crate::signal::mean(&per_frame), 0.0)
    }

    /// Mean over frames of geometric / arithmetic mean of the power spectrum
    pub fn flatness(&self) -> f64 {
        let per_frame: Vec<f64> = self
            .magnitudes
            .iter()
            .map(|frame| {
                let n = frame.len() as f64;
                let (log_sum, sum) = frame.iter().fold((0.0, 0.0), |(log_sum, sum), m| {
                    let power = (m * m).max(FLATNESS_AMIN);
                    (log_sum + power.ln(), sum + power)
                });
                (log_sum / n).exp() / (sum / n)
            })
            .collect();
        finite_or(crate::signal::mean(&per_frame), 0.0)
    }
}

/// Band energy as mean-square power in dB: `10·log10(energy / frames)`
///
/// `energy` is the sum of squared STFT magnitudes over the band's bins and
/// all frames, so the value depends on the analysis window configuration.
pub fn energy_db_from_energy(energy: f64, num_frames: usize) -> f64 {
    if energy < EPSILON {
        return DB_FLOOR;
    }
    let mean_power = energy / num_frames.max(1) as f64;
    finite_or(10.0 * mean_power.max(EPSILON).log10(), DB_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    /// Tone with 20 ms raised-cosine fades so the edge frames stay narrowband
    fn sine(freq: f32, len: usize) -> Vec<f32> {
        let fade = 960;
        (0..len)
            .map(|i| {
                let edge = i.min(len - 1 - i);
                let gain = if edge < fade {
                    0.5 - 0.5 * (PI * edge as f32 / fade as f32).cos()
                } else {
                    1.0
                };
                gain * 0.5 * (2.0 * PI * freq * i as f32 / 48_000.0).sin()
            })
            .collect()
    }

    fn noise(len: usize) -> Vec<f32> {
        let mut state = 12_345u32;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                ((state >> 8) as f32 / (1u32 << 24) as f32) * 2.0 - 1.0
            })
            .collect()
    }

    fn spectrum(samples: &[f32]) -> FeatureSpectrum {
        FeatureSpectrum::compute(samples, 48_000)
    }

    #[test]
    fn centroid_tracks_a_pure_tone() {
        let centroid = spectrum(&sine(1000.0, 48_000)).centroid_hz();
        assert!((centroid - 1000.0).abs() < 100.0, "centroid {}", centroid);
    }

    #[test]
    fn rolloff_of_a_tone_sits_near_the_tone() {
        let rolloff = spectrum(&sine(3000.0, 48_000)).rolloff_hz(ROLLOFF_PERCENT);
        assert!((rolloff - 3000.0).abs() < 150.0, "rolloff {}", rolloff);
    }

    #[test]
    fn noise_is_flatter_than_a_tone() {
        let tone = spectrum(&sine(1000.0, 48_000)).flatness();
        let white = spectrum(&noise(48_000)).flatness();
        assert!(tone < 0.01, "tone flatness {}", tone);
        assert!(white > 0.3, "noise flatness {}", white);
        assert!(white <= 1.0);
    }

    #[test]
    fn silent_spectrum_has_no_centroid_or_rolloff() {
        let silent = spectrum(&[0.0f32; 4096]);
        assert!(silent.num_frames() > 0);
        assert_eq!(silent.centroid_hz(), 0.0);
        assert_eq!(silent.rolloff_hz(ROLLOFF_PERCENT), 0.0);
    }

    #[test]
    fn energy_db_is_mean_square() {
        assert_eq!(energy_db_from_energy(0.0, 10), -120.0);
        assert!((energy_db_from_energy(100.0, 10) - 10.0).abs() < 1e-12);
        // Zero frames is treated as one
        assert!((energy_db_from_energy(10.0, 0) - 10.0).abs() < 1e-12);
    }
}
