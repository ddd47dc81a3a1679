//! Fixed-resolution spectral transform used for band decomposition
//!
//! Window 4096, hop 1024 (75% overlap), periodic Hann, amplitude-scaled.
//! These parameters are part of the measurement definition and are not
//! configurable per call.

use crate::error::Result;
use crate::stft::{Spectrogram, Stft, StftConfig};
use rustfft::num_complex::Complex;

/// Window (and FFT) length in samples
pub const WINDOW_SIZE: usize = 4096;

/// Hop between successive frames in samples
pub const HOP_SIZE: usize = 1024;

/// Magnitude/phase view of a signal, `[bin][frame]`
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralFrame {
    /// Magnitude per bin per frame
    pub magnitude: Vec<Vec<f64>>,
    /// Phase in radians per bin per frame
    pub phase: Vec<Vec<f64>>,
    /// Centre frequency of each bin in Hz
    pub frequencies: Vec<f64>,
    pub sample_rate: u32,
    pub window_size: usize,
    pub hop_size: usize,
    /// Length of the signal that produced this frame, for exact-length inversion
    pub signal_len: usize,
}

impl SpectralFrame {
    pub fn num_bins(&self) -> usize {
        self.magnitude.len()
    }

    pub fn num_frames(&self) -> usize {
        self.magnitude.first().map_or(0, Vec::len)
    }

    /// Complex spectrum keeping only `bins`; every other bin is zero
    pub fn masked_spectrogram(&self, bins: &[usize]) -> Spectrogram {
        let mut spectrogram = Spectrogram::zeros(self.num_bins(), self.num_frames());
        for &bin in bins {
            let (mags, phases) = (&self.magnitude[bin], &self.phase[bin]);
            for (t, (&mag, &phase)) in mags.iter().zip(phases).enumerate() {
                spectrogram.frame_mut(t)[bin] = Complex::from_polar(mag, phase);
            }
        }
        spectrogram
    }
}

/// The band-decomposition STFT
#[derive(Debug, Clone)]
pub struct SpectralTransform {
    stft: Stft,
}

impl Default for SpectralTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralTransform {
    pub fn new() -> Self {
        Self {
            stft: Stft::new(StftConfig::spectrum(WINDOW_SIZE, HOP_SIZE)),
        }
    }

    /// Frequency spacing between bins in Hz
    pub fn frequency_resolution(sample_rate: u32) -> f64 {
        f64::from(sample_rate) / WINDOW_SIZE as f64
    }

    /// Decompose a mono signal into magnitude and phase grids
    pub fn forward(&self, signal: &[f32], sample_rate: u32) -> SpectralFrame {
        let spectrogram = self.stft.forward(signal);
        let num_bins = spectrogram.num_bins();
        let num_frames = spectrogram.num_frames();

        let mut magnitude = vec![Vec::with_capacity(num_frames); num_bins];
        let mut phase = vec![Vec::with_capacity(num_frames); num_bins];
        for frame in spectrogram.frames() {
            for (bin, c) in frame.iter().enumerate() {
                magnitude[bin].push(c.norm());
                phase[bin].push(c.arg());
            }
        }

        tracing::debug!(
            bins = num_bins,
            frames = num_frames,
            samples = signal.len(),
            "Computed band-decomposition STFT"
        );

        SpectralFrame {
            magnitude,
            phase,
            frequencies: self.stft.frequencies(sample_rate),
            sample_rate,
            window_size: WINDOW_SIZE,
            hop_size: HOP_SIZE,
            signal_len: signal.len(),
        }
    }

    /// Invert a (possibly masked) spectrogram back to `length` samples
    pub fn inverse(&self, spectrogram: &Spectrogram, length: usize) -> Result<Vec<f32>> {
        self.stft.inverse(spectrogram, length)
    }

    /// Invert a spectral frame unchanged
    pub fn inverse_frame(&self, frame: &SpectralFrame) -> Result<Vec<f32>> {
        let all_bins: Vec<usize> = (0..frame.num_bins()).collect();
        self.inverse(&frame.masked_spectrogram(&all_bins), frame.signal_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn frequency_axis_matches_resolution() {
        let transform = SpectralTransform::new();
        let frame = transform.forward(&[0.0; 1000], 48_000);
        assert_eq!(frame.num_bins(), 2049);
        assert!((frame.frequencies[1] - 11.71875).abs() < 1e-9);
        assert_eq!(frame.frequencies[2048], 24_000.0);
        assert_eq!(SpectralTransform::frequency_resolution(44_100), 44_100.0 / 4096.0);
    }

    #[test]
    fn silence_has_zero_magnitude() {
        let frame = SpectralTransform::new().forward(&[0.0; 8192], 48_000);
        assert!(frame.magnitude.iter().flatten().all(|&m| m == 0.0));
    }

    #[test]
    fn polar_round_trip_reconstructs() {
        let transform = SpectralTransform::new();
        let signal: Vec<f32> = (0..20_000)
            .map(|i| (0.4 * (2.0 * PI * 523.0 * i as f64 / 44_100.0).sin()) as f32)
            .collect();
        let frame = transform.forward(&signal, 44_100);
        let back = transform.inverse_frame(&frame).unwrap();
        assert_eq!(back.len(), signal.len());
        for (a, b) in signal.iter().zip(&back) {
            assert!((a - b).abs() < 1e-4);
        }
    }
}
