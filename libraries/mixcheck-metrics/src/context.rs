//! Per-band analysis context
//!
//! A [`BandContext`] owns everything the metric families need for one band
//! and caches the expensive intermediate results. Harmonic-percussive
//! separation and the feature spectrogram are computed on first use and
//! shared by every metric that reads them.

use crate::hpss::{separate, Separation};
use crate::signal::below_energy_floor;
use crate::spectral::FeatureSpectrum;
use mixcheck_core::FrequencyBand;
use std::sync::OnceLock;

/// Band-limited signals plus lazily computed shared analyses
#[derive(Debug)]
pub struct BandContext {
    band: FrequencyBand,
    samples: Vec<f32>,
    stereo: Option<(Vec<f32>, Vec<f32>)>,
    sample_rate: u32,
    energy: f64,
    num_frames: usize,
    separation: OnceLock<Separation>,
    spectrum: OnceLock<FeatureSpectrum>,
}

impl BandContext {
    /// Create a context for a mono band signal
    ///
    /// `energy` and `num_frames` come from the band's integrated STFT summary.
    pub fn new(
        band: FrequencyBand,
        samples: Vec<f32>,
        sample_rate: u32,
        energy: f64,
        num_frames: usize,
    ) -> Self {
        Self {
            band,
            samples,
            stereo: None,
            sample_rate,
            energy,
            num_frames,
            separation: OnceLock::new(),
            spectrum: OnceLock::new(),
        }
    }

    /// Attach band-limited left and right channels
    #[must_use]
    pub fn with_stereo(mut self, left: Vec<f32>, right: Vec<f32>) -> Self {
        self.stereo = Some((left, right));
        self
    }

    pub fn band(&self) -> &FrequencyBand {
        &self.band
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Left and right band signals, `None` for mono sources
    pub fn stereo(&self) -> Option<(&[f32], &[f32])> {
        self.stereo
            .as_ref()
            .map(|(l, r)| (l.as_slice(), r.as_slice()))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Integrated STFT energy of the band
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// STFT frame count the energy was integrated over
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Harmonic-percussive separation, computed at most once
    ///
    /// Signals below the energy floor get an empty separation without
    /// running the filter.
    pub fn separation(&self) -> &Separation {
        self.separation.get_or_init(|| {
            if below_energy_floor(&self.samples) {
                return Separation::default();
            }
            tracing::debug!(band = self.band.name, "Running harmonic-percussive separation");
            separate(&self.samples)
        })
    }

    /// 2048/512 magnitude spectrogram, computed at most once
    pub fn feature_spectrum(&self) -> &FeatureSpectrum {
        self.spectrum
            .get_or_init(|| FeatureSpectrum::compute(&self.samples, self.sample_rate))
    }

    /// Whether the separation has been computed yet
    pub fn separation_computed(&self) -> bool {
        self.separation.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixcheck_core::FREQUENCY_BANDS;

    #[test]
    fn separation_is_cached() {
        let samples: Vec<f32> = (0..8192).map(|i| (i as f32 * 0.1).sin() * 0.3).collect();
        let ctx = BandContext::new(FREQUENCY_BANDS[2], samples, 48_000, 1.0, 9);
        assert!(!ctx.separation_computed());
        let first: *const Separation = ctx.separation();
        let second: *const Separation = ctx.separation();
        assert!(ctx.separation_computed());
        assert_eq!(first, second);
    }

    #[test]
    fn stereo_is_optional() {
        let ctx = BandContext::new(FREQUENCY_BANDS[0], vec![0.0; 16], 44_100, 0.0, 1);
        assert!(ctx.stereo().is_none());
        let ctx = ctx.with_stereo(vec![0.1; 16], vec![0.2; 16]);
        let (l, r) = ctx.stereo().unwrap();
        assert_eq!(l.len(), 16);
        assert_eq!(r[0], 0.2);
        assert_eq!(ctx.band().name, "low");
    }

    #[test]
    fn faint_band_skips_separation() {
        let ctx = BandContext::new(FREQUENCY_BANDS[1], vec![1e-8; 8192], 48_000, 0.0, 9);
        assert!(ctx.separation().is_empty());
    }
}
