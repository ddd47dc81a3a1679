//! Band integration over a spectral frame

use crate::transform::SpectralFrame;
use mixcheck_core::{FrequencyBand, FREQUENCY_BANDS};

/// Spectral summary of one band
#[derive(Debug, Clone, PartialEq)]
pub struct BandSummary {
    pub band: FrequencyBand,
    /// Bins assigned to this band; never empty
    pub bin_indices: Vec<usize>,
    /// Sum of squared magnitudes over the band's bins and all frames
    pub energy: f64,
    /// Mean magnitude across the band's bins, one value per frame
    pub time_series: Vec<f64>,
}

impl BandSummary {
    pub fn num_frames(&self) -> usize {
        self.time_series.len()
    }
}

/// Indices of bins with `low_hz <= f < high_hz`
pub fn bin_indices_for_range(frequencies: &[f64], low_hz: f64, high_hz: f64) -> Vec<usize> {
    frequencies
        .iter()
        .enumerate()
        .filter(|(_, &f)| f >= low_hz && f < high_hz)
        .map(|(i, _)| i)
        .collect()
}

/// Bins for `band`, falling back to the single bin nearest the band centre
/// when the range selects nothing at this resolution
pub fn band_bin_indices(frequencies: &[f64], band: &FrequencyBand) -> Vec<usize> {
    let bins = bin_indices_for_range(frequencies, band.low_hz, band.high_hz);
    if !bins.is_empty() {
        return bins;
    }

    let center = band.center_hz();
    let nearest = frequencies
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - center).abs().total_cmp(&(*b - center).abs()))
        .map_or(0, |(i, _)| i);
    tracing::debug!(band = band.name, bin = nearest, "Band empty at this resolution, using nearest bin");
    vec![nearest]
}

/// Aggregates a spectral frame into per-band summaries
#[derive(Debug, Clone)]
pub struct BandIntegrator {
    bands: Vec<FrequencyBand>,
}

impl Default for BandIntegrator {
    fn default() -> Self {
        Self::new(FREQUENCY_BANDS.to_vec())
    }
}

impl BandIntegrator {
    /// Integrator over a custom band table; output follows this order
    pub fn new(bands: Vec<FrequencyBand>) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> &[FrequencyBand] {
        &self.bands
    }

    /// One summary per configured band, in configured order
    pub fn integrate(&self, frame: &SpectralFrame) -> Vec<BandSummary> {
        let num_frames = frame.num_frames();
        self.bands
            .iter()
            .map(|band| {
                let bin_indices = band_bin_indices(&frame.frequencies, band);

                let energy = bin_indices
                    .iter()
                    .flat_map(|&bin| frame.magnitude[bin].iter())
                    .map(|m| m * m)
                    .sum();

                let count = bin_indices.len() as f64;
                let mut time_series = vec![0.0; num_frames];
                for &bin in &bin_indices {
                    for (acc, m) in time_series.iter_mut().zip(&frame.magnitude[bin]) {
                        *acc += m;
                    }
                }
                for value in &mut time_series {
                    *value /= count;
                }

                BandSummary {
                    band: *band,
                    bin_indices,
                    energy,
                    time_series,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::SpectralTransform;
    use std::f64::consts::PI;

    #[test]
    fn range_is_half_open() {
        let freqs = [0.0, 100.0, 200.0, 300.0];
        assert_eq!(bin_indices_for_range(&freqs, 100.0, 300.0), vec![1, 2]);
    }

    #[test]
    fn empty_band_falls_back_to_nearest_bin() {
        let freqs = [0.0, 1000.0, 2000.0];
        let band = FrequencyBand::new("narrow", 1100.0, 1200.0);
        assert_eq!(band_bin_indices(&freqs, &band), vec![1]);
    }

    #[test]
    fn energy_lands_in_the_right_band() {
        let signal: Vec<f32> = (0..48_000)
            .map(|i| (0.5 * (2.0 * PI * 1000.0 * i as f64 / 48_000.0).sin()) as f32)
            .collect();
        let frame = SpectralTransform::new().forward(&signal, 48_000);
        let summaries = BandIntegrator::default().integrate(&frame);

        let names: Vec<&str> = summaries.iter().map(|s| s.band.name).collect();
        assert_eq!(names, ["low", "low_mid", "mid", "high_mid", "high"]);

        let mid = &summaries[2];
        for (i, other) in summaries.iter().enumerate() {
            if i != 2 {
                assert!(mid.energy > other.energy * 1e3, "{} too loud", other.band.name);
            }
        }
        assert_eq!(mid.num_frames(), frame.num_frames());
    }

    #[test]
    fn time_series_is_mean_magnitude() {
        let frame = SpectralFrame {
            magnitude: vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
            phase: vec![vec![0.0; 2]; 3],
            frequencies: vec![0.0, 100.0, 300.0],
            sample_rate: 48_000,
            window_size: 4,
            hop_size: 1,
            signal_len: 2,
        };
        let integrator = BandIntegrator::new(vec![FrequencyBand::new("a", 50.0, 400.0)]);
        let summary = &integrator.integrate(&frame)[0];
        assert_eq!(summary.bin_indices, vec![1, 2]);
        assert_eq!(summary.time_series, vec![4.0, 5.0]);
        assert_eq!(summary.energy, 9.0 + 16.0 + 25.0 + 36.0);
    }
}
