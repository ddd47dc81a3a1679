//! Band-limited time-domain reconstruction
//!
//! A band is isolated by zeroing every bin outside it and inverting the
//! transform. Stereo channels use their own spectra computed with the same
//! parameters so the left/right band signals stay sample-aligned.

use crate::bands::{band_bin_indices, BandSummary};
use crate::error::{DspError, Result};
use crate::transform::{SpectralFrame, SpectralTransform};
use mixcheck_core::FrequencyBand;

/// Left and right spectra of a stereo source
#[derive(Debug, Clone)]
pub struct StereoSpectra {
    pub left: SpectralFrame,
    pub right: SpectralFrame,
}

impl StereoSpectra {
    /// Transform untouched stereo frames channel by channel
    pub fn from_frames(transform: &SpectralTransform, frames: &[[f32; 2]], sample_rate: u32) -> Self {
        let (left, right): (Vec<f32>, Vec<f32>) = frames.iter().map(|[l, r]| (*l, *r)).unzip();
        Self {
            left: transform.forward(&left, sample_rate),
            right: transform.forward(&right, sample_rate),
        }
    }
}

/// Rebuilds band-limited signals from spectra
#[derive(Debug, Clone, Copy)]
pub struct BandReconstructor<'a> {
    transform: &'a SpectralTransform,
}

impl<'a> BandReconstructor<'a> {
    pub fn new(transform: &'a SpectralTransform) -> Self {
        Self { transform }
    }

    /// Time-domain mono signal containing only the band's bins
    pub fn reconstruct(&self, frame: &SpectralFrame, summary: &BandSummary) -> Result<Vec<f32>> {
        self.reconstruct_bins(frame, &summary.bin_indices)
    }

    /// Left and right band signals for a stereo source
    pub fn reconstruct_stereo(
        &self,
        spectra: &StereoSpectra,
        band: &FrequencyBand,
    ) -> Result<(Vec<f32>, Vec<f32>)> {
        let bins = band_bin_indices(&spectra.left.frequencies, band);
        let left = self.reconstruct_bins(&spectra.left, &bins)?;
        let right = self.reconstruct_bins(&spectra.right, &bins)?;
        Ok((left, right))
    }

    fn reconstruct_bins(&self, frame: &SpectralFrame, bins: &[usize]) -> Result<Vec<f32>> {
        let num_bins = frame.num_bins();
        if let Some(&index) = bins.iter().find(|&&b| b >= num_bins) {
            return Err(DspError::BinOutOfRange { index, num_bins });
        }
        let spectrogram = frame.masked_spectrogram(bins);
        self.transform.inverse(&spectrogram, frame.signal_len)
    }
}
