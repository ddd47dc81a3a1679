//! True Peak measurement strategies (ITU-R BS.1770-4 Annex 2)
//!
//! Both strategies oversample each channel by 4 and report the largest
//! absolute value across channels in dBTP. Digital silence floors to -120.

use crate::analyzer::{validate_format, LoudnessAnalyzer};
use crate::error::{LoudnessError, Result};
use ebur128::Mode;
use mixcheck_core::DB_FLOOR;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::fmt;

/// Oversampling factor required by BS.1770-4 below 96 kHz
pub const OVERSAMPLING_FACTOR: usize = 4;

/// Input frames per resampler call
const CHUNK_SIZE: usize = 4096;

/// A way of measuring inter-sample peaks
pub trait TruePeakStrategy: fmt::Debug + Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Maximum true peak over all channels, in dBTP
    fn measure(&self, channels: &[&[f32]], sample_rate: u32) -> Result<f64>;
}

/// Convert a linear peak to dBTP, flooring silence at -120
pub fn peak_to_dbtp(peak: f64) -> f64 {
    if peak <= 0.0 || !peak.is_finite() {
        return DB_FLOOR;
    }
    (20.0 * peak.log10()).max(DB_FLOOR)
}

/// The loudness engine's own polyphase true-peak detector
///
/// Falls back to [`OversampledTruePeak`] if the engine fails.
#[derive(Debug, Default)]
pub struct ReferenceTruePeak {
    fallback: OversampledTruePeak,
}

impl ReferenceTruePeak {
    pub fn new() -> Self {
        Self::default()
    }

    fn measure_reference(channels: &[&[f32]], sample_rate: u32) -> Result<f64> {
        let mut analyzer = LoudnessAnalyzer::with_mode(sample_rate, channels.len(), Mode::TRUE_PEAK)?;
        analyzer.add_planar(channels)?;
        analyzer.max_true_peak()
    }
}

impl TruePeakStrategy for ReferenceTruePeak {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn measure(&self, channels: &[&[f32]], sample_rate: u32) -> Result<f64> {
        match Self::measure_reference(channels, sample_rate) {
            Ok(peak) => Ok(peak_to_dbtp(peak)),
            Err(err) => {
                tracing::debug!(error = %err, "Reference true peak failed, falling back to oversampling");
                self.fallback.measure(channels, sample_rate)
            }
        }
    }
}

/// 4x windowed-sinc upsampling followed by a sample peak search
#[derive(Debug, Clone, Default)]
pub struct OversampledTruePeak;

impl OversampledTruePeak {
    pub fn new() -> Self {
        Self
    }

    fn interpolation_params() -> SincInterpolationParameters {
        SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        }
    }

    /// Peak of one channel after 4x upsampling, linear
    fn channel_peak(samples: &[f32]) -> Result<f64> {
        let mut resampler = SincFixedIn::<f64>::new(
            OVERSAMPLING_FACTOR as f64,
            1.0,
            Self::interpolation_params(),
            CHUNK_SIZE,
            1,
        )
        .map_err(|e| LoudnessError::ResampleError(format!("SincFixedIn creation failed: {}", e)))?;

        // Trailing zeros flush the filter delay line
        let padded_len = (samples.len() / CHUNK_SIZE + 2) * CHUNK_SIZE;
        let mut input = vec![0.0f64; padded_len];
        for (dst, &src) in input.iter_mut().zip(samples) {
            *dst = f64::from(src);
        }

        let mut peak = 0.0f64;
        for chunk in input.chunks_exact(CHUNK_SIZE) {
            let output = resampler
                .process(&[chunk], None)
                .map_err(|e| LoudnessError::ResampleError(e.to_string()))?;
            peak = output
                .iter()
                .flatten()
                .fold(peak, |acc, &s| acc.max(s.abs()));
        }
        Ok(peak)
    }
}

impl TruePeakStrategy for OversampledTruePeak {
    fn name(&self) -> &'static str {
        "oversampled"
    }

    fn measure(&self, channels: &[&[f32]], sample_rate: u32) -> Result<f64> {
        validate_format(sample_rate, channels.len())?;
        let peak = channels
            .iter()
            .map(|ch| Self::channel_peak(ch))
            .try_fold(0.0f64, |acc, peak| peak.map(|p| acc.max(p)))?;
        Ok(peak_to_dbtp(peak))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / 48_000.0).sin())
            .collect()
    }

    #[test]
    fn silence_floors() {
        let silent = vec![0.0f32; 48_000];
        assert_eq!(ReferenceTruePeak::new().measure(&[&silent], 48_000).unwrap(), -120.0);
        assert_eq!(OversampledTruePeak::new().measure(&[&silent], 48_000).unwrap(), -120.0);
        assert_eq!(peak_to_dbtp(0.0), -120.0);
        assert_eq!(peak_to_dbtp(1e-9), -120.0);
    }

    #[test]
    fn strategies_agree_on_a_sine() {
        let tone = sine(997.0, 0.5, 48_000);
        let reference = ReferenceTruePeak::new().measure(&[&tone], 48_000).unwrap();
        let oversampled = OversampledTruePeak::new().measure(&[&tone], 48_000).unwrap();
        let expected = 20.0 * 0.5f64.log10();
        assert!((reference - expected).abs() < 0.2, "reference {}", reference);
        assert!((oversampled - expected).abs() < 0.2, "oversampled {}", oversampled);
    }

    #[test]
    fn inter_sample_peak_exceeds_sample_peak() {
        // fs/4 sine sampled at 45 degrees: every sample is at 0.707 of the crest
        let tone: Vec<f32> = (0..48_000)
            .map(|i| (std::f32::consts::FRAC_PI_2 * i as f32 + std::f32::consts::FRAC_PI_4).sin())
            .collect();
        let sample_peak_db = 20.0 * f64::from(std::f32::consts::FRAC_1_SQRT_2).log10();
        let tp = OversampledTruePeak::new().measure(&[&tone], 48_000).unwrap();
        assert!(tp > sample_peak_db + 2.5, "true peak {}", tp);
    }

    #[test]
    fn takes_the_loudest_channel() {
        let quiet = sine(997.0, 0.1, 24_000);
        let loud = sine(997.0, 0.8, 24_000);
        let tp = OversampledTruePeak::new().measure(&[&quiet, &loud], 48_000).unwrap();
        assert!((tp - 20.0 * 0.8f64.log10()).abs() < 0.2);
    }

    #[test]
    fn rejects_bad_format() {
        assert!(OversampledTruePeak::new().measure(&[], 48_000).is_err());
        assert!(OversampledTruePeak::new().measure(&[&[0.1]], 1_000).is_err());
    }
}
