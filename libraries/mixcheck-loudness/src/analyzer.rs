//! EBU R128 loudness analysis
//!
//! Thin wrapper around the `ebur128` crate (a port of libebur128), which is
//! the primary engine for integrated loudness and loudness range.
//! It measures:
//! - Integrated loudness (LUFS), gated per BS.1770-4
//! - Loudness range (LRA) per EBU Tech 3342
//! - True peak per channel (4x polyphase oversampling)

use crate::error::{LoudnessError, Result};
use ebur128::{EbuR128, Mode};

/// Supported sample rate range of the engine
pub(crate) const SAMPLE_RATE_RANGE: std::ops::RangeInclusive<u32> = 8_000..=384_000;

/// Raw measurements from one pass of the primary engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimaryMeasurement {
    /// `None` when no gating block exceeded the absolute gate
    pub integrated_lufs: Option<f64>,
    /// `None` when integrated loudness is undefined or the engine failed
    pub loudness_range_lu: Option<f64>,
}

/// EBU R128 loudness analyzer over planar channels
///
/// # Example
///
/// ```ignore
/// use mixcheck_loudness::LoudnessAnalyzer;
///
/// let mut analyzer = LoudnessAnalyzer::new(48_000, 2)?;
/// analyzer.add_planar(&[&left, &right])?;
/// let measurement = analyzer.finalize()?;
/// println!("Integrated loudness: {:?} LUFS", measurement.integrated_lufs);
/// ```
pub struct LoudnessAnalyzer {
    ebur128: EbuR128,
    channels: usize,
    frames_processed: usize,
}

impl LoudnessAnalyzer {
    /// Create a new analyzer
    ///
    /// # Errors
    /// Returns error if sample rate or channel count is invalid
    pub fn new(sample_rate: u32, channels: usize) -> Result<Self> {
        Self::with_mode(sample_rate, channels, Mode::I | Mode::LRA)
    }

    pub(crate) fn with_mode(sample_rate: u32, channels: usize, mode: Mode) -> Result<Self> {
        validate_format(sample_rate, channels)?;
        let ebur128 = EbuR128::new(channels as u32, sample_rate, mode)?;
        Ok(Self {
            ebur128,
            channels,
            frames_processed: 0,
        })
    }

    /// Add audio as one slice per channel
    ///
    /// All slices must have the same length.
    pub fn add_planar(&mut self, channels: &[&[f32]]) -> Result<()> {
        if channels.len() != self.channels {
            return Err(LoudnessError::InvalidChannelCount(channels.len()));
        }
        let frames = channels.first().map_or(0, |c| c.len());
        if channels.iter().any(|c| c.len() != frames) {
            return Err(LoudnessError::AnalysisError(
                "Channel lengths differ".to_string(),
            ));
        }
        if frames == 0 {
            return Ok(());
        }

        self.ebur128.add_frames_planar_f32(channels)?;
        self.frames_processed += frames;
        Ok(())
    }

    /// Number of frames fed so far
    pub fn frames_processed(&self) -> usize {
        self.frames_processed
    }

    /// Maximum per-channel true peak, linear
    pub(crate) fn max_true_peak(&self) -> Result<f64> {
        (0..self.channels as u32).try_fold(0.0f64, |acc, ch| {
            Ok(acc.max(self.ebur128.true_peak(ch)?))
        })
    }

    /// Finish the measurement
    ///
    /// # Errors
    /// Returns [`LoudnessError::NoSamples`] when nothing was added
    pub fn finalize(&self) -> Result<PrimaryMeasurement> {
        if self.frames_processed == 0 {
            return Err(LoudnessError::NoSamples);
        }

        // ebur128 reports -inf when every block is below the absolute gate
        let integrated_lufs = Some(self.ebur128.loudness_global()?).filter(|l| l.is_finite());

        let loudness_range_lu = if integrated_lufs.is_some() {
            match self.ebur128.loudness_range() {
                Ok(lra) if lra.is_finite() => Some(lra),
                Ok(_) => None,
                Err(err) => {
                    tracing::debug!(error = ?err, "Loudness range unavailable");
                    None
                }
            }
        } else {
            None
        };

        Ok(PrimaryMeasurement {
            integrated_lufs,
            loudness_range_lu,
        })
    }
}

pub(crate) fn validate_format(sample_rate: u32, channels: usize) -> Result<()> {
    if !SAMPLE_RATE_RANGE.contains(&sample_rate) {
        return Err(LoudnessError::InvalidSampleRate(sample_rate));
    }
    if !(1..=2).contains(&channels) {
        return Err(LoudnessError::InvalidChannelCount(channels));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(amplitude: f32, secs: f32) -> Vec<f32> {
        let len = (48_000.0 * secs) as usize;
        (0..len)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * 997.0 * i as f32 / 48_000.0).sin())
            .collect()
    }

    #[test]
    fn test_analyzer_creation() {
        assert!(LoudnessAnalyzer::new(44_100, 2).is_ok());
        assert!(LoudnessAnalyzer::new(48_000, 1).is_ok());

        assert!(matches!(
            LoudnessAnalyzer::new(100, 2),
            Err(LoudnessError::InvalidSampleRate(100))
        ));
        assert!(matches!(
            LoudnessAnalyzer::new(48_000, 0),
            Err(LoudnessError::InvalidChannelCount(0))
        ));
        assert!(matches!(
            LoudnessAnalyzer::new(48_000, 6),
            Err(LoudnessError::InvalidChannelCount(6))
        ));
    }

    #[test]
    fn test_silence_is_undefined() {
        let mut analyzer = LoudnessAnalyzer::new(48_000, 1).unwrap();
        analyzer.add_planar(&[&[0.0; 48_000]]).unwrap();
        let m = analyzer.finalize().unwrap();
        assert_eq!(m.integrated_lufs, None);
        assert_eq!(m.loudness_range_lu, None);
    }

    #[test]
    fn test_full_scale_reference_tone() {
        let tone = sine(1.0, 5.0);
        let mut analyzer = LoudnessAnalyzer::new(48_000, 1).unwrap();
        analyzer.add_planar(&[&tone]).unwrap();
        let m = analyzer.finalize().unwrap();
        let lufs = m.integrated_lufs.unwrap();
        assert!((lufs + 3.01).abs() < 0.05, "Expected -3.01 LUFS, got {:.3}", lufs);
        assert!(m.loudness_range_lu.unwrap() < 0.1);
    }

    #[test]
    fn test_no_samples_error() {
        let analyzer = LoudnessAnalyzer::new(48_000, 2).unwrap();
        assert!(matches!(analyzer.finalize(), Err(LoudnessError::NoSamples)));
    }

    #[test]
    fn test_mismatched_channels() {
        let mut analyzer = LoudnessAnalyzer::new(48_000, 2).unwrap();
        assert!(analyzer.add_planar(&[&[0.1; 10]]).is_err());
        assert!(analyzer.add_planar(&[&[0.1; 10], &[0.1; 9]]).is_err());
        assert_eq!(analyzer.frames_processed(), 0);
    }
}
