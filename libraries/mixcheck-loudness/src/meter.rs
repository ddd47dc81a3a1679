//! Standards-compliant overall loudness metering
//!
//! Integrated loudness and loudness range come from the primary engine.
//! True Peak and the cross-validation engine are strategies picked once from
//! [`LoudnessSettings`]. Untouched stereo frames are metered when present so
//! inter-sample peaks and channel summation follow BS.1770-4 multichannel
//! rules instead of a mono downmix.

use crate::analyzer::LoudnessAnalyzer;
use crate::cross_check::{IndependentBs1770, LoudnessCrossCheck, PrimaryRecheck};
use crate::error::{LoudnessError, Result};
use crate::true_peak::{OversampledTruePeak, ReferenceTruePeak, TruePeakStrategy};
use mixcheck_core::{
    AudioBuffer, CrossCheckBackend, LoudnessSettings, OverallLoudnessRecord, TruePeakBackend,
};

/// Overall loudness meter with configurable True Peak and cross-check engines
#[derive(Debug)]
pub struct LoudnessStandardsMeter {
    true_peak: Box<dyn TruePeakStrategy>,
    cross_check: Box<dyn LoudnessCrossCheck>,
    cross_validation_threshold_lu: f64,
}

impl Default for LoudnessStandardsMeter {
    fn default() -> Self {
        Self::new(&LoudnessSettings::default())
    }
}

impl LoudnessStandardsMeter {
    /// Build the meter, selecting strategies from `settings`
    pub fn new(settings: &LoudnessSettings) -> Self {
        let true_peak: Box<dyn TruePeakStrategy> = match settings.true_peak_backend {
            TruePeakBackend::Reference => Box::new(ReferenceTruePeak::new()),
            TruePeakBackend::Oversampled => Box::new(OversampledTruePeak::new()),
        };
        let cross_check: Box<dyn LoudnessCrossCheck> = match settings.cross_check_backend {
            CrossCheckBackend::Independent => Box::new(IndependentBs1770),
            CrossCheckBackend::Recheck => Box::new(PrimaryRecheck),
        };
        Self::with_strategies(true_peak, cross_check, settings.cross_validation_threshold_lu)
    }

    /// Build the meter from explicit strategies
    pub fn with_strategies(
        true_peak: Box<dyn TruePeakStrategy>,
        cross_check: Box<dyn LoudnessCrossCheck>,
        cross_validation_threshold_lu: f64,
    ) -> Self {
        tracing::debug!(
            true_peak = true_peak.name(),
            cross_check = cross_check.name(),
            "Loudness meter configured"
        );
        Self {
            true_peak,
            cross_check,
            cross_validation_threshold_lu,
        }
    }

    /// Meter a buffer, preferring its untouched stereo frames
    pub fn measure(&self, buffer: &AudioBuffer) -> Result<OverallLoudnessRecord> {
        match buffer.split_channels() {
            Some((left, right)) => self.measure_channels(&[&left, &right], buffer.sample_rate()),
            None => self.measure_channels(&[buffer.samples()], buffer.sample_rate()),
        }
    }

    /// Meter planar channels (one or two slices of equal length)
    pub fn measure_channels(
        &self,
        channels: &[&[f32]],
        sample_rate: u32,
    ) -> Result<OverallLoudnessRecord> {
        if channels.iter().all(|c| c.is_empty()) {
            return Err(LoudnessError::NoSamples);
        }

        let mut analyzer = LoudnessAnalyzer::new(sample_rate, channels.len())?;
        analyzer.add_planar(channels)?;
        let primary = analyzer.finalize()?;

        let true_peak_dbfs = self.true_peak.measure(channels, sample_rate)?;

        self.cross_validate(primary.integrated_lufs, channels, sample_rate);

        let record = OverallLoudnessRecord::from_measurements(
            primary.integrated_lufs,
            primary.loudness_range_lu,
            Some(true_peak_dbfs),
        );
        tracing::info!(
            lufs = ?record.integrated_lufs,
            lra = ?record.loudness_range_lu,
            true_peak = ?record.true_peak_dbfs,
            "Overall loudness measured"
        );
        Ok(record)
    }

    /// Compare the primary loudness against the cross-check engine
    ///
    /// Only logs; the primary value is always the one reported.
    fn cross_validate(&self, primary: Option<f64>, channels: &[&[f32]], sample_rate: u32) {
        let check = match self.cross_check.integrated_lufs(channels, sample_rate) {
            Ok(check) => check,
            Err(err) => {
                tracing::warn!(engine = self.cross_check.name(), error = %err, "Loudness cross-check failed");
                return;
            }
        };

        match (primary, check) {
            (Some(primary), Some(check)) => {
                let diff = (primary - check).abs();
                if diff > self.cross_validation_threshold_lu {
                    tracing::warn!(
                        primary,
                        check,
                        diff,
                        engine = self.cross_check.name(),
                        "Integrated loudness cross-validation diverged"
                    );
                } else {
                    tracing::debug!(primary, check, diff, "Integrated loudness cross-validated");
                }
            }
            (None, None) => {}
            _ => tracing::warn!(
                primary = ?primary,
                check = ?check,
                engine = self.cross_check.name(),
                "Loudness engines disagree on whether loudness is defined"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixcheck_core::MixcheckError;

    fn tone(amplitude: f32, secs: usize) -> Vec<f32> {
        (0..48_000 * secs)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * 997.0 * i as f32 / 48_000.0).sin())
            .collect()
    }

    #[test]
    fn silence_has_no_loudness_but_floors_peak() {
        let meter = LoudnessStandardsMeter::default();
        let buffer = AudioBuffer::new(vec![0.0; 96_000], 48_000);
        let record = meter.measure(&buffer).unwrap();
        assert_eq!(record.integrated_lufs, None);
        assert_eq!(record.loudness_range_lu, None);
        assert_eq!(record.true_peak_dbfs, Some(-120.0));
    }

    #[test]
    fn stereo_frames_are_metered_untouched() {
        let l = tone(0.1, 5);
        let frames: Vec<[f32; 2]> = l.iter().map(|&s| [s, s]).collect();
        let record = LoudnessStandardsMeter::default()
            .measure(&AudioBuffer::from_stereo(frames, 48_000))
            .unwrap();
        // Two channels of a -20 dBFS tone sum to -20 LUFS
        assert!((record.integrated_lufs.unwrap() + 20.0).abs() < 0.1);
        assert!((record.true_peak_dbfs.unwrap() + 20.0).abs() < 0.2);
    }

    #[test]
    fn results_are_rounded_to_two_decimals() {
        let record = LoudnessStandardsMeter::default()
            .measure(&AudioBuffer::new(tone(0.3, 4), 48_000))
            .unwrap();
        for value in [record.integrated_lufs, record.loudness_range_lu, record.true_peak_dbfs] {
            let v = value.unwrap();
            assert!(((v * 100.0).round() - v * 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn backends_are_interchangeable() {
        let settings = LoudnessSettings {
            true_peak_backend: TruePeakBackend::Oversampled,
            cross_check_backend: CrossCheckBackend::Recheck,
            cross_validation_threshold_lu: 0.1,
        };
        let buffer = AudioBuffer::new(tone(0.5, 3), 48_000);
        let a = LoudnessStandardsMeter::new(&settings).measure(&buffer).unwrap();
        let b = LoudnessStandardsMeter::default().measure(&buffer).unwrap();
        assert_eq!(a.integrated_lufs, b.integrated_lufs);
        assert!((a.true_peak_dbfs.unwrap() - b.true_peak_dbfs.unwrap()).abs() < 0.2);
    }

    #[test]
    fn empty_input_is_an_error() {
        let meter = LoudnessStandardsMeter::default();
        let err = meter.measure_channels(&[&[]], 48_000).unwrap_err();
        assert!(matches!(MixcheckError::from(err), MixcheckError::EmptyInput));
    }
}
