//! The analysis pipeline
//!
//! validate → edge-case warnings → forward STFT → band integration →
//! stereo spectra → per band: reconstruct, build context, compute metrics →
//! overall loudness of the untouched signal.

use crate::progress::ProgressSink;
use mixcheck_core::{
    AnalysisSettings, AnalysisWarning, AudioBuffer, BandMetricRecord, OverallLoudnessRecord, Result,
};
use mixcheck_dsp::{BandIntegrator, BandReconstructor, BandSummary, SpectralFrame, SpectralTransform, StereoSpectra};
use mixcheck_loudness::LoudnessStandardsMeter;
use mixcheck_metrics::{compute_band_metrics, BandContext, MetricFailure};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Everything one analysis call produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    /// One record per band, in band-table order
    pub bands: Vec<BandMetricRecord>,
    pub overall: OverallLoudnessRecord,
    /// Input edge cases first, then isolated metric failures, then a
    /// loudness failure if the meter could not run
    pub warnings: Vec<AnalysisWarning>,
}

/// Reusable analyzer holding the transform and the configured meter
#[derive(Debug)]
pub struct Analyzer {
    settings: AnalysisSettings,
    transform: SpectralTransform,
    integrator: BandIntegrator,
    meter: LoudnessStandardsMeter,
}

impl Analyzer {
    /// Build an analyzer; loudness strategies are chosen here, once
    pub fn new(settings: AnalysisSettings) -> Result<Self> {
        let meter = LoudnessStandardsMeter::new(&settings.loudness);
        Self::with_meter(settings, meter)
    }

    /// Build an analyzer around an already configured loudness meter
    pub fn with_meter(settings: AnalysisSettings, meter: LoudnessStandardsMeter) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            transform: SpectralTransform::new(),
            integrator: BandIntegrator::default(),
            meter,
        })
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Analyse one decoded buffer
    ///
    /// Input validation failures abort before any metric runs. A metric that
    /// fails is reported as `None` plus a [`AnalysisWarning::MetricFailed`];
    /// a failed loudness measurement leaves every overall value `None` and
    /// adds [`AnalysisWarning::LoudnessFailed`].
    pub fn analyze(
        &self,
        buffer: &AudioBuffer,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<AnalysisOutput> {
        buffer.validate()?;
        let started = Instant::now();
        let sample_rate = buffer.sample_rate();

        let mut warnings = AnalysisWarning::from_flags(&buffer.flags());
        if !buffer.is_stereo() {
            warnings.push(AnalysisWarning::MonoSource);
        }
        for warning in &warnings {
            tracing::warn!(%warning, "Input edge case");
        }

        let frame = self.transform.forward(buffer.samples(), sample_rate);
        let summaries = self.integrator.integrate(&frame);
        let stereo = buffer
            .stereo()
            .map(|frames| StereoSpectra::from_frames(&self.transform, frames, sample_rate));
        tracing::debug!(
            bins = frame.num_bins(),
            frames = frame.num_frames(),
            stereo = stereo.is_some(),
            "Spectrum ready"
        );

        let mut bands = Vec::with_capacity(summaries.len());
        let mut failures = Vec::new();
        let mut record_band = |(record, band_failures): (BandMetricRecord, Vec<MetricFailure>)| {
            if let Some(sink) = progress {
                sink.band_completed(&record.band_name, &record);
            }
            failures.extend(band_failures);
            bands.push(record);
        };

        if self.settings.parallel_bands {
            let results: Vec<Result<_>> = summaries
                .par_iter()
                .map(|summary| self.analyze_band(&frame, stereo.as_ref(), summary))
                .collect();
            for result in results {
                record_band(result?);
            }
        } else {
            for summary in &summaries {
                record_band(self.analyze_band(&frame, stereo.as_ref(), summary)?);
            }
        }

        warnings.extend(failures.into_iter().map(|f| AnalysisWarning::MetricFailed {
            band: f.band,
            metric: f.metric.to_string(),
        }));

        let overall = match self.meter.measure(buffer) {
            Ok(record) => record,
            Err(err) => {
                tracing::error!(error = %err, "Overall loudness measurement failed");
                warnings.push(AnalysisWarning::LoudnessFailed {
                    message: err.to_string(),
                });
                OverallLoudnessRecord::default()
            }
        };

        tracing::info!(
            bands = bands.len(),
            warnings = warnings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis complete"
        );
        Ok(AnalysisOutput {
            bands,
            overall,
            warnings,
        })
    }

    fn analyze_band(
        &self,
        frame: &SpectralFrame,
        stereo: Option<&StereoSpectra>,
        summary: &BandSummary,
    ) -> Result<(BandMetricRecord, Vec<MetricFailure>)> {
        let reconstructor = BandReconstructor::new(&self.transform);
        let samples = reconstructor.reconstruct(frame, summary)?;
        let mut ctx = BandContext::new(
            summary.band,
            samples,
            frame.sample_rate,
            summary.energy,
            summary.num_frames(),
        );
        if let Some(spectra) = stereo {
            let (left, right) = reconstructor.reconstruct_stereo(spectra, &summary.band)?;
            ctx = ctx.with_stereo(left, right);
        }

        let (record, failures) = compute_band_metrics(&ctx);
        tracing::info!(
            band = summary.band.name,
            bins = summary.bin_indices.len(),
            rms_dbfs = ?record.band_rms_dbfs,
            failures = failures.len(),
            "Band analysed"
        );
        Ok((record, failures))
    }
}

/// Analyse a buffer with default settings and no progress sink
pub fn analyze(buffer: &AudioBuffer) -> Result<AnalysisOutput> {
    Analyzer::new(AnalysisSettings::default())?.analyze(buffer, None)
}
