/// Decoded audio buffer and input edge-case detection
use crate::error::{MixcheckError, Result};
use serde::{Deserialize, Serialize};

/// Sample rates the analysis pipeline accepts
pub const SUPPORTED_SAMPLE_RATES: [u32; 2] = [44_100, 48_000];

/// RMS below this level (linear, -120 dBFS) marks the input as silent
pub const SILENCE_RMS_LINEAR: f64 = 1e-6;

/// Sample peaks above this level (dBFS) mark the input as clipping
pub const CLIPPING_THRESHOLD_DBFS: f64 = -0.1;

/// Absolute mean above which a DC offset is reported and removed
pub const DC_OFFSET_THRESHOLD: f64 = 1e-3;

/// Conditions detected on the input before analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeCaseFlags {
    /// RMS below -120 dBFS
    pub silence: bool,

    /// Sample peak above -0.1 dBFS
    pub clipping: bool,

    /// Measured DC offset, present only when it exceeded the threshold
    pub dc_offset: Option<f64>,
}

impl EdgeCaseFlags {
    /// Inspect mono samples for silence, clipping and DC offset
    pub fn detect(samples: &[f32]) -> Self {
        if samples.is_empty() {
            return Self {
                silence: true,
                ..Self::default()
            };
        }

        let n = samples.len() as f64;
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut peak = 0.0f64;
        for &s in samples {
            let s = f64::from(s);
            sum += s;
            sum_sq += s * s;
            peak = peak.max(s.abs());
        }

        let rms = (sum_sq / n).sqrt();
        let mean = sum / n;
        let clip_linear = 10f64.powf(CLIPPING_THRESHOLD_DBFS / 20.0);
        let silence = rms < SILENCE_RMS_LINEAR;

        Self {
            silence,
            clipping: peak > clip_linear,
            dc_offset: (!silence && mean.abs() > DC_OFFSET_THRESHOLD).then_some(mean),
        }
    }
}

/// Decoded audio ready for analysis
///
/// The mono signal is the analysis signal for every per-band metric. When the
/// source was stereo the untouched frames are kept alongside it for stereo
/// metrics and loudness measurement. A detected DC offset is removed from the
/// mono signal only.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    stereo: Option<Vec<[f32; 2]>>,
    flags: EdgeCaseFlags,
}

impl AudioBuffer {
    /// Create a mono buffer, detecting edge cases and removing DC offset
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        let flags = EdgeCaseFlags::detect(&samples);
        let samples = remove_dc(samples, flags.dc_offset);
        Self {
            samples,
            sample_rate,
            stereo: None,
            flags,
        }
    }

    /// Create a buffer from stereo frames; the mono signal is `(L + R) / 2`
    pub fn from_stereo(frames: Vec<[f32; 2]>, sample_rate: u32) -> Self {
        let mono: Vec<f32> = frames.iter().map(|[l, r]| (l + r) * 0.5).collect();
        let flags = EdgeCaseFlags::detect(&mono);
        let samples = remove_dc(mono, flags.dc_offset);
        Self {
            samples,
            sample_rate,
            stereo: Some(frames),
            flags,
        }
    }

    /// Create a buffer from interleaved samples with one or two channels
    pub fn from_interleaved(samples: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        match channels {
            1 => Ok(Self::new(samples.to_vec(), sample_rate)),
            2 => {
                if samples.len() % 2 != 0 {
                    return Err(MixcheckError::invalid_input(format!(
                        "Sample count {} is not divisible by channel count 2",
                        samples.len()
                    )));
                }
                let frames = samples
                    .chunks_exact(2)
                    .map(|pair| [pair[0], pair[1]])
                    .collect();
                Ok(Self::from_stereo(frames, sample_rate))
            }
            other => Err(MixcheckError::UnsupportedChannelCount(other)),
        }
    }

    /// Replace the detected flags with ones computed by an external loader
    #[must_use]
    pub fn with_flags(mut self, flags: EdgeCaseFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Check the buffer against the pipeline's input contract
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(MixcheckError::UnsupportedSampleRate(self.sample_rate));
        }
        if self.samples.is_empty() {
            return Err(MixcheckError::EmptyInput);
        }
        if let Some(frames) = &self.stereo {
            if frames.len() != self.samples.len() {
                return Err(MixcheckError::invalid_input(format!(
                    "Stereo frame count {} does not match mono length {}",
                    frames.len(),
                    self.samples.len()
                )));
            }
            if frames.iter().flatten().any(|s| !s.is_finite()) {
                return Err(MixcheckError::invalid_input("Stereo frames contain non-finite samples"));
            }
        }
        if let Some(pos) = self.samples.iter().position(|s| !s.is_finite()) {
            return Err(MixcheckError::invalid_input(format!(
                "Non-finite sample at index {pos}"
            )));
        }
        Ok(())
    }

    /// Mono analysis samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Untouched stereo frames, if the source was stereo
    pub fn stereo(&self) -> Option<&[[f32; 2]]> {
        self.stereo.as_deref()
    }

    /// Whether the source carried two channels
    pub fn is_stereo(&self) -> bool {
        self.stereo.is_some()
    }

    /// Number of channels in the source
    pub fn channels(&self) -> usize {
        if self.is_stereo() {
            2
        } else {
            1
        }
    }

    /// Edge-case flags detected at construction
    pub fn flags(&self) -> EdgeCaseFlags {
        self.flags
    }

    /// Number of samples in the mono signal
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Left and right channels as separate vectors
    pub fn split_channels(&self) -> Option<(Vec<f32>, Vec<f32>)> {
        self.stereo
            .as_ref()
            .map(|frames| frames.iter().map(|[l, r]| (*l, *r)).unzip())
    }
}

fn remove_dc(mut samples: Vec<f32>, offset: Option<f64>) -> Vec<f32> {
    if let Some(mean) = offset {
        tracing::debug!(mean, "Removing DC offset from analysis signal");
        let mean = mean as f32;
        for s in &mut samples {
            *s -= mean;
        }
    }
    samples
}
