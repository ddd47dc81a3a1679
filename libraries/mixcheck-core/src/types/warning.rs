/// Advisory warnings attached to an analysis result
use crate::types::audio::EdgeCaseFlags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-fatal conditions found while analysing a buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    /// Input RMS below -120 dBFS; most metrics report their floor values
    SilentInput,

    /// Sample peak above -0.1 dBFS
    Clipping,

    /// A DC offset was measured and removed before analysis
    DcOffsetRemoved { mean: f64 },

    /// Source is mono, so stereo metrics are undefined
    MonoSource,

    /// A single metric failed and was reported as missing
    MetricFailed { band: String, metric: String },

    /// Overall loudness could not be measured and is reported as missing
    LoudnessFailed { message: String },
}

impl AnalysisWarning {
    /// Translate detected input flags into warnings
    pub fn from_flags(flags: &EdgeCaseFlags) -> Vec<Self> {
        let mut warnings = Vec::new();
        if flags.silence {
            warnings.push(Self::SilentInput);
        }
        if flags.clipping {
            warnings.push(Self::Clipping);
        }
        if let Some(mean) = flags.dc_offset {
            warnings.push(Self::DcOffsetRemoved { mean });
        }
        warnings
    }
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SilentInput => write!(f, "Audio is silent (RMS below -120 dBFS)"),
            Self::Clipping => write!(f, "Audio clips (sample peak above -0.1 dBFS)"),
            Self::DcOffsetRemoved { mean } => {
                write!(f, "DC offset of {:.4} removed before analysis", mean)
            }
            Self::MonoSource => write!(f, "Mono source: stereo metrics are unavailable"),
            Self::MetricFailed { band, metric } => {
                write!(f, "Metric '{}' failed for band '{}'", metric, band)
            }
            Self::LoudnessFailed { message } => {
                write!(f, "Overall loudness unavailable: {}", message)
            }
        }
    }
}
