//! Error types for loudness measurement

use mixcheck_core::MixcheckError;
use thiserror::Error;

/// Result type for loudness operations
pub type Result<T> = std::result::Result<T, LoudnessError>;

/// Errors that can occur during loudness measurement
#[derive(Error, Debug)]
pub enum LoudnessError {
    /// Invalid sample rate
    #[error("Invalid sample rate: {0} Hz (must be between 8000 and 384000)")]
    InvalidSampleRate(u32),

    /// Invalid channel count
    #[error("Invalid channel count: {0} (must be 1 or 2)")]
    InvalidChannelCount(usize),

    /// EBU R128 analysis error
    #[error("EBU R128 analysis failed: {0}")]
    AnalysisError(String),

    /// No samples were provided for analysis
    #[error("No audio samples provided for analysis")]
    NoSamples,

    /// Resampling error
    #[error("Resampling failed: {0}")]
    ResampleError(String),
}

impl From<ebur128::Error> for LoudnessError {
    fn from(err: ebur128::Error) -> Self {
        Self::AnalysisError(format!("{:?}", err))
    }
}

impl From<LoudnessError> for MixcheckError {
    fn from(err: LoudnessError) -> Self {
        match err {
            LoudnessError::InvalidSampleRate(rate) => Self::UnsupportedSampleRate(rate),
            LoudnessError::InvalidChannelCount(channels) => Self::UnsupportedChannelCount(channels),
            LoudnessError::NoSamples => Self::EmptyInput,
            other => Self::loudness(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_core_error() {
        let err: MixcheckError = LoudnessError::NoSamples.into();
        assert!(matches!(err, MixcheckError::EmptyInput));

        let err: MixcheckError = LoudnessError::ResampleError("bad ratio".into()).into();
        assert!(matches!(err, MixcheckError::Loudness(ref msg) if msg.contains("bad ratio")));

        let err: MixcheckError = LoudnessError::InvalidChannelCount(6).into();
        assert!(err.is_input_error());
    }
}
