//! Error types for spectral processing

use mixcheck_core::MixcheckError;
use thiserror::Error;

/// Result type for DSP operations
pub type Result<T> = std::result::Result<T, DspError>;

/// Errors that can occur while transforming or reconstructing spectra
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    /// A spectrogram with no frames was passed to a synthesis step
    #[error("Spectrogram has no frames")]
    EmptySpectrum,

    /// Frame length does not match the transform's bin count
    #[error("Spectrum shape mismatch: expected {expected} bins, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Band summary refers to bins outside the spectrum
    #[error("Bin index {index} out of range for {num_bins} bins")]
    BinOutOfRange { index: usize, num_bins: usize },
}

impl From<DspError> for MixcheckError {
    fn from(err: DspError) -> Self {
        Self::Dsp(err.to_string())
    }
}
