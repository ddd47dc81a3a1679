/// Core error types for mixcheck
use thiserror::Error;

/// Result type alias using `MixcheckError`
pub type Result<T> = std::result::Result<T, MixcheckError>;

/// Core error type for mixcheck
///
/// Input-validation failures are hard errors raised before any metric runs.
/// Individual metric failures never surface here; they are isolated per
/// metric and reported as warnings.
#[derive(Error, Debug)]
pub enum MixcheckError {
    /// Sample rate outside the supported set
    #[error("Unsupported sample rate: {0} Hz (must be 44100 or 48000)")]
    UnsupportedSampleRate(u32),

    /// More than two channels, or zero channels
    #[error("Unsupported channel count: {0} (must be 1 or 2)")]
    UnsupportedChannelCount(usize),

    /// No samples at all
    #[error("No audio samples provided for analysis")]
    EmptyInput,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Spectral transform errors
    #[error("DSP error: {0}")]
    Dsp(String),

    /// Loudness measurement errors
    #[error("Loudness error: {0}")]
    Loudness(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl MixcheckError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a DSP error
    pub fn dsp(msg: impl Into<String>) -> Self {
        Self::Dsp(msg.into())
    }

    /// Create a loudness error
    pub fn loudness(msg: impl Into<String>) -> Self {
        Self::Loudness(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error was caused by the caller's input rather than the engine
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedSampleRate(_)
                | Self::UnsupportedChannelCount(_)
                | Self::EmptyInput
                | Self::InvalidInput(_)
        )
    }
}
