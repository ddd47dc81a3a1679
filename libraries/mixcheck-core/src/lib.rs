//! mixcheck core
//!
//! Shared data model, band table, settings and error handling for the mixcheck
//! audio-quality analysis crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Input**: `AudioBuffer` with edge-case detection (silence, clipping, DC offset)
//! - **Bands**: the fixed `FREQUENCY_BANDS` table
//! - **Results**: `BandMetricRecord`, `OverallLoudnessRecord`, `AnalysisWarning`
//! - **Settings**: `AnalysisSettings` (serde, all fields defaulted)
//! - **Error Handling**: Unified `MixcheckError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use mixcheck_core::{AudioBuffer, FREQUENCY_BANDS};
//!
//! let samples: Vec<f32> = (0..48_000)
//!     .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48_000.0).sin() * 0.5)
//!     .collect();
//! let buffer = AudioBuffer::new(samples, 48_000);
//! assert!(buffer.validate().is_ok());
//! assert_eq!(FREQUENCY_BANDS.len(), 5);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod settings;
pub mod types;

pub use error::{MixcheckError, Result};
pub use settings::{AnalysisSettings, CrossCheckBackend, LoudnessSettings, Tolerances, TruePeakBackend};
pub use types::{
    round_metric, AnalysisWarning, AudioBuffer, BandMetricRecord, EdgeCaseFlags, FrequencyBand,
    OverallLoudnessRecord, BAND_METRIC_NAMES, FREQUENCY_BANDS, SUPPORTED_SAMPLE_RATES,
};

/// Floor for every dB-valued metric (silence)
pub const DB_FLOOR: f64 = -120.0;

/// Guard against division by zero and log of zero
pub const EPSILON: f64 = 1e-10;

/// Linear RMS below which a band is treated as silent
pub const ENERGY_FLOOR: f64 = 1e-6;
