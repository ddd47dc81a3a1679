//! Overall loudness metering for mixcheck
//!
//! This crate provides:
//! - BS.1770-4 / EBU R128 integrated loudness and loudness range
//! - True Peak with interchangeable measurement strategies
//! - An independent gated integrator for cross-validation
//! - Precision validation against a synthetic golden corpus
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────────────────┐     ┌───────────────────────┐
//! │ AudioBuffer  │ ──► │ LoudnessStandardsMeter  │ ──► │ OverallLoudnessRecord │
//! └──────────────┘     └─────────────────────────┘     └───────────────────────┘
//!                         │          │         │                   │
//!                         ▼          ▼         ▼                   ▼
//!                    ebur128   TruePeak   CrossCheck     ┌────────────────────┐
//!                   (LUFS/LRA) Strategy   (logs only)    │ PrecisionValidator │
//!                                                        └────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use mixcheck_loudness::LoudnessStandardsMeter;
//!
//! let meter = LoudnessStandardsMeter::default();
//! let record = meter.measure(&buffer)?;
//! println!("{}", record);
//! ```

#![deny(unsafe_code)]

mod analyzer;
pub mod bs1770;
mod corpus;
mod cross_check;
mod error;
mod meter;
mod true_peak;
mod validator;

pub use analyzer::{LoudnessAnalyzer, PrimaryMeasurement};
pub use corpus::{amplitude_for_lufs, expected_values, golden_corpus, GoldenVector, ToneSegment, TEST_TONE_HZ};
pub use cross_check::{IndependentBs1770, LoudnessCrossCheck, PrimaryRecheck};
pub use error::{LoudnessError, Result};
pub use meter::LoudnessStandardsMeter;
pub use true_peak::{peak_to_dbtp, OversampledTruePeak, ReferenceTruePeak, TruePeakStrategy};
pub use validator::{
    parse_expected, validate, ExpectedLoudness, MetricCheck, PrecisionValidator, ValidationResult,
};
