//! One-call audio quality analysis for mixcheck
//!
//! Ties the crates together: the buffer is decomposed into five bands, each
//! band is reconstructed and measured with the full metric suite, and the
//! untouched signal is metered for overall loudness.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌───────────────────────┐
//! │ AudioBuffer │──►│ SpectralTransform│──►│ BandIntegrator        │
//! └─────────────┘   └──────────────────┘   └───────────────────────┘
//!        │                                            │ per band (rayon)
//!        │                                            ▼
//!        │                          ┌──────────────────────────────────┐
//!        │                          │ BandReconstructor → BandContext   │
//!        │                          │ → compute_band_metrics            │
//!        │                          └──────────────────────────────────┘
//!        ▼                                            │
//! ┌────────────────────────┐                          ▼
//! │ LoudnessStandardsMeter │──────────────►   AnalysisOutput
//! └────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use mixcheck_analysis::{Analyzer, AnalysisSettings};
//!
//! let analyzer = Analyzer::new(AnalysisSettings::default())?;
//! let output = analyzer.analyze(&buffer, Some(&|band: &str, _: &_| println!("{band} done")))?;
//! println!("{}", output.overall);
//! ```

#![deny(unsafe_code)]

mod analyzer;
mod progress;

pub use analyzer::{analyze, AnalysisOutput, Analyzer};
pub use progress::ProgressSink;

pub use mixcheck_core::{AnalysisSettings, AnalysisWarning, AudioBuffer, MixcheckError, Result};
