//! Per-band audio quality metrics
//!
//! This crate provides:
//! - Level metrics: RMS, sample peak and short-term level range
//! - Dynamics metrics: macro dynamic range, crest factor
//! - Spectral shape: centroid, 85% roll-off, flatness, band energy
//! - Stereo image: width, phase correlation, mid/side energy
//! - Harmonic content: THD, harmonic ratio, inharmonicity (YIN pitch tracking)
//! - Transients: percussive energy share, onset-to-peak attack time
//!
//! Every metric function is pure and total: empty, silent or too-quiet input
//! returns a documented sentinel instead of failing.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐     ┌──────────────────────┐     ┌──────────────────┐
//! │  BandContext  │ ──► │ compute_band_metrics │ ──► │ BandMetricRecord │
//! │ (lazy HPSS,   │     │  (isolated metrics)  │     │ + MetricFailures │
//! │  spectrogram) │     └──────────────────────┘     └──────────────────┘
//! └───────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use mixcheck_metrics::{compute_band_metrics, BandContext};
//!
//! let ctx = BandContext::new(summary.band, band_samples, 48_000, summary.energy, summary.num_frames());
//! let (record, failures) = compute_band_metrics(&ctx);
//! println!("{}: {:?} dBFS", record.band_name, record.band_rms_dbfs);
//! ```

#![deny(unsafe_code)]

mod context;
pub mod dynamics;
pub mod harmonics;
pub mod hpss;
pub mod level;
pub mod onset;
pub mod pitch;
pub mod signal;
pub mod spectral;
pub mod stereo;
mod suite;
pub mod transients;

pub use context::BandContext;
pub use hpss::{separate, Separation};
pub use spectral::FeatureSpectrum;
pub use suite::{compute_band_metrics, run_isolated, MetricFailure};
