//! Spectral decomposition for mixcheck
//!
//! This crate provides:
//! - A generic centred STFT (`Stft`) with exact weighted overlap-add inversion
//! - The fixed 4096/1024 band-decomposition transform (`SpectralTransform`)
//! - Per-band energy and time-series integration (`BandIntegrator`)
//! - Band-limited time-domain reconstruction for mono and stereo (`BandReconstructor`)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌───────────────────┐     ┌────────────────┐
//! │ Mono signal │ ──► │ SpectralTransform │ ──► │ SpectralFrame  │
//! └─────────────┘     └───────────────────┘     └────────────────┘
//!                                                  │          │
//!                                                  ▼          ▼
//!                                        ┌──────────────┐ ┌───────────────────┐
//!                                        │BandIntegrator│ │ BandReconstructor │
//!                                        └──────────────┘ └───────────────────┘
//!                                               │                   │
//!                                               ▼                   ▼
//!                                         BandSummary       band-limited signal
//! ```
//!
//! # Example
//!
//! ```ignore
//! use mixcheck_dsp::{BandIntegrator, BandReconstructor, SpectralTransform};
//!
//! let transform = SpectralTransform::new();
//! let frame = transform.forward(&samples, 48_000);
//! let summaries = BandIntegrator::default().integrate(&frame);
//!
//! let reconstructor = BandReconstructor::new(&transform);
//! let low = reconstructor.reconstruct(&frame, &summaries[0])?;
//! ```

#![deny(unsafe_code)]

mod bands;
mod error;
mod reconstruct;
pub mod stft;
mod transform;

pub use bands::{band_bin_indices, bin_indices_for_range, BandIntegrator, BandSummary};
pub use error::{DspError, Result};
pub use reconstruct::{BandReconstructor, StereoSpectra};
pub use stft::{periodic_hann, Spectrogram, SpectrumScaling, Stft, StftConfig};
pub use transform::{SpectralFrame, SpectralTransform, HOP_SIZE, WINDOW_SIZE};

/// Complex sample type used throughout the spectral pipeline
pub use rustfft::num_complex::Complex;
