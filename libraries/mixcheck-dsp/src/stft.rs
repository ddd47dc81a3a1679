//! Short-time Fourier transform engine
//!
//! A centred, periodic-Hann STFT with weighted overlap-add inversion. Two
//! framing conventions are supported:
//!
//! - **Spectrum** framing: the signal is zero-padded by half a window on both
//!   sides, then padded at the end so the last frame is full, and every frame
//!   is divided by the window sum (amplitude scaling). Used by the fixed
//!   4096/1024 band decomposition.
//! - **Analysis** framing: half-window zero padding on both sides, no end
//!   padding and no scaling. Used by the feature extractors (2048/512).
//!
//! Both invert exactly: `inverse(forward(x), x.len()) == x` up to rounding.

use crate::error::{DspError, Result};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

/// Below this summed squared window value a sample is left unnormalized
const WINDOW_SUM_FLOOR: f64 = 1e-10;

/// Frame scaling applied by the forward transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectrumScaling {
    /// Raw FFT output
    None,
    /// Divide by the window sum so a bin-centred sine of amplitude A reads A/2
    WindowSum,
}

/// STFT geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StftConfig {
    /// FFT size, equal to the window length
    pub n_fft: usize,
    /// Hop between frames in samples
    pub hop: usize,
    pub scaling: SpectrumScaling,
    /// Zero-pad the tail so the final frame is complete
    pub pad_to_full_frames: bool,
}

impl StftConfig {
    /// Feature-extraction framing (centred, unscaled)
    pub const fn analysis(n_fft: usize, hop: usize) -> Self {
        Self {
            n_fft,
            hop,
            scaling: SpectrumScaling::None,
            pad_to_full_frames: false,
        }
    }

    /// Band-decomposition framing (centred, tail-padded, window-sum scaled)
    pub const fn spectrum(n_fft: usize, hop: usize) -> Self {
        Self {
            n_fft,
            hop,
            scaling: SpectrumScaling::WindowSum,
            pad_to_full_frames: true,
        }
    }

    /// Number of one-sided frequency bins
    pub const fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }
}

/// Periodic Hann window (the DFT-even form used for spectral analysis)
pub fn periodic_hann(size: usize) -> Vec<f64> {
    if size == 0 {
        return Vec::new();
    }
    let n = size as f64;
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n).cos())
        .collect()
}

/// One-sided complex spectrogram, stored frame-major
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    frames: Vec<Vec<Complex<f64>>>,
    num_bins: usize,
}

impl Spectrogram {
    /// Build a spectrogram from frame-major columns; every column must have `num_bins` bins
    pub fn from_frames(frames: Vec<Vec<Complex<f64>>>, num_bins: usize) -> Result<Self> {
        if let Some(bad) = frames.iter().find(|f| f.len() != num_bins) {
            return Err(DspError::ShapeMismatch {
                expected: num_bins,
                actual: bad.len(),
            });
        }
        Ok(Self { frames, num_bins })
    }

    /// A spectrogram of zeros
    pub fn zeros(num_bins: usize, num_frames: usize) -> Self {
        Self {
            frames: vec![vec![Complex::new(0.0, 0.0); num_bins]; num_frames],
            num_bins,
        }
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Complex bins of frame `t`
    pub fn frame(&self, t: usize) -> &[Complex<f64>] {
        &self.frames[t]
    }

    pub fn frame_mut(&mut self, t: usize) -> &mut [Complex<f64>] {
        &mut self.frames[t]
    }

    pub fn frames(&self) -> impl Iterator<Item = &[Complex<f64>]> {
        self.frames.iter().map(Vec::as_slice)
    }

    /// Magnitudes, frame-major
    pub fn magnitudes(&self) -> Vec<Vec<f64>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|c| c.norm()).collect())
            .collect()
    }
}

/// STFT processor with cached FFT plans
///
/// Cheap to clone and safe to share between threads.
#[derive(Clone)]
pub struct Stft {
    config: StftConfig,
    window: Arc<[f64]>,
    window_sum: f64,
    fft_forward: Arc<dyn Fft<f64>>,
    fft_inverse: Arc<dyn Fft<f64>>,
}

impl fmt::Debug for Stft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stft")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Stft {
    /// Plan forward and inverse FFTs for the given geometry
    pub fn new(config: StftConfig) -> Self {
        let window = periodic_hann(config.n_fft);
        let window_sum = window.iter().sum();
        let mut planner = FftPlanner::new();
        let fft_forward = planner.plan_fft_forward(config.n_fft);
        let fft_inverse = planner.plan_fft_inverse(config.n_fft);

        Self {
            config,
            window: window.into(),
            window_sum,
            fft_forward,
            fft_inverse,
        }
    }

    pub fn config(&self) -> &StftConfig {
        &self.config
    }

    pub fn num_bins(&self) -> usize {
        self.config.num_bins()
    }

    /// Centre frequency of every bin
    pub fn frequencies(&self, sample_rate: u32) -> Vec<f64> {
        let resolution = f64::from(sample_rate) / self.config.n_fft as f64;
        (0..self.num_bins()).map(|k| k as f64 * resolution).collect()
    }

    /// Length of the zero-padded signal the frames are cut from
    fn padded_len(&self, signal_len: usize) -> usize {
        let StftConfig { n_fft, hop, .. } = self.config;
        let centred = signal_len + n_fft;
        if self.config.pad_to_full_frames {
            let overhang = (centred - n_fft) % hop;
            if overhang == 0 {
                centred
            } else {
                centred + hop - overhang
            }
        } else {
            centred
        }
    }

    /// Number of frames produced for a signal of `signal_len` samples
    pub fn frame_count(&self, signal_len: usize) -> usize {
        (self.padded_len(signal_len) - self.config.n_fft) / self.config.hop + 1
    }

    /// Forward transform of a mono signal
    pub fn forward(&self, signal: &[f32]) -> Spectrogram {
        let StftConfig { n_fft, hop, .. } = self.config;
        let num_bins = self.num_bins();
        let offset = n_fft / 2;
        let num_frames = self.frame_count(signal.len());
        let scale = match self.config.scaling {
            SpectrumScaling::None => 1.0,
            SpectrumScaling::WindowSum => 1.0 / self.window_sum,
        };

        let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];
        let mut frames = Vec::with_capacity(num_frames);

        for t in 0..num_frames {
            let start = t * hop;
            for (i, slot) in buffer.iter_mut().enumerate() {
                // Position in the unpadded signal; outside it is zero padding
                let sample = (start + i)
                    .checked_sub(offset)
                    .and_then(|idx| signal.get(idx))
                    .map_or(0.0, |&s| f64::from(s));
                *slot = Complex::new(sample * self.window[i], 0.0);
            }
            self.fft_forward.process(&mut buffer);
            frames.push(buffer[..num_bins].iter().map(|&c| c * scale).collect());
        }

        Spectrogram { frames, num_bins }
    }

    /// Weighted overlap-add inverse, trimmed to `length` samples
    pub fn inverse(&self, spectrogram: &Spectrogram, length: usize) -> Result<Vec<f32>> {
        let StftConfig { n_fft, hop, .. } = self.config;
        let num_bins = self.num_bins();
        if spectrogram.num_bins() != num_bins {
            return Err(DspError::ShapeMismatch {
                expected: num_bins,
                actual: spectrogram.num_bins(),
            });
        }
        if spectrogram.num_frames() == 0 {
            return Err(DspError::EmptySpectrum);
        }

        let unscale = match self.config.scaling {
            SpectrumScaling::None => 1.0,
            SpectrumScaling::WindowSum => self.window_sum,
        };
        let norm = unscale / n_fft as f64;

        let total = (spectrogram.num_frames() - 1) * hop + n_fft;
        let mut output = vec![0.0f64; total];
        let mut window_sq = vec![0.0f64; total];
        let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];

        for (t, frame) in spectrogram.frames().enumerate() {
            buffer[..num_bins].copy_from_slice(frame);
            // A real signal has purely real DC and Nyquist bins
            buffer[0].im = 0.0;
            buffer[num_bins - 1].im = 0.0;
            for k in 1..num_bins - 1 {
                buffer[n_fft - k] = frame[k].conj();
            }
            self.fft_inverse.process(&mut buffer);

            let start = t * hop;
            for (i, c) in buffer.iter().enumerate() {
                let w = self.window[i];
                output[start + i] += c.re * norm * w;
                window_sq[start + i] += w * w;
            }
        }

        for (sample, &wsq) in output.iter_mut().zip(&window_sq) {
            if wsq > WINDOW_SUM_FLOOR {
                *sample /= wsq;
            }
        }

        let offset = n_fft / 2;
        let mut signal: Vec<f32> = output
            .into_iter()
            .skip(offset)
            .take(length)
            .map(|s| s as f32)
            .collect();
        signal.resize(length, 0.0);
        Ok(signal)
    }
}
