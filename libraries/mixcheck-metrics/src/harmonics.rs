//! Harmonic metrics: THD, harmonic ratio and inharmonicity
//!
//! THD and harmonic ratio read the shared [`Separation`] of the band; the
//! inharmonicity estimate runs its own pitch tracking and partial search.

use crate::hpss::Separation;
use crate::pitch::{track_pitch, PitchRange};
use crate::signal::{below_energy_floor, finite_or, median, rms, sum_of_squares};
use mixcheck_core::EPSILON;
use rustfft::{num_complex::Complex, FftPlanner};

/// Longest analysis window for inharmonicity (1 s at 48 kHz)
pub const INHARMONICITY_WINDOW: usize = 48_000;

/// Maximum number of windows spread across the signal
pub const MAX_INHARMONICITY_WINDOWS: usize = 6;

/// Windows shorter than this are skipped
const MIN_WINDOW_LEN: usize = 2048;

/// Longest FFT used for partial detection
const PARTIAL_FFT_LEN: usize = 4096;

/// Partials must exceed this fraction of the strongest bin
const PARTIAL_THRESHOLD: f64 = 0.1;

/// Residual energy left after removing the harmonic component, in percent
///
/// Returns 0 below the energy floor or when separation was skipped.
pub fn thd_percent(samples: &[f32], separation: &Separation) -> f64 {
    if below_energy_floor(samples) || separation.is_empty() {
        return 0.0;
    }
    let n = samples.len().min(separation.harmonic.len());
    let residual: Vec<f32> = samples[..n]
        .iter()
        .zip(&separation.harmonic[..n])
        .map(|(&x, &h)| x - h)
        .collect();

    let total = rms(&samples[..n]);
    if total < EPSILON {
        return 0.0;
    }
    finite_or(100.0 * rms(&residual) / total, 0.0)
}

/// Harmonic share of separated energy, `Eh / (Eh + Ep)`
pub fn harmonic_ratio(samples: &[f32], separation: &Separation) -> f64 {
    if below_energy_floor(samples) || separation.is_empty() {
        return 0.0;
    }
    let harmonic = sum_of_squares(&separation.harmonic);
    let percussive = sum_of_squares(&separation.percussive);
    let total = harmonic + percussive;
    if total < EPSILON {
        return 0.0;
    }
    finite_or(harmonic / total, 0.0)
}

/// Mean relative deviation of spectral partials from the harmonic series
///
/// Up to six windows of at most one second are spread evenly over the
/// signal. Each window contributes when it has a voiced pitch; the result is
/// the mean over contributing windows, clamped to `[0, 1]`, or 0 when no
/// window had a pitch.
pub fn inharmonicity(samples: &[f32], sample_rate: u32) -> f64 {
    if below_energy_floor(samples) {
        return 0.0;
    }

    let mut planner = FftPlanner::<f64>::new();
    let range = PitchRange::for_sample_rate(sample_rate);

    let scores: Vec<f64> = window_starts(samples.len())
        .into_iter()
        .filter_map(|start| {
            let end = (start + INHARMONICITY_WINDOW).min(samples.len());
            let chunk = &samples[start..end];
            if chunk.len() < MIN_WINDOW_LEN {
                return None;
            }
            window_inharmonicity(chunk, sample_rate, range, &mut planner)
        })
        .collect();

    if scores.is_empty() {
        return 0.0;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    finite_or(mean.clamp(0.0, 1.0), 0.0)
}

/// Start offsets of the analysis windows
fn window_starts(total: usize) -> Vec<usize> {
    let possible = (total / INHARMONICITY_WINDOW).max(1);
    let count = possible.min(MAX_INHARMONICITY_WINDOWS);
    if possible <= count {
        return (0..count).map(|i| i * INHARMONICITY_WINDOW).collect();
    }
    let step = (total - INHARMONICITY_WINDOW) as f64 / (count - 1) as f64;
    (0..count).map(|i| (i as f64 * step).round() as usize).collect()
}

fn window_inharmonicity(
    chunk: &[f32],
    sample_rate: u32,
    range: PitchRange,
    planner: &mut FftPlanner<f64>,
) -> Option<f64> {
    let voiced: Vec<f64> = track_pitch(chunk, sample_rate, range)
        .into_iter()
        .flatten()
        .filter(|f| f.is_finite() && *f > 0.0)
        .collect();
    if voiced.is_empty() {
        return None;
    }
    let f0 = median(&voiced);

    let fft_len = chunk.len().min(PARTIAL_FFT_LEN);
    let mut buffer: Vec<Complex<f64>> = chunk[..fft_len]
        .iter()
        .map(|&s| Complex::new(f64::from(s), 0.0))
        .collect();
    planner.plan_fft_forward(fft_len).process(&mut buffer);

    let magnitudes: Vec<f64> = buffer[..=fft_len / 2].iter().map(|c| c.norm()).collect();
    let max_mag = magnitudes.iter().copied().fold(0.0, f64::max);
    if max_mag < EPSILON {
        return None;
    }

    let bin_hz = f64::from(sample_rate) / fft_len as f64;
    let deviations: Vec<f64> = magnitudes
        .iter()
        .enumerate()
        .filter(|(_, &m)| m > PARTIAL_THRESHOLD * max_mag)
        .map(|(k, _)| k as f64 * bin_hz)
        .filter(|&freq| freq >= 0.5 * f0)
        .map(|freq| {
            let nearest = (freq / f0).round().max(1.0) * f0;
            (freq - nearest).abs() / nearest
        })
        .collect();

    if deviations.is_empty() {
        return None;
    }
    let mean = deviations.iter().sum::<f64>() / deviations.len() as f64;
    Some(mean.min(1.0))
}
