//! YIN fundamental-frequency tracking
//!
//! Frames of 2048 samples (hop 512, centred) are compared against lagged
//! copies of their first 1024 samples. The difference function is computed
//! through an FFT cross-correlation, normalised by its cumulative mean, and
//! the first dip under the threshold gives the period.

use rustfft::{num_complex::Complex, FftPlanner};

pub const FRAME_LENGTH: usize = 2048;
pub const WIN_LENGTH: usize = FRAME_LENGTH / 2;
pub const HOP_LENGTH: usize = 512;

/// Cumulative-mean-normalised difference below which a frame is voiced
pub const YIN_THRESHOLD: f64 = 0.1;

/// Frames with less energy than this across the window are unvoiced
const FRAME_ENERGY_FLOOR: f64 = 1e-12;

/// Search range for the pitch tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchRange {
    pub fmin: f64,
    pub fmax: f64,
}

impl PitchRange {
    /// 20 Hz up to 8 kHz or Nyquist, whichever is lower
    pub fn for_sample_rate(sample_rate: u32) -> Self {
        Self {
            fmin: 20.0,
            fmax: (f64::from(sample_rate) / 2.0).min(8000.0),
        }
    }

    /// Lag bounds in samples; the longest lag is capped by the frame geometry
    fn lag_bounds(&self, sample_rate: u32) -> (usize, usize) {
        let sr = f64::from(sample_rate);
        let min_period = ((sr / self.fmax).floor() as usize).max(2);
        let max_period = ((sr / self.fmin).ceil() as usize).min(FRAME_LENGTH - WIN_LENGTH - 1);
        (min_period, max_period)
    }
}

/// Per-frame fundamental estimates; `None` for unvoiced frames
pub fn track_pitch(samples: &[f32], sample_rate: u32, range: PitchRange) -> Vec<Option<f64>> {
    let (min_period, max_period) = range.lag_bounds(sample_rate);
    if min_period >= max_period {
        return Vec::new();
    }

    let fft_len = (FRAME_LENGTH + WIN_LENGTH).next_power_of_two();
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let offset = FRAME_LENGTH / 2;
    let num_frames = 1 + samples.len() / HOP_LENGTH;
    let mut frame = vec![0.0f64; FRAME_LENGTH];
    let mut ref_buf = vec![Complex::new(0.0, 0.0); fft_len];
    let mut sig_buf = vec![Complex::new(0.0, 0.0); fft_len];

    (0..num_frames)
        .map(|t| {
            let start = t * HOP_LENGTH;
            for (i, slot) in frame.iter_mut().enumerate() {
                *slot = (start + i)
                    .checked_sub(offset)
                    .and_then(|idx| samples.get(idx))
                    .map_or(0.0, |&s| f64::from(s));
            }

            // Cross-correlation of the reference window against the frame
            for (i, slot) in ref_buf.iter_mut().enumerate() {
                *slot = Complex::new(if i < WIN_LENGTH { frame[i] } else { 0.0 }, 0.0);
            }
            for (i, slot) in sig_buf.iter_mut().enumerate() {
                *slot = Complex::new(frame.get(i).copied().unwrap_or(0.0), 0.0);
            }
            forward.process(&mut ref_buf);
            forward.process(&mut sig_buf);
            for (r, s) in ref_buf.iter_mut().zip(&sig_buf) {
                *r = r.conj() * s;
            }
            inverse.process(&mut ref_buf);
            let scale = 1.0 / fft_len as f64;
            let acf: Vec<f64> = ref_buf[..=max_period].iter().map(|c| c.re * scale).collect();

            estimate_period(&frame, &acf, min_period, max_period)
                .map(|period| f64::from(sample_rate) / period)
        })
        .collect()
}

/// Period in (fractional) samples from one frame, or `None` if unvoiced
fn estimate_period(frame: &[f64], acf: &[f64], min_period: usize, max_period: usize) -> Option<f64> {
    // Energy of frame[tau .. tau + WIN_LENGTH] for every lag
    let mut prefix = Vec::with_capacity(frame.len() + 1);
    prefix.push(0.0);
    for &x in frame {
        let last = prefix.last().copied().unwrap_or(0.0);
        prefix.push(last + x * x);
    }
    let window_energy = |tau: usize| prefix[tau + WIN_LENGTH] - prefix[tau];

    let e0 = window_energy(0);
    if e0 < FRAME_ENERGY_FLOOR {
        return None;
    }

    let diff: Vec<f64> = (0..=max_period)
        .map(|tau| (e0 + window_energy(tau) - 2.0 * acf[tau]).max(0.0))
        .collect();

    let mut cmndf = vec![1.0; max_period + 1];
    let mut running = 0.0;
    for tau in 1..=max_period {
        running += diff[tau];
        cmndf[tau] = if running > 0.0 {
            diff[tau] * tau as f64 / running
        } else {
            1.0
        };
    }

    let mut tau = min_period;
    while tau <= max_period {
        if cmndf[tau] < YIN_THRESHOLD {
            // Walk down to the bottom of the dip
            while tau < max_period && cmndf[tau + 1] < cmndf[tau] {
                tau += 1;
            }
            return Some(parabolic_refine(&cmndf, tau));
        }
        tau += 1;
    }
    None
}

/// Sub-sample minimum position from the neighbours of `tau`
fn parabolic_refine(values: &[f64], tau: usize) -> f64 {
    if tau == 0 || tau + 1 >= values.len() {
        return tau as f64;
    }
    let (a, b, c) = (values[tau - 1], values[tau], values[tau + 1]);
    let denom = a - 2.0 * b + c;
    if denom.abs() < f64::EPSILON {
        return tau as f64;
    }
    let shift = 0.5 * (a - c) / denom;
    tau as f64 + shift.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::median;
    use std::f32::consts::PI;

    fn harmonic_tone(f0: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (1..=4)
                    .map(|h| 0.2 / h as f32 * (2.0 * PI * f0 * h as f32 * t).sin())
                    .sum()
            })
            .collect()
    }

    fn voiced_median(track: &[Option<f64>]) -> f64 {
        let voiced: Vec<f64> = track.iter().flatten().copied().collect();
        assert!(!voiced.is_empty());
        median(&voiced)
    }

    #[test]
    fn tracks_a_harmonic_tone() {
        let tone = harmonic_tone(220.0, 48_000, 48_000);
        let track = track_pitch(&tone, 48_000, PitchRange::for_sample_rate(48_000));
        assert_eq!(track.len(), 1 + 48_000 / HOP_LENGTH);
        let f0 = voiced_median(&track);
        assert!((f0 - 220.0).abs() < 2.0, "f0 {}", f0);
    }

    #[test]
    fn tracks_at_cd_rate() {
        let tone = harmonic_tone(440.0, 44_100, 44_100);
        let track = track_pitch(&tone, 44_100, PitchRange::for_sample_rate(44_100));
        let f0 = voiced_median(&track);
        assert!((f0 - 440.0).abs() < 4.0, "f0 {}", f0);
    }

    #[test]
    fn silence_is_unvoiced() {
        let track = track_pitch(&[0.0; 8192], 48_000, PitchRange::for_sample_rate(48_000));
        assert!(track.iter().all(Option::is_none));
    }

    #[test]
    fn lag_bounds_respect_frame_geometry() {
        let (min, max) = PitchRange::for_sample_rate(48_000).lag_bounds(48_000);
        assert_eq!(min, 6);
        assert_eq!(max, FRAME_LENGTH - WIN_LENGTH - 1);
    }
}
