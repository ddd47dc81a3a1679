//! Dynamics metrics: macro dynamic range, crest factor, RMS

use crate::signal::{finite_or, peak, rms};
use mixcheck_core::{DB_FLOOR, EPSILON};

const FRAME_SIZE: usize = 1024;
const HOP_SIZE: usize = FRAME_SIZE / 2;

/// Max minus min of frame RMS in dB over 1024-sample frames with 50% overlap
///
/// Unlike crest factor this tracks slow level changes. Returns 0 when the
/// signal is shorter than one frame.
pub fn dynamic_range_db(samples: &[f32]) -> f64 {
    if samples.len() < FRAME_SIZE {
        return 0.0;
    }

    let num_frames = (samples.len() - FRAME_SIZE) / HOP_SIZE + 1;
    let (min, max) = (0..num_frames)
        .map(|i| {
            let start = i * HOP_SIZE;
            20.0 * (rms(&samples[start..start + FRAME_SIZE]) + EPSILON).log10()
        })
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), db| {
            (lo.min(db), hi.max(db))
        });

    finite_or(max - min, 0.0)
}

/// Peak-to-RMS ratio in dB; 0 for near-silent input
pub fn crest_factor_db(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let peak = peak(samples);
    let rms = rms(samples);
    if rms < EPSILON || peak < EPSILON {
        return 0.0;
    }
    finite_or(20.0 * (peak / rms).log10(), 0.0)
}

/// Overall RMS in dB, floored at -120
pub fn rms_db(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return DB_FLOOR;
    }
    crate::signal::amplitude_to_db(rms(samples))
}
