//! Level metrics: RMS, true peak and level range

use crate::signal::{amplitude_to_db, finite_or, percentile, rms};
use mixcheck_core::DB_FLOOR;

/// Frame length for the level-range distribution
const LEVEL_FRAME_MS: f64 = 50.0;

/// RMS level in dBFS; -120 for empty or near-silent input
pub fn band_rms_dbfs(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return DB_FLOOR;
    }
    amplitude_to_db(rms(samples))
}

/// Sample peak of the band signal in dBFS; -120 for empty or silent input
pub fn band_true_peak_dbfs(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return DB_FLOOR;
    }
    amplitude_to_db(crate::signal::peak(samples))
}

/// Spread between the 90th and 10th percentile of 50 ms frame levels, in dB
///
/// Silent frames count as -120 dB. Returns 0 with fewer than two frames.
pub fn band_level_range_db(samples: &[f32], sample_rate: u32) -> f64 {
    let frame_size = ((f64::from(sample_rate) * LEVEL_FRAME_MS / 1000.0) as usize).max(1);
    let num_frames = samples.len() / frame_size;
    if num_frames < 2 {
        return 0.0;
    }

    let frame_db: Vec<f64> = samples
        .chunks_exact(frame_size)
        .map(|frame| amplitude_to_db(rms(frame)))
        .collect();

    let range = percentile(&frame_db, 90.0) - percentile(&frame_db, 10.0);
    if range < 0.0 {
        return 0.0;
    }
    finite_or(range, 0.0)
}
