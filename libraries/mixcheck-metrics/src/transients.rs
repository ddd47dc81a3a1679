//! Transient metrics: percussive energy share and attack time

use crate::hpss::Separation;
use crate::onset::detect_onsets;
use crate::signal::{below_energy_floor, finite_or, sum_of_squares};
use crate::spectral::{FEATURE_HOP, FEATURE_N_FFT};
use mixcheck_core::EPSILON;

/// Onset detection runs over chunks of this many samples
pub const ATTACK_CHUNK: usize = 48_000;

/// Chunks shorter than this are skipped
const MIN_CHUNK_LEN: usize = 1024;

/// How far after an onset the envelope peak is searched
const ATTACK_SEARCH_SECS: f64 = 0.05;

/// Percussive share of the band's energy, clamped to `[0, 1]`
pub fn transient_preservation(samples: &[f32], separation: &Separation) -> f64 {
    if below_energy_floor(samples) || separation.is_empty() {
        return 0.0;
    }
    let total = sum_of_squares(samples);
    if total < EPSILON {
        return 0.0;
    }
    let percussive = sum_of_squares(&separation.percussive);
    finite_or((percussive / total).clamp(0.0, 1.0), 0.0)
}

/// Mean time from each onset to the following RMS envelope peak, in ms
///
/// Returns 0 when no onset is found.
pub fn attack_time_ms(samples: &[f32], sample_rate: u32) -> f64 {
    if below_energy_floor(samples) {
        return 0.0;
    }

    let search = ((ATTACK_SEARCH_SECS * f64::from(sample_rate) / FEATURE_HOP as f64) as usize)
        .max(1);
    let frame_ms = FEATURE_HOP as f64 / f64::from(sample_rate) * 1000.0;

    let attacks: Vec<f64> = samples
        .chunks(ATTACK_CHUNK)
        .filter(|chunk| chunk.len() >= MIN_CHUNK_LEN)
        .flat_map(|chunk| {
            let envelope = rms_envelope(chunk);
            detect_onsets(chunk, sample_rate)
                .into_iter()
                .filter(|&onset| onset < envelope.len())
                .map(|onset| {
                    let end = (onset + search).min(envelope.len());
                    first_argmax(&envelope[onset..end]) as f64 * frame_ms
                })
                .collect::<Vec<_>>()
        })
        .collect();

    if attacks.is_empty() {
        return 0.0;
    }
    finite_or(attacks.iter().sum::<f64>() / attacks.len() as f64, 0.0)
}

/// Frame RMS over centred, zero-padded 2048-sample frames at hop 512
fn rms_envelope(samples: &[f32]) -> Vec<f64> {
    let half = FEATURE_N_FFT / 2;
    let num_frames = 1 + samples.len() / FEATURE_HOP;
    (0..num_frames)
        .map(|t| {
            let centre = t * FEATURE_HOP;
            let lo = centre.saturating_sub(half);
            let hi = (centre + half).min(samples.len());
            let energy = samples.get(lo..hi).map_or(0.0, sum_of_squares);
            (energy / FEATURE_N_FFT as f64).sqrt()
        })
        .collect()
}

/// Index of the first maximum
fn first_argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_i, best), (i, &v)| {
            if v > best {
                (i, v)
            } else {
                (best_i, best)
            }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_frame_count_and_level() {
        let env = rms_envelope(&vec![0.5f32; 10_240]);
        assert_eq!(env.len(), 1 + 10_240 / FEATURE_HOP);
        // Interior frames see the full constant signal
        assert!((env[10] - 0.5).abs() < 1e-9);
        // Edge frames are half padding
        assert!((env[0] - 0.5 * 0.5f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn argmax_prefers_first() {
        assert_eq!(first_argmax(&[0.1, 0.5, 0.5, 0.2]), 1);
        assert_eq!(first_argmax(&[]), 0);
    }

    #[test]
    fn percussive_share() {
        let x = vec![0.5f32; 1000];
        let half: Vec<f32> = x.iter().map(|s| s * std::f32::consts::FRAC_1_SQRT_2).collect();
        let sep = Separation {
            harmonic: half.clone(),
            percussive: half,
        };
        assert!((transient_preservation(&x, &sep) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn impulse_attack_is_immediate() {
        let mut x = vec![0.0f32; 48_000];
        x[24_000] = 1.0;
        let attack = attack_time_ms(&x, 48_000);
        assert!(attack < 1.0, "attack {}", attack);
    }

    #[test]
    fn silence_sentinels() {
        let silent = vec![0.0f32; 4800];
        assert_eq!(transient_preservation(&silent, &Separation::default()), 0.0);
        assert_eq!(attack_time_ms(&silent, 48_000), 0.0);
    }
}
