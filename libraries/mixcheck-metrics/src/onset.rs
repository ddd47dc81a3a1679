//! Spectral-flux onset detection and peak picking

use crate::spectral::{FEATURE_HOP, FEATURE_N_FFT};
use mixcheck_dsp::{Stft, StftConfig};

/// Log-power spectra are clipped this far below their global maximum
const TOP_DB: f64 = 80.0;

/// Onset strength threshold above the local mean
const PEAK_DELTA: f64 = 0.07;

/// Power floor before the logarithm
const POWER_AMIN: f64 = 1e-10;

/// Frames between the spectra compared by the flux
const FLUX_LAG: usize = 1;

/// Frames of delay applied to the envelope to align it with the onsets
const ENVELOPE_DELAY: usize = 3;

/// Normalised spectral-flux onset strength, one value per STFT frame
///
/// Returns an empty envelope when no flux was measured.
pub fn onset_strength(samples: &[f32]) -> Vec<f64> {
    let stft = Stft::new(StftConfig::analysis(FEATURE_N_FFT, FEATURE_HOP));
    let spectrum = stft.forward(samples);
    let num_frames = spectrum.num_frames();

    let mut log_power: Vec<Vec<f64>> = spectrum
        .frames()
        .map(|frame| {
            frame
                .iter()
                .map(|c| 10.0 * c.norm_sqr().max(POWER_AMIN).log10())
                .collect()
        })
        .collect();

    let global_max = log_power
        .iter()
        .flatten()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let floor = global_max - TOP_DB;
    for value in log_power.iter_mut().flatten() {
        *value = value.max(floor);
    }

    let flux: Vec<f64> = log_power
        .windows(FLUX_LAG + 1)
        .map(|pair| {
            let (prev, cur) = (&pair[0], &pair[FLUX_LAG]);
            let rise: f64 = cur.iter().zip(prev).map(|(c, p)| (c - p).max(0.0)).sum();
            rise / cur.len().max(1) as f64
        })
        .collect();

    // Delay so envelope index t refers to the flux ending at frame t - 2
    let mut envelope: Vec<f64> = std::iter::repeat(0.0)
        .take(ENVELOPE_DELAY)
        .chain(flux)
        .take(num_frames)
        .collect();

    let min = envelope.iter().copied().fold(f64::INFINITY, f64::min);
    for value in &mut envelope {
        *value -= min;
    }
    let max = envelope.iter().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        return Vec::new();
    }
    for value in &mut envelope {
        *value /= max + f64::MIN_POSITIVE;
    }
    envelope
}

/// Windows for [`peak_pick`], in frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakWindows {
    pub pre_max: usize,
    pub post_max: usize,
    pub pre_avg: usize,
    pub post_avg: usize,
    pub wait: usize,
}

impl PeakWindows {
    /// 30 ms max window, 100 ms mean window, 30 ms refractory period
    pub fn for_sample_rate(sample_rate: u32) -> Self {
        let frames = |secs: f64| (secs * f64::from(sample_rate) / FEATURE_HOP as f64) as usize;
        let pre_avg = frames(0.1);
        Self {
            pre_max: frames(0.03),
            post_max: 1,
            pre_avg,
            post_avg: pre_avg + 1,
            wait: frames(0.03),
        }
    }
}

/// Frame indices of onset peaks in a normalised envelope
///
/// A frame is a peak when it is the maximum of its surrounding window, sits
/// `delta` above the local mean, and comes more than `wait` frames after the
/// previous peak.
pub fn peak_pick(envelope: &[f64], windows: PeakWindows) -> Vec<usize> {
    let n = envelope.len();
    let mut peaks = Vec::new();
    let mut last: Option<usize> = None;

    for (i, &value) in envelope.iter().enumerate() {
        if value <= 0.0 {
            continue;
        }
        let max_lo = i.saturating_sub(windows.pre_max);
        let max_hi = (i + windows.post_max).min(n);
        let local_max = envelope[max_lo..max_hi]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        if value < local_max {
            continue;
        }

        let avg_lo = i.saturating_sub(windows.pre_avg);
        let avg_hi = (i + windows.post_avg).min(n);
        let window = &envelope[avg_lo..avg_hi];
        let local_mean = window.iter().sum::<f64>() / window.len() as f64;
        if value < local_mean + PEAK_DELTA {
            continue;
        }

        if last.map_or(true, |prev| i > prev + windows.wait) {
            peaks.push(i);
            last = Some(i);
        }
    }
    peaks
}

/// Onset frames of `samples`, hop 512
pub fn detect_onsets(samples: &[f32], sample_rate: u32) -> Vec<usize> {
    let envelope = onset_strength(samples);
    if envelope.is_empty() {
        return Vec::new();
    }
    peak_pick(&envelope, PeakWindows::for_sample_rate(sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_at_48k() {
        let w = PeakWindows::for_sample_rate(48_000);
        assert_eq!(w.pre_max, 2);
        assert_eq!(w.pre_avg, 9);
        assert_eq!(w.post_avg, 10);
        assert_eq!(w.wait, 2);
    }

    #[test]
    fn picks_isolated_peaks() {
        let mut env = vec![0.0; 100];
        env[20] = 1.0;
        env[60] = 0.8;
        let peaks = peak_pick(&env, PeakWindows::for_sample_rate(48_000));
        assert_eq!(peaks, vec![20, 60]);
    }

    #[test]
    fn refractory_period_suppresses_neighbours() {
        let mut env = vec![0.0; 50];
        env[10] = 1.0;
        env[12] = 1.0;
        let peaks = peak_pick(&env, PeakWindows::for_sample_rate(48_000));
        assert_eq!(peaks, vec![10]);
    }

    #[test]
    fn burst_after_silence_is_an_onset() {
        let mut signal = vec![0.0f32; 48_000];
        let mut state = 7u32;
        for s in &mut signal[24_000..30_000] {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            *s = ((state >> 8) as f32 / (1u32 << 24) as f32) - 0.5;
        }
        let onsets = detect_onsets(&signal, 48_000);
        assert!(!onsets.is_empty());
        let first = onsets[0] as i64 * FEATURE_HOP as i64;
        assert!((first - 24_000).abs() < 3 * FEATURE_HOP as i64, "onset at {}", first);
    }

    #[test]
    fn silence_has_no_onsets() {
        assert!(onset_strength(&[0.0; 8192]).is_empty());
        assert!(detect_onsets(&[0.0; 8192], 48_000).is_empty());
    }
}
