//! Independent BS.1770-4 gated loudness integrator
//!
//! A second implementation of integrated loudness that shares no code with
//! the primary engine: its own K-weighting biquads, block energies and
//! two-stage gating. Used only to cross-check the primary result.

use std::f64::consts::PI;

/// Offset in the loudness formula, `-0.691 + 10·log10(Σ G·z)`
pub const LOUDNESS_OFFSET: f64 = -0.691;

/// Absolute gate in LUFS
pub const ABSOLUTE_GATE_LUFS: f64 = -70.0;

/// Relative gate below the absolute-gated loudness, in LU
pub const RELATIVE_GATE_LU: f64 = -10.0;

/// Direct-form-I biquad section
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b: [f64; 3],
    a: [f64; 3],
    x: [f64; 2],
    y: [f64; 2],
}

impl Biquad {
    fn new(b: [f64; 3], a: [f64; 3]) -> Self {
        Self {
            b,
            a,
            x: [0.0; 2],
            y: [0.0; 2],
        }
    }

    fn process(&mut self, input: f64) -> f64 {
        let output = self.b[0] * input + self.b[1] * self.x[0] + self.b[2] * self.x[1]
            - self.a[1] * self.y[0]
            - self.a[2] * self.y[1];
        self.x = [input, self.x[0]];
        self.y = [output, self.y[0]];
        output
    }
}

/// Two-stage K-weighting filter: high-frequency shelf then RLB high-pass
#[derive(Debug, Clone, Copy)]
pub struct KWeighting {
    shelf: Biquad,
    highpass: Biquad,
}

impl KWeighting {
    /// Filter coefficients derived for `sample_rate` from the analogue
    /// prototype, matching the published 48 kHz values
    pub fn new(sample_rate: u32) -> Self {
        let rate = f64::from(sample_rate);

        let f0 = 1681.974_450_955_533;
        let gain_db = 3.999_843_853_973_347;
        let q = 0.707_175_236_955_419_6;
        let k = (PI * f0 / rate).tan();
        let vh = 10f64.powf(gain_db / 20.0);
        let vb = vh.powf(0.499_666_774_154_541_6);
        let a0 = 1.0 + k / q + k * k;
        let shelf = Biquad::new(
            [
                (vh + vb * k / q + k * k) / a0,
                2.0 * (k * k - vh) / a0,
                (vh - vb * k / q + k * k) / a0,
            ],
            [1.0, 2.0 * (k * k - 1.0) / a0, (1.0 - k / q + k * k) / a0],
        );

        let f0 = 38.135_470_876_024_44;
        let q = 0.500_327_037_323_877_3;
        let k = (PI * f0 / rate).tan();
        let a0 = 1.0 + k / q + k * k;
        let highpass = Biquad::new(
            [1.0, -2.0, 1.0],
            [1.0, 2.0 * (k * k - 1.0) / a0, (1.0 - k / q + k * k) / a0],
        );

        Self { shelf, highpass }
    }

    pub fn process(&mut self, input: f64) -> f64 {
        self.highpass.process(self.shelf.process(input))
    }
}

/// Samples in 100 ms, rounded the way libebur128 rounds it
fn samples_per_100ms(sample_rate: u32) -> usize {
    ((sample_rate + 5) / 10) as usize
}

/// Gated integrated loudness of planar channels, all weighted 1.0
///
/// Returns `None` when the signal is shorter than one 400 ms block or no
/// block passes both gates.
pub fn integrated_loudness(channels: &[&[f32]], sample_rate: u32) -> Option<f64> {
    let step = samples_per_100ms(sample_rate);
    let len = channels.iter().map(|c| c.len()).min()?;
    let num_steps = len / step;
    if num_steps < 4 {
        return None;
    }

    // Mean square of the weighted signal per 100 ms step, summed over channels
    let mut step_energy = vec![0.0f64; num_steps];
    for channel in channels {
        let mut filter = KWeighting::new(sample_rate);
        for (s, energy) in step_energy.iter_mut().enumerate() {
            let sum: f64 = channel[s * step..(s + 1) * step]
                .iter()
                .map(|&x| {
                    let y = filter.process(f64::from(x));
                    y * y
                })
                .sum();
            *energy += sum / step as f64;
        }
    }

    // 400 ms blocks with 75% overlap
    let blocks: Vec<f64> = step_energy
        .windows(4)
        .map(|w| w.iter().sum::<f64>() / 4.0)
        .collect();

    let above_absolute: Vec<f64> = blocks
        .iter()
        .copied()
        .filter(|&z| energy_to_lufs(z) > ABSOLUTE_GATE_LUFS)
        .collect();
    if above_absolute.is_empty() {
        return None;
    }

    let relative_gate = energy_to_lufs(mean(&above_absolute)) + RELATIVE_GATE_LU;
    let gated: Vec<f64> = above_absolute
        .into_iter()
        .filter(|&z| energy_to_lufs(z) > relative_gate)
        .collect();
    if gated.is_empty() {
        return None;
    }

    let lufs = energy_to_lufs(mean(&gated));
    lufs.is_finite().then_some(lufs)
}

fn energy_to_lufs(energy: f64) -> f64 {
    if energy <= 0.0 {
        return f64::NEG_INFINITY;
    }
    LOUDNESS_OFFSET + 10.0 * energy.log10()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f64, amplitude: f64, sample_rate: u32, secs: f64) -> Vec<f32> {
        let len = (f64::from(sample_rate) * secs) as usize;
        (0..len)
            .map(|i| (amplitude * (2.0 * PI * freq * i as f64 / f64::from(sample_rate)).sin()) as f32)
            .collect()
    }

    #[test]
    fn k_weighting_gain_near_one_khz() {
        // Steady-state power gain at 997 Hz is about +0.691 dB
        let mut filter = KWeighting::new(48_000);
        let input = tone(997.0, 1.0, 48_000, 2.0);
        let output: Vec<f64> = input.iter().map(|&x| filter.process(f64::from(x))).collect();
        let p_in: f64 = input[48_000..].iter().map(|&x| f64::from(x).powi(2)).sum();
        let p_out: f64 = output[48_000..].iter().map(|y| y * y).sum();
        let gain_db = 10.0 * (p_out / p_in).log10();
        assert!((gain_db - 0.691).abs() < 0.01, "gain {}", gain_db);
    }

    #[test]
    fn full_scale_mono_tone_reads_minus_three() {
        for rate in [44_100, 48_000] {
            let x = tone(997.0, 1.0, rate, 5.0);
            let lufs = integrated_loudness(&[&x], rate).unwrap();
            assert!((lufs + 3.01).abs() < 0.02, "{} Hz: {}", rate, lufs);
        }
    }

    #[test]
    fn stereo_sums_channel_power() {
        let x = tone(997.0, 0.1, 48_000, 5.0);
        let lufs = integrated_loudness(&[&x, &x], 48_000).unwrap();
        assert!((lufs + 20.0).abs() < 0.02, "{}", lufs);
    }

    #[test]
    fn absolute_gate_ignores_silence() {
        let mut x = vec![0.0f32; 48_000 * 10];
        x.extend(tone(997.0, 0.1, 48_000, 40.0));
        let lufs = integrated_loudness(&[&x], 48_000).unwrap();
        assert!((lufs + 23.01).abs() < 0.05, "{}", lufs);
    }

    #[test]
    fn relative_gate_ignores_quiet_passages() {
        let mut x = tone(997.0, 0.01, 48_000, 20.0);
        x.extend(tone(997.0, 0.1, 48_000, 30.0));
        let lufs = integrated_loudness(&[&x], 48_000).unwrap();
        // Without the relative gate the quiet part would pull this to about -25.2
        assert!((lufs + 23.01).abs() < 0.05, "{}", lufs);
    }

    #[test]
    fn undefined_cases() {
        assert_eq!(integrated_loudness(&[&[0.0; 48_000]], 48_000), None);
        assert_eq!(integrated_loudness(&[&[0.5; 1000]], 48_000), None);
        assert_eq!(integrated_loudness(&[], 48_000), None);
    }
}
