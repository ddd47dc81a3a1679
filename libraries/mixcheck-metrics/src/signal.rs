//! Small numeric helpers shared by the metric families

use mixcheck_core::{DB_FLOOR, ENERGY_FLOOR, EPSILON};

/// Root mean square, accumulated in f64; 0 for empty input
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    (sum_of_squares(samples) / samples.len() as f64).sqrt()
}

pub fn sum_of_squares(samples: &[f32]) -> f64 {
    samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum()
}

/// Maximum absolute sample value
pub fn peak(samples: &[f32]) -> f64 {
    samples
        .iter()
        .fold(0.0f64, |acc, &s| acc.max(f64::from(s).abs()))
}

/// Empty, or every sample below `EPSILON` in magnitude
pub fn is_silent(samples: &[f32]) -> bool {
    samples.is_empty() || peak(samples) < EPSILON
}

/// Too quiet for separation, pitch tracking or onset detection
pub fn below_energy_floor(samples: &[f32]) -> bool {
    is_silent(samples) || rms(samples) < ENERGY_FLOOR
}

/// `20·log10(x)` with the -120 dB floor below `EPSILON`
pub fn amplitude_to_db(x: f64) -> f64 {
    if x < EPSILON {
        DB_FLOOR
    } else {
        20.0 * x.log10()
    }
}

/// `10·log10(x)` with the -120 dB floor below `EPSILON`
pub fn power_to_db(x: f64) -> f64 {
    if x < EPSILON {
        DB_FLOOR
    } else {
        10.0 * x.log10()
    }
}

/// Linear-interpolated percentile (`q` in 0..=100), as numpy computes it
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Median; mean of the two middle values for even lengths
pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Replace a non-finite result with `fallback`
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_like_numpy() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 4.0);
        assert!((percentile(&values, 10.0) - 1.3).abs() < 1e-12);
        assert!((percentile(&values, 90.0) - 3.7).abs() < 1e-12);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
    }

    #[test]
    fn db_floors() {
        assert_eq!(amplitude_to_db(0.0), DB_FLOOR);
        assert_eq!(power_to_db(1e-12), DB_FLOOR);
        assert!((amplitude_to_db(0.5) + 6.0206).abs() < 1e-3);
        assert!((power_to_db(0.5) + 3.0103).abs() < 1e-3);
    }

    #[test]
    fn silence_and_energy_floor() {
        assert!(is_silent(&[]));
        assert!(is_silent(&[0.0; 10]));
        assert!(!is_silent(&[1e-3]));
        // Not digital silence, but far below the energy floor
        let faint = vec![1e-7f32; 1000];
        assert!(!is_silent(&faint));
        assert!(below_energy_floor(&faint));
        assert!(!below_energy_floor(&[0.1; 100]));
    }
}
