//! Stereo image metrics
//!
//! All functions take band-limited left/right signals and return `None`
//! when either channel is empty. Mono sources never reach these functions.

use crate::signal::{finite_or, power_to_db};
use mixcheck_core::{DB_FLOOR, EPSILON};

/// Mid and side energies, `mid = (L+R)/2`, `side = (L-R)/2`
fn mid_side_energy(left: &[f32], right: &[f32]) -> (f64, f64) {
    left.iter()
        .zip(right)
        .fold((0.0, 0.0), |(mid_e, side_e), (&l, &r)| {
            let (l, r) = (f64::from(l), f64::from(r));
            let mid = (l + r) / 2.0;
            let side = (l - r) / 2.0;
            (mid_e + mid * mid, side_e + side * side)
        })
}

fn has_both(left: &[f32], right: &[f32]) -> bool {
    !left.is_empty() && !right.is_empty()
}

/// Side energy as a share of total mid+side energy, in percent
pub fn stereo_width_percent(left: &[f32], right: &[f32]) -> Option<f64> {
    if !has_both(left, right) {
        return None;
    }
    let (mid, side) = mid_side_energy(left, right);
    let total = mid + side;
    if total < EPSILON {
        return Some(0.0);
    }
    Some(100.0 * side / total)
}

/// Pearson correlation of L and R; `None` if either channel is constant
pub fn phase_correlation(left: &[f32], right: &[f32]) -> Option<f64> {
    if !has_both(left, right) {
        return None;
    }
    let n = left.len().min(right.len());
    let (left, right) = (&left[..n], &right[..n]);

    let mean = |x: &[f32]| x.iter().map(|&s| f64::from(s)).sum::<f64>() / n as f64;
    let (mean_l, mean_r) = (mean(left), mean(right));

    let (mut cov, mut var_l, mut var_r) = (0.0, 0.0, 0.0);
    for (&l, &r) in left.iter().zip(right) {
        let dl = f64::from(l) - mean_l;
        let dr = f64::from(r) - mean_r;
        cov += dl * dr;
        var_l += dl * dl;
        var_r += dr * dr;
    }

    let std_l = (var_l / n as f64).sqrt();
    let std_r = (var_r / n as f64).sqrt();
    if std_l < EPSILON || std_r < EPSILON {
        return None;
    }
    let corr = cov / (var_l.sqrt() * var_r.sqrt());
    corr.is_finite().then_some(corr.clamp(-1.0, 1.0))
}

/// Mid-channel energy `10·log10(Σ mid²)`, floored at -120
pub fn mid_energy_db(left: &[f32], right: &[f32]) -> Option<f64> {
    has_both(left, right).then(|| finite_or(power_to_db(mid_side_energy(left, right).0), DB_FLOOR))
}

/// Side-channel energy `10·log10(Σ side²)`, floored at -120
pub fn side_energy_db(left: &[f32], right: &[f32]) -> Option<f64> {
    has_both(left, right).then(|| finite_or(power_to_db(mid_side_energy(left, right).1), DB_FLOOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(len: usize) -> Vec<f32> {
        (0..len).map(|i| 0.5 * (i as f32 * 0.05).sin()).collect()
    }

    #[test]
    fn identical_channels_are_centred() {
        let l = tone(4800);
        assert_eq!(stereo_width_percent(&l, &l), Some(0.0));
        assert!((phase_correlation(&l, &l).unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(side_energy_db(&l, &l), Some(-120.0));
        assert!(mid_energy_db(&l, &l).unwrap() > 0.0);
    }

    #[test]
    fn opposite_channels_are_all_side() {
        let l = tone(4800);
        let r: Vec<f32> = l.iter().map(|s| -s).collect();
        assert_eq!(stereo_width_percent(&l, &r), Some(100.0));
        assert!((phase_correlation(&l, &r).unwrap() + 1.0).abs() < 1e-9);
        assert_eq!(mid_energy_db(&l, &r), Some(-120.0));
    }

    #[test]
    fn constant_channel_has_no_correlation() {
        let l = tone(4800);
        let r = vec![0.0; 4800];
        assert_eq!(phase_correlation(&l, &r), None);
        // One-sided signal splits energy evenly between mid and side
        assert!((stereo_width_percent(&l, &r).unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn empty_channels_are_undefined() {
        assert_eq!(stereo_width_percent(&[], &[0.1]), None);
        assert_eq!(phase_correlation(&[0.1], &[]), None);
        assert_eq!(mid_energy_db(&[], &[]), None);
        assert_eq!(side_energy_db(&[], &[]), None);
    }

    #[test]
    fn silent_pair_has_zero_width() {
        let silent = [0.0f32; 100];
        assert_eq!(stereo_width_percent(&silent, &silent), Some(0.0));
        assert_eq!(mid_energy_db(&silent, &silent), Some(-120.0));
    }
}
