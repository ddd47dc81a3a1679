//! Cross-validation engines for integrated loudness

use crate::analyzer::LoudnessAnalyzer;
use crate::bs1770;
use crate::error::Result;
use std::fmt;

/// A second opinion on integrated loudness
pub trait LoudnessCrossCheck: fmt::Debug + Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Integrated loudness in LUFS, `None` when undefined
    fn integrated_lufs(&self, channels: &[&[f32]], sample_rate: u32) -> Result<Option<f64>>;
}

/// The in-crate BS.1770-4 integrator, independent of the primary engine
#[derive(Debug, Clone, Default)]
pub struct IndependentBs1770;

impl LoudnessCrossCheck for IndependentBs1770 {
    fn name(&self) -> &'static str {
        "independent-bs1770"
    }

    fn integrated_lufs(&self, channels: &[&[f32]], sample_rate: u32) -> Result<Option<f64>> {
        Ok(bs1770::integrated_loudness(channels, sample_rate))
    }
}

/// Runs the primary engine a second time
///
/// Only catches nondeterminism in the primary path; the two results agree
/// by construction.
#[derive(Debug, Clone, Default)]
pub struct PrimaryRecheck;

impl LoudnessCrossCheck for PrimaryRecheck {
    fn name(&self) -> &'static str {
        "primary-recheck"
    }

    fn integrated_lufs(&self, channels: &[&[f32]], sample_rate: u32) -> Result<Option<f64>> {
        let mut analyzer = LoudnessAnalyzer::new(sample_rate, channels.len())?;
        analyzer.add_planar(channels)?;
        Ok(analyzer.finalize()?.integrated_lufs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engines_agree_on_a_reference_tone() {
        let tone: Vec<f32> = (0..48_000 * 5)
            .map(|i| 0.25 * (2.0 * std::f32::consts::PI * 997.0 * i as f32 / 48_000.0).sin())
            .collect();
        let independent = IndependentBs1770.integrated_lufs(&[&tone, &tone], 48_000).unwrap().unwrap();
        let recheck = PrimaryRecheck.integrated_lufs(&[&tone, &tone], 48_000).unwrap().unwrap();
        assert!((independent - recheck).abs() < 0.1, "{} vs {}", independent, recheck);
    }

    #[test]
    fn silence_is_undefined_for_both() {
        let silent = vec![0.0f32; 48_000];
        assert_eq!(IndependentBs1770.integrated_lufs(&[&silent], 48_000).unwrap(), None);
        assert_eq!(PrimaryRecheck.integrated_lufs(&[&silent], 48_000).unwrap(), None);
    }
}
