/// Analysis settings
///
/// Plain serde structs with per-field defaults so that a partial TOML file or
/// a handful of environment variables is enough to configure a run. Loading
/// from disk is left to the application layer.
use crate::error::{MixcheckError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalysisSettings {
    /// Process the five bands on the rayon thread pool
    #[serde(default = "default_parallel_bands")]
    pub parallel_bands: bool,

    #[serde(default)]
    pub loudness: LoudnessSettings,

    #[serde(default)]
    pub tolerances: Tolerances,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoudnessSettings {
    #[serde(default)]
    pub true_peak_backend: TruePeakBackend,

    #[serde(default)]
    pub cross_check_backend: CrossCheckBackend,

    /// Divergence between primary and cross-check loudness that gets logged
    #[serde(default = "default_cross_validation_threshold")]
    pub cross_validation_threshold_lu: f64,
}

/// How True Peak is measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TruePeakBackend {
    /// The reference meter's own 4x true-peak detector
    #[default]
    Reference,
    /// 4x windowed-sinc oversampling, then sample peak
    Oversampled,
}

/// Which engine re-measures integrated loudness for cross-validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossCheckBackend {
    /// Independent K-weighted gated integrator
    #[default]
    Independent,
    /// Re-run the primary engine
    Recheck,
}

/// Acceptance tolerances for precision validation
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Tolerances {
    /// Integrated loudness tolerance in LU
    #[serde(default = "default_lufs_tolerance")]
    pub lufs: f64,

    /// True Peak tolerance in dB
    #[serde(default = "default_true_peak_tolerance")]
    pub true_peak: f64,

    /// Loudness Range tolerance in LU
    #[serde(default = "default_lra_tolerance")]
    pub lra: f64,
}

impl AnalysisSettings {
    /// Reject settings that cannot produce a meaningful run
    pub fn validate(&self) -> Result<()> {
        let t = &self.tolerances;
        for (name, value) in [("lufs", t.lufs), ("true_peak", t.true_peak), ("lra", t.lra)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(MixcheckError::config(format!(
                    "Tolerance '{}' must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        let threshold = self.loudness.cross_validation_threshold_lu;
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(MixcheckError::config(format!(
                "Cross-validation threshold must be a non-negative number, got {}",
                threshold
            )));
        }
        Ok(())
    }
}

// Default values
fn default_parallel_bands() -> bool {
    true
}

fn default_cross_validation_threshold() -> f64 {
    0.1
}

fn default_lufs_tolerance() -> f64 {
    0.1
}

fn default_true_peak_tolerance() -> f64 {
    0.2
}

fn default_lra_tolerance() -> f64 {
    0.2
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            parallel_bands: default_parallel_bands(),
            loudness: LoudnessSettings::default(),
            tolerances: Tolerances::default(),
        }
    }
}

impl Default for LoudnessSettings {
    fn default() -> Self {
        Self {
            true_peak_backend: TruePeakBackend::default(),
            cross_check_backend: CrossCheckBackend::default(),
            cross_validation_threshold_lu: default_cross_validation_threshold(),
        }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            lufs: default_lufs_tolerance(),
            true_peak: default_true_peak_tolerance(),
            lra: default_lra_tolerance(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_published_tolerances() {
        let settings = AnalysisSettings::default();
        assert!(settings.parallel_bands);
        assert_eq!(settings.tolerances.lufs, 0.1);
        assert_eq!(settings.tolerances.true_peak, 0.2);
        assert_eq!(settings.tolerances.lra, 0.2);
        assert_eq!(settings.loudness.true_peak_backend, TruePeakBackend::Reference);
        assert_eq!(settings.loudness.cross_check_backend, CrossCheckBackend::Independent);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: AnalysisSettings = serde_json::from_str(
            r#"{"parallel_bands": false, "loudness": {"true_peak_backend": "oversampled"}}"#,
        )
        .unwrap();
        assert!(!settings.parallel_bands);
        assert_eq!(settings.loudness.true_peak_backend, TruePeakBackend::Oversampled);
        assert_eq!(settings.loudness.cross_validation_threshold_lu, 0.1);
        assert_eq!(settings.tolerances, Tolerances::default());
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let mut settings = AnalysisSettings::default();
        settings.tolerances.lra = -1.0;
        assert!(matches!(settings.validate(), Err(MixcheckError::Config(_))));
    }
}
