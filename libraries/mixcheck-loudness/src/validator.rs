//! Precision validation of loudness measurements against golden values
//!
//! Tolerances follow professional metering practice: ±0.1 LU for
//! integrated loudness, ±0.2 dB for True Peak and ±0.2 LU for LRA.

use mixcheck_core::{OverallLoudnessRecord, Result, Tolerances};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Expected loudness of one golden-corpus file; `None` means undefined
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedLoudness {
    #[serde(default)]
    pub integrated_lufs: Option<f64>,
    #[serde(default)]
    pub loudness_range_lu: Option<f64>,
    #[serde(default)]
    pub true_peak_dbfs: Option<f64>,
}

/// Outcome of comparing one metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricCheck {
    pub passed: bool,
    /// Absolute difference; infinite when only one side is defined
    pub delta: f64,
    pub computed: Option<f64>,
}

impl MetricCheck {
    /// Compare `computed` against `expected` within `tolerance`
    pub fn evaluate(computed: Option<f64>, expected: Option<f64>, tolerance: f64) -> Self {
        let (passed, delta) = match (computed, expected) {
            (None, None) => (true, 0.0),
            (Some(c), Some(e)) if c.is_finite() && e.is_finite() => {
                let delta = (c - e).abs();
                (delta <= tolerance, delta)
            }
            _ => (false, f64::INFINITY),
        };
        Self {
            passed,
            delta,
            computed,
        }
    }

    fn status(&self) -> &'static str {
        if self.passed {
            "PASS"
        } else {
            "FAIL"
        }
    }
}

/// Per-metric verdicts for one test vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationResult {
    pub lufs: MetricCheck,
    pub true_peak: MetricCheck,
    pub lra: MetricCheck,
    /// All three metrics passed
    pub overall_pass: bool,
}

/// Compare a measurement with its expected values
pub fn validate(
    computed: &OverallLoudnessRecord,
    expected: &ExpectedLoudness,
    tolerances: &Tolerances,
) -> ValidationResult {
    let lufs = MetricCheck::evaluate(computed.integrated_lufs, expected.integrated_lufs, tolerances.lufs);
    let true_peak =
        MetricCheck::evaluate(computed.true_peak_dbfs, expected.true_peak_dbfs, tolerances.true_peak);
    let lra = MetricCheck::evaluate(computed.loudness_range_lu, expected.loudness_range_lu, tolerances.lra);
    let overall_pass = lufs.passed && true_peak.passed && lra.passed;

    tracing::info!(
        lufs = lufs.status(),
        lufs_delta = lufs.delta,
        true_peak = true_peak.status(),
        true_peak_delta = true_peak.delta,
        lra = lra.status(),
        lra_delta = lra.delta,
        overall = if overall_pass { "PASS" } else { "FAIL" },
        "Validated loudness measurement"
    );

    ValidationResult {
        lufs,
        true_peak,
        lra,
        overall_pass,
    }
}

/// Parse an `expected_values.json` document (file name → expected values)
pub fn parse_expected(json: &str) -> Result<BTreeMap<String, ExpectedLoudness>> {
    Ok(serde_json::from_str(json)?)
}

/// Validates measurements with a fixed set of tolerances
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PrecisionValidator {
    tolerances: Tolerances,
}

impl PrecisionValidator {
    pub fn new(tolerances: Tolerances) -> Self {
        Self { tolerances }
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    pub fn validate(&self, computed: &OverallLoudnessRecord, expected: &ExpectedLoudness) -> ValidationResult {
        validate(computed, expected, &self.tolerances)
    }

    /// Markdown report over a set of validated files
    pub fn generate_report(
        &self,
        results: &BTreeMap<String, ValidationResult>,
        expected: &BTreeMap<String, ExpectedLoudness>,
    ) -> String {
        let total = results.len();
        let passed = results.values().filter(|r| r.overall_pass).count();
        let t = &self.tolerances;

        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = writeln!(out, "# Loudness Metering Precision Validation Report");
        let _ = writeln!(out);
        let _ = writeln!(out, "## Summary");
        let _ = writeln!(out);
        let _ = writeln!(out, "- **Total test vectors:** {}", total);
        let _ = writeln!(out, "- **Passed:** {}", passed);
        let _ = writeln!(out, "- **Failed:** {}", total - passed);
        if total > 0 {
            let _ = writeln!(out, "- **Pass rate:** {:.0}%", passed as f64 / total as f64 * 100.0);
        } else {
            let _ = writeln!(out, "- **Pass rate:** N/A");
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "## Tolerances");
        let _ = writeln!(out);
        let _ = writeln!(out, "| Metric | Tolerance |");
        let _ = writeln!(out, "|--------|-----------|");
        let _ = writeln!(out, "| Integrated LUFS | +/- {} LU |", t.lufs);
        let _ = writeln!(out, "| True Peak | +/- {} dB |", t.true_peak);
        let _ = writeln!(out, "| Loudness Range | +/- {} LU |", t.lra);
        let _ = writeln!(out);

        let _ = writeln!(out, "## Detailed Results");
        let _ = writeln!(out);
        let _ = writeln!(out, "| Test File | Metric | Expected | Computed | Delta | Status |");
        let _ = writeln!(out, "|-----------|--------|----------|----------|-------|--------|");
        for (file, result) in results {
            let exp = expected.get(file).copied().unwrap_or_default();
            let rows = [
                (file.as_str(), "LUFS", exp.integrated_lufs, &result.lufs),
                ("", "True Peak", exp.true_peak_dbfs, &result.true_peak),
                ("", "LRA", exp.loudness_range_lu, &result.lra),
            ];
            for (name, metric, expected_value, check) in rows {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {:.3} | {} |",
                    name,
                    metric,
                    format_value(expected_value),
                    format_value(check.computed),
                    check.delta,
                    check.status()
                );
            }
        }
        let _ = writeln!(out);

        let all_pass = results.values().all(|r| r.overall_pass);
        let _ = writeln!(out, "## Overall Verdict");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "**{}** - {} test vectors are within professional-grade tolerances.",
            if all_pass { "PASS" } else { "FAIL" },
            if all_pass { "All" } else { "Not all" }
        );
        out
    }
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}", v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lufs: Option<f64>, lra: Option<f64>, tp: Option<f64>) -> OverallLoudnessRecord {
        OverallLoudnessRecord {
            integrated_lufs: lufs,
            loudness_range_lu: lra,
            true_peak_dbfs: tp,
        }
    }

    #[test]
    fn both_undefined_passes() {
        let check = MetricCheck::evaluate(None, None, 0.1);
        assert!(check.passed);
        assert_eq!(check.delta, 0.0);
    }

    #[test]
    fn one_sided_undefined_fails_with_infinite_delta() {
        let check = MetricCheck::evaluate(Some(-23.0), None, 0.1);
        assert!(!check.passed);
        assert!(check.delta.is_infinite());
        assert!(!MetricCheck::evaluate(None, Some(-23.0), 0.1).passed);
        assert!(!MetricCheck::evaluate(Some(f64::NAN), Some(-23.0), 0.1).passed);
    }

    #[test]
    fn tolerance_is_inclusive() {
        assert!(MetricCheck::evaluate(Some(-23.05), Some(-23.0), 0.1).passed);
        assert!(!MetricCheck::evaluate(Some(-23.2), Some(-23.0), 0.1).passed);
    }

    #[test]
    fn overall_requires_all_three() {
        let expected = ExpectedLoudness {
            integrated_lufs: Some(-23.0),
            loudness_range_lu: Some(0.0),
            true_peak_dbfs: Some(-20.0),
        };
        let ok = validate(&record(Some(-23.02), Some(0.1), Some(-20.1)), &expected, &Tolerances::default());
        assert!(ok.overall_pass);
        let bad = validate(&record(Some(-23.02), Some(0.5), Some(-20.1)), &expected, &Tolerances::default());
        assert!(!bad.overall_pass);
        assert!(bad.lufs.passed && bad.true_peak.passed && !bad.lra.passed);
    }

    #[test]
    fn parses_nullable_expected_values() {
        let parsed = parse_expected(
            r#"{"silence.wav": {"integrated_lufs": null, "loudness_range_lu": null, "true_peak_dbfs": -120.0},
                "tone.wav": {"integrated_lufs": -23.0, "loudness_range_lu": 0.0, "true_peak_dbfs": -20.0}}"#,
        )
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["silence.wav"].integrated_lufs, None);
        assert_eq!(parsed["tone.wav"].true_peak_dbfs, Some(-20.0));
        assert!(parse_expected("not json").is_err());
    }

    #[test]
    fn report_lists_every_metric() {
        let validator = PrecisionValidator::default();
        let expected: BTreeMap<String, ExpectedLoudness> = [(
            "silence.wav".to_string(),
            ExpectedLoudness {
                integrated_lufs: None,
                loudness_range_lu: None,
                true_peak_dbfs: Some(-120.0),
            },
        )]
        .into_iter()
        .collect();
        let results: BTreeMap<String, ValidationResult> = [(
            "silence.wav".to_string(),
            validator.validate(&record(None, None, Some(-120.0)), &expected["silence.wav"]),
        )]
        .into_iter()
        .collect();

        let report = validator.generate_report(&results, &expected);
        assert!(report.contains("## Summary"));
        assert!(report.contains("- **Pass rate:** 100%"));
        assert!(report.contains("| silence.wav | LUFS | N/A | N/A | 0.000 | PASS |"));
        assert!(report.contains("| | True Peak | -120.00 | -120.00 | 0.000 | PASS |"));
        assert!(report.contains("| Integrated LUFS | +/- 0.1 LU |"));
        assert!(report.contains("**PASS** - All test vectors"));
    }

    #[test]
    fn empty_report_has_no_pass_rate() {
        let report = PrecisionValidator::default().generate_report(&BTreeMap::new(), &BTreeMap::new());
        assert!(report.contains("- **Pass rate:** N/A"));
    }
}
