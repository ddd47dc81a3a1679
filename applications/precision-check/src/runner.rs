/// Golden-corpus generation and validation runs
use crate::wav::{read_wav, write_vector};
use mixcheck_core::{AnalysisSettings, MixcheckError, Result};
use mixcheck_loudness::{
    expected_values, golden_corpus, parse_expected, ExpectedLoudness, LoudnessStandardsMeter,
    PrecisionValidator, ValidationResult,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the expected-values document inside a corpus directory
pub const EXPECTED_VALUES_FILE: &str = "expected_values.json";

/// Outcome of validating a corpus directory
#[derive(Debug, Clone)]
pub struct PrecisionRun {
    pub results: BTreeMap<String, ValidationResult>,
    pub expected: BTreeMap<String, ExpectedLoudness>,
    pub report: String,
}

impl PrecisionRun {
    pub fn passed(&self) -> usize {
        self.results.values().filter(|r| r.overall_pass).count()
    }

    pub fn all_passed(&self) -> bool {
        self.results.values().all(|r| r.overall_pass)
    }
}

/// Write every golden vector and `expected_values.json` into `dir`
pub fn generate_corpus(dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let corpus = golden_corpus();

    let mut written = Vec::with_capacity(corpus.len() + 1);
    for vector in &corpus {
        let path = dir.join(vector.name);
        write_vector(&path, vector)?;
        tracing::info!(path = %path.display(), "Generated test vector");
        written.push(path);
    }

    let expected_path = dir.join(EXPECTED_VALUES_FILE);
    fs::write(&expected_path, serde_json::to_string_pretty(&expected_values(&corpus))?)?;
    written.push(expected_path);

    tracing::info!(vectors = corpus.len(), dir = %dir.display(), "Golden corpus written");
    Ok(written)
}

/// Meter every file listed in the expected values and build the report
///
/// A listed file that is missing or unreadable fails the run.
pub fn run_validation(
    corpus_dir: &Path,
    expected_path: &Path,
    settings: &AnalysisSettings,
) -> Result<PrecisionRun> {
    let expected = parse_expected(&fs::read_to_string(expected_path)?)?;
    if expected.is_empty() {
        return Err(MixcheckError::invalid_input(format!(
            "{} lists no test vectors",
            expected_path.display()
        )));
    }

    let meter = LoudnessStandardsMeter::new(&settings.loudness);
    let validator = PrecisionValidator::new(settings.tolerances);

    let mut results = BTreeMap::new();
    for (name, values) in &expected {
        let buffer = read_wav(&corpus_dir.join(name))?;
        let record = meter.measure(&buffer)?;
        let result = validator.validate(&record, values);
        tracing::info!(
            file = %name,
            measured = %record,
            pass = result.overall_pass,
            "Validated test vector"
        );
        results.insert(name.clone(), result);
    }

    let report = validator.generate_report(&results, &expected);
    Ok(PrecisionRun {
        results,
        expected,
        report,
    })
}
