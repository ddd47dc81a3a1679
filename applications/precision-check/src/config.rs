/// Precision-check configuration
use mixcheck_core::{AnalysisSettings, MixcheckError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default configuration file, read from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "mixcheck.toml";

/// Environment variable prefix; nested keys use `__`
pub const ENV_PREFIX: &str = "MIXCHECK";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PrecisionConfig {
    /// Directory holding the golden WAV files
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: PathBuf,

    /// Expected values; defaults to `expected_values.json` in the corpus
    #[serde(default)]
    pub expected_file: Option<PathBuf>,

    /// Where the Markdown report is written
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,

    #[serde(default)]
    pub analysis: AnalysisSettings,
}

impl Default for PrecisionConfig {
    fn default() -> Self {
        Self {
            corpus_dir: default_corpus_dir(),
            expected_file: None,
            report_path: default_report_path(),
            analysis: AnalysisSettings::default(),
        }
    }
}

impl PrecisionConfig {
    /// Load from the config file and `MIXCHECK_*` environment variables
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`load`](Self::load), reading environment overrides from `env`
    /// instead of the process environment when given
    pub fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut settings = config::Config::builder();

        settings = match path {
            Some(path) => settings.add_source(config::File::from(path)),
            None => settings.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: Self = settings
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| MixcheckError::config(e.to_string()))?;
        config.analysis.validate()?;
        Ok(config)
    }

    /// Expected-values file, falling back to the corpus default
    pub fn expected_path(&self) -> PathBuf {
        self.expected_file
            .clone()
            .unwrap_or_else(|| self.corpus_dir.join("expected_values.json"))
    }
}

fn default_corpus_dir() -> PathBuf {
    PathBuf::from("test_vectors")
}

fn default_report_path() -> PathBuf {
    PathBuf::from("precision_report.md")
}
