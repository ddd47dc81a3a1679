//! mixcheck precision check
//!
//! Generates the synthetic golden corpus as 24-bit WAV files, meters each
//! file with the configured loudness engines and writes a Markdown report
//! of the deviations from the expected values.
//!
//! This library exposes the pieces of the binary for testing.

pub mod config;
pub mod runner;
pub mod wav;

pub use config::PrecisionConfig;
pub use runner::{generate_corpus, run_validation, PrecisionRun, EXPECTED_VALUES_FILE};
