/// mixcheck-precision - golden-corpus loudness precision check
use anyhow::{bail, Context};
use clap::Parser;
use mixcheck_precision::{generate_corpus, run_validation, PrecisionConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mixcheck-precision")]
#[command(about = "Validate loudness metering against the golden corpus", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./mixcheck.toml when present)
    #[arg(short, long, env = "MIXCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the golden WAV files
    #[arg(short = 'd', long)]
    corpus_dir: Option<PathBuf>,

    /// Expected-values JSON file
    #[arg(short, long)]
    expected: Option<PathBuf>,

    /// Where to write the Markdown report
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Write the synthetic corpus into the corpus directory before validating
    #[arg(short, long)]
    generate: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mixcheck=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config =
        PrecisionConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.corpus_dir {
        config.corpus_dir = dir;
    }
    if let Some(expected) = cli.expected {
        config.expected_file = Some(expected);
    }
    if let Some(report) = cli.report {
        config.report_path = report;
    }

    if cli.generate {
        generate_corpus(&config.corpus_dir).with_context(|| {
            format!("Failed to generate corpus in {}", config.corpus_dir.display())
        })?;
    }

    let expected_path = config.expected_path();
    let run = run_validation(&config.corpus_dir, &expected_path, &config.analysis)
        .with_context(|| format!("Validation of {} failed", config.corpus_dir.display()))?;

    std::fs::write(&config.report_path, &run.report)
        .with_context(|| format!("Failed to write report {}", config.report_path.display()))?;

    tracing::info!(
        passed = run.passed(),
        total = run.results.len(),
        report = %config.report_path.display(),
        "Precision check finished"
    );

    if !run.all_passed() {
        bail!(
            "{} of {} test vectors outside tolerance",
            run.results.len() - run.passed(),
            run.results.len()
        );
    }
    Ok(())
}
