//! batchqa - quality assurance for delivered newspaper batches
//!
//! Runs the fixed check pipeline against one batch directory and prints an
//! aggregated report.
//!
//! ## Exit codes
//!
//! - `0`: all checks passed
//! - `1`: at least one check recorded a failure
//! - `2`: usage or setup error, no checks were run

use anyhow::{Context, Result};
use batchqa_core::{Batch, CheckableComponent, QaConfig};
use batchqa_pipeline::{ExitStatus, PipelineRunner, ReportFormat, Verdict};
use clap::{CommandFactory, Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "batchqa")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run quality assurance checks against a newspaper batch", long_about = None)]
struct Cli {
    /// Batch directory to check
    batch_dir: PathBuf,

    /// Set a configuration property (repeatable)
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE")]
    defines: Vec<String>,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text, env = "BATCHQA_FORMAT")]
    format: Format,

    /// Debug logging and failure traces in the text report
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json_logs: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for ReportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => ReportFormat::Text,
            Format::Json => ReportFormat::Json,
        }
    }
}

/// Everything the pipeline needs, assembled before it starts.
struct Setup {
    batch: Batch,
    // Keeps the scratch directory alive for the run
    _config: QaConfig,
    components: Vec<Box<dyn CheckableComponent>>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    batchqa_core::init_tracing(cli.json_logs, level);
    info!(version = batchqa_core::VERSION, "Entered batchqa");

    let setup = match prepare(&cli.batch_dir, &cli.defines) {
        Ok(setup) => setup,
        Err(err) => {
            eprintln!("{}", Cli::command().render_usage());
            eprintln!("Error: {err:?}");
            return ExitStatus::Usage.into();
        }
    };

    let runner = PipelineRunner::new(setup.components);
    let result = runner.process_batch(&setup.batch).await;

    match Verdict::evaluate(&result, cli.format.into(), cli.verbose) {
        Ok(verdict) => {
            println!("{}", verdict.report);
            verdict.status.into()
        }
        Err(err) => {
            eprintln!("Error: failed to render report: {err:?}");
            // The verdict itself does not depend on rendering
            if result.is_success() {
                ExitStatus::Success.into()
            } else {
                ExitStatus::Failures.into()
            }
        }
    }
}

/// Resolve the batch, assemble configuration and build the pipeline.
fn prepare(batch_dir: &Path, defines: &[String]) -> Result<Setup> {
    let shown = std::path::absolute(batch_dir).unwrap_or_else(|_| batch_dir.to_path_buf());
    println!("Looking at: {}", shown.display());

    let batch = Batch::identify(batch_dir).context("Must have first argument as existing directory")?;
    let config = QaConfig::assemble(batch_dir, defines).context("Failed to assemble configuration")?;
    for (key, value) in config.iter() {
        tracing::debug!(key = %key, value = %value, "Configuration property");
    }
    let components =
        batchqa_checks::standard_pipeline(&config).context("Failed to construct check components")?;

    Ok(Setup {
        batch,
        _config: config,
        components,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_defines_and_format() {
        let cli = Cli::try_parse_from([
            "batchqa",
            "-D",
            "threadsPerBatch=2",
            "--define",
            "atNinestars=false",
            "--format",
            "json",
            "/data/B-42",
        ])
        .expect("parse");
        assert_eq!(cli.defines, vec!["threadsPerBatch=2", "atNinestars=false"]);
        assert!(matches!(cli.format, Format::Json));
        assert_eq!(cli.batch_dir, PathBuf::from("/data/B-42"));
    }

    #[test]
    fn test_missing_batch_dir_is_usage_error() {
        let err = Cli::try_parse_from(["batchqa"]).err().expect("error");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_prepare_rejects_missing_directory() {
        let err = prepare(Path::new("/tmp/does-not-exist-batchqa"), &[]).err().expect("error");
        let root = err.root_cause().to_string();
        assert!(root.contains("not a directory"));
    }

    #[test]
    fn test_prepare_rejects_bad_pattern() {
        let dir = tempfile::tempdir().expect("tempdir");
        let defines = vec!["iterator.datafilePattern=(".to_string()];
        let err = prepare(dir.path(), &defines).err().expect("error");
        assert!(format!("{err:#}").contains("construct check components"));
    }
}
