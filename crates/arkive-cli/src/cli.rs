//! Argument parsing, configuration layering and the archive run.

use std::path::PathBuf;

use anyhow::anyhow;
use arkive_config::{
    ArkiveConfig, ConfigOverride, LoadOptions, LoadedConfig, LogFormatSetting, load_config,
};
use arkive_fsops::{ArchiveEngine, ArchiveReport, HandlerRegistry};
use arkive_telemetry::{LogFormat, LoggingConfig, init_logging};
use clap::{Parser, ValueEnum};
use tracing::{debug, warn};

use crate::error::{CliError, CliResult};
use crate::output::render_report;

#[derive(Debug, Parser)]
#[command(
    name = "arkive",
    about = "Copy files into a destination tree named by content hash and capture time"
)]
pub(crate) struct Cli {
    /// Configuration file; defaults to /etc/arkive.toml when present.
    #[arg(long, env = "ARKIVE_CONFIG", value_name = "FILE")]
    config_file: Option<PathBuf>,
    /// Log to stderr at LEVEL (trace, debug, info, warn, warning, error, critical, fatal).
    /// Takes precedence over `RUST_LOG`.
    #[arg(short = 'L', long = "logging", value_name = "LEVEL")]
    logging: Option<String>,
    /// Print the combined configuration instead of running.
    #[arg(long)]
    debug_config: bool,
    /// Compute destinations without writing anything.
    #[arg(long)]
    dry_run: bool,
    /// Root directory for relative destination templates.
    #[arg(long, value_name = "DIR")]
    destination: Option<PathBuf>,
    /// Number of files archived in parallel.
    #[arg(long, value_name = "N")]
    workers: Option<u32>,
    #[arg(
        long = "output",
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select how the run summary is printed"
    )]
    output: OutputFormat,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Parse the process arguments, run, and return the exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match execute(&cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: &Cli) -> CliResult<()> {
    let loaded = load(cli)?;
    if cli.debug_config {
        let text = loaded.render().map_err(CliError::config)?;
        print!("{text}");
        return Ok(());
    }

    install_logging(&loaded.config, cli.logging.is_some())?;
    debug!(
        sources = loaded.config.sources.len(),
        destination = %loaded.config.destination.display(),
        "configuration loaded"
    );

    let report = archive(&loaded.config).await?;
    render_report(&report, cli.output)?;
    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::failure(anyhow!(
            "{} of {} item(s) failed to archive",
            report.failures.len(),
            report.failures.len() + report.records.len()
        )))
    }
}

fn load(cli: &Cli) -> CliResult<LoadedConfig> {
    load_config(&load_options(cli)?).map_err(CliError::config)
}

fn load_options(cli: &Cli) -> CliResult<LoadOptions> {
    let mut overrides = Vec::new();
    if let Some(level) = &cli.logging {
        overrides.push(ConfigOverride::section("logging", "level", level.as_str()));
    }
    if cli.dry_run {
        overrides.push(ConfigOverride::section("backup", "dry-run", true));
        overrides.push(ConfigOverride::section(
            "backup-no-timestamp",
            "dry-run",
            true,
        ));
    }
    if let Some(destination) = &cli.destination {
        let destination = destination
            .to_str()
            .ok_or_else(|| CliError::validation("destination must be valid UTF-8"))?;
        overrides.push(ConfigOverride::root("destination", destination));
    }
    if let Some(workers) = cli.workers {
        overrides.push(ConfigOverride::root("workers", i64::from(workers)));
    }
    Ok(LoadOptions {
        config_file: cli.config_file.clone(),
        overrides,
    })
}

fn install_logging(config: &ArkiveConfig, explicit: bool) -> CliResult<()> {
    let format = match config.logging.format {
        Some(LogFormatSetting::Json) => LogFormat::Json,
        Some(LogFormatSetting::Pretty) => LogFormat::Pretty,
        None => LogFormat::infer(),
    };
    init_logging(&LoggingConfig {
        level: &config.logging.level,
        explicit,
        format,
    })
    .map_err(CliError::failure)
}

async fn archive(config: &ArkiveConfig) -> CliResult<ArchiveReport> {
    let engine = ArchiveEngine::from_config(config, &HandlerRegistry::builtin())
        .map_err(|err| CliError::validation(err.detail()))?;
    if config.sources.is_empty() {
        warn!("no source directories configured");
    }
    tokio::task::spawn_blocking(move || engine.archive_all())
        .await
        .map_err(|err| CliError::failure(anyhow!("archive task failed: {err}")))
}
