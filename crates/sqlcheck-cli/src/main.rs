use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sqlcheck_core::{Config, DialectConfig, Report, Reporter};
use sqlcheck_engine::run_check;

mod console;

use console::{ConsoleReporter, JsonReporter};

/// Config file picked up from the working directory
const DEFAULT_CONFIG_FILE: &str = "sqlcheck.toml";

/// sqlcheck - static analysis for SQL embedded in source code
#[derive(Parser, Debug)]
#[command(name = "sqlcheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source directory to scan (default: .)
    #[arg(short, long)]
    src: Option<PathBuf>,

    /// DDL file with CREATE TABLE statements
    #[arg(short = 'S', long)]
    schema: Option<PathBuf>,

    /// Exclude pattern matched against file and directory names (repeatable)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// File extension to scan (repeatable)
    #[arg(long = "ext")]
    extensions: Vec<String>,

    /// Number of concurrent extraction workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// OFFSET above which pagination is reported
    #[arg(long)]
    pagination_threshold: Option<u64>,

    /// SQL dialect (mysql, generic, postgres, sqlite)
    #[arg(long)]
    dialect: Option<DialectConfig>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Console)]
    format: OutputFormat,

    /// Write the JSON report to this file
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Path to config file (default: sqlcheck.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Console,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;

    if cli.verbose {
        eprintln!("{} {}", "Scanning:".cyan(), config.source_root.display());
        match &config.schema {
            Some(schema) => eprintln!("{} {}", "Schema:".cyan(), schema.display()),
            None => eprintln!("{}", "No schema given, index and type checks are off".yellow()),
        }
        eprintln!("{} {:?}", "Dialect:".cyan(), config.dialect);
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, finishing files in flight");
                cancel.cancel();
            }
        }
    });

    let outcome = run_check(&config, cancel).await.context("sqlcheck run failed")?;
    if outcome.cancelled {
        eprintln!("{}", "Scan interrupted, results are partial".yellow());
    }

    let report = outcome.report();
    emit(&report, cli.format, cli.out.as_deref())?;

    if report.has_fatal() {
        std::process::exit(1);
    }

    Ok(())
}

/// stderr logging; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Config file (explicit, or sqlcheck.toml if present) with flags applied on top
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(path) = &cli.config {
        Config::from_file(path).with_context(|| format!("failed to load config {}", path.display()))?
    } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
        Config::from_file(Path::new(DEFAULT_CONFIG_FILE))
            .with_context(|| format!("failed to load {}", DEFAULT_CONFIG_FILE))?
    } else {
        Config::default()
    };

    apply_flags(cli, &mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn apply_flags(cli: &Cli, config: &mut Config) {
    if let Some(src) = &cli.src {
        config.source_root = src.clone();
    }
    if let Some(schema) = &cli.schema {
        config.schema = Some(schema.clone());
    }
    if !cli.exclude.is_empty() {
        config.exclude = cli.exclude.clone();
    }
    if !cli.extensions.is_empty() {
        config.extensions = cli.extensions.clone();
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(threshold) = cli.pagination_threshold {
        config.deep_pagination_threshold = threshold;
    }
    if let Some(dialect) = cli.dialect {
        config.dialect = dialect;
    }
}

/// Render the report in the chosen format; `--out` always gets JSON
fn emit(report: &Report, format: OutputFormat, out: Option<&Path>) -> Result<()> {
    match (format, out) {
        (OutputFormat::Json, None) => JsonReporter::stdout().report(report)?,
        (OutputFormat::Json, Some(_)) => {}
        (OutputFormat::Console, _) => ConsoleReporter::stdout().report(report)?,
    }

    if let Some(path) = out {
        JsonReporter::file(path)
            .and_then(|mut reporter| reporter.report(report))
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        eprintln!("{} {}", "Report saved to:".green(), path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "sqlcheck",
            "-s",
            "services",
            "-S",
            "db/schema.sql",
            "-e",
            "gen",
            "-e",
            "*_mock.go",
            "--ext",
            "go",
            "-w",
            "3",
            "--pagination-threshold",
            "100",
            "--dialect",
            "postgres",
            "-f",
            "json",
        ])
        .unwrap();

        let mut config = Config::default();
        apply_flags(&cli, &mut config);

        assert_eq!(config.source_root, PathBuf::from("services"));
        assert_eq!(config.schema, Some(PathBuf::from("db/schema.sql")));
        assert_eq!(config.exclude, vec!["gen", "*_mock.go"]);
        assert_eq!(config.extensions, vec!["go"]);
        assert_eq!(config.workers, 3);
        assert_eq!(config.deep_pagination_threshold, 100);
        assert_eq!(config.dialect, DialectConfig::Postgres);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = Cli::try_parse_from(["sqlcheck"]).unwrap();
        let mut config = Config::default();
        apply_flags(&cli, &mut config);

        assert_eq!(config, Config::default());
        assert_eq!(cli.format, OutputFormat::Console);
    }

    #[test]
    fn explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "workers = 2\ndeep_pagination_threshold = 42\n").unwrap();

        let cli = Cli::try_parse_from(["sqlcheck", "-c", path.to_str().unwrap(), "-w", "6"]).unwrap();
        let config = load_config(&cli).unwrap();

        assert_eq!(config.workers, 6);
        assert_eq!(config.deep_pagination_threshold, 42);
    }

    #[test]
    fn invalid_flag_values() {
        assert!(Cli::try_parse_from(["sqlcheck", "--dialect", "oracle"]).is_err());
        assert!(Cli::try_parse_from(["sqlcheck", "-f", "html"]).is_err());

        let cli = Cli::try_parse_from(["sqlcheck", "-c", "/no/such/config.toml"]).unwrap();
        assert!(load_config(&cli).is_err());
    }
}
