//! End-to-end check run: schema -> scan -> audit

use sqlcheck_core::{Config, Issue, Report, Schema};
use sqlcheck_scan::{ScanError, Scanner};
use sqlcheck_sql::{SchemaLoadError, SchemaLoader, SqlParser};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::auditor::{Auditor, RuleFailure};

/// Result of a whole run
#[derive(Debug, Default)]
pub struct CheckOutcome {
    /// Issues in discovery order
    pub issues: Vec<Issue>,

    pub files_scanned: usize,
    pub segments_found: usize,
    pub segments_audited: usize,
    pub segments_skipped: usize,

    pub rule_failures: Vec<RuleFailure>,
    pub scan_failures: Vec<ScanError>,

    /// The scan stopped early on cancellation
    pub cancelled: bool,
}

impl CheckOutcome {
    /// Versioned report of this run
    pub fn report(&self) -> Report {
        Report::from_issues(self.issues.clone()).with_scan_stats(
            self.files_scanned,
            self.segments_audited,
            self.segments_skipped,
        )
    }

    pub fn has_fatal(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == sqlcheck_core::Severity::Fatal)
    }
}

/// Errors that abort a run
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("failed to load schema {}: {source}", path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaLoadError,
    },

    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Load the configured schema, or an empty one when none is configured
pub fn load_schema(config: &Config) -> Result<Schema, CheckError> {
    let Some(path) = &config.schema else {
        info!("no schema configured, schema-dependent rules are inactive");
        return Ok(Schema::empty());
    };

    let parser = SqlParser::from_dialect(config.dialect);
    let schema = SchemaLoader::new(&parser)
        .load_file(path)
        .map_err(|source| CheckError::Schema {
            path: path.clone(),
            source,
        })?;

    info!(path = %path.display(), tables = schema.len(), "schema loaded");
    Ok(schema)
}

/// Run a full check with `config`
///
/// Fails only when the configured schema cannot be loaded or the source
/// root does not exist. Every other failure is counted in the outcome.
pub async fn run_check(config: &Config, cancel: CancellationToken) -> Result<CheckOutcome, CheckError> {
    let schema = Arc::new(load_schema(config)?);

    let scanner = Scanner::from_config(config)?;
    let collected = scanner.collect(cancel).await?;

    let auditor = Auditor::from_config(config, schema);
    let summary = auditor.audit_detailed(&collected.segments);

    info!(
        files = collected.files_scanned,
        segments = collected.segments.len(),
        issues = summary.issues.len(),
        "check finished"
    );

    Ok(CheckOutcome {
        issues: summary.issues,
        files_scanned: collected.files_scanned,
        segments_found: collected.segments.len(),
        segments_audited: summary.audited,
        segments_skipped: summary.skipped_segments,
        rule_failures: summary.rule_failures,
        scan_failures: collected.failures,
        cancelled: collected.cancelled,
    })
}
