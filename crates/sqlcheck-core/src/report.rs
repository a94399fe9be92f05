//! Report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use crate::issue::{Issue, Severity};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total number of issues
    pub total: usize,

    /// Number of FATAL issues
    pub fatal: usize,

    /// Number of warnings
    pub warnings: usize,

    /// Number of suggestions
    pub suggestions: usize,

    /// Number of files the extractor processed
    pub files_scanned: usize,

    /// Number of segments that parsed and were audited
    pub segments_audited: usize,

    /// Number of segments dropped because they did not parse
    pub segments_skipped: usize,
}

/// Check report (report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Summary statistics
    pub summary: ReportSummary,

    /// All issues in discovery order
    pub issues: Vec<Issue>,
}

impl Report {
    /// Create a new empty report
    pub fn new() -> Self {
        Self::from_issues(Vec::new())
    }

    /// Create a report from issues
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        let count = |s: Severity| issues.iter().filter(|i| i.severity == s).count();

        let summary = ReportSummary {
            total: issues.len(),
            fatal: count(Severity::Fatal),
            warnings: count(Severity::Warning),
            suggestions: count(Severity::Suggestion),
            ..ReportSummary::default()
        };

        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary,
            issues,
        }
    }

    /// Attach scan statistics
    pub fn with_scan_stats(mut self, files_scanned: usize, audited: usize, skipped: usize) -> Self {
        self.summary.files_scanned = files_scanned;
        self.summary.segments_audited = audited;
        self.summary.segments_skipped = skipped;
        self
    }

    /// Check if the report has any FATAL issues
    pub fn has_fatal(&self) -> bool {
        self.summary.fatal > 0
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ReportError> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer of audit results (console, JSON file, ...)
pub trait Reporter {
    /// Render or persist the issues
    fn report(&mut self, report: &Report) -> Result<(), ReportError>;
}

/// Reporting error types
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{IssueType, Location, SqlSegment};

    fn issue(issue_type: IssueType, severity: Severity) -> Issue {
        let seg = SqlSegment::new("SELECT * FROM t", Location::new("a.go", 1), "go");
        Issue::new(issue_type, severity, "msg", "fix", &seg)
    }

    #[test]
    fn empty_report() {
        let report = Report::new();
        assert_eq!(report.version, ReportVersion::CURRENT);
        assert_eq!(report.summary.total, 0);
        assert!(!report.has_fatal());
    }

    #[test]
    fn report_with_issues() {
        let report = Report::from_issues(vec![
            issue(IssueType::UnsafeDelete, Severity::Fatal),
            issue(IssueType::SelectStar, Severity::Suggestion),
            issue(IssueType::IndexMiss, Severity::Warning),
        ])
        .with_scan_stats(4, 3, 1);

        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.fatal, 1);
        assert_eq!(report.summary.warnings, 1);
        assert_eq!(report.summary.suggestions, 1);
        assert_eq!(report.summary.files_scanned, 4);
        assert_eq!(report.summary.segments_skipped, 1);
        assert!(report.has_fatal());
    }

    #[test]
    fn report_serialization() {
        let report = Report::from_issues(vec![issue(IssueType::SelectStar, Severity::Suggestion)]);
        let json = report.to_json().unwrap();
        assert!(json.contains("\"version\""));
        assert!(json.contains("\"issues\""));
        assert!(json.contains("SELECT_STAR"));
    }

    #[test]
    fn save_to_file_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        Report::new().save_to_file(&path).unwrap();

        let parsed: Report = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.summary.total, 0);
    }
}
