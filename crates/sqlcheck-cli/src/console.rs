//! Console and JSON reporters

use colored::Colorize;
use sqlcheck_core::{Report, ReportError, Reporter, Severity};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Maximum characters of SQL shown per issue
const SNIPPET_WIDTH: usize = 80;

/// Human-readable, colored issue listing
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn report(&mut self, report: &Report) -> Result<(), ReportError> {
        if report.issues.is_empty() {
            writeln!(self.out, "{}", "✓ No SQL issues found!".green().bold())?;
            return Ok(());
        }

        for issue in &report.issues {
            let level = match issue.severity {
                Severity::Fatal => issue.severity.to_string().red().bold(),
                Severity::Warning => issue.severity.to_string().yellow().bold(),
                Severity::Suggestion => issue.severity.to_string().blue().bold(),
            };

            writeln!(
                self.out,
                "{}: [{}] {}",
                issue.location(),
                level,
                issue.message
            )?;
            writeln!(self.out, "    Code: {}", snippet(&issue.segment.sql).cyan())?;
            writeln!(self.out, "    Suggestion: {}", issue.suggestion)?;
            writeln!(self.out)?;
        }

        let summary = &report.summary;
        writeln!(self.out, "{}", "Summary:".bold())?;
        writeln!(self.out, "  Total issues: {}", summary.total)?;

        if summary.fatal > 0 {
            writeln!(self.out, "  Fatal:       {}", summary.fatal.to_string().red().bold())?;
        } else {
            writeln!(self.out, "  Fatal:       {}", summary.fatal.to_string().green())?;
        }
        writeln!(self.out, "  Warnings:    {}", summary.warnings.to_string().yellow())?;
        writeln!(self.out, "  Suggestions: {}", summary.suggestions)?;
        writeln!(
            self.out,
            "  Scanned {} files, audited {} segments ({} unparsable)",
            summary.files_scanned, summary.segments_audited, summary.segments_skipped
        )?;

        self.out.flush()?;
        Ok(())
    }
}

/// Single-line SQL, cut to [`SNIPPET_WIDTH`] characters
fn snippet(sql: &str) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");

    if flat.chars().count() > SNIPPET_WIDTH {
        let cut: String = flat.chars().take(SNIPPET_WIDTH).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

/// Writes the versioned JSON report
pub struct JsonReporter<W: Write> {
    out: W,
}

impl JsonReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl JsonReporter<BufWriter<File>> {
    /// Report into a file, truncating it
    pub fn file(path: &Path) -> Result<Self, ReportError> {
        Ok(Self {
            out: BufWriter::new(File::create(path)?),
        })
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, report: &Report) -> Result<(), ReportError> {
        writeln!(self.out, "{}", report.to_json()?)?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlcheck_core::{Issue, IssueType, Location, SqlSegment};

    fn sample_report() -> Report {
        let segment = SqlSegment::new("DELETE\n  FROM users", Location::new("app/db.go", 12), "go");
        Report::from_issues(vec![Issue::new(
            IssueType::UnsafeDelete,
            Severity::Fatal,
            "DELETE statement executed without WHERE clause (Full Table Delete)",
            "Add a WHERE clause to limit the scope of the delete.",
            &segment,
        )])
        .with_scan_stats(3, 1, 0)
    }

    #[test]
    fn console_lists_issues() {
        colored::control::set_override(false);

        let mut reporter = ConsoleReporter::new(Vec::new());
        reporter.report(&sample_report()).unwrap();
        let text = String::from_utf8(reporter.into_inner()).unwrap();

        assert!(text.contains("app/db.go:12: [FATAL] DELETE statement executed without WHERE clause"));
        assert!(text.contains("Code: DELETE FROM users"));
        assert!(text.contains("Suggestion: Add a WHERE clause"));
        assert!(text.contains("Total issues: 1"));
        assert!(text.contains("Scanned 3 files"));
    }

    #[test]
    fn console_empty_report() {
        colored::control::set_override(false);

        let mut reporter = ConsoleReporter::new(Vec::new());
        reporter.report(&Report::new()).unwrap();
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(text.contains("No SQL issues found"));
    }

    #[test]
    fn snippet_truncation() {
        assert_eq!(snippet("SELECT 1"), "SELECT 1");
        let long = format!("SELECT {} FROM t", "a, ".repeat(40));
        let cut = snippet(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), SNIPPET_WIDTH + 3);
    }

    #[test]
    fn json_reporter_output_parses() {
        let mut reporter = JsonReporter::new(Vec::new());
        reporter.report(&sample_report()).unwrap();

        let parsed: Report = serde_json::from_slice(&reporter.into_inner()).unwrap();
        assert_eq!(parsed.summary.fatal, 1);
        assert_eq!(parsed.issues[0].issue_type, IssueType::UnsafeDelete);
    }

    #[test]
    fn json_reporter_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        JsonReporter::file(&path).unwrap().report(&sample_report()).unwrap();
        let parsed: Report = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.summary.files_scanned, 3);
    }
}
