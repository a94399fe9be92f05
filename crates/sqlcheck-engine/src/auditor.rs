//! Rule engine
//!
//! The [`Auditor`] owns an ordered rule registry and a read-only schema.
//! Auditing parses each segment once and runs every rule against it.
//! Unparsable segments and failing rules are contained: they are counted
//! and logged, never fatal to the run.

use sqlcheck_core::{Config, Issue, Location, Schema, SeverityThreshold, SqlSegment};
use sqlcheck_sql::{ParsedStatement, SqlParser};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::rules::default_rules;

/// A single check over one parsed statement
///
/// Rules are stateless: the same rule instance is applied to every segment.
pub trait Rule: Send + Sync {
    /// Stable rule name (used by `disabled_rules`)
    fn name(&self) -> &'static str;

    /// Inspect one statement
    fn check(
        &self,
        segment: &SqlSegment,
        parsed: &ParsedStatement,
        schema: &Schema,
    ) -> Result<Vec<Issue>, RuleError>;
}

/// A rule could not evaluate a statement
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("OFFSET literal '{0}' is not a valid unsigned integer")]
    InvalidOffset(String),

    #[error("{0}")]
    Other(String),
}

/// A rule that failed on a segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    pub rule: &'static str,
    pub location: Location,
    pub error: RuleError,
}

/// Issues plus the counters behind them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditSummary {
    /// Issues in discovery order
    pub issues: Vec<Issue>,

    /// Segments that parsed and went through the rules
    pub audited: usize,

    /// Segments dropped because they did not parse
    pub skipped_segments: usize,

    /// Rules that returned an error
    pub rule_failures: Vec<RuleFailure>,
}

/// Runs registered rules over SQL segments
pub struct Auditor {
    rules: Vec<Box<dyn Rule>>,
    schema: Arc<Schema>,
    parser: SqlParser,
    severity: SeverityThreshold,
}

impl Auditor {
    /// Auditor with no rules and the MySQL parser
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            rules: Vec::new(),
            schema,
            parser: SqlParser::new(),
            severity: SeverityThreshold::default(),
        }
    }

    /// Auditor with the default rule set, dialect and severity overrides from `config`
    pub fn from_config(config: &Config, schema: Arc<Schema>) -> Self {
        let mut auditor = Self::new(schema)
            .with_parser(SqlParser::from_dialect(config.dialect))
            .with_severity(config.severity.clone());

        for rule in default_rules(config) {
            auditor.register(rule);
        }

        auditor
    }

    pub fn with_parser(mut self, parser: SqlParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_severity(mut self, severity: SeverityThreshold) -> Self {
        self.severity = severity;
        self
    }

    /// Append a rule; rules run in registration order
    pub fn register(&mut self, rule: Box<dyn Rule>) -> &mut Self {
        debug!(rule = rule.name(), "registered rule");
        self.rules.push(rule);
        self
    }

    /// Names of registered rules, in order
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Audit segments and return the flat issue list
    pub fn audit(&self, segments: &[SqlSegment]) -> Vec<Issue> {
        self.audit_detailed(segments).issues
    }

    /// Audit segments, keeping skip and failure counters
    pub fn audit_detailed(&self, segments: &[SqlSegment]) -> AuditSummary {
        let mut summary = AuditSummary::default();

        for segment in segments {
            let parsed = match self.parser.parse(&segment.sql) {
                Ok(parsed) => parsed,
                Err(err) => {
                    debug!(location = %segment.location, error = %err, "skipping unparsable segment");
                    summary.skipped_segments += 1;
                    continue;
                }
            };

            if parsed.was_truncated() {
                debug!(
                    location = %segment.location,
                    statements = parsed.statement_count,
                    "only the first statement is audited"
                );
            }

            summary.audited += 1;

            for rule in &self.rules {
                match rule.check(segment, &parsed, &self.schema) {
                    Ok(issues) => {
                        summary.issues.extend(issues.into_iter().map(|mut issue| {
                            issue.severity =
                                self.severity.get_severity(issue.issue_type, issue.severity);
                            issue
                        }));
                    }
                    Err(error) => {
                        warn!(
                            rule = rule.name(),
                            location = %segment.location,
                            error = %error,
                            "rule failed"
                        );
                        summary.rule_failures.push(RuleFailure {
                            rule: rule.name(),
                            location: segment.location.clone(),
                            error,
                        });
                    }
                }
            }
        }

        debug!(
            audited = summary.audited,
            skipped = summary.skipped_segments,
            issues = summary.issues.len(),
            "audit finished"
        );

        summary
    }
}

impl std::fmt::Debug for Auditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auditor")
            .field("rules", &self.rule_names())
            .field("tables", &self.schema.len())
            .finish()
    }
}
