//! Query shape rules: pagination depth and negative predicates

use sqlcheck_core::{Issue, IssueType, Schema, Severity, SqlSegment};
use sqlcheck_sql::{ParsedStatement, StatementKind};
use sqlparser::ast::{visit_expressions, BinaryOperator, Expr, Value};
use std::convert::Infallible;
use std::ops::ControlFlow;

use crate::auditor::{Rule, RuleError};

/// Default OFFSET above which pagination is reported
pub const DEFAULT_PAGINATION_THRESHOLD: u64 = 5000;

/// Literal OFFSET above a threshold
///
/// The server still reads and discards every skipped row.
pub struct DeepPaginationRule {
    threshold: u64,
}

impl DeepPaginationRule {
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }
}

impl Default for DeepPaginationRule {
    fn default() -> Self {
        Self::new(DEFAULT_PAGINATION_THRESHOLD)
    }
}

impl Rule for DeepPaginationRule {
    fn name(&self) -> &'static str {
        "deep_pagination"
    }

    fn check(
        &self,
        segment: &SqlSegment,
        parsed: &ParsedStatement,
        _schema: &Schema,
    ) -> Result<Vec<Issue>, RuleError> {
        let kind = parsed.kind();
        let (StatementKind::Select { .. }, Some(offset)) = (kind, kind.offset()) else {
            return Ok(Vec::new());
        };

        // Placeholders and expressions are not known until execution
        let Expr::Value(Value::Number(literal, _)) = offset else {
            return Ok(Vec::new());
        };

        let value: u64 = literal
            .parse()
            .map_err(|_| RuleError::InvalidOffset(literal.clone()))?;

        if value <= self.threshold {
            return Ok(Vec::new());
        }

        Ok(vec![Issue::new(
            IssueType::DeepPagination,
            Severity::Warning,
            format!("Deep pagination detected (High Offset: {})", value),
            "Use keyset pagination (WHERE id > last_id) instead of OFFSET.",
            segment,
        )])
    }
}

/// NOT IN, != and leading-wildcard LIKE anywhere in the statement
pub struct NegativeQueryRule;

impl Rule for NegativeQueryRule {
    fn name(&self) -> &'static str {
        "negative_query"
    }

    fn check(
        &self,
        segment: &SqlSegment,
        parsed: &ParsedStatement,
        _schema: &Schema,
    ) -> Result<Vec<Issue>, RuleError> {
        let mut issues = Vec::new();

        let flow = visit_expressions(&parsed.statement, |expr| {
            let finding = match expr {
                Expr::InList { negated: true, .. } | Expr::InSubquery { negated: true, .. } => Some((
                    IssueType::NegativeQuery,
                    "Avoid using NOT IN",
                    "Use NOT EXISTS or LEFT JOIN ... IS NULL which are often better optimized.",
                )),
                Expr::BinaryOp {
                    op: BinaryOperator::NotEq,
                    ..
                } => Some((
                    IssueType::NegativeQuery,
                    "Avoid using != (Not Equal)",
                    "Negative comparison often prevents index usage.",
                )),
                Expr::Like { pattern, .. } | Expr::ILike { pattern, .. }
                    if has_leading_wildcard(pattern) =>
                {
                    Some((
                        IssueType::LeadingWildcard,
                        "LIKE query with leading wildcard",
                        "Leading wildcards confuse the optimizer and prevent index usage (Full Table Scan).",
                    ))
                }
                _ => None,
            };

            if let Some((issue_type, message, suggestion)) = finding {
                issues.push(Issue::new(issue_type, Severity::Warning, message, suggestion, segment));
            }
            ControlFlow::<Infallible>::Continue(())
        });
        if let ControlFlow::Break(never) = flow {
            match never {}
        }

        Ok(issues)
    }
}

fn has_leading_wildcard(pattern: &Expr) -> bool {
    match pattern {
        Expr::Value(Value::SingleQuotedString(text) | Value::DoubleQuotedString(text)) => {
            text.starts_with('%') || text.starts_with('_')
        }
        _ => false,
    }
}
