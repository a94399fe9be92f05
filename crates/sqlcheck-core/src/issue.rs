//! Issue types and source locations
//!
//! IMPORTANT: Issue type identifiers are stable.
//! NEVER rename or remove them - report consumers match on these strings.
//! Add new types with new names only.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Issue type registry
///
/// These identifiers are STABLE.
/// Do NOT rename or remove variants - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    /// UPDATE without a WHERE clause
    UnsafeUpdate,

    /// DELETE without a WHERE clause
    UnsafeDelete,

    /// Bare `*` in a SELECT projection
    SelectStar,

    /// WHERE clause does not constrain the leading column of any index
    IndexMiss,

    /// Target table declares no index at all
    NoIndexesDefined,

    /// String column compared against a numeric literal
    ImplicitConversion,

    /// Literal OFFSET above the configured threshold
    DeepPagination,

    /// NOT IN or != predicate
    NegativeQuery,

    /// LIKE pattern starting with a wildcard
    LeadingWildcard,
}

impl IssueType {
    /// All issue types, in declaration order
    pub const ALL: [IssueType; 9] = [
        Self::UnsafeUpdate,
        Self::UnsafeDelete,
        Self::SelectStar,
        Self::IndexMiss,
        Self::NoIndexesDefined,
        Self::ImplicitConversion,
        Self::DeepPagination,
        Self::NegativeQuery,
        Self::LeadingWildcard,
    ];

    /// Get the issue type as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsafeUpdate => "UNSAFE_UPDATE",
            Self::UnsafeDelete => "UNSAFE_DELETE",
            Self::SelectStar => "SELECT_STAR",
            Self::IndexMiss => "INDEX_MISS",
            Self::NoIndexesDefined => "NO_INDEXES_DEFINED",
            Self::ImplicitConversion => "IMPLICIT_CONVERSION",
            Self::DeepPagination => "DEEP_PAGINATION",
            Self::NegativeQuery => "NEGATIVE_QUERY",
            Self::LeadingWildcard => "LEADING_WILDCARD",
        }
    }

    /// Look up an issue type by its stable identifier (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Issue severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Improvement worth considering
    Suggestion,

    /// Likely performance problem - should be reviewed
    Warning,

    /// Dangerous statement that should fail CI
    Fatal,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Suggestion => write!(f, "SUGGESTION"),
            Self::Warning => write!(f, "WARNING"),
            Self::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Physical location of an extracted segment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Path of the scanned file
    pub file: PathBuf,

    /// Line number (1-indexed) where the literal starts
    pub line: usize,
}

impl Location {
    /// Create a location with file and line number
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// A candidate SQL fragment extracted from source code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SqlSegment {
    /// SQL text with the surrounding quotes stripped
    pub sql: String,

    /// Where the literal starts
    pub location: Location,

    /// Source tag (lower-cased file extension)
    pub source: String,
}

impl SqlSegment {
    /// Create a new segment
    pub fn new(sql: impl Into<String>, location: Location, source: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            location,
            source: source.into(),
        }
    }
}

/// A finding reported by a rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Issue {
    /// Stable issue type
    #[serde(rename = "type")]
    pub issue_type: IssueType,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// How to fix it
    pub suggestion: String,

    /// Segment the issue was found in
    pub segment: SqlSegment,
}

impl Issue {
    /// Create a new issue
    pub fn new(
        issue_type: IssueType,
        severity: Severity,
        message: impl Into<String>,
        suggestion: impl Into<String>,
        segment: &SqlSegment,
    ) -> Self {
        Self {
            issue_type,
            severity,
            message: message.into(),
            suggestion: suggestion.into(),
            segment: segment.clone(),
        }
    }

    /// Location of the originating segment
    pub fn location(&self) -> &Location {
        &self.segment.location
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_type_stability() {
        assert_eq!(IssueType::UnsafeDelete.as_str(), "UNSAFE_DELETE");
        assert_eq!(IssueType::NoIndexesDefined.as_str(), "NO_INDEXES_DEFINED");
        assert_eq!(IssueType::LeadingWildcard.to_string(), "LEADING_WILDCARD");
    }

    #[test]
    fn issue_type_lookup() {
        for t in IssueType::ALL {
            assert_eq!(IssueType::from_name(t.as_str()), Some(t));
        }
        assert_eq!(IssueType::from_name("select_star"), Some(IssueType::SelectStar));
        assert_eq!(IssueType::from_name("NOPE"), None);
    }

    #[test]
    fn location_display() {
        let loc = Location::new("src/db.go", 42);
        assert_eq!(loc.to_string(), "src/db.go:42");
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Fatal > Severity::Warning);
        assert!(Severity::Warning > Severity::Suggestion);
    }

    #[test]
    fn issue_serialization() {
        let seg = SqlSegment::new("DELETE FROM users", Location::new("main.go", 7), "go");
        let issue = Issue::new(
            IssueType::UnsafeDelete,
            Severity::Fatal,
            "DELETE without WHERE",
            "Add a WHERE clause",
            &seg,
        );

        let json = serde_json::to_string(&issue).unwrap();
        assert!(json.contains("\"type\":\"UNSAFE_DELETE\""));
        assert!(json.contains("\"severity\":\"FATAL\""));
        assert_eq!(issue.location().line, 7);
    }
}
