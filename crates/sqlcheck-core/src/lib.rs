//! sqlcheck core
//!
//! Core domain model shared by every sqlcheck crate.
//! Never rename issue type identifiers - they are part of the public API.

pub mod issue;
pub mod schema;
pub mod report;
pub mod config;

pub use issue::{Issue, IssueType, Severity, Location, SqlSegment};
pub use schema::{Column, Index, Schema, SchemaBuilder, SchemaError, Table, PRIMARY_INDEX_NAME};
pub use report::{Report, ReportError, ReportSummary, ReportVersion, Reporter};
pub use config::{Config, ConfigError, DialectConfig, SeverityThreshold};
