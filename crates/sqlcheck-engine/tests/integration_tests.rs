//! Integration tests for the full check pipeline

use pretty_assertions::assert_eq;
use sqlcheck_core::{Config, IssueType, Severity};
use sqlcheck_engine::{run_check, CheckError, CheckOutcome};
use sqlcheck_scan::ScanError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

const USERS_DDL: &str = r#"
CREATE TABLE users (
    id INT PRIMARY KEY,
    name VARCHAR(255),
    email VARCHAR(255),
    created_at DATETIME,
    KEY idx_email (email)
);
"#;

const QUERIES_GO: &str = r#"package main

func main() {
    q1 := "SELECT * FROM users WHERE id = 1"
    q2 := `UPDATE orders SET status = 'paid' WHERE id = 100`
    q3 := "DELETE FROM users"

    q4 := "SELECT * FROM users WHERE name = 123"
    q5 := "SELECT * FROM users WHERE email LIKE '%@gmail.com'"
    q6 := "SELECT * FROM users WHERE created_at = '2023-01-01'"
    q7 := "SELECT * FROM users WHERE id > 1 LIMIT 10000, 10"

    q8 := "SELECT * FROM users WHERE email = 'test@example.com'"
    s := "SELECTING items is fun"
}
"#;

struct Fixture {
    _dir: tempfile::TempDir,
    config: Config,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(src.join("vendor/dep")).unwrap();
    fs::write(src.join("main.go"), QUERIES_GO).unwrap();
    fs::write(src.join("main_test.go"), "q := \"DELETE FROM users\"").unwrap();
    fs::write(src.join("vendor/dep/x.go"), "q := \"DELETE FROM users\"").unwrap();

    let schema = dir.path().join("schema.sql");
    fs::write(&schema, USERS_DDL).unwrap();

    let config = Config {
        source_root: src,
        schema: Some(schema),
        workers: 4,
        ..Config::default()
    };

    Fixture { _dir: dir, config }
}

fn counts(outcome: &CheckOutcome) -> BTreeMap<IssueType, usize> {
    let mut counts = BTreeMap::new();
    for issue in &outcome.issues {
        *counts.entry(issue.issue_type).or_insert(0) += 1;
    }
    counts
}

fn signature(outcome: &CheckOutcome) -> Vec<(PathBuf, usize, IssueType, String)> {
    let mut issues: Vec<_> = outcome
        .issues
        .iter()
        .map(|i| {
            (
                i.segment.location.file.clone(),
                i.segment.location.line,
                i.issue_type,
                i.message.clone(),
            )
        })
        .collect();
    issues.sort();
    issues
}

#[tokio::test]
async fn end_to_end_go_source() {
    let fixture = fixture();
    let outcome = run_check(&fixture.config, CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.files_scanned, 1);
    assert_eq!(outcome.segments_found, 8);
    assert_eq!(outcome.segments_audited, 8);
    assert_eq!(outcome.segments_skipped, 0);
    assert!(outcome.rule_failures.is_empty());

    let expected: BTreeMap<IssueType, usize> = [
        (IssueType::UnsafeDelete, 1),
        (IssueType::SelectStar, 6),
        (IssueType::IndexMiss, 2),
        (IssueType::ImplicitConversion, 1),
        (IssueType::DeepPagination, 1),
        (IssueType::LeadingWildcard, 1),
    ]
    .into_iter()
    .collect();
    assert_eq!(counts(&outcome), expected);

    assert!(outcome.has_fatal());
    let fatal: Vec<usize> = outcome
        .issues
        .iter()
        .filter(|i| i.severity == Severity::Fatal)
        .map(|i| i.segment.location.line)
        .collect();
    assert_eq!(fatal, vec![6]);
}

#[tokio::test]
async fn issues_for_one_segment_follow_rule_order() {
    let fixture = fixture();
    let outcome = run_check(&fixture.config, CancellationToken::new()).await.unwrap();

    let line_8: Vec<IssueType> = outcome
        .issues
        .iter()
        .filter(|i| i.segment.location.line == 8)
        .map(|i| i.issue_type)
        .collect();
    assert_eq!(
        line_8,
        vec![IssueType::SelectStar, IssueType::IndexMiss, IssueType::ImplicitConversion]
    );
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let fixture = fixture();
    let first = run_check(&fixture.config, CancellationToken::new()).await.unwrap();
    let second = run_check(&fixture.config, CancellationToken::new()).await.unwrap();

    assert_eq!(signature(&first), signature(&second));
}

#[tokio::test]
async fn report_carries_scan_stats() {
    let fixture = fixture();
    let report = run_check(&fixture.config, CancellationToken::new())
        .await
        .unwrap()
        .report();

    assert_eq!(report.summary.total, 12);
    assert_eq!(report.summary.fatal, 1);
    assert_eq!(report.summary.suggestions, 6);
    assert_eq!(report.summary.warnings, 5);
    assert_eq!(report.summary.files_scanned, 1);
    assert_eq!(report.summary.segments_audited, 8);
}

#[tokio::test]
async fn without_schema_only_schema_free_rules_fire() {
    let fixture = fixture();
    let config = Config {
        schema: None,
        ..fixture.config.clone()
    };
    let outcome = run_check(&config, CancellationToken::new()).await.unwrap();

    let found = counts(&outcome);
    assert!(!found.contains_key(&IssueType::IndexMiss));
    assert!(!found.contains_key(&IssueType::ImplicitConversion));
    assert_eq!(found.get(&IssueType::UnsafeDelete), Some(&1));
    assert_eq!(found.get(&IssueType::DeepPagination), Some(&1));
}

#[tokio::test]
async fn config_threshold_and_disabled_rules() {
    let fixture = fixture();
    let config = Config {
        deep_pagination_threshold: 20000,
        disabled_rules: vec!["select_star".into()],
        ..fixture.config.clone()
    };
    let outcome = run_check(&config, CancellationToken::new()).await.unwrap();

    let found = counts(&outcome);
    assert!(!found.contains_key(&IssueType::SelectStar));
    assert!(!found.contains_key(&IssueType::DeepPagination));
    assert_eq!(outcome.issues.len(), 5);
}

#[tokio::test]
async fn unreadable_schema_aborts_the_run() {
    let fixture = fixture();
    let config = Config {
        schema: Some(Path::new("/no/such/schema.sql").to_path_buf()),
        ..fixture.config.clone()
    };

    let err = run_check(&config, CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, CheckError::Schema { .. }));
}

#[tokio::test]
async fn invalid_schema_aborts_the_run() {
    let fixture = fixture();
    let bad = fixture._dir.path().join("bad.sql");
    fs::write(&bad, "CREATE TABLE t (id INT, KEY idx_missing (missing));").unwrap();

    let config = Config {
        schema: Some(bad),
        ..fixture.config.clone()
    };
    let err = run_check(&config, CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, CheckError::Schema { .. }));
}

#[tokio::test]
async fn missing_source_root_aborts_the_run() {
    let config = Config {
        source_root: PathBuf::from("/no/such/source"),
        ..Config::default()
    };

    let err = run_check(&config, CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, CheckError::Scan(ScanError::RootNotFound(_))));
}

#[tokio::test]
async fn cancelled_run_still_returns_an_outcome() {
    let fixture = fixture();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = run_check(&fixture.config, cancel).await.unwrap();
    assert!(outcome.cancelled);
    assert!(outcome.issues.is_empty());
}
