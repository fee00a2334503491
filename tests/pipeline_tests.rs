//! End-to-end runs over a scratch directory.

mod common;

use card_insights::data::DataSourceError;
use card_insights::query::QUERIES;
use card_insights::store::Store;
use card_insights::{Pipeline, PipelineConfig, PipelineError};
use common::write_sources;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn config(root: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.data_dir = Some(root.join("data"));
    config.output_dir = root.join("out");
    config.charts.width = 400;
    config.charts.height = 240;
    config
}

fn scratch() -> TempDir {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    write_sources(&data);
    dir
}

#[test]
fn full_run_writes_every_output() {
    let dir = scratch();
    let config = config(dir.path());
    let out = config.output_dir.clone();

    let summary = Pipeline::new(config).with_search_root(dir.path()).run().unwrap();
    assert!(summary.is_success(), "{:?}", summary.failures);
    assert!(!summary.preview_only);
    assert_eq!(
        summary.tables,
        vec![
            ("users".to_string(), 2),
            ("cards".to_string(), 3),
            ("transactions".to_string(), 2)
        ]
    );

    for query in QUERIES.iter() {
        let csv = out.join("results").join(format!("{}.csv", query.name));
        assert!(csv.is_file(), "{}", csv.display());
        let png = out.join("charts").join(format!("{}.png", query.name));
        assert_eq!(png.is_file(), query.chart.is_some(), "{}", png.display());
    }
    assert!(out.join("charts").join("charts_deck.pptx").is_file());
    assert!(!out.join("data_quality.json").exists());

    let preview = fs::read_to_string(out.join("data_preview.txt")).unwrap();
    assert!(preview.contains("[USERS]  shape: 2 rows x"));
    assert!(preview.contains("[TRANSACTIONS]  key columns present: id=Y, client_id=Y, card_id=Y"));

    let monthly = fs::read_to_string(out.join("results/monthly_transactions.csv")).unwrap();
    assert_eq!(monthly.lines().next(), Some("month,txn_count,total_amount"));
    assert!(monthly.contains("2019-01,2,30"));

    let store = Store::open(&out.join("user_behavior.db")).unwrap();
    assert_eq!(store.read_table("users").unwrap().height(), 2);
}

#[test]
fn rerun_replaces_tables() {
    let dir = scratch();
    Pipeline::new(config(dir.path())).with_search_root(dir.path()).run().unwrap();
    let summary = Pipeline::new(config(dir.path())).with_search_root(dir.path()).run().unwrap();
    assert!(summary.is_success());

    let store = Store::open(&dir.path().join("out/user_behavior.db")).unwrap();
    assert_eq!(store.read_table("cards").unwrap().height(), 3);
}

#[test]
fn preview_only_stops_before_the_store() {
    let dir = scratch();
    let mut config = config(dir.path());
    config.preview_only = true;
    config.quality_report = true;

    let summary = Pipeline::new(config).with_search_root(dir.path()).run().unwrap();
    assert!(summary.preview_only);

    let out = dir.path().join("out");
    assert!(out.join("data_preview.txt").is_file());
    assert!(out.join("data_quality.json").is_file());
    assert!(!out.join("user_behavior.db").exists());
    assert!(!out.join("results").exists());
}

#[test]
fn missing_source_is_fatal() {
    let dir = scratch();
    fs::remove_file(dir.path().join("data/cards_data.csv")).unwrap();

    let err = Pipeline::new(config(dir.path()))
        .with_search_root(dir.path())
        .run()
        .unwrap_err();
    assert!(matches!(err, PipelineError::Source(DataSourceError::NotFound(_))));
    assert!(!dir.path().join("out/user_behavior.db").exists());
}

#[test]
fn sources_are_found_under_the_search_root() {
    let dir = scratch();
    let mut config = config(dir.path());
    config.data_dir = None;
    config.charts.enabled = false;

    let summary = Pipeline::new(config).with_search_root(dir.path()).run().unwrap();
    assert!(summary.is_success());
    assert!(dir.path().join("out/results/users_by_age_group.csv").is_file());
}

#[test]
fn export_failures_are_collected_in_the_summary() {
    let dir = scratch();
    let config = config(dir.path());
    let out = config.output_dir.clone();
    fs::create_dir_all(&out).unwrap();
    // A file where the results directory should go
    fs::write(out.join("results"), "blocked").unwrap();

    let summary = Pipeline::new(config).with_search_root(dir.path()).run().unwrap();
    assert!(!summary.is_success());
    assert_eq!(summary.failures.len(), QUERIES.len());
    assert!(summary
        .failures
        .iter()
        .all(|f| f.target.starts_with(out.join("results"))));
    // Other outputs are still written
    assert!(out.join("charts/users_by_age_group.png").is_file());
    assert!(out.join("user_behavior.db").is_file());
}
